pub mod api;
pub mod audio;
pub mod commands;
pub mod config;
pub mod state;
pub mod terminal;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use lesson_core::{ComparisonMode, Gender};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ClientConfig;
use crate::state::AppState;
use crate::terminal::{LessonSource, Terminal};

#[derive(Parser)]
#[command(name = "hebrew-lesson", about = "Hebrew lessons and vocabulary review", version)]
struct Cli {
    /// How exercises address you (male or female)
    #[arg(long, global = true, value_parser = parse_gender)]
    gender: Option<Gender>,

    /// Answer matching (strict or diacritic_insensitive)
    #[arg(long, global = true, value_parser = parse_matching)]
    matching: Option<ComparisonMode>,

    /// Learner id for reviews and progress (overrides HEBREW_USER_ID)
    #[arg(long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Take a lesson
    Lesson {
        /// Lesson id on the server
        #[arg(required_unless_present = "file")]
        id: Option<String>,
        /// Read the lesson document from a JSON file instead
        #[arg(long, conflicts_with = "id")]
        file: Option<PathBuf>,
    },

    /// Review vocabulary that is due
    Review,
}

fn parse_gender(s: &str) -> Result<Gender, String> {
    Gender::from_str(&s.to_lowercase()).ok_or_else(|| format!("unknown gender: {}", s))
}

fn parse_matching(s: &str) -> Result<ComparisonMode, String> {
    ComparisonMode::from_str(s).ok_or_else(|| format!("unknown matching mode: {}", s))
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = ClientConfig::from_env()?;

    // stdout belongs to the lesson
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Some(mode) = cli.matching {
        config.comparison_mode = mode;
    }
    if let Some(user) = cli.user {
        config.user_id = Some(user);
    }
    tracing::debug!(
        api = %config.api_base_url,
        mode = config.comparison_mode.as_str(),
        "configuration loaded"
    );

    let state = AppState::new(config).with_preferred_gender(cli.gender.unwrap_or_default());
    let mut terminal = Terminal::new(std::io::stdin().lock(), std::io::stdout());

    match cli.command {
        Command::Lesson { id, file } => {
            let source = match (file, id) {
                (Some(path), _) => LessonSource::File(path),
                (None, Some(id)) => LessonSource::Remote(id),
                (None, None) => anyhow::bail!("a lesson id or --file is required"),
            };
            terminal.run_lesson(&state, source).await
        }
        Command::Review => terminal.run_review(&state).await.map(|_| ()),
    }
}
