//! Interactive terminal renderer.
//!
//! Drives the lesson and review commands from line-based input. Besides the
//! per-exercise prompts it understands `:audio` (replay the cue), `:skip` and
//! `:quit`.

use crate::api::ApiClient;
use crate::audio::AudioCueController;
use crate::commands::{self, ExerciseView};
use crate::state::AppState;
use anyhow::Context;
use lesson_core::{
    resolve_array, Answer, Evaluation, ExercisePayload, Gender, LessonDocument, MatchBoard,
    PreReviewChoice, ReviewQuality, Stage,
};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

type Cue = Arc<AudioCueController<ApiClient>>;

/// Where a lesson comes from.
#[derive(Debug, Clone)]
pub enum LessonSource {
    Remote(String),
    File(PathBuf),
}

/// How a review run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewEnd {
    Finished,
    Quit,
}

enum Reply {
    Line(String),
    Skip,
    Quit,
}

enum Collected {
    Answer(Answer),
    Continue,
    Skip,
    Quit,
}

macro_rules! line_or_return {
    ($reply:expr) => {
        match $reply {
            Reply::Line(line) => line,
            Reply::Skip => return Ok(Collected::Skip),
            Reply::Quit => return Ok(Collected::Quit),
        }
    };
}

pub struct Terminal<R, W> {
    input: R,
    out: W,
}

impl<R: BufRead, W: Write> Terminal<R, W> {
    pub fn new(input: R, out: W) -> Self {
        Self { input, out }
    }

    pub fn into_parts(self) -> (R, W) {
        (self.input, self.out)
    }

    /// Walk a lesson from load to the post-lesson summary.
    pub async fn run_lesson(
        &mut self,
        state: &AppState,
        source: LessonSource,
    ) -> anyhow::Result<()> {
        let view = match source {
            LessonSource::Remote(id) => commands::load_lesson(state, &id).await?,
            LessonSource::File(path) => {
                let text = std::fs::read_to_string(&path)
                    .with_context(|| format!("reading lesson file {}", path.display()))?;
                let document: LessonDocument = serde_json::from_str(&text)
                    .with_context(|| format!("parsing lesson file {}", path.display()))?;
                commands::open_lesson(state, document).await?
            }
        };
        writeln!(self.out, "== {} ==", view.title)?;

        if view.stage == Stage::PreReview {
            writeln!(self.out, "You have words due for review.")?;
            match self.read("Review them now? [y/N]")? {
                Reply::Quit => return Ok(()),
                Reply::Line(answer) if is_yes(&answer) => {
                    match self.run_review(state).await {
                        Ok(ReviewEnd::Quit) => return Ok(()),
                        Ok(ReviewEnd::Finished) => {}
                        Err(error) => {
                            warn!(error = %error, "review failed, continuing with the lesson");
                            writeln!(self.out, "Review is unavailable right now: {error}")?;
                        }
                    }
                    commands::leave_pre_review(state, PreReviewChoice::ReviewNow)?;
                }
                _ => {
                    commands::leave_pre_review(state, PreReviewChoice::Skip)?;
                }
            }
        }

        let prompt = format!("Address you as male or female? [{}]", view.gender);
        match self.read(&prompt)? {
            Reply::Quit => return Ok(()),
            Reply::Line(answer) => {
                if let Some(gender) = parse_gender(&answer) {
                    commands::set_gender(state, gender)?;
                }
            }
            Reply::Skip => {}
        }

        let mut stage = commands::start_lesson(state)?;
        while stage == Stage::Lesson {
            let Some(view) = commands::current_exercise(state)? else {
                break;
            };
            match self.run_exercise(state, &view).await? {
                Some(next) => stage = next,
                None => return Ok(()),
            }
        }

        let finished = commands::finish_lesson(state).await?;
        let summary = &finished.summary;
        writeln!(self.out, "\nLesson complete!")?;
        writeln!(
            self.out,
            "Score: {}% ({}/{})  Time: {} min",
            summary.score, summary.correct, summary.graded, summary.time_spent_minutes
        )?;
        if !summary.completed_vocabulary.is_empty() {
            writeln!(self.out, "New words: {}", summary.completed_vocabulary.join(", "))?;
        }
        writeln!(self.out, "{}", finished.save.message())?;
        Ok(())
    }

    /// Review every due card once.
    pub async fn run_review(&mut self, state: &AppState) -> anyhow::Result<ReviewEnd> {
        let view = commands::load_review(state).await?;
        if view.total == 0 {
            writeln!(self.out, "No words are due for review.")?;
            return Ok(ReviewEnd::Finished);
        }
        writeln!(self.out, "Reviewing {} words.", view.total)?;

        while let Some(card) = commands::current_card(state)? {
            writeln!(self.out, "\n{}", card.hebrew)?;
            if let Reply::Quit = self.read("Press Enter to reveal")? {
                return Ok(ReviewEnd::Quit);
            }
            writeln!(self.out, "  {}", card.english)?;

            let quality = loop {
                match self.read("How well did you know it? 1=again 3=hard 4=good 5=easy")? {
                    Reply::Quit => return Ok(ReviewEnd::Quit),
                    Reply::Line(line) => {
                        let quality = line.parse().ok().and_then(ReviewQuality::from_value);
                        if let Some(quality) = quality {
                            break quality;
                        }
                        writeln!(self.out, "Please answer 1, 3, 4 or 5.")?;
                    }
                    Reply::Skip => writeln!(self.out, "Every card needs a rating.")?,
                }
            };

            let rated = commands::rate_card(state, quality.to_value()).await?;
            if let Some(summary) = rated.summary {
                writeln!(
                    self.out,
                    "\nReviewed {} words ({} to repeat).",
                    summary.reviewed, summary.again
                )?;
            }
        }
        Ok(ReviewEnd::Finished)
    }

    /// Returns the next stage, or `None` when the learner quits.
    async fn run_exercise(
        &mut self,
        state: &AppState,
        view: &ExerciseView,
    ) -> anyhow::Result<Option<Stage>> {
        writeln!(
            self.out,
            "\n[{}/{}] {}",
            view.index + 1,
            view.total,
            view.exercise.type_name()
        )?;

        let cue: Cue = Arc::new(state.cue_controller());
        let collected = self.collect(view, &cue);
        cue.release();

        let stage = match collected? {
            Collected::Quit => return Ok(None),
            Collected::Skip => commands::skip_exercise(state)?,
            Collected::Continue => commands::advance(state)?,
            Collected::Answer(answer) => {
                let evaluation = commands::submit_answer(state, &answer)?;
                let graded = view.exercise.kind().map(|k| k.is_graded()).unwrap_or(false);
                if graded {
                    self.show_feedback(&evaluation)?;
                }
                commands::advance(state)?
            }
        };
        Ok(Some(stage))
    }

    fn collect(&mut self, view: &ExerciseView, cue: &Cue) -> anyhow::Result<Collected> {
        let gender = view.gender;
        match &view.exercise.payload {
            ExercisePayload::VocabularyIntro(data) => {
                writeln!(self.out, "{}  =  {}", data.hebrew.resolve(gender), data.english)?;
                if let Some(transliteration) = &data.transliteration {
                    writeln!(self.out, "({})", transliteration.resolve(gender))?;
                }
                play_cue(cue, view);
                line_or_return!(self.ask("Press Enter to continue", cue, view)?);
                Ok(Collected::Continue)
            }

            ExercisePayload::ListenAndSelect(data) => {
                writeln!(self.out, "Listen and choose what you heard.")?;
                let options = resolve_array(&data.options, gender);
                self.list(&options)?;
                play_cue(cue, view);
                let line = line_or_return!(self.ask("Your choice:", cue, view)?);
                Ok(Collected::Answer(choice_answer(&line, options.len())))
            }

            ExercisePayload::MatchPairs(data) => {
                let mut board = MatchBoard::new(data, gender);
                let mut attempts = Vec::new();
                while !board.is_complete() {
                    let left: Vec<String> =
                        board.open_left().into_iter().map(str::to_string).collect();
                    let right: Vec<String> =
                        board.open_right().into_iter().map(str::to_string).collect();
                    writeln!(self.out, "Hebrew:")?;
                    self.list(&left)?;
                    writeln!(self.out, "English:")?;
                    self.list(&right)?;

                    let line = line_or_return!(self.ask("Pair (e.g. 1 2):", cue, view)?);
                    let Some((l, r)) = parse_pair(&line, &left, &right) else {
                        writeln!(self.out, "Enter two numbers.")?;
                        continue;
                    };
                    match board.try_match(&l, &r) {
                        Ok(true) => writeln!(self.out, "Matched.")?,
                        Ok(false) => writeln!(self.out, "Not a pair.")?,
                        Err(e) => writeln!(self.out, "{}", e)?,
                    }
                    attempts.push((l, r));
                }
                Ok(Collected::Answer(Answer::Pairs(attempts)))
            }

            ExercisePayload::BuildSentence(data) => {
                if let Some(translation) = &data.translation {
                    writeln!(self.out, "Build: {}", translation)?;
                }
                let words = resolve_array(&data.words, gender);
                self.list(&words)?;
                let line = line_or_return!(self.ask("Word order (numbers or words):", cue, view)?);
                Ok(Collected::Answer(Answer::Order(parse_order(&line, &words))))
            }

            ExercisePayload::FillInBlank(data) => {
                writeln!(self.out, "{}", data.sentence.resolve(gender))?;
                if let Some(translation) = &data.translation {
                    writeln!(self.out, "({})", translation)?;
                }
                if let Some(hint) = &data.hint {
                    writeln!(self.out, "Hint: {}", hint)?;
                }
                let line = line_or_return!(self.ask("Fill in the blank:", cue, view)?);
                Ok(Collected::Answer(Answer::Text(line)))
            }

            ExercisePayload::SpeakingPractice(data) => {
                writeln!(self.out, "Say it out loud: {}", data.phrase.resolve(gender))?;
                if let Some(translation) = &data.translation {
                    writeln!(self.out, "({})", translation)?;
                }
                play_cue(cue, view);
                let line = line_or_return!(self.ask("Did you say it? [y/n]", cue, view)?);
                Ok(Collected::Answer(Answer::SelfAssessed(is_yes(&line))))
            }

            ExercisePayload::DialogueCompletion(data) => {
                for line in &data.lines {
                    writeln!(self.out, "{}: {}", line.speaker, line.text.resolve(gender))?;
                }
                writeln!(self.out, "...")?;
                let options = resolve_array(&data.options, gender);
                self.list(&options)?;
                let line = line_or_return!(self.ask("Next line:", cue, view)?);
                Ok(Collected::Answer(choice_answer(&line, options.len())))
            }

            ExercisePayload::DialogueWithBlanks(data) => {
                for (i, line) in data.lines.iter().enumerate() {
                    let text = line.text.resolve(gender);
                    writeln!(self.out, "{}. {}: {}", i + 1, line.speaker, text)?;
                }
                let mut blanks = Vec::with_capacity(data.blanks.len());
                for blank in &data.blanks {
                    let prompt = format!("Blank in line {}:", blank.line_index + 1);
                    blanks.push(line_or_return!(self.ask(&prompt, cue, view)?));
                }
                Ok(Collected::Answer(Answer::Blanks(blanks)))
            }

            ExercisePayload::ListenAndType(data) => {
                if let Some(translation) = &data.translation {
                    writeln!(self.out, "({})", translation)?;
                }
                play_cue(cue, view);
                let line = line_or_return!(self.ask("Type what you hear:", cue, view)?);
                Ok(Collected::Answer(Answer::Text(line)))
            }

            ExercisePayload::Unsupported { kind, reason, .. } => {
                debug!(kind = %kind, reason = %reason, "rendering placeholder");
                writeln!(self.out, "This exercise ({}) can't be shown here.", kind)?;
                match self.read("Press Enter to skip")? {
                    Reply::Quit => Ok(Collected::Quit),
                    _ => Ok(Collected::Skip),
                }
            }
        }
    }

    fn show_feedback(&mut self, evaluation: &Evaluation) -> anyhow::Result<()> {
        if evaluation.is_correct {
            writeln!(self.out, "Correct!")?;
        } else {
            writeln!(self.out, "Not quite. Expected: {}", evaluation.expected)?;
        }
        Ok(())
    }

    fn list(&mut self, items: &[String]) -> anyhow::Result<()> {
        for (i, item) in items.iter().enumerate() {
            writeln!(self.out, "  {}. {}", i + 1, item)?;
        }
        Ok(())
    }

    /// Prompt, replaying the cue on `:audio` until something else is entered.
    fn ask(&mut self, prompt: &str, cue: &Cue, view: &ExerciseView) -> anyhow::Result<Reply> {
        loop {
            write!(self.out, "{} ", prompt)?;
            self.out.flush()?;
            let Some(line) = self.read_line()? else {
                return Ok(Reply::Quit);
            };
            match line.as_str() {
                ":audio" => {
                    if view.audio_text.is_some() {
                        play_cue(cue, view);
                    } else {
                        writeln!(self.out, "No audio for this exercise.")?;
                    }
                }
                ":skip" => return Ok(Reply::Skip),
                ":quit" => return Ok(Reply::Quit),
                _ => return Ok(Reply::Line(line)),
            }
        }
    }

    fn read(&mut self, prompt: &str) -> anyhow::Result<Reply> {
        write!(self.out, "{} ", prompt)?;
        self.out.flush()?;
        Ok(match self.read_line()? {
            None => Reply::Quit,
            Some(line) if line == ":quit" => Reply::Quit,
            Some(line) if line == ":skip" => Reply::Skip,
            Some(line) => Reply::Line(line),
        })
    }

    fn read_line(&mut self) -> anyhow::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

/// Start the exercise cue in the background. A newer cue supersedes it.
fn play_cue(cue: &Cue, view: &ExerciseView) {
    let Some(text) = view.audio_text.clone() else {
        return;
    };
    let cue = cue.clone();
    let gender = view.gender;
    tokio::spawn(async move {
        let outcome = cue.play(&text, gender).await;
        debug!(?outcome, "audio cue finished");
    });
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

fn parse_gender(answer: &str) -> Option<Gender> {
    match answer.trim().to_lowercase().as_str() {
        "m" => Some(Gender::Male),
        "f" => Some(Gender::Female),
        other => Gender::from_str(other),
    }
}

/// A 1-based option number selects by position; anything else by value.
fn choice_answer(line: &str, count: usize) -> Answer {
    match line.trim().parse::<usize>() {
        Ok(n) if (1..=count).contains(&n) => Answer::Index(n - 1),
        _ => Answer::Choice(line.trim().to_string()),
    }
}

fn parse_pair(line: &str, left: &[String], right: &[String]) -> Option<(String, String)> {
    let mut numbers = line.split_whitespace().map(|n| n.parse::<usize>().ok());
    let l = numbers.next()??.checked_sub(1)?;
    let r = numbers.next()??.checked_sub(1)?;
    Some((left.get(l)?.clone(), right.get(r)?.clone()))
}

/// Word numbers map to the listed words; otherwise the words are taken as typed.
fn parse_order(line: &str, words: &[String]) -> Vec<String> {
    let picked: Option<Vec<String>> = line
        .split_whitespace()
        .map(|n| {
            let index = n.parse::<usize>().ok()?.checked_sub(1)?;
            words.get(index).cloned()
        })
        .collect();
    picked.unwrap_or_else(|| line.split_whitespace().map(str::to_string).collect())
}
