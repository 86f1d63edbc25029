//! Scripted terminal sessions.

mod common;

use std::io::{Cursor, Write};

use common::{fixtures, MockBackend};
use hebrew_lesson_client::terminal::{LessonSource, Terminal};
use pretty_assertions::assert_eq;

fn terminal(script: &[&str]) -> Terminal<Cursor<Vec<u8>>, Vec<u8>> {
    let mut input = script.join("\n");
    input.push('\n');
    Terminal::new(Cursor::new(input.into_bytes()), Vec::new())
}

fn output(terminal: Terminal<Cursor<Vec<u8>>, Vec<u8>>) -> String {
    String::from_utf8(terminal.into_parts().1).unwrap()
}

#[tokio::test]
async fn remote_lesson_to_summary() {
    let backend = MockBackend::builder()
        .lesson(fixtures::cafe_lesson())
        .start()
        .await;
    let state = backend.app_state();

    let mut term = terminal(&["f", "", "2", "מַיִם"]);
    term.run_lesson(&state, LessonSource::Remote("cafe-1".into()))
        .await
        .unwrap();
    let out = output(term);

    assert!(out.contains("== At the café =="));
    assert!(out.contains("קָפֶה  =  coffee"));
    assert!(out.contains("אֲנִי שׁוֹתָה ___"), "female sentence shown");
    assert!(out.contains("Score: 100% (2/2)"));
    assert!(out.contains("New words: קָפֶה"));
    assert!(out.contains("Progress saved\n"));
    assert_eq!(backend.recorded().progress.len(), 1);
}

#[tokio::test]
async fn pre_review_then_lesson() {
    let backend = MockBackend::builder()
        .lesson(fixtures::cafe_lesson())
        .due_words(fixtures::due_words(2))
        .start()
        .await;
    let state = backend.app_state();

    let mut term = terminal(&["y", "", "4", "", "5", "", "", ":skip", "מים"]);
    term.run_lesson(&state, LessonSource::Remote("cafe-1".into()))
        .await
        .unwrap();
    let out = output(term);

    assert!(out.contains("Reviewing 2 words."));
    assert!(out.contains("Reviewed 2 words (0 to repeat)."));
    assert!(out.contains("Score: 100% (1/1)"));
    assert_eq!(
        backend.recorded().reviews,
        vec![("w1".to_string(), 4), ("w2".to_string(), 5)]
    );
}

#[tokio::test]
async fn file_lesson_placeholder_and_quit() {
    let backend = MockBackend::builder().start().await;
    let state = backend.app_state();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{}", fixtures::lesson_with_unknown()).unwrap();

    let mut term = terminal(&["m", "", ":quit"]);
    term.run_lesson(&state, LessonSource::File(file.path().to_path_buf()))
        .await
        .unwrap();
    let out = output(term);

    assert!(out.contains("This exercise (karaoke) can't be shown here."));
    assert!(out.contains("Say it out loud: תּוֹדָה רַבָּה"));
    assert!(!out.contains("Lesson complete!"));
    assert!(backend.recorded().progress.is_empty());
}

#[tokio::test]
async fn review_with_nothing_due() {
    let backend = MockBackend::builder().start().await;
    let state = backend.app_state();

    let mut term = terminal(&[]);
    term.run_review(&state).await.unwrap();
    assert!(output(term).contains("No words are due for review."));
}

#[tokio::test]
async fn failed_review_fetch_continues_lesson() {
    let backend = MockBackend::builder()
        .lesson(fixtures::cafe_lesson())
        .due_words(fixtures::due_words(2))
        .fail_due_after(1)
        .start()
        .await;
    let state = backend.app_state();

    let mut term = terminal(&["y", "m", "", "2", "מים"]);
    term.run_lesson(&state, LessonSource::Remote("cafe-1".into()))
        .await
        .unwrap();
    let out = output(term);

    assert!(out.contains("Review is unavailable right now"));
    assert!(!out.contains("Reviewing 2 words."));
    assert!(out.contains("Score: 100% (2/2)"));
    assert_eq!(backend.recorded().review_queries.len(), 2);
    assert!(backend.recorded().reviews.is_empty());
    assert_eq!(backend.recorded().progress.len(), 1);
}

#[tokio::test]
async fn quit_during_pre_review_ends_lesson() {
    let backend = MockBackend::builder()
        .lesson(fixtures::cafe_lesson())
        .due_words(fixtures::due_words(2))
        .start()
        .await;
    let state = backend.app_state();

    let mut term = terminal(&["y", ":quit", "m", "", "2", "מים"]);
    term.run_lesson(&state, LessonSource::Remote("cafe-1".into()))
        .await
        .unwrap();
    let out = output(term);

    assert!(out.contains("Reviewing 2 words."));
    assert!(!out.contains("Address you as"));
    assert!(!out.contains("Lesson complete!"));
    assert!(backend.recorded().reviews.is_empty());
    assert!(backend.recorded().progress.is_empty());
}
