//! End-to-end walks through lesson and review sessions.

use chrono::{Duration, Utc};
use lesson_core::{
    Answer, ExerciseOutcome, Gender, LessonDocument, LessonSession, PreReviewChoice,
    ReviewCard, ReviewQuality, ReviewQueue, Stage,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use unicode_normalization::UnicodeNormalization;

fn cafe_lesson() -> LessonDocument {
    serde_json::from_value(json!({
        "id": "cafe-1",
        "title": "At the café",
        "exercises": [
            {"id": "e1", "type": "vocabulary_intro",
             "data": {"hebrew": "קָפֶה", "english": "coffee"}},
            {"id": "e2", "type": "listen_and_select",
             "data": {"audioText": "מַיִם", "options": ["coffee", "water", "bread"], "correctAnswer": "water"}},
            {"id": "e3", "type": "fill_in_blank",
             "data": {"sentence": "אֲנִי שׁוֹתֶה ___", "correctAnswer": "מַיִם"}}
        ]
    }))
    .unwrap()
}

#[test]
fn cafe_lesson_reaches_complete() {
    let start = Utc::now();
    let mut session = LessonSession::new(cafe_lesson(), 0);
    assert_eq!(session.stage(), Stage::Intro);
    session.start(start).unwrap();

    session.advance().unwrap();

    let selected = session.submit(&Answer::Choice("water".into())).unwrap();
    assert!(selected.is_correct);
    session.advance().unwrap();

    let typed: String = "מַיִם".nfc().collect();
    let filled = session.submit(&Answer::Text(typed)).unwrap();
    assert!(filled.is_correct);
    assert_eq!(session.advance().unwrap(), Stage::Complete);

    assert_eq!(session.completed_vocabulary(), &["קָפֶה".to_string()]);

    let summary = session.finish(start + Duration::seconds(200)).unwrap();
    assert_eq!(summary.time_spent_minutes, 3);
    assert_eq!(summary.score, 100);
    assert_eq!(summary.graded, 2);
    assert_eq!(session.stage(), Stage::PostOptions);
}

#[test]
fn full_stage_sequence_with_pre_review() {
    let mut session = LessonSession::new(cafe_lesson(), 4);
    let mut stages = vec![session.stage()];

    stages.push(session.leave_pre_review(PreReviewChoice::Skip).unwrap());
    session.set_gender(Gender::Female).unwrap();
    stages.push(session.start(Utc::now()).unwrap());
    while session.stage() == Stage::Lesson {
        stages.push(session.advance().unwrap());
    }
    session.finish(Utc::now()).unwrap();
    stages.push(session.stage());

    assert_eq!(
        stages,
        vec![
            Stage::PreReview,
            Stage::Intro,
            Stage::Lesson,
            Stage::Lesson,
            Stage::Lesson,
            Stage::Complete,
            Stage::PostOptions,
        ]
    );
}

#[test]
fn unknown_exercise_can_be_skipped() {
    let lesson: LessonDocument = serde_json::from_value(json!({
        "id": "l2",
        "exercises": [
            {"id": "a", "type": "foo", "data": {}},
            {"id": "b", "type": "speaking_practice", "data": {"phrase": "תּוֹדָה"}}
        ]
    }))
    .unwrap();

    let mut session = LessonSession::new(lesson, 0);
    session.start(Utc::now()).unwrap();

    let current = session.current_exercise().unwrap();
    assert!(!current.is_supported());
    assert!(session.submit(&Answer::Index(0)).is_err());

    session.skip().unwrap();
    assert_eq!(session.current_index(), 1);
    assert_eq!(session.outcome(0), Some(ExerciseOutcome::Skipped));

    session.advance().unwrap();
    assert_eq!(session.stage(), Stage::Complete);
    assert_eq!(session.summary(Utc::now()).skipped, 1);
}

#[test]
fn advance_moves_past_unknown_exercise() {
    let lesson: LessonDocument = serde_json::from_value(json!({
        "id": "l3",
        "exercises": [{"id": "a", "type": "foo"}]
    }))
    .unwrap();
    let mut session = LessonSession::new(lesson, 0);
    session.start(Utc::now()).unwrap();
    assert_eq!(session.advance().unwrap(), Stage::Complete);
}

#[test]
fn completed_vocabulary_bounded_by_intro_count() {
    let lesson: LessonDocument = serde_json::from_value(json!({
        "id": "l4",
        "exercises": [
            {"id": "a", "type": "vocabulary_intro", "data": {"hebrew": {"male": "אַתָּה", "female": "אַתְּ"}, "english": "you"}},
            {"id": "b", "type": "vocabulary_intro", "data": {"hebrew": "אַתָּה", "english": "you (m)"}},
            {"id": "c", "type": "fill_in_blank", "data": {"sentence": "___", "correctAnswer": "x"}}
        ]
    }))
    .unwrap();
    let bound = lesson.vocabulary_count();

    for gender in [Gender::Male, Gender::Female] {
        let mut session = LessonSession::new(lesson.clone(), 0);
        session.set_gender(gender).unwrap();
        session.start(Utc::now()).unwrap();
        while session.stage() == Stage::Lesson {
            session.advance().unwrap();
        }
        let words = session.completed_vocabulary();
        assert!(words.len() <= bound);
        let mut deduped = words.to_vec();
        deduped.dedup();
        assert_eq!(deduped.len(), words.len());
    }
}

#[test]
fn review_of_five_cards_completes_once() {
    let cards: Vec<ReviewCard> = serde_json::from_value(json!([
        {"id": "1", "hebrew": "סֵפֶר", "english": "book", "repetitions": 2, "category": "nouns", "level": 1},
        {"id": "2", "hebrew": "בַּיִת", "english": "house", "repetitions": 0},
        {"id": "3", "hebrew": "יֶלֶד", "english": "boy", "repetitions": 1},
        {"id": "4", "hebrew": "יַלְדָּה", "english": "girl", "repetitions": 1},
        {"id": "5", "hebrew": "כֶּלֶב", "english": "dog", "repetitions": 3}
    ]))
    .unwrap();

    let fired = Arc::new(AtomicUsize::new(0));
    let counter = fired.clone();
    let mut queue = ReviewQueue::new(cards).on_complete(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let qualities = [1u8, 3, 4, 5, 4];
    for (i, value) in qualities.into_iter().enumerate() {
        assert_eq!(fired.load(Ordering::SeqCst), 0, "fired before card {}", i + 1);
        let quality = ReviewQuality::try_from(value).unwrap();
        queue.rate(quality).unwrap();
    }
    assert_eq!(fired.load(Ordering::SeqCst), 1);
    assert!(queue.is_exhausted());
}
