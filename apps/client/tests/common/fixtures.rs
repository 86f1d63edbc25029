//! Lesson documents and review words used across the client tests.

use serde_json::{json, Value};

/// Three exercises: one introduction, one listening choice, one blank.
pub fn cafe_lesson() -> Value {
    json!({
        "id": "cafe-1",
        "title": "At the café",
        "exercises": [
            {"id": "e1", "type": "vocabulary_intro",
             "data": {"hebrew": "קָפֶה", "english": "coffee", "transliteration": "kafe"}},
            {"id": "e2", "type": "listen_and_select",
             "data": {"audioText": "מַיִם", "options": ["coffee", "water", "bread"], "correctAnswer": "water"}},
            {"id": "e3", "type": "fill_in_blank",
             "data": {"sentence": {"male": "אֲנִי שׁוֹתֶה ___", "female": "אֲנִי שׁוֹתָה ___"},
                      "correctAnswer": "מַיִם"}}
        ]
    })
}

/// A lesson mixing a renderable exercise with one the client does not know.
pub fn lesson_with_unknown() -> Value {
    json!({
        "id": "mixed-1",
        "title": "Mixed",
        "exercises": [
            {"id": "a", "type": "karaoke", "data": {"song": "?"}},
            {"id": "b", "type": "speaking_practice", "data": {"phrase": "תּוֹדָה רַבָּה"}}
        ]
    })
}

pub fn due_words(n: usize) -> Vec<Value> {
    let words = [
        ("סֵפֶר", "book"),
        ("בַּיִת", "house"),
        ("יֶלֶד", "boy"),
        ("יַלְדָּה", "girl"),
        ("כֶּלֶב", "dog"),
        ("חָתוּל", "cat"),
    ];
    words
        .iter()
        .cycle()
        .take(n)
        .enumerate()
        .map(|(i, (hebrew, english))| {
            json!({"id": format!("w{}", i + 1), "hebrew": hebrew, "english": english, "repetitions": i})
        })
        .collect()
}
