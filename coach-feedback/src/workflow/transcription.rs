//! Speech-to-text detection and punctuation noise filtering
//!
//! Voice learners produce text with no punctuation or capitalization to
//! correct, so feedback about either is noise from the STT boundary.

use crate::types::FeedbackItem;

/// Question words whose presence without a '?' hints at dictation
const QUESTION_WORDS: &[&str] = &["what", "how", "when", "where", "why"];

/// Punctuation/capitalization keywords (Spanish and English)
pub const PUNCTUATION_KEYWORDS: &[&str] = &[
    "coma",
    "comma",
    "punto",
    "period",
    "mayúscula",
    "capital",
    "signo de interrogación",
    "question mark",
    "puntuación",
    "punctuation",
    "capitaliz",
    "mayúscul",
    "punto final",
];

/// Whether `text` likely came from speech-to-text
///
/// True iff at least two of four signals fire:
/// 1. more than 10 words and no period
/// 2. more than 5 words and no comma
/// 3. first character is not uppercase
/// 4. no question mark but a wh-question word appears
pub fn looks_transcribed(text: &str) -> bool {
    let Some(first) = text.chars().next() else {
        return false;
    };

    let word_count = text.split_whitespace().count();
    let lower = text.to_lowercase();

    let signals = [
        word_count > 10 && !text.contains('.'),
        word_count > 5 && !text.contains(','),
        !first.is_uppercase(),
        !text.contains('?') && QUESTION_WORDS.iter().any(|w| lower.contains(w)),
    ];

    signals.iter().filter(|fired| **fired).count() >= 2
}

/// Drop punctuation/capitalization feedback when input looks transcribed
///
/// Identity when `transcribed` is false.
pub fn filter_transcription_noise(items: Vec<FeedbackItem>, transcribed: bool) -> Vec<FeedbackItem> {
    if !transcribed {
        return items;
    }

    items
        .into_iter()
        .filter(|item| !mentions_punctuation(item))
        .collect()
}

fn mentions_punctuation(item: &FeedbackItem) -> bool {
    let text = format!(
        "{} {} {}",
        item.explanation, item.issue_type, item.learning_tip
    )
    .to_lowercase();
    PUNCTUATION_KEYWORDS.iter().any(|k| text.contains(k))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Category;

    #[test]
    fn test_empty_input_not_transcribed() {
        assert!(!looks_transcribed(""));
    }

    #[test]
    fn test_typed_sentence_not_transcribed() {
        assert!(!looks_transcribed("Hello, I would like a coffee."));
        assert!(!looks_transcribed("What time is it?"));
    }

    #[test]
    fn test_lowercase_question_without_mark() {
        // signals: lowercase start + wh-word without '?'
        assert!(looks_transcribed("what time is it"));
    }

    #[test]
    fn test_long_unpunctuated_dictation() {
        // > 10 words, no period, no comma
        assert!(looks_transcribed(
            "I went to the store yesterday and I bought some apples and bananas"
        ));
    }

    #[test]
    fn test_single_signal_is_not_enough() {
        // only the lowercase-start signal fires
        assert!(!looks_transcribed("yes."));
        // only the no-comma signal fires (6 words, period present, capitalized)
        assert!(!looks_transcribed("I like to play football daily."));
    }

    #[test]
    fn test_deterministic() {
        let text = "where do you live my friend";
        assert_eq!(looks_transcribed(text), looks_transcribed(text));
    }

    fn item_with_explanation(explanation: &str) -> FeedbackItem {
        FeedbackItem::new(Category::Grammar, "a", "b", explanation)
    }

    #[test]
    fn test_filter_identity_when_typed() {
        let items = vec![
            item_with_explanation("Falta una coma después de 'Hello'."),
            item_with_explanation("Use 'doesn't' with she."),
        ];
        let filtered = filter_transcription_noise(items.clone(), false);
        assert_eq!(filtered, items);
    }

    #[test]
    fn test_filter_drops_punctuation_feedback() {
        let items = vec![
            item_with_explanation("Sentences start with a capital letter."),
            item_with_explanation("Falta una coma."),
            item_with_explanation("Use 'doesn't' with she."),
            item_with_explanation("ok").with_issue_type("punctuation_missing"),
            item_with_explanation("ok").with_learning_tip("Revisa la puntuación"),
        ];

        let filtered = filter_transcription_noise(items, true);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].explanation, "Use 'doesn't' with she.");
    }

    #[test]
    fn test_filter_matches_case_insensitively() {
        let items = vec![item_with_explanation("Missing PERIOD at the end.")];
        assert!(filter_transcription_noise(items, true).is_empty());
    }
}
