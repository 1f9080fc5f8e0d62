//! Result capping and summary
//!
//! Learners see a short list: high before medium before low, truncated to
//! the plan cap for the input mode. The summary is computed from the full
//! buckets, so it reflects what was found, not what was shown.

use crate::types::{FeedbackItem, SeverityBuckets};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Maximum suggestions shown per input mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapPolicy {
    /// Cap when the learner turn looks voice-transcribed
    pub transcribed: usize,
    /// Cap for typed input
    pub typed: usize,
}

impl CapPolicy {
    pub const fn new(transcribed: usize, typed: usize) -> Self {
        Self { transcribed, typed }
    }

    pub fn limit(&self, is_transcribed: bool) -> usize {
        if is_transcribed {
            self.transcribed
        } else {
            self.typed
        }
    }

    /// Replace either cap when an override is configured
    pub fn with_overrides(self, transcribed: Option<usize>, typed: Option<usize>) -> Self {
        Self {
            transcribed: transcribed.unwrap_or(self.transcribed),
            typed: typed.unwrap_or(self.typed),
        }
    }
}

/// Summary language
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Es,
    En,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown locale: {0} (expected es or en)")]
pub struct UnknownLocale(pub String);

impl FromStr for Locale {
    type Err = UnknownLocale;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "es" => Ok(Locale::Es),
            "en" => Ok(Locale::En),
            _ => Err(UnknownLocale(s.to_string())),
        }
    }
}

/// High ++ medium ++ low, truncated to the cap for the input mode
pub fn cap_ranked(buckets: &SeverityBuckets, is_transcribed: bool, policy: CapPolicy) -> Vec<FeedbackItem> {
    buckets
        .ranked()
        .take(policy.limit(is_transcribed))
        .cloned()
        .collect()
}

/// Summary for the full (pre-truncation) buckets
pub fn summarize(buckets: &SeverityBuckets, locale: Locale) -> String {
    let high = buckets.high.len();
    let medium = buckets.medium.len();
    let low = buckets.low.len();

    match locale {
        Locale::Es => {
            if high + medium + low == 0 {
                congratulations(locale)
            } else if high == 0 && medium == 0 {
                format!("¡Muy bien! Solo {} sugerencia(s) menor(es) 👍", low)
            } else if high == 0 {
                format!("¡Bien! {} sugerencia(s) para sonar más natural 📈", medium)
            } else if high == 1 {
                "Una corrección importante y algunas sugerencias opcionales 📝".to_string()
            } else {
                format!("{} correcciones importantes para mejorar la comunicación 🎯", high)
            }
        }
        Locale::En => {
            if high + medium + low == 0 {
                congratulations(locale)
            } else if high == 0 && medium == 0 {
                format!("Very good! Only {} minor suggestion(s) 👍", low)
            } else if high == 0 {
                format!("Good! {} suggestion(s) to sound more natural 📈", medium)
            } else if high == 1 {
                "One important correction and a few optional suggestions 📝".to_string()
            } else {
                format!("{} important corrections to improve communication 🎯", high)
            }
        }
    }
}

/// Message for a turn with nothing to correct
pub fn congratulations(locale: Locale) -> String {
    match locale {
        Locale::Es => "¡Excelente! Tu inglés suena muy natural 🎉".to_string(),
        Locale::En => "Excellent! Your English sounds very natural 🎉".to_string(),
    }
}
