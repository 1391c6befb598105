//! Supported input languages.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RouterError;

/// A language the router can detect and respond in.
///
/// The declaration order is the canonical iteration order used when
/// flattening templates and when reporting detection scores.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Zh,
    #[default]
    En,
    Ja,
    Ko,
    Es,
    Fr,
    De,
}

impl Language {
    /// All supported languages in canonical order.
    pub const ALL: [Language; 7] = [
        Language::Zh,
        Language::En,
        Language::Ja,
        Language::Ko,
        Language::Es,
        Language::Fr,
        Language::De,
    ];

    /// ISO 639-1 code.
    pub fn code(&self) -> &'static str {
        match self {
            Language::Zh => "zh",
            Language::En => "en",
            Language::Ja => "ja",
            Language::Ko => "ko",
            Language::Es => "es",
            Language::Fr => "fr",
            Language::De => "de",
        }
    }

    /// Human-readable name, in English.
    pub fn name(&self) -> &'static str {
        match self {
            Language::Zh => "Chinese",
            Language::En => "English",
            Language::Ja => "Japanese",
            Language::Ko => "Korean",
            Language::Es => "Spanish",
            Language::Fr => "French",
            Language::De => "German",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = RouterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Language::ALL
            .into_iter()
            .find(|lang| lang.code() == lower)
            .ok_or_else(|| RouterError::InvalidInput(format!("unsupported language: {}", s)))
    }
}
