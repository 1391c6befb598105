//! Language detection.
//!
//! Each supported language has an ordered list of patterns: script ranges
//! and common keywords. The score for a language is the total number of
//! non-overlapping pattern matches in the input. The highest score wins;
//! ties and all-zero scores fall back to English.
//!
//! Detection only chooses the response language. It never affects matching.

use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::sync::{LazyLock, Mutex};

use intent_types::Language;
use lru::LruCache;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

/// Confidence reported when no pattern matched at all
pub const NEUTRAL_CONFIDENCE: f32 = 0.5;

const ZH_PATTERNS: &[&str] = &[
    r"[\u{4e00}-\u{9fff}]",
    r"[的了是我你吗呢吧设备积分查询显示添加删除帮助]",
];

const EN_PATTERNS: &[&str] = &[
    r"(?i)\b(?:the|my|me|show|check|list|add|remove|delete|view|get|what|how|is|are|all)\b",
    r"(?i)\b(?:device|devices|points|profile|help|status|account|new)\b",
];

const JA_PATTERNS: &[&str] = &[
    r"[\u{3040}-\u{309f}]",
    r"[\u{30a0}-\u{30ff}]",
    r"(?:です|ます|ください|して|を|は|の)",
];

const KO_PATTERNS: &[&str] = &[
    r"[\u{ac00}-\u{d7af}]",
    r"[\u{1100}-\u{11ff}\u{3130}-\u{318f}]",
];

const ES_PATTERNS: &[&str] = &[
    r"(?i)[ñáíóú¿¡]",
    r"(?i)\b(?:el|los|las|mis|mi|que|mostrar|muestra|ver|dispositivo|dispositivos|puntos|agregar|añadir|eliminar|perfil|ayuda|estado|cuántos|nuevo)\b",
];

const FR_PATTERNS: &[&str] = &[
    r"(?i)[àâçèêëîïôûœ]",
    r"(?i)\b(?:le|les|des|mes|mon|ma|afficher|affiche|voir|appareil|appareils|ajouter|supprimer|profil|aide|état|du|une|nouvel)\b",
];

const DE_PATTERNS: &[&str] = &[
    r"(?i)[äöüß]",
    r"(?i)\b(?:der|die|das|mein|meine|meinen|zeige|zeigen|gerät|geräte|punkte|hinzufügen|entfernen|löschen|hilfe|und|ist|neues)\b",
];

fn pattern_source(language: Language) -> &'static [&'static str] {
    match language {
        Language::Zh => ZH_PATTERNS,
        Language::En => EN_PATTERNS,
        Language::Ja => JA_PATTERNS,
        Language::Ko => KO_PATTERNS,
        Language::Es => ES_PATTERNS,
        Language::Fr => FR_PATTERNS,
        Language::De => DE_PATTERNS,
    }
}

/// Compiled patterns in canonical language order. A pattern that fails to
/// compile is dropped and simply never matches.
static PATTERNS: LazyLock<Vec<(Language, Vec<Regex>)>> = LazyLock::new(|| {
    Language::ALL
        .into_iter()
        .map(|language| {
            let compiled = pattern_source(language)
                .iter()
                .filter_map(|p| Regex::new(p).ok())
                .collect();
            (language, compiled)
        })
        .collect()
});

/// Outcome of detecting one input string.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionResult {
    pub language: Language,
    /// best score / sum of scores, or [`NEUTRAL_CONFIDENCE`] when nothing matched
    pub confidence: f32,
    /// Raw match counts per language
    pub scores: BTreeMap<Language, usize>,
}

/// Pattern-scoring language classifier with a bounded memo.
pub struct LanguageDetector {
    memo: Option<Mutex<LruCache<String, DetectionResult>>>,
}

impl Default for LanguageDetector {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl LanguageDetector {
    /// Create a detector remembering up to `memo_capacity` inputs.
    /// A capacity of 0 disables memoization.
    pub fn new(memo_capacity: usize) -> Self {
        Self {
            memo: NonZeroUsize::new(memo_capacity).map(|cap| Mutex::new(LruCache::new(cap))),
        }
    }

    /// Detect the language of `text`.
    pub fn detect(&self, text: &str) -> DetectionResult {
        if let Some(memo) = &self.memo {
            if let Ok(mut memo) = memo.lock() {
                if let Some(hit) = memo.get(text) {
                    return hit.clone();
                }
            }
        }

        let result = score_text(text);
        debug!(
            language = %result.language,
            confidence = result.confidence,
            "Detected language"
        );

        if let Some(memo) = &self.memo {
            if let Ok(mut memo) = memo.lock() {
                memo.put(text.to_string(), result.clone());
            }
        }
        result
    }

    /// Number of memoized inputs.
    pub fn memo_len(&self) -> usize {
        self.memo
            .as_ref()
            .and_then(|memo| memo.lock().ok().map(|m| m.len()))
            .unwrap_or(0)
    }

    pub fn clear_memo(&self) {
        if let Some(memo) = &self.memo {
            if let Ok(mut memo) = memo.lock() {
                memo.clear();
            }
        }
    }
}

fn score_text(text: &str) -> DetectionResult {
    let scores: BTreeMap<Language, usize> = PATTERNS
        .iter()
        .map(|(language, patterns)| {
            let score = patterns.iter().map(|p| p.find_iter(text).count()).sum();
            (*language, score)
        })
        .collect();

    let total: usize = scores.values().sum();
    let best = scores.values().copied().max().unwrap_or(0);
    let leaders: Vec<Language> = scores
        .iter()
        .filter(|(_, score)| **score == best)
        .map(|(&language, _)| language)
        .collect();

    let language = match leaders.as_slice() {
        [only] if best > 0 => *only,
        _ => Language::En,
    };
    let confidence = if total > 0 {
        best as f32 / total as f32
    } else {
        NEUTRAL_CONFIDENCE
    };

    DetectionResult {
        language,
        confidence,
        scores,
    }
}
