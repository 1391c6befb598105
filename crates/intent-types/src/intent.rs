//! Intents and the templates they are flattened from.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::language::Language;

/// A recognizable (text, action) pair.
///
/// Ids are unique within one index generation. Intents are derived from
/// [`Template`]s at initialization time, one per language and example phrase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Intent {
    pub id: u64,
    /// Example phrase that gets embedded
    pub text: String,
    /// Name of the action to dispatch on match
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Language of the example phrase
    pub language: Language,
    /// Template this intent was flattened from
    #[serde(default)]
    pub template_id: String,
}

impl Intent {
    pub fn new(id: u64, text: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            action: action.into(),
            description: None,
            category: None,
            language: Language::En,
            template_id: String::new(),
        }
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_template_id(mut self, template_id: impl Into<String>) -> Self {
        self.template_id = template_id.into();
        self
    }
}

/// A language-indexed bundle of example phrases mapped to one action.
///
/// Templates are immutable catalog data once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: String,
    pub action: String,
    pub category: String,
    /// Per-language description
    #[serde(default)]
    pub description: BTreeMap<Language, String>,
    /// Per-language example phrases
    #[serde(default)]
    pub templates: BTreeMap<Language, Vec<String>>,
    /// Ordered parameter names the action expects
    #[serde(default)]
    pub parameters: Vec<String>,
    /// Higher priority templates are flattened first
    #[serde(default)]
    pub priority: i32,
}

impl Template {
    pub fn new(
        id: impl Into<String>,
        action: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            action: action.into(),
            category: category.into(),
            description: BTreeMap::new(),
            templates: BTreeMap::new(),
            parameters: Vec::new(),
            priority: 0,
        }
    }

    /// Add example phrases for a language (builder pattern).
    pub fn with_phrases<I, S>(mut self, language: Language, phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.templates
            .entry(language)
            .or_default()
            .extend(phrases.into_iter().map(Into::into));
        self
    }

    pub fn with_description(mut self, language: Language, description: impl Into<String>) -> Self {
        self.description.insert(language, description.into());
        self
    }

    pub fn with_parameter(mut self, name: impl Into<String>) -> Self {
        self.parameters.push(name.into());
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Description for a language, falling back to English.
    pub fn description_for(&self, language: Language) -> Option<&str> {
        self.description
            .get(&language)
            .or_else(|| self.description.get(&Language::En))
            .map(String::as_str)
    }

    /// Number of intents this template expands to.
    pub fn phrase_count(&self) -> usize {
        self.templates.values().map(Vec::len).sum()
    }
}
