//! Template catalog.
//!
//! Holds the language-indexed templates and flattens them into the intents
//! that get embedded and indexed. Flattening order is what fixes index
//! labels, so it is fully deterministic: templates by descending priority
//! (ties keep insertion order), then languages in canonical order, then
//! phrases in the order they were declared.

use intent_types::{Intent, Language, Template};
use tracing::debug;

/// Ordered collection of templates, keyed by template id.
#[derive(Debug, Clone, Default)]
pub struct TemplateCatalog {
    templates: Vec<Template>,
}

impl TemplateCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from templates, upserting in iteration order.
    pub fn from_templates(templates: impl IntoIterator<Item = Template>) -> Self {
        let mut catalog = Self::new();
        for template in templates {
            catalog.add_template(template);
        }
        catalog
    }

    /// Insert a template, or replace the one with the same id in place.
    ///
    /// Returns `true` if an existing template was replaced.
    pub fn add_template(&mut self, template: Template) -> bool {
        match self.templates.iter_mut().find(|t| t.id == template.id) {
            Some(existing) => {
                debug!(id = %template.id, "Replaced template");
                *existing = template;
                true
            }
            None => {
                debug!(id = %template.id, "Added template");
                self.templates.push(template);
                false
            }
        }
    }

    /// Remove a template by id. Returns whether anything was removed.
    pub fn remove_template(&mut self, id: &str) -> bool {
        let before = self.templates.len();
        self.templates.retain(|t| t.id != id);
        self.templates.len() != before
    }

    pub fn get(&self, id: &str) -> Option<&Template> {
        self.templates.iter().find(|t| t.id == id)
    }

    /// Template that declares `action`, if any.
    pub fn find_by_action(&self, action: &str) -> Option<&Template> {
        self.templates.iter().find(|t| t.action == action)
    }

    /// Templates in insertion order.
    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Number of intents `get_all_flattened` would produce.
    pub fn intent_count(&self) -> usize {
        self.templates
            .iter()
            .flat_map(|t| t.templates.values().flatten())
            .filter(|phrase| !phrase.trim().is_empty())
            .count()
    }

    fn by_priority(&self) -> impl Iterator<Item = &Template> {
        let mut ordered: Vec<&Template> = self.templates.iter().collect();
        // sort_by is stable, so equal priorities keep insertion order
        ordered.sort_by(|a, b| b.priority.cmp(&a.priority));
        ordered.into_iter()
    }

    /// Every (template, language, phrase) as an intent, ids from 0.
    ///
    /// Blank phrases are skipped; they can never be embedded.
    pub fn get_all_flattened(&self) -> Vec<Intent> {
        let mut intents = Vec::with_capacity(self.intent_count());
        for template in self.by_priority() {
            for (&language, phrases) in &template.templates {
                for phrase in phrases.iter().filter(|p| !p.trim().is_empty()) {
                    let mut intent =
                        Intent::new(intents.len() as u64, phrase.as_str(), &template.action)
                            .with_language(language)
                            .with_category(&template.category)
                            .with_template_id(&template.id);
                    intent.description = template.description_for(language).map(str::to_string);
                    intents.push(intent);
                }
            }
        }
        intents
    }

    /// Flattened intents for one language. Ids match `get_all_flattened`.
    pub fn get_for_language(&self, language: Language) -> Vec<Intent> {
        self.get_all_flattened()
            .into_iter()
            .filter(|intent| intent.language == language)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points() -> Template {
        Template::new("points", "getUserPoints", "user")
            .with_phrases(Language::En, ["check points", "my points"])
            .with_phrases(Language::Zh, ["查询积分"])
            .with_description(Language::En, "Show the user's points")
    }

    fn devices() -> Template {
        Template::new("devices", "listDevices", "device")
            .with_phrases(Language::En, ["list devices"])
            .with_priority(5)
    }

    #[test]
    fn test_flatten_orders_by_priority_then_language() {
        let catalog = TemplateCatalog::from_templates([points(), devices()]);
        let intents = catalog.get_all_flattened();

        let texts: Vec<&str> = intents.iter().map(|i| i.text.as_str()).collect();
        // zh sorts before en in canonical language order
        assert_eq!(texts, vec!["list devices", "查询积分", "check points", "my points"]);

        let ids: Vec<u64> = intents.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
        assert_eq!(catalog.intent_count(), 4);
    }

    #[test]
    fn test_flatten_inherits_template_fields() {
        let catalog = TemplateCatalog::from_templates([points()]);
        let intents = catalog.get_all_flattened();

        let zh = &intents[0];
        assert_eq!(zh.action, "getUserPoints");
        assert_eq!(zh.category.as_deref(), Some("user"));
        assert_eq!(zh.template_id, "points");
        assert_eq!(zh.language, Language::Zh);
        // falls back to the English description
        assert_eq!(zh.description.as_deref(), Some("Show the user's points"));
    }

    #[test]
    fn test_equal_priority_keeps_insertion_order() {
        let first = Template::new("a", "actionA", "x").with_phrases(Language::En, ["alpha"]);
        let second = Template::new("b", "actionB", "x").with_phrases(Language::En, ["beta"]);
        let catalog = TemplateCatalog::from_templates([first, second]);

        let actions: Vec<String> = catalog
            .get_all_flattened()
            .into_iter()
            .map(|i| i.action)
            .collect();
        assert_eq!(actions, vec!["actionA", "actionB"]);
    }

    #[test]
    fn test_add_template_upserts_in_place() {
        let mut catalog = TemplateCatalog::from_templates([points(), devices()]);
        let replacement = Template::new("points", "getUserPoints", "user")
            .with_phrases(Language::En, ["show points"]);

        assert!(catalog.add_template(replacement));
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.templates()[0].id, "points");
        assert_eq!(catalog.intent_count(), 2);
    }

    #[test]
    fn test_remove_template() {
        let mut catalog = TemplateCatalog::from_templates([points(), devices()]);
        assert!(catalog.remove_template("devices"));
        assert!(!catalog.remove_template("devices"));
        assert_eq!(catalog.len(), 1);
        assert!(catalog.get("devices").is_none());
    }

    #[test]
    fn test_get_for_language() {
        let catalog = TemplateCatalog::from_templates([points(), devices()]);
        let zh = catalog.get_for_language(Language::Zh);
        assert_eq!(zh.len(), 1);
        assert_eq!(zh[0].id, 1);
        assert!(catalog.get_for_language(Language::Ko).is_empty());
    }

    #[test]
    fn test_blank_phrases_skipped() {
        let template = Template::new("t", "act", "c").with_phrases(Language::En, ["ok", "  "]);
        let catalog = TemplateCatalog::from_templates([template]);
        assert_eq!(catalog.get_all_flattened().len(), 1);
    }
}
