//! Action dispatch.
//!
//! A matched intent names an action. The [`ActionDispatcher`] looks the
//! action up in a frozen [`ActionRegistry`] and invokes it, extracting a
//! single parameter from the raw input text when the handler needs one.
//!
//! Parameter extraction runs these heuristics in order and takes the first
//! usable candidate:
//! 1. explicit `key: value` syntax
//! 2. verb + noun phrases ("add device Kitchen Lamp")
//! 3. quoted substrings
//! 4. known device brand names
//! 5. the trailing token
//!
//! A candidate is usable when it is longer than one character and holds at
//! least one word outside the command vocabulary ("device", "hinzufügen",
//! "추가" and so on).

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

use intent_types::Language;
use regex::Regex;
use tracing::{debug, info};

use crate::messages;

/// Handler taking no arguments; returns display text.
pub type ActionFn = Arc<dyn Fn() -> String + Send + Sync>;

/// Handler taking one extracted parameter; returns display text.
pub type ParamActionFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

#[derive(Clone)]
enum Handler {
    NoArg(ActionFn),
    WithParam { parameter: String, handler: ParamActionFn },
}

/// Frozen, name-keyed set of action handlers.
///
/// Built once with [`ActionRegistry::builder`]; there is no way to register
/// handlers afterwards.
#[derive(Clone, Default)]
pub struct ActionRegistry {
    handlers: HashMap<String, Handler>,
}

impl fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("actions", &self.names())
            .finish()
    }
}

impl ActionRegistry {
    pub fn builder() -> ActionRegistryBuilder {
        ActionRegistryBuilder::default()
    }

    /// Registry with no handlers; every action reports "not implemented".
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn contains(&self, action: &str) -> bool {
        self.handlers.contains_key(action)
    }

    /// Parameter name the action expects, if it takes one.
    pub fn parameter(&self, action: &str) -> Option<&str> {
        match self.handlers.get(action) {
            Some(Handler::WithParam { parameter, .. }) => Some(parameter),
            _ => None,
        }
    }

    /// Registered action names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Builder for [`ActionRegistry`]. Later registrations replace earlier ones.
#[derive(Default)]
pub struct ActionRegistryBuilder {
    handlers: HashMap<String, Handler>,
}

impl ActionRegistryBuilder {
    /// Register a handler that takes no arguments.
    pub fn action<F>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.handlers
            .insert(name.into(), Handler::NoArg(Arc::new(handler)));
        self
    }

    /// Register a handler that takes one parameter named `parameter`.
    pub fn action_with_param<F>(
        mut self,
        name: impl Into<String>,
        parameter: impl Into<String>,
        handler: F,
    ) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.handlers.insert(
            name.into(),
            Handler::WithParam {
                parameter: parameter.into(),
                handler: Arc::new(handler),
            },
        );
        self
    }

    pub fn build(self) -> ActionRegistry {
        info!(actions = self.handlers.len(), "Built action registry");
        ActionRegistry {
            handlers: self.handlers,
        }
    }
}

/// What happened when an action was dispatched.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchOutcome {
    /// Text to show the user
    pub response: String,
    /// Whether a handler actually ran
    pub executed: bool,
    /// Extracted parameter, for parameterized actions
    pub parameter: Option<String>,
}

impl DispatchOutcome {
    fn executed(response: String, parameter: Option<String>) -> Self {
        Self {
            response,
            executed: true,
            parameter,
        }
    }

    fn skipped(response: String) -> Self {
        Self {
            response,
            executed: false,
            parameter: None,
        }
    }
}

/// Routes matched actions to handlers.
#[derive(Debug, Clone)]
pub struct ActionDispatcher {
    registry: Arc<ActionRegistry>,
}

impl ActionDispatcher {
    pub fn new(registry: Arc<ActionRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    /// Invoke `action` for the raw input `text`.
    ///
    /// Never fails: unknown actions and missing parameters produce a
    /// localized response with `executed == false`.
    pub fn dispatch(&self, action: &str, text: &str, language: Language) -> DispatchOutcome {
        match self.registry.handlers.get(action) {
            None => {
                debug!(action = action, "No handler registered");
                DispatchOutcome::skipped(messages::not_implemented(language, action))
            }
            Some(Handler::NoArg(handler)) => {
                debug!(action = action, "Dispatching action");
                DispatchOutcome::executed(handler(), None)
            }
            Some(Handler::WithParam { parameter, handler }) => match extract_parameter(text) {
                Some(value) => {
                    debug!(action = action, parameter = %value, "Dispatching action");
                    let response = handler(&value);
                    DispatchOutcome::executed(response, Some(value))
                }
                None => {
                    debug!(action = action, "Parameter missing, prompting");
                    DispatchOutcome::skipped(messages::missing_parameter(language, parameter))
                }
            },
        }
    }
}

const KEY_VALUE: &str = r"[:：=]\s*(.+)$";

const VERB_NOUN: &[&str] = &[
    r"(?i)\b(?:add|connect|register|remove|delete|disconnect|unplug|check|agregar|añadir|eliminar|borrar|ajouter|supprimer|entferne|lösche|füge)\s+(?:(?:a|an|the|my|new|un|una|el|mi|nuevo|le|la|une|mon|nouvel|nouveau|das|ein|neues|mein)\s+)*(?:(?:device|dispositivo|appareil|gerät)\s+)(?:(?:called|named|llamado|nommé|namens)\s+)?(.+)$",
    r"(?i)\bstatus\s+of\s+(?:(?:the|my)\s+)?(.+)$",
    r"(?:添加|删除|移除|查看)(?:设备)?(.+)$",
    r"(?:デバイス)(.+?)(?:を)?(?:追加|削除)",
    r"(.+?)\s*(?:기기를?|장치를?)\s*(?:추가|삭제)",
];

const QUOTED: &str = r#"["“'「『«]\s*([^"”'」』»]+?)\s*["”'」』»]"#;

const BRAND: &str = r"(?i)\b((?:philips\s+hue|hue|nest|echo|alexa|sonos|roku|chromecast|xiaomi|tp-?link|kasa|ring|arlo|ecobee|wemo|lifx|samsung|homepod|apple\s+tv|fire\s+tv)\b(?:\s+[\p{L}\p{N}-]+)?)";

/// Command vocabulary of the device phrases in every supported language.
/// A candidate built only from these words names no device.
const GENERIC_WORDS: &[&str] = &[
    // en
    "device", "devices", "a", "an", "the", "new", "my", "it", "this", "that", "one", "please",
    "of", "add", "register", "unregister", "remove", "delete", "status", "check",
    // zh
    "设备", "添加", "新增", "删除", "移除", "查看", "状态",
    // ja
    "デバイス", "追加", "削除", "登録", "状態", "ステータス", "確認", "新しい", "を", "の",
    // ko
    "기기", "장치", "추가", "삭제", "제거", "등록", "상태", "확인", "새",
    // es
    "dispositivo", "dispositivos", "agregar", "añadir", "eliminar", "borrar", "estado", "nuevo",
    "un", "una", "el", "del",
    // fr
    "appareil", "appareils", "ajouter", "supprimer", "retirer", "état", "nouvel", "nouveau",
    "une", "le", "la", "l", "de",
    // de
    "gerät", "geräte", "geräts", "gerätestatus", "hinzufügen", "entfernen", "löschen", "neues",
    "des",
];

static KEY_VALUE_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(KEY_VALUE).ok());

static VERB_NOUN_RES: LazyLock<Vec<Regex>> =
    LazyLock::new(|| VERB_NOUN.iter().filter_map(|p| Regex::new(p).ok()).collect());

static QUOTED_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(QUOTED).ok());

static BRAND_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(BRAND).ok());

/// Whether `word` is command vocabulary.
///
/// Scripts written without spaces may run several entries together
/// ("设备状态"), so words without ASCII letters are also accepted when
/// they split entirely into entries.
fn is_vocabulary(word: &str) -> bool {
    let word = word.to_lowercase();
    if GENERIC_WORDS.contains(&word.as_str()) {
        return true;
    }
    !word.is_empty()
        && !word.chars().any(|c| c.is_ascii_alphabetic())
        && splits_into_vocabulary(&word)
}

fn splits_into_vocabulary(word: &str) -> bool {
    word.is_empty()
        || GENERIC_WORDS
            .iter()
            .any(|entry| word.strip_prefix(*entry).is_some_and(splits_into_vocabulary))
}

fn clean(candidate: &str) -> Option<String> {
    let trimmed = candidate
        .trim()
        .trim_matches(|c: char| c.is_ascii_punctuation() || "“”「」『』«»。？！，".contains(c))
        .trim();
    if trimmed.chars().count() <= 1 {
        return None;
    }
    // Elided articles ("l'appareil") split off like separate words
    let all_vocabulary = trimmed
        .split(|c: char| c.is_whitespace() || c == '\'' || c == '’')
        .filter(|word| !word.is_empty())
        .all(is_vocabulary);
    if all_vocabulary {
        return None;
    }
    Some(trimmed.to_string())
}

fn first_capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| clean(m.as_str()))
}

/// Pull a single parameter value out of free text, or `None`.
pub fn extract_parameter(text: &str) -> Option<String> {
    let text = text.trim();

    if let Some(value) = KEY_VALUE_RE.as_ref().and_then(|re| first_capture(re, text)) {
        return Some(value);
    }
    if let Some(value) = VERB_NOUN_RES.iter().find_map(|re| first_capture(re, text)) {
        return Some(value);
    }
    if let Some(value) = QUOTED_RE.as_ref().and_then(|re| first_capture(re, text)) {
        return Some(value);
    }
    if let Some(value) = BRAND_RE.as_ref().and_then(|re| first_capture(re, text)) {
        return Some(value);
    }

    // Trailing token only counts when something precedes it
    let tokens: Vec<&str> = text.split_whitespace().collect();
    match tokens.as_slice() {
        [_, .., last] => clean(last),
        _ => None,
    }
}
