//! Locale context resolution
//!
//! A locale context is free text steering the model, for example "labels of
//! a checkout page". Contexts come from the configuration's `localeContext`
//! map, keyed by file path. An entry is either a plain string applying to the
//! whole file, or a map from dotted key paths to contexts, where the reserved
//! `$fileContext` key holds the file-level fallback. Flat keys of the form
//! `<file>/<key path>` and `<file>/$fileContext` are understood as well.
//!
//! # Example
//!
//! ```ignore
//! use localizer_mt::context::{ContextMode, ContextResolver, FileContext, LocaleContexts};
//!
//! let contexts: LocaleContexts = serde_json::from_str(r#"{
//!     "locales/en.json": { "$fileContext": "Shop UI", "cart.title": "Page heading" }
//! }"#)?;
//! let resolver = FileContext::new(&contexts, "locales/en.json", ContextMode::Deep);
//! assert_eq!(resolver.context_for("cart.title").as_deref(), Some("Page heading"));
//! assert_eq!(resolver.file_context().as_deref(), Some("Shop UI"));
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Reserved key holding the file-level context of a deep entry
pub const FILE_CONTEXT_KEY: &str = "$fileContext";

/// How contexts are attached, mirroring `localeContextType`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContextMode {
    /// One context per file, applied to every fragment and leaf
    #[default]
    File,
    /// Per-key contexts with a file-level fallback
    Deep,
}

/// One `localeContext` entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContextEntry {
    Text(String),
    Keys(HashMap<String, String>),
}

/// The configuration's `localeContext` map
pub type LocaleContexts = HashMap<String, ContextEntry>;

/// Looks up the context of a leaf by its dotted key path
pub trait ContextResolver: Send + Sync {
    /// Context registered for exactly this key path
    fn context_for(&self, key_path: &str) -> Option<String>;

    /// Context applying to the whole file
    fn file_context(&self) -> Option<String>;

    /// Context of a leaf: its own, else the file's
    fn resolve(&self, key_path: &str) -> Option<String> {
        self.context_for(key_path)
            .filter(|c| !c.trim().is_empty())
            .or_else(|| self.file_context())
            .filter(|c| !c.trim().is_empty())
    }
}

/// Resolver that never returns a context
#[derive(Debug, Clone, Copy, Default)]
pub struct NoContext;

impl ContextResolver for NoContext {
    fn context_for(&self, _key_path: &str) -> Option<String> {
        None
    }

    fn file_context(&self) -> Option<String> {
        None
    }
}

/// Contexts of one file
#[derive(Debug, Clone, Default)]
pub struct FileContext {
    mode: ContextMode,
    file: Option<String>,
    keys: HashMap<String, String>,
}

impl FileContext {
    pub fn new(contexts: &LocaleContexts, file_path: &str, mode: ContextMode) -> Self {
        let file_path = file_path.trim_start_matches("./");
        let mut file = None;
        let mut keys = HashMap::new();

        match contexts.get(file_path) {
            Some(ContextEntry::Text(text)) => file = Some(text.clone()),
            Some(ContextEntry::Keys(map)) => {
                for (key, value) in map {
                    if key == FILE_CONTEXT_KEY {
                        file = Some(value.clone());
                    } else {
                        keys.insert(key.clone(), value.clone());
                    }
                }
            }
            None => {}
        }

        let prefix = format!("{}/", file_path);
        for (key, entry) in contexts {
            let (Some(key_path), ContextEntry::Text(text)) = (key.strip_prefix(&prefix), entry)
            else {
                continue;
            };
            if key_path == FILE_CONTEXT_KEY {
                file.get_or_insert_with(|| text.clone());
            } else {
                keys.entry(key_path.to_string()).or_insert_with(|| text.clone());
            }
        }

        Self { mode, file, keys }
    }

    /// Resolver carrying a single file-level context
    pub fn from_text(context: impl Into<String>) -> Self {
        Self {
            mode: ContextMode::File,
            file: Some(context.into()),
            keys: HashMap::new(),
        }
    }

    pub fn mode(&self) -> ContextMode {
        self.mode
    }
}

impl ContextResolver for FileContext {
    fn context_for(&self, key_path: &str) -> Option<String> {
        match self.mode {
            ContextMode::File => None,
            ContextMode::Deep => self.keys.get(key_path).cloned(),
        }
    }

    fn file_context(&self) -> Option<String> {
        self.file.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contexts(json: &str) -> LocaleContexts {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_plain_string_entry_is_file_context() {
        let contexts = contexts(r#"{ "docs/intro.md": "Onboarding guide" }"#);
        let resolver = FileContext::new(&contexts, "docs/intro.md", ContextMode::File);
        assert_eq!(resolver.file_context().as_deref(), Some("Onboarding guide"));
        assert_eq!(resolver.resolve("anything").as_deref(), Some("Onboarding guide"));
    }

    #[test]
    fn test_deep_entry_prefers_key_context() {
        let contexts = contexts(
            r#"{ "en.json": { "$fileContext": "Shop UI", "cart.title": "Page heading" } }"#,
        );
        let resolver = FileContext::new(&contexts, "en.json", ContextMode::Deep);
        assert_eq!(resolver.resolve("cart.title").as_deref(), Some("Page heading"));
        assert_eq!(resolver.resolve("cart.total").as_deref(), Some("Shop UI"));
    }

    #[test]
    fn test_file_mode_ignores_key_contexts() {
        let contexts = contexts(r#"{ "en.json": { "$fileContext": "Shop UI", "a": "A" } }"#);
        let resolver = FileContext::new(&contexts, "en.json", ContextMode::File);
        assert_eq!(resolver.resolve("a").as_deref(), Some("Shop UI"));
    }

    #[test]
    fn test_flat_path_keys() {
        let contexts = contexts(
            r#"{ "en.json/$fileContext": "Settings", "en.json/menu.0": "First menu entry" }"#,
        );
        let resolver = FileContext::new(&contexts, "./en.json", ContextMode::Deep);
        assert_eq!(resolver.resolve("menu.0").as_deref(), Some("First menu entry"));
        assert_eq!(resolver.resolve("menu.1").as_deref(), Some("Settings"));
    }

    #[test]
    fn test_blank_contexts_are_skipped() {
        let contexts = contexts(r#"{ "en.json": { "$fileContext": "UI", "a": "  " } }"#);
        let resolver = FileContext::new(&contexts, "en.json", ContextMode::Deep);
        assert_eq!(resolver.resolve("a").as_deref(), Some("UI"));
    }

    #[test]
    fn test_unknown_file_and_no_context() {
        let resolver = FileContext::new(&LocaleContexts::new(), "missing.md", ContextMode::Deep);
        assert_eq!(resolver.resolve("x"), None);
        assert_eq!(NoContext.resolve("x"), None);
    }

    #[test]
    fn test_context_mode_serde() {
        let mode: ContextMode = serde_json::from_str("\"deep\"").unwrap();
        assert_eq!(mode, ContextMode::Deep);
    }
}
