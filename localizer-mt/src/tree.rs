//! JSON locale tree translation
//!
//! String leaves are collected with their dotted key path (`menu.items.0`),
//! identical strings are translated once per call, and the tree is rebuilt
//! with the same shape and key order. Numbers, booleans, null and blank strings are
//! copied unchanged. A leaf whose translation fails keeps its original value.

use crate::context::ContextResolver;
use crate::orchestrator::Translator;
use futures::future::join_all;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// One string leaf and where it sits in the tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaf<'v> {
    pub path: String,
    pub text: &'v str,
}

/// Every translatable string leaf in document order
pub fn leaves(value: &Value) -> Vec<Leaf<'_>> {
    let mut found = Vec::new();
    collect(value, String::new(), &mut found);
    found
}

fn collect<'v>(value: &'v Value, path: String, found: &mut Vec<Leaf<'v>>) {
    match value {
        Value::String(text) if !text.trim().is_empty() => found.push(Leaf { path, text }),
        Value::Object(map) => {
            for (key, child) in map {
                collect(child, join_path(&path, key), found);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                collect(child, join_path(&path, &index.to_string()), found);
            }
        }
        _ => {}
    }
}

fn join_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

/// Copy of `value` with every translated string replaced
fn rebuild(value: &Value, translations: &HashMap<&str, String>) -> Value {
    match value {
        Value::String(text) => Value::String(
            translations
                .get(text.as_str())
                .cloned()
                .unwrap_or_else(|| text.clone()),
        ),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, child)| (key.clone(), rebuild(child, translations)))
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => {
            Value::Array(items.iter().map(|child| rebuild(child, translations)).collect())
        }
        other => other.clone(),
    }
}

/// Translates the leaves of one tree into one locale
pub(crate) struct TreeTranslator<'a> {
    translator: &'a Translator,
    from: &'a str,
    to: &'a str,
    resolver: &'a dyn ContextResolver,
}

impl<'a> TreeTranslator<'a> {
    pub(crate) fn new(
        translator: &'a Translator,
        from: &'a str,
        to: &'a str,
        resolver: &'a dyn ContextResolver,
    ) -> Self {
        Self {
            translator,
            from,
            to,
            resolver,
        }
    }

    pub(crate) async fn translate(&self, value: &Value) -> Value {
        let found = leaves(value);

        // Memoized by text; the first occurrence decides the context.
        let mut seen: HashSet<&str> = HashSet::new();
        let unique: Vec<&Leaf<'_>> = found.iter().filter(|leaf| seen.insert(leaf.text)).collect();
        debug!(
            "Translating {} string leaves ({} distinct) into {}",
            found.len(),
            unique.len(),
            self.to
        );

        let translated = join_all(unique.into_iter().map(|leaf| self.translate_leaf(leaf))).await;
        let translations: HashMap<&str, String> = translated.into_iter().flatten().collect();

        rebuild(value, &translations)
    }

    async fn translate_leaf<'v>(&self, leaf: &Leaf<'v>) -> Option<(&'v str, String)> {
        let context = self.resolver.resolve(&leaf.path);
        match self
            .translator
            .translate_leaf(leaf.text, self.from, self.to, context.as_deref())
            .await
        {
            Ok(translated) => Some((leaf.text, translated)),
            Err(e) => {
                warn!(
                    "Keeping original value of '{}' ({} -> {}): {}",
                    leaf.path, self.from, self.to, e
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ContextMode, FileContext, LocaleContexts, NoContext};
    use crate::mock::{MockMode, MockTranslator};
    use crate::orchestrator::DispatchPolicy;
    use serde_json::json;
    use std::sync::Arc;

    fn translator(mode: MockMode) -> (Translator, MockTranslator) {
        let mock = MockTranslator::new(mode);
        let translator = Translator::new(Arc::new(mock.clone()), DispatchPolicy::Parallel);
        (translator, mock)
    }

    // ===== Path Tests =====

    #[test]
    fn test_leaf_paths_use_dots_and_indices() {
        let value = json!({ "a": { "b": "x" }, "c": ["y", 3, { "d": "z" }], "e": "  " });
        let paths: Vec<String> = leaves(&value).into_iter().map(|l| l.path).collect();
        assert_eq!(paths, vec!["a.b", "c.0", "c.2.d"]);
    }

    // ===== Translation Tests =====

    #[tokio::test]
    async fn test_identical_strings_are_translated_once() {
        let (translator, mock) = translator(MockMode::Suffix);
        let value = json!({ "a": { "b": "hello" }, "c": ["hello"] });
        let output = translator.translate_tree(&value, "en", "fr", &NoContext).await;
        assert_eq!(output, json!({ "a": { "b": "hello_fr" }, "c": ["hello_fr"] }));
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_each_locale_translates_on_its_own() {
        let (translator, mock) = translator(MockMode::Suffix);
        let value = json!({ "greeting": "hello", "again": "hello" });
        let french = translator.translate_tree(&value, "en", "fr", &NoContext).await;
        let german = translator.translate_tree(&value, "en", "de", &NoContext).await;
        assert_eq!(french, json!({ "greeting": "hello_fr", "again": "hello_fr" }));
        assert_eq!(german, json!({ "greeting": "hello_de", "again": "hello_de" }));
        assert_eq!(mock.calls(), 2);
    }

    #[tokio::test]
    async fn test_failed_leaf_keeps_original_value() {
        let (translator, _) = translator(MockMode::FailOn("broken".to_string()));
        let value = json!({ "ok": "fine", "bad": "broken" });
        let output = translator.translate_tree(&value, "en", "fr", &NoContext).await;
        assert_eq!(output, json!({ "ok": "fine_fr", "bad": "broken" }));
    }

    #[tokio::test]
    async fn test_non_string_values_pass_through() {
        let (translator, mock) = translator(MockMode::Suffix);
        let value = json!({ "n": 1.5, "t": true, "z": null, "blank": " ", "list": [] });
        let output = translator.translate_tree(&value, "en", "fr", &NoContext).await;
        assert_eq!(output, value);
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn test_key_order_is_preserved() {
        let (translator, _) = translator(MockMode::Suffix);
        let value: Value = serde_json::from_str(r#"{"zeta":"z","alpha":"a","mid":"m"}"#).unwrap();
        let output = translator.translate_tree(&value, "en", "fr", &NoContext).await;
        let keys: Vec<&String> = output.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[tokio::test]
    async fn test_multi_paragraph_leaf_keeps_its_breaks() {
        let (translator, _) = translator(MockMode::Suffix);
        let value = json!({ "body": "First.\n\nSecond." });
        let output = translator.translate_tree(&value, "en", "fr", &NoContext).await;
        assert_eq!(output, json!({ "body": "First._fr\n\nSecond._fr" }));
    }

    /// Records every instruction prompt it receives
    #[derive(Default)]
    struct PromptRecorder {
        prompts: std::sync::Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl crate::translator::MachineTranslator for PromptRecorder {
        async fn translate(&self, question: &str, system_prompt: &str) -> crate::error::MtResult<String> {
            self.prompts.lock().unwrap().push(system_prompt.to_string());
            Ok(crate::prompt::fragment_of(question).to_string())
        }

        fn provider_name(&self) -> &str {
            "Prompt Recorder"
        }
    }

    #[tokio::test]
    async fn test_deep_context_reaches_the_model() {
        let contexts: LocaleContexts = serde_json::from_str(
            r#"{ "en.json": { "$fileContext": "Shop UI", "title": "Page heading" } }"#,
        )
        .unwrap();
        let resolver = FileContext::new(&contexts, "en.json", ContextMode::Deep);
        let recorder = Arc::new(PromptRecorder::default());
        let translator = Translator::new(recorder.clone(), DispatchPolicy::Parallel);

        translator
            .translate_tree(&json!({ "title": "Home", "cta": "Buy" }), "en", "fr", &resolver)
            .await;

        let prompts = recorder.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 2);
        assert!(prompts.iter().any(|p| p.contains("\"\"\"\nPage heading\n\"\"\"")));
        assert!(prompts.iter().any(|p| p.contains("\"\"\"\nShop UI\n\"\"\"")));
    }

    #[tokio::test]
    async fn test_leaves_are_prompted_as_plain_text() {
        let recorder = Arc::new(PromptRecorder::default());
        let translator = Translator::new(recorder.clone(), DispatchPolicy::Parallel);

        translator
            .translate_tree(&json!({ "title": "Home" }), "en", "fr", &NoContext)
            .await;

        let prompts = recorder.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("from a txt file"));
        assert!(!prompts[0].contains("json file"));
    }

    #[tokio::test]
    async fn test_many_repeated_leaves_keep_first_occurrence_order() {
        let mock = MockTranslator::new(MockMode::Suffix);
        let translator = Translator::new(Arc::new(mock.clone()), DispatchPolicy::Parallel);
        let items: Vec<Value> = (0..500).map(|i| json!(format!("item {}", i % 50))).collect();

        let output = translator
            .translate_tree(&json!({ "items": items }), "en", "de", &NoContext)
            .await;

        assert_eq!(mock.calls(), 50);
        assert_eq!(output["items"][0], "item 0_de");
        assert_eq!(output["items"][499], "item 49_de");
    }
}
