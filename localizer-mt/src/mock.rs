//! Mock language model for testing
//!
//! This module provides a deterministic, network-free backend for exercising
//! the translation pipeline without API keys. It reads the fragment back out
//! of the question and the target locale out of the instruction prompt.
//!
//! # Example
//!
//! ```ignore
//! use localizer_mt::{MachineTranslator, MockMode, MockTranslator};
//! use localizer_mt::prompt::{question, system_prompt};
//! use localizer::FileKind;
//!
//! #[tokio::test]
//! async fn test_translation() {
//!     let mock = MockTranslator::new(MockMode::Suffix);
//!     let prompt = system_prompt(FileKind::Text, "en", "fr", None);
//!     let result = mock.translate(&question("hello"), &prompt).await.unwrap();
//!     assert_eq!(result, "hello_fr");
//! }
//! ```

use crate::error::{MtError, MtResult};
use crate::prompt::{fragment_of, target_of};
use crate::translator::MachineTranslator;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Mock translation modes for testing different scenarios
#[derive(Debug, Clone)]
pub enum MockMode {
    /// Return the fragment unchanged
    NoOp,

    /// Append the target locale to every line: "hello" → "hello_fr"
    Suffix,

    /// Predefined translations keyed by fragment text, falling back to
    /// `Suffix` behavior for unknown fragments
    Mappings(HashMap<String, String>),

    /// Return the fragment unchanged but dressed in the artifacts real
    /// models add: triple quotes, a label and a translator's note
    Wrapped,

    /// Fail every request with this message
    Error(String),

    /// Fail only the request whose fragment equals this text, `Suffix` otherwise
    FailOn(String),
}

/// Deterministic backend recording how often it was called
///
/// Clones share the call counter.
#[derive(Debug, Clone)]
pub struct MockTranslator {
    mode: MockMode,
    /// Simulated network delay
    delay: Duration,
    calls: Arc<AtomicUsize>,
}

impl MockTranslator {
    pub fn new(mode: MockMode) -> Self {
        Self {
            mode,
            delay: Duration::ZERO,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a MockTranslator with simulated network delay
    ///
    /// # Example
    ///
    /// ```ignore
    /// let mock = MockTranslator::with_delay(MockMode::Suffix, Duration::from_millis(50));
    /// ```
    pub fn with_delay(mode: MockMode, delay: Duration) -> Self {
        Self {
            delay,
            ..Self::new(mode)
        }
    }

    /// Number of requests received so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn suffixed(text: &str, target: &str) -> String {
        text.lines()
            .map(|line| {
                if line.trim().is_empty() {
                    line.to_string()
                } else {
                    format!("{}_{}", line, target)
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn apply_translation(&self, text: &str, target: &str) -> MtResult<String> {
        match &self.mode {
            MockMode::NoOp => Ok(text.to_string()),
            MockMode::Suffix => Ok(Self::suffixed(text, target)),
            MockMode::Mappings(map) => Ok(map
                .get(text)
                .cloned()
                .unwrap_or_else(|| Self::suffixed(text, target))),
            MockMode::Wrapped => Ok(format!(
                "\"\"\"\nTranslation: {} (Note: literal translation)\n\"\"\"",
                text
            )),
            MockMode::Error(msg) => Err(MtError::Translation(msg.clone())),
            MockMode::FailOn(failing) if failing == text => Err(MtError::Translation(format!(
                "simulated error for '{}'",
                text
            ))),
            MockMode::FailOn(_) => Ok(Self::suffixed(text, target)),
        }
    }
}

#[async_trait]
impl MachineTranslator for MockTranslator {
    async fn translate(&self, question: &str, system_prompt: &str) -> MtResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let target = target_of(system_prompt).unwrap_or("xx");
        self.apply_translation(fragment_of(question), target)
    }

    fn provider_name(&self) -> &str {
        "Mock Translator"
    }
}
