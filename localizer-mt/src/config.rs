//! Project configuration
//!
//! Loads `localizer-ai.config.json`. The configuration is an ordinary value
//! handed to the provider, queue and orchestrator constructors; nothing is
//! cached globally.
//!
//! ```json
//! {
//!   "source": "docs",
//!   "fileTypes": [".md", ".json"],
//!   "locales": ["fr", "de"],
//!   "from": "en",
//!   "destination": "out",
//!   "localeContextType": "deep",
//!   "localeContext": { "docs/en.json": { "$fileContext": "Shop UI" } },
//!   "aiServiceProvider": "mistralAI",
//!   "llmConfig": { "temperature": 0.2 },
//!   "requestSpacingMs": 1500,
//!   "parallel": false
//! }
//! ```

use crate::context::{ContextMode, FileContext, LocaleContexts};
use crate::error::{MtError, MtResult};
use crate::openai::{ChatCompletionProvider, Provider};
use crate::orchestrator::DispatchPolicy;
use crate::queue::DEFAULT_MIN_SPACING;
use crate::translator::validate_locale;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File name looked up when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "localizer-ai.config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LocalizerConfig {
    /// Directory (or file) holding the source-locale content
    pub source: String,
    /// Extensions to translate, such as `.md` or `json`
    pub file_types: Vec<String>,
    /// Target locales
    pub locales: Vec<String>,
    /// Source locale
    pub from: String,
    /// Output root; translated files go to `<destination>/<locale>`
    pub destination: Option<String>,
    pub locale_context_type: ContextMode,
    pub locale_context: LocaleContexts,
    pub ai_service_provider: Provider,
    /// Extra chat completion fields merged into every request
    pub llm_config: Map<String, Value>,
    /// Minimum spacing between queued requests
    pub request_spacing_ms: Option<u64>,
    /// Send requests all at once instead of through the queue
    pub parallel: bool,
}

impl Default for LocalizerConfig {
    fn default() -> Self {
        Self {
            source: String::new(),
            file_types: Vec::new(),
            locales: Vec::new(),
            from: "en".to_string(),
            destination: None,
            locale_context_type: ContextMode::default(),
            locale_context: LocaleContexts::new(),
            ai_service_provider: Provider::default(),
            llm_config: Map::new(),
            request_spacing_ms: None,
            parallel: false,
        }
    }
}

impl LocalizerConfig {
    /// Read and parse a configuration file
    ///
    /// The result is not validated; call [`LocalizerConfig::validate`].
    pub fn load(path: impl AsRef<Path>) -> MtResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            MtError::Config(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> MtResult<Self> {
        serde_json::from_str(content)
            .map_err(|e| MtError::Config(format!("Invalid configuration: {}", e)))
    }

    /// Check that the configuration can drive a translation run
    pub fn validate(&self) -> MtResult<()> {
        if self.source.trim().is_empty() {
            return Err(MtError::Config("source is required".to_string()));
        }
        if self.file_types.is_empty() {
            return Err(MtError::Config(
                "fileTypes must list at least one file type".to_string(),
            ));
        }
        if self.locales.is_empty() {
            return Err(MtError::Config(
                "locales must list at least one locale".to_string(),
            ));
        }

        validate_locale(&self.from)?;
        for locale in &self.locales {
            validate_locale(locale)?;
        }

        Ok(())
    }

    pub fn min_spacing(&self) -> Duration {
        self.request_spacing_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_MIN_SPACING)
    }

    pub fn dispatch_policy(&self) -> DispatchPolicy {
        if self.parallel {
            DispatchPolicy::Parallel
        } else {
            DispatchPolicy::Queued {
                min_spacing: self.min_spacing(),
            }
        }
    }

    /// Whether a file's extension is one of `fileTypes`
    pub fn accepts(&self, path: &str) -> bool {
        self.file_types
            .iter()
            .any(|file_type| path.ends_with(file_type.as_str()))
    }

    /// Contexts applying to one source file
    pub fn file_context(&self, path: &str) -> FileContext {
        FileContext::new(&self.locale_context, path, self.locale_context_type)
    }

    /// Directory receiving the files of one locale
    pub fn locale_dir(&self, locale: &str) -> PathBuf {
        match self.destination.as_deref().filter(|d| !d.trim().is_empty()) {
            Some(destination) => Path::new(destination).join(locale),
            None => PathBuf::from(locale),
        }
    }

    /// Build the configured provider, keyed from the environment
    pub fn provider(&self) -> MtResult<ChatCompletionProvider> {
        Ok(ChatCompletionProvider::from_env(self.ai_service_provider)?
            .with_options(self.llm_config.clone()))
    }
}
