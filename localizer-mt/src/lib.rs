//! LLM-backed translation for localizer
//!
//! This crate sends the fragments produced by `localizer` to a language model
//! and reassembles the answers, for flat text and Markdown as well as JSON
//! locale files.
//!
//! # Workflow Example
//!
//! ```ignore
//! use localizer_mt::{LocalizerConfig, Translator};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // 1. Load and check the project configuration
//!     let config = LocalizerConfig::load("localizer-ai.config.json")?;
//!     config.validate()?;
//!
//!     // 2. Build the provider and pick the dispatch policy
//!     let translator = Translator::new(Arc::new(config.provider()?), config.dispatch_policy());
//!
//!     // 3. Translate one file into every configured locale
//!     let path = "docs/intro.md";
//!     let content = std::fs::read_to_string(path)?;
//!     let context = config.file_context(path);
//!     for (locale, result) in translator
//!         .translate_locales(path, &content, &config.from, &config.locales, &context)
//!         .await
//!     {
//!         println!("{}: {}", locale, result?);
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod mock;
pub mod openai;
pub mod orchestrator;
pub mod prompt;
pub mod queue;
pub mod translator;
pub mod tree;


// Re-export main types for convenient access
pub use config::{DEFAULT_CONFIG_FILE, LocalizerConfig};
pub use context::{ContextEntry, ContextMode, ContextResolver, FileContext, LocaleContexts, NoContext};
pub use error::{MtError, MtResult};
pub use mock::{MockMode, MockTranslator};
pub use openai::{ChatCompletionProvider, Provider};
pub use orchestrator::{DispatchPolicy, Translator};
pub use queue::{DEFAULT_MIN_SPACING, QueueState, RequestQueue};
pub use translator::{MachineTranslator, normalize_locale, validate_locale};
pub use tree::{Leaf, leaves};
