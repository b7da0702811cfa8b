//! Language model capability and locale helpers
//!
//! The `MachineTranslator` trait is the single seam between the translation
//! pipeline and a language model backend. A backend receives a fully built
//! question and instruction prompt and returns the raw model response; the
//! pipeline takes care of prompting, sanitizing and reassembly.
//!
//! # Example
//!
//! ```ignore
//! use localizer_mt::{ChatCompletionProvider, MachineTranslator, Provider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = ChatCompletionProvider::from_env(Provider::OpenAi)?;
//!     let answer = provider
//!         .translate("Text to translate:\n\"\"\"\nHello\n\"\"\"", "Translate from en to fr.")
//!         .await?;
//!     println!("{}", answer);
//!     Ok(())
//! }
//! ```

use crate::error::{MtError, MtResult};
use async_trait::async_trait;
use icu_locale::Locale;
use std::sync::Arc;

/// Generic trait for language model backends
///
/// Implementations may fail on transport or provider errors. Callers assume
/// that a fixed input produces an equivalent answer every time, which is what
/// makes caching translations meaningful.
#[async_trait]
pub trait MachineTranslator: Send + Sync {
    /// Ask the model to answer a question under an instruction prompt
    ///
    /// # Arguments
    ///
    /// * `question` - The user message, holding the text to translate
    /// * `system_prompt` - The instruction describing the translation task
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - The raw model response
    /// * `Err(MtError)` - If the backend could not produce a response
    async fn translate(&self, question: &str, system_prompt: &str) -> MtResult<String>;

    /// Name of the backend, used in logs
    fn provider_name(&self) -> &str;
}

#[async_trait]
impl<T: MachineTranslator + ?Sized> MachineTranslator for Arc<T> {
    async fn translate(&self, question: &str, system_prompt: &str) -> MtResult<String> {
        (**self).translate(question, system_prompt).await
    }

    fn provider_name(&self) -> &str {
        (**self).provider_name()
    }
}

/// Validate that a locale code is a well-formed BCP-47 tag
///
/// Underscores are accepted as separators (`pt_BR`).
///
/// # Returns
///
/// * `Ok(())` - If the locale parses
/// * `Err(MtError::InvalidLocale)` - If it is empty or malformed
pub fn validate_locale(locale: &str) -> MtResult<()> {
    parse_locale(locale).map(|_| ())
}

/// Canonical form of a locale code: `en_us` → `en-US`, `ZH-hant` → `zh-Hant`
///
/// Codes that do not parse are returned trimmed and otherwise untouched.
pub fn normalize_locale(locale: &str) -> String {
    parse_locale(locale)
        .map(|parsed| parsed.to_string())
        .unwrap_or_else(|_| locale.trim().to_string())
}

fn parse_locale(locale: &str) -> MtResult<Locale> {
    let trimmed = locale.trim();
    if trimmed.is_empty() {
        return Err(MtError::InvalidLocale("Locale code is empty".to_string()));
    }

    trimmed
        .replace('_', "-")
        .parse::<Locale>()
        .map_err(|e| MtError::InvalidLocale(format!("Failed to parse locale '{}': {}", locale, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_locale_valid_codes() {
        assert!(validate_locale("en").is_ok());
        assert!(validate_locale("en-US").is_ok());
        assert!(validate_locale("zh-Hans").is_ok());
        assert!(validate_locale("pt_BR").is_ok());
    }

    #[test]
    fn test_validate_locale_invalid_codes() {
        assert!(validate_locale("").is_err());
        assert!(validate_locale("   ").is_err());
        assert!(validate_locale("en@invalid").is_err());
        assert!(validate_locale("not a locale").is_err());
    }

    #[test]
    fn test_validate_locale_error_messages() {
        match validate_locale("fr#bad") {
            Err(MtError::InvalidLocale(msg)) => assert!(msg.contains("fr#bad")),
            other => panic!("Expected InvalidLocale error, got {:?}", other),
        }
    }

    #[test]
    fn test_normalize_locale_canonical_casing() {
        assert_eq!(normalize_locale("en_us"), "en-US");
        assert_eq!(normalize_locale("ZH-hant-tw"), "zh-Hant-TW");
        assert_eq!(normalize_locale("fr"), "fr");
    }

    #[test]
    fn test_normalize_locale_keeps_unparseable_codes() {
        assert_eq!(normalize_locale(" weird@code "), "weird@code");
    }
}
