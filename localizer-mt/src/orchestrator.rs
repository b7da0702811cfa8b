//! Translation orchestrator
//!
//! The orchestrator drives one translation end to end: it segments the
//! content, builds a prompt per fragment, sends the fragments to the model
//! (all at once, or one by one through the rate-limited queue), sanitizes
//! every answer and reassembles the document. Results are written back by
//! fragment position, so the dispatch policy only changes timing, never the
//! order of the output.
//!
//! # Example
//!
//! ```ignore
//! use localizer::FileKind;
//! use localizer_mt::{DispatchPolicy, MockMode, MockTranslator, Translator};
//! use std::sync::Arc;
//!
//! let translator = Translator::new(
//!     Arc::new(MockTranslator::new(MockMode::Suffix)),
//!     DispatchPolicy::Parallel,
//! );
//! let output = translator
//!     .segment_and_translate("# Hello", FileKind::Markdown, "en", "fr", None)
//!     .await?;
//! assert_eq!(output, "# Hello_fr");
//! ```

use crate::context::ContextResolver;
use crate::error::{MtError, MtResult};
use crate::prompt::{question, system_prompt};
use crate::queue::RequestQueue;
use crate::translator::{MachineTranslator, validate_locale};
use crate::tree::TreeTranslator;
use futures::future::join_all;
use localizer::{ContentKind, FileKind, Fragment, reconstruct, sanitize, segment};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// How fragment requests reach the model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchPolicy {
    /// Every request is sent at once; the backend handles its own limits
    Parallel,
    /// Requests go through a FIFO queue, one at a time, `min_spacing` apart
    Queued { min_spacing: Duration },
}

impl Default for DispatchPolicy {
    fn default() -> Self {
        DispatchPolicy::Queued {
            min_spacing: crate::queue::DEFAULT_MIN_SPACING,
        }
    }
}

/// Translates flat content, JSON trees and whole files through one model
pub struct Translator {
    model: Arc<dyn MachineTranslator>,
    policy: DispatchPolicy,
    queue: Option<RequestQueue<String>>,
}

impl Translator {
    pub fn new(model: Arc<dyn MachineTranslator>, policy: DispatchPolicy) -> Self {
        let queue = match policy {
            DispatchPolicy::Parallel => None,
            DispatchPolicy::Queued { min_spacing } => Some(RequestQueue::new(min_spacing)),
        };
        Self {
            model,
            policy,
            queue,
        }
    }

    pub fn policy(&self) -> DispatchPolicy {
        self.policy
    }

    pub fn provider_name(&self) -> &str {
        self.model.provider_name()
    }

    /// Send one request according to the dispatch policy
    async fn dispatch(&self, question: String, system_prompt: String) -> MtResult<String> {
        match &self.queue {
            None => self.model.translate(&question, &system_prompt).await,
            Some(queue) => {
                let model = Arc::clone(&self.model);
                queue
                    .enqueue(async move { model.translate(&question, &system_prompt).await })
                    .await
            }
        }
    }

    /// Translate one fragment and clean up the answer
    async fn translate_fragment(
        &self,
        fragment: &Fragment,
        file_kind: FileKind,
        from: &str,
        to: &str,
        context: Option<&str>,
    ) -> MtResult<String> {
        if fragment.descriptor.is_passthrough() {
            return Ok(fragment.text.clone());
        }

        debug!(
            "Dispatching {} fragment {} to {} ({} -> {})",
            fragment.kind(),
            fragment.position + 1,
            self.model.provider_name(),
            from,
            to
        );

        let raw = self
            .dispatch(
                question(&fragment.text),
                system_prompt(file_kind, from, to, context),
            )
            .await?;

        Ok(sanitize(&raw, &fragment.text, file_kind.content_kind()))
    }

    /// Translate flat content, keeping its formatting
    ///
    /// A fragment whose translation fails keeps its original text; the
    /// failure is logged and the rest of the document is still translated.
    ///
    /// # Arguments
    ///
    /// * `content` - Text or Markdown content
    /// * `file_kind` - Decides segmentation and the file type named in the prompt
    /// * `from` - Source locale
    /// * `to` - Target locale
    /// * `context` - Optional context steering the model
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - The translated content; empty content stays empty
    /// * `Err(MtError)` - For an invalid locale or a reconstruction defect
    pub async fn segment_and_translate(
        &self,
        content: &str,
        file_kind: FileKind,
        from: &str,
        to: &str,
        context: Option<&str>,
    ) -> MtResult<String> {
        validate_locale(from)?;
        validate_locale(to)?;

        let segmented = segment(content, file_kind.content_kind());
        if segmented.is_empty() {
            return Ok(content.to_string());
        }

        let translated = join_all(segmented.fragments.iter().map(|fragment| async move {
            match self
                .translate_fragment(fragment, file_kind, from, to, context)
                .await
            {
                Ok(text) => text,
                Err(e) => {
                    warn!(
                        "Translation failed for {} fragment {} ({} -> {}): {}",
                        fragment.kind(),
                        fragment.position + 1,
                        from,
                        to,
                        e
                    );
                    fragment.text.clone()
                }
            }
        }))
        .await;

        Ok(reconstruct(
            &segmented.template,
            &translated,
            &segmented.fragments,
        )?)
    }

    /// Translate one JSON leaf string
    ///
    /// Unlike [`Translator::segment_and_translate`], any failed fragment fails
    /// the whole leaf, so the caller can keep the original value. The leaf is
    /// judged only once every fragment has answered, so no request is left
    /// running in the queue after this returns. Leaves are prompted as
    /// plain text.
    pub async fn translate_leaf(
        &self,
        text: &str,
        from: &str,
        to: &str,
        context: Option<&str>,
    ) -> MtResult<String> {
        let segmented = segment(text, ContentKind::PlainText);
        if segmented.is_empty() {
            return Ok(text.to_string());
        }

        let translated = join_all(
            segmented
                .fragments
                .iter()
                .map(|fragment| self.translate_fragment(fragment, FileKind::Text, from, to, context)),
        )
        .await
        .into_iter()
        .collect::<MtResult<Vec<_>>>()?;

        Ok(reconstruct(
            &segmented.template,
            &translated,
            &segmented.fragments,
        )?)
    }

    /// Translate every string leaf of a JSON value
    ///
    /// Identical strings are translated once per call. Failed leaves keep
    /// their original value.
    pub async fn translate_tree(
        &self,
        value: &Value,
        from: &str,
        to: &str,
        resolver: &dyn ContextResolver,
    ) -> Value {
        TreeTranslator::new(self, from, to, resolver)
            .translate(value)
            .await
    }

    /// Translate the content of one file into one locale
    ///
    /// The file kind comes from the path's extension. JSON files are parsed,
    /// translated leaf by leaf and pretty-printed with two-space indentation;
    /// other files are translated as flat content under the file's context.
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - The translated file content
    /// * `Err(MtError)` - For an invalid locale, or JSON that cannot be parsed,
    ///   is not an object or array, or cannot be re-encoded
    pub async fn translate_file(
        &self,
        path: &str,
        content: &str,
        from: &str,
        to: &str,
        resolver: &dyn ContextResolver,
    ) -> MtResult<String> {
        validate_locale(from)?;
        validate_locale(to)?;

        match FileKind::from_path(path) {
            FileKind::Json => {
                let value: Value = serde_json::from_str(content)?;
                if !(value.is_object() || value.is_array()) {
                    return Err(MtError::Serialization(format!(
                        "{} must hold a JSON object or array",
                        path
                    )));
                }
                let translated = self.translate_tree(&value, from, to, resolver).await;
                Ok(serde_json::to_string_pretty(&translated)?)
            }
            kind => {
                let context = resolver.file_context();
                self.segment_and_translate(content, kind, from, to, context.as_deref())
                    .await
            }
        }
    }

    /// Translate one file into several locales concurrently
    ///
    /// Every locale succeeds or fails on its own.
    ///
    /// # Returns
    ///
    /// One `(locale, result)` pair per requested locale, in request order.
    pub async fn translate_locales(
        &self,
        path: &str,
        content: &str,
        from: &str,
        locales: &[String],
        resolver: &dyn ContextResolver,
    ) -> Vec<(String, MtResult<String>)> {
        join_all(locales.iter().map(|to| async move {
            let result = self.translate_file(path, content, from, to, resolver).await;
            if let Err(e) = &result {
                error!("Failed to translate {} into {}: {}", path, to, e);
            }
            (to.clone(), result)
        }))
        .await
    }
}
