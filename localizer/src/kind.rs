//! Content and file kinds
//!
//! `ContentKind` decides how flat content is segmented and cleaned up.
//! `FileKind` is what the file layer sees: it is derived from the path's
//! extension and additionally covers JSON locale files, whose string leaves
//! are translated one by one as plain text.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// How a piece of flat content is segmented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContentKind {
    /// Blank-line delimited paragraphs
    PlainText,
    /// Markdown, segmented by the ordered recognizer set
    Markdown,
}

/// Kind of a file as detected from its extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FileKind {
    Text,
    Markdown,
    Json,
}

impl FileKind {
    /// Detect the file kind from a path's extension
    ///
    /// Unknown or missing extensions fall back to `Text`.
    ///
    /// # Example
    ///
    /// ```
    /// use localizer::FileKind;
    ///
    /// assert_eq!(FileKind::from_path("docs/intro.md"), FileKind::Markdown);
    /// assert_eq!(FileKind::from_path("locales/en.json"), FileKind::Json);
    /// assert_eq!(FileKind::from_path("README"), FileKind::Text);
    /// ```
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let extension = path
            .as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("md") | Some("markdown") | Some("mdx") => FileKind::Markdown,
            Some("json") => FileKind::Json,
            _ => FileKind::Text,
        }
    }

    /// Short label used in the model instruction
    pub fn label(self) -> &'static str {
        match self {
            FileKind::Text => "txt",
            FileKind::Markdown => "md",
            FileKind::Json => "json",
        }
    }

    /// Content kind used when segmenting a file of this kind.
    ///
    /// JSON leaves are plain strings, so they segment as plain text.
    pub fn content_kind(self) -> ContentKind {
        match self {
            FileKind::Markdown => ContentKind::Markdown,
            FileKind::Text | FileKind::Json => ContentKind::PlainText,
        }
    }
}

impl From<ContentKind> for FileKind {
    fn from(kind: ContentKind) -> Self {
        match kind {
            ContentKind::PlainText => FileKind::Text,
            ContentKind::Markdown => FileKind::Markdown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_markdown_variants() {
        assert_eq!(FileKind::from_path("a.md"), FileKind::Markdown);
        assert_eq!(FileKind::from_path("a.MD"), FileKind::Markdown);
        assert_eq!(FileKind::from_path("a.markdown"), FileKind::Markdown);
        assert_eq!(FileKind::from_path("a.mdx"), FileKind::Markdown);
    }

    #[test]
    fn test_unknown_extension_is_text() {
        assert_eq!(FileKind::from_path("notes.txt"), FileKind::Text);
        assert_eq!(FileKind::from_path("notes.yaml"), FileKind::Text);
        assert_eq!(FileKind::from_path("Makefile"), FileKind::Text);
    }

    #[test]
    fn test_json_leaves_are_plain_text() {
        assert_eq!(FileKind::Json.content_kind(), ContentKind::PlainText);
        assert_eq!(FileKind::Markdown.content_kind(), ContentKind::Markdown);
        assert_eq!(FileKind::Json.label(), "json");
    }
}
