//! Cleanup of raw model responses
//!
//! Language models wrap their answers in quotes, prepend labels, add notes
//! about their own translation and sometimes rewrite links. The sanitizer
//! removes those artifacts before the response is reconstructed. It never
//! fails: an empty response yields the original fragment text.
//!
//! # Example
//!
//! ```
//! use localizer::{sanitize, ContentKind};
//!
//! let cleaned = sanitize("\"\"\"Bonjour\"\"\"", "Hello", ContentKind::PlainText);
//! assert_eq!(cleaned, "Bonjour");
//! ```

use crate::kind::ContentKind;
use crate::patterns::leading_whitespace;
use regex::Regex;
use std::sync::LazyLock;

const TRIPLE_QUOTES: [&str; 4] = ["\"\"\"", "'''", "\u{201c}\u{201c}\u{201c}", "\u{201d}\u{201d}\u{201d}"];

const QUOTE_PAIRS: [(char, char); 5] = [
    ('"', '"'),
    ('\'', '\''),
    ('\u{201c}', '\u{201d}'),
    ('\u{2018}', '\u{2019}'),
    ('\u{ab}', '\u{bb}'),
];

static LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*(?:translated text|translation)\s*:\s*").unwrap());
static ANNOTATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[\[(]\s*(?:note|translation|translator'?s note)\s*:[^\])]*[\])]").unwrap()
});
static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]{2,}").unwrap());
static DOUBLE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([ \t]*)(?:[-*+]|\d+\.)[ \t]+[-*+][ \t]+([^\s*+-])").unwrap()
});
static STAR_BULLET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([ \t]*)[*+][ \t]+(\S)").unwrap());
static URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s<>"'()\[\]]+"#).unwrap());

/// Remove model artifacts from a raw response
///
/// # Arguments
///
/// * `raw` - The response as returned by the model
/// * `original` - The fragment text that was sent for translation
/// * `kind` - Content kind of the fragment
///
/// # Returns
///
/// The cleaned translation, or `original` when the response is empty.
pub fn sanitize(raw: &str, original: &str, kind: ContentKind) -> String {
    if raw.trim().is_empty() {
        return original.to_string();
    }

    let text = raw.replace("\r\n", "\n");
    let text = strip_triple_quotes(&text);
    let text = unwrap_code_fence(&text, original);
    let text = strip_label(&text, original);
    let text = strip_annotations(&text, original);
    let text = strip_quote_wrapping(&text, original);
    let text = normalize_whitespace(&text, kind);
    let text = match kind {
        ContentKind::Markdown => fix_list_markers(&text),
        ContentKind::PlainText => straighten_quotes(&text),
    };
    let text = restore_urls(&text, original);

    let text = text.trim();
    if text.is_empty() {
        original.to_string()
    } else {
        text.to_string()
    }
}

fn strip_triple_quotes(text: &str) -> String {
    let kept: Vec<&str> = text
        .lines()
        .filter(|line| !TRIPLE_QUOTES.contains(&line.trim()))
        .collect();
    let mut text = kept.join("\n").trim().to_string();

    for quote in TRIPLE_QUOTES {
        if let Some(rest) = text.strip_prefix(quote) {
            text = rest.to_string();
        }
        if let Some(rest) = text.strip_suffix(quote) {
            text = rest.to_string();
        }
    }
    text
}

/// Drop a code fence the model put around a fragment that had none
fn unwrap_code_fence(text: &str, original: &str) -> String {
    let trimmed = text.trim();
    if original.trim_start().starts_with("```") || !trimmed.starts_with("```") {
        return text.to_string();
    }

    let lines: Vec<&str> = trimmed.lines().collect();
    if lines.len() < 2 || lines[lines.len() - 1].trim() != "```" {
        return text.to_string();
    }
    lines[1..lines.len() - 1].join("\n")
}

fn strip_label(text: &str, original: &str) -> String {
    if LABEL.is_match(original) {
        return text.to_string();
    }
    LABEL.replace(text, "").into_owned()
}

fn strip_annotations(text: &str, original: &str) -> String {
    ANNOTATION
        .replace_all(text, |caps: &regex::Captures| {
            let annotation = &caps[0];
            if original.contains(annotation) {
                annotation.to_string()
            } else {
                String::new()
            }
        })
        .into_owned()
}

/// Remove one pair of quotes around the whole response, unless the original
/// was quoted the same way
fn strip_quote_wrapping(text: &str, original: &str) -> String {
    let trimmed = text.trim();
    let original = original.trim();

    for (open, close) in QUOTE_PAIRS {
        let wrapped = |s: &str| s.chars().count() >= 2 && s.starts_with(open) && s.ends_with(close);
        if !wrapped(trimmed) || wrapped(original) {
            continue;
        }
        let inner = &trimmed[open.len_utf8()..trimmed.len() - close.len_utf8()];
        if !inner.contains(open) && !inner.contains(close) {
            return inner.to_string();
        }
    }
    text.to_string()
}

/// Collapse runs of blanks inside each line, keeping leading indentation.
/// Fenced regions of Markdown are left untouched.
fn normalize_whitespace(text: &str, kind: ContentKind) -> String {
    let mut in_fence = false;
    text.lines()
        .map(|line| {
            let is_fence = line.trim_start().starts_with("```");
            if kind == ContentKind::Markdown && (in_fence || is_fence) {
                if is_fence {
                    in_fence = !in_fence;
                }
                return line.trim_end().to_string();
            }
            let indent = leading_whitespace(line);
            let rest = WHITESPACE_RUN.replace_all(&line[indent.len()..], " ");
            format!("{}{}", indent, rest.trim_end())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn fix_list_markers(text: &str) -> String {
    let mut in_fence = false;
    text.lines()
        .map(|line| {
            if line.trim_start().starts_with("```") {
                in_fence = !in_fence;
                return line.to_string();
            }
            if in_fence || is_thematic_break(line) {
                return line.to_string();
            }
            let line = DOUBLE_MARKER.replace(line, "$1- $2");
            STAR_BULLET.replace(&line, "$1- $2").into_owned()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_thematic_break(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty() && trimmed.chars().all(|c| matches!(c, '-' | '*' | '_' | '+' | ' '))
}

fn straighten_quotes(text: &str) -> String {
    text.replace(['\u{201c}', '\u{201d}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'")
}

/// Put back links the model rewrote
///
/// Links are paired by order of appearance, and only when the response holds
/// as many links as the original. A response link that already appears
/// verbatim in the original is left alone.
fn restore_urls(text: &str, original: &str) -> String {
    let originals: Vec<&str> = URL.find_iter(original).map(|m| m.as_str()).collect();
    let found: Vec<regex::Match> = URL.find_iter(text).collect();
    if originals.is_empty() || found.len() != originals.len() {
        return text.to_string();
    }

    let mut output = String::with_capacity(text.len());
    let mut cursor = 0;
    for (m, source) in found.iter().zip(originals) {
        output.push_str(&text[cursor..m.start()]);
        if original.contains(m.as_str()) {
            output.push_str(m.as_str());
        } else {
            output.push_str(source);
        }
        cursor = m.end();
    }
    output.push_str(&text[cursor..]);
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(raw: &str, original: &str) -> String {
        sanitize(raw, original, ContentKind::PlainText)
    }

    fn markdown(raw: &str, original: &str) -> String {
        sanitize(raw, original, ContentKind::Markdown)
    }

    // ===== Wrapper Tests =====

    #[test]
    fn test_strips_triple_quotes() {
        assert_eq!(plain("\"\"\"Bonjour\"\"\"", "Hello"), "Bonjour");
        assert_eq!(plain("\"\"\"\nBonjour\n\"\"\"", "Hello"), "Bonjour");
        assert_eq!(plain("'''Hola'''", "Hello"), "Hola");
    }

    #[test]
    fn test_strips_single_quote_pair_unless_original_was_quoted() {
        assert_eq!(plain("\"Bonjour\"", "Hello"), "Bonjour");
        assert_eq!(plain("\"Bonjour\"", "\"Hello\""), "\"Bonjour\"");
        assert_eq!(plain("\u{ab}Bonjour\u{bb}", "Hello"), "Bonjour");
    }

    #[test]
    fn test_keeps_inner_quotes() {
        assert_eq!(plain("\"Oui\" et \"non\"", "Yes and no"), "\"Oui\" et \"non\"");
    }

    #[test]
    fn test_unwraps_added_code_fence() {
        assert_eq!(markdown("```\nBonjour\n```", "Hello"), "Bonjour");
        assert_eq!(
            markdown("```js\nlet x;\n```", "```js\nlet x;\n```"),
            "```js\nlet x;\n```"
        );
    }

    // ===== Label and Annotation Tests =====

    #[test]
    fn test_strips_leading_label() {
        assert_eq!(plain("Translation: Bonjour", "Hello"), "Bonjour");
        assert_eq!(plain("translated text:Hallo", "Hello"), "Hallo");
    }

    #[test]
    fn test_strips_annotations() {
        assert_eq!(plain("(Note: informal tone) Bonjour", "Hello"), "Bonjour");
        assert_eq!(
            plain("Bonjour [Translator's note: greeting]", "Hello"),
            "Bonjour"
        );
        assert_eq!(plain("Salut (translation: casual)", "Hi"), "Salut");
    }

    #[test]
    fn test_keeps_link_text_without_colon() {
        assert_eq!(
            markdown("Voir [Notes](https://example.com)", "See [Notes](https://example.com)"),
            "Voir [Notes](https://example.com)"
        );
    }

    // ===== Whitespace Tests =====

    #[test]
    fn test_collapses_runs_but_keeps_indentation() {
        assert_eq!(markdown("un   deux\n    trois  quatre", "x"), "un deux\n    trois quatre");
    }

    #[test]
    fn test_leaves_fenced_code_alone() {
        let raw = "Texte\n```\nlet  x =   1;\n```";
        assert_eq!(markdown(raw, "```\nlet  x =   1;\n```"), raw);
    }

    #[test]
    fn test_normalizes_line_endings() {
        assert_eq!(plain("un\r\ndeux", "one\r\ntwo"), "un\ndeux");
    }

    // ===== Markdown Fix Tests =====

    #[test]
    fn test_collapses_doubled_list_markers() {
        assert_eq!(markdown("- - pomme\n1. - poire", "x"), "- pomme\n- poire");
    }

    #[test]
    fn test_normalizes_bullets_but_not_emphasis() {
        assert_eq!(markdown("* pomme\n+ poire", "x"), "- pomme\n- poire");
        assert_eq!(markdown("**gras** texte", "x"), "**gras** texte");
        assert_eq!(markdown("* * *", "x"), "* * *");
    }

    // ===== Quote and URL Tests =====

    #[test]
    fn test_straightens_curly_quotes_in_plain_text() {
        assert_eq!(plain("Il a dit \u{201c}oui\u{201d}", "He said yes"), "Il a dit \"oui\"");
        assert_eq!(plain("l\u{2019}eau", "water"), "l'eau");
    }

    #[test]
    fn test_restores_rewritten_urls() {
        assert_eq!(
            plain("Voir https://exemple.fr/docs", "See https://example.com/docs"),
            "Voir https://example.com/docs"
        );
    }

    #[test]
    fn test_keeps_urls_when_counts_differ() {
        assert_eq!(
            plain("Voir https://a.fr et https://b.fr", "See https://a.com"),
            "Voir https://a.fr et https://b.fr"
        );
    }

    // ===== Fallback Tests =====

    #[test]
    fn test_empty_response_returns_original() {
        assert_eq!(plain("", "Hello"), "Hello");
        assert_eq!(plain("   \n", "Hello"), "Hello");
        assert_eq!(plain("\"\"\"\"\"\"", "Hello"), "Hello");
    }
}
