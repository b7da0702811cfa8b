//! Segmentation of flat content into a template and fragments
//!
//! Markdown runs every recognizer over the whole content, sorts the claims by
//! source offset (earlier recognizers win ties) and keeps the claims that do
//! not overlap an already accepted one. Non-blank lines left over after that
//! become paragraphs, so no prose is ever frozen into the template. Plain
//! text is cut into runs of non-blank lines. Whitespace between fragments
//! stays in the template verbatim.
//!
//! # Example
//!
//! ```
//! use localizer::{segment, ContentKind, FragmentKind};
//!
//! let segmented = segment("# Title\n\nSome text.", ContentKind::Markdown);
//! assert_eq!(segmented.template.to_string(), "$chunk-1\n\n$chunk-2");
//! assert_eq!(segmented.fragments[0].kind(), FragmentKind::Header);
//! assert_eq!(segmented.fragments[1].text, "Some text.");
//! ```

use crate::fragment::{Descriptor, Fragment, FragmentKind};
use crate::kind::ContentKind;
use crate::patterns::{Block, Document, line_pads};
use crate::template::Template;
use std::ops::Range;

/// Result of segmenting one piece of content
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Segmented {
    pub template: Template,
    /// Fragments in document order; `fragments[i].position == i`
    pub fragments: Vec<Fragment>,
}

impl Segmented {
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Source text of every fragment, in position order
    pub fn texts(&self) -> Vec<String> {
        self.fragments.iter().map(|f| f.text.clone()).collect()
    }
}

struct Claim {
    span: Range<usize>,
    priority: usize,
    kind: FragmentKind,
    block: Block,
}

/// Split content into a template and its translatable fragments
///
/// # Arguments
///
/// * `content` - The content to segment
/// * `kind` - Whether to run the Markdown recognizers or split plain text
///
/// # Returns
///
/// The template and the fragments. Empty content yields an empty template
/// and no fragments.
pub fn segment(content: &str, kind: ContentKind) -> Segmented {
    if content.is_empty() {
        return Segmented::default();
    }

    let doc = Document::new(content);
    let claims = match kind {
        ContentKind::Markdown => markdown_claims(&doc),
        ContentKind::PlainText => plain_text_claims(&doc),
    };

    let mut template = Template::default();
    let mut fragments = Vec::with_capacity(claims.len());
    let mut cursor = 0;

    for claim in claims {
        template.push_literal(&content[cursor..claim.span.start]);
        let position = template.push_slot();
        let descriptor = match kind {
            ContentKind::Markdown => claim.kind.describe(&doc, claim.block),
            ContentKind::PlainText => Descriptor::Paragraph {
                lines: line_pads(doc.text(claim.block).split('\n')),
            },
        };
        fragments.push(Fragment {
            text: content[claim.span.clone()].trim().to_string(),
            descriptor,
            position,
            span: claim.span.clone(),
        });
        cursor = claim.span.end;
    }
    template.push_literal(&content[cursor..]);

    Segmented {
        template,
        fragments,
    }
}

fn markdown_claims(doc: &Document<'_>) -> Vec<Claim> {
    let mut claims: Vec<Claim> = FragmentKind::PRIORITY
        .iter()
        .enumerate()
        .flat_map(|(priority, &kind)| {
            kind.find(doc).into_iter().map(move |block| Claim {
                span: doc.span(block),
                priority,
                kind,
                block,
            })
        })
        .filter(|claim| !doc.text(claim.block).trim().is_empty())
        .collect();

    claims.sort_by_key(|claim| (claim.span.start, claim.priority));

    let mut accepted: Vec<Claim> = Vec::with_capacity(claims.len());
    for claim in claims {
        let free = accepted
            .last()
            .is_none_or(|last| claim.span.start >= last.span.end);
        if free {
            accepted.push(claim);
        }
    }

    let stray = unclaimed_runs(doc, &accepted);
    if !stray.is_empty() {
        accepted.extend(stray);
        accepted.sort_by_key(|claim| claim.span.start);
    }
    accepted
}

/// Paragraph claims for runs of non-blank lines no accepted claim covers
fn unclaimed_runs(doc: &Document<'_>, accepted: &[Claim]) -> Vec<Claim> {
    let lines = doc.lines();
    let mut covered = vec![false; lines.len()];
    for claim in accepted {
        covered[claim.block.first..=claim.block.last].fill(true);
    }

    let open = |i: usize| !covered[i] && !lines[i].is_blank();
    let mut runs = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        if !open(i) {
            i += 1;
            continue;
        }
        let first = i;
        while i + 1 < lines.len() && open(i + 1) {
            i += 1;
        }
        let block = Block { first, last: i };
        runs.push(Claim {
            span: doc.span(block),
            priority: FragmentKind::PRIORITY.len() - 1,
            kind: FragmentKind::Paragraph,
            block,
        });
        i += 1;
    }
    runs
}

fn plain_text_claims(doc: &Document<'_>) -> Vec<Claim> {
    let lines = doc.lines();
    let mut claims = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        if lines[i].is_blank() {
            i += 1;
            continue;
        }
        let first = i;
        while i + 1 < lines.len() && !lines[i + 1].is_blank() {
            i += 1;
        }
        let block = Block { first, last: i };
        claims.push(Claim {
            span: doc.span(block),
            priority: 0,
            kind: FragmentKind::Paragraph,
            block,
        });
        i += 1;
    }

    claims
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(segmented: &Segmented) -> Vec<FragmentKind> {
        segmented.fragments.iter().map(|f| f.kind()).collect()
    }

    // ===== Edge Case Tests =====

    #[test]
    fn test_empty_content_yields_nothing() {
        let segmented = segment("", ContentKind::Markdown);
        assert!(segmented.template.is_empty());
        assert!(segmented.fragments.is_empty());
    }

    #[test]
    fn test_whitespace_only_content_has_no_fragments() {
        let segmented = segment("  \n\n\t", ContentKind::PlainText);
        assert!(segmented.is_empty());
        assert_eq!(segmented.template.to_string(), "  \n\n\t");
    }

    #[test]
    fn test_unstructured_markdown_is_one_paragraph() {
        let segmented = segment("  Just some words.  ", ContentKind::Markdown);
        assert_eq!(kinds(&segmented), vec![FragmentKind::Paragraph]);
        assert_eq!(segmented.fragments[0].text, "Just some words.");
    }

    // ===== Plain Text Tests =====

    #[test]
    fn test_plain_text_splits_on_blank_lines() {
        let segmented = segment("First line\nsecond line\n\n\nThird", ContentKind::PlainText);
        assert_eq!(segmented.texts(), vec!["First line\nsecond line", "Third"]);
        assert_eq!(segmented.template.to_string(), "$chunk-1\n\n\n$chunk-2");
    }

    #[test]
    fn test_plain_text_ignores_markdown_syntax() {
        let segmented = segment("# not a header\n- nor a list", ContentKind::PlainText);
        assert_eq!(kinds(&segmented), vec![FragmentKind::Paragraph]);
    }

    // ===== Markdown Tests =====

    #[test]
    fn test_fragments_follow_document_order() {
        let content = "# Title\n\nIntro text.\n\n- one\n- two\n\n| a | b |\n|---|---|\n| 1 | 2 |\n\n```js\nlet x = 1;\n```";
        let segmented = segment(content, ContentKind::Markdown);
        assert_eq!(
            kinds(&segmented),
            vec![
                FragmentKind::Header,
                FragmentKind::Paragraph,
                FragmentKind::List,
                FragmentKind::Table,
                FragmentKind::Code,
            ]
        );
        for (i, fragment) in segmented.fragments.iter().enumerate() {
            assert_eq!(fragment.position, i);
        }
    }

    #[test]
    fn test_fragments_never_overlap() {
        let content = "```md\n# inside code\n- also inside\n```\n\nAfter";
        let segmented = segment(content, ContentKind::Markdown);
        assert_eq!(kinds(&segmented), vec![FragmentKind::Code, FragmentKind::Paragraph]);
        let spans: Vec<_> = segmented.fragments.iter().map(|f| f.span.clone()).collect();
        assert!(spans[0].end <= spans[1].start);
    }

    #[test]
    fn test_template_no_longer_contains_fragment_text() {
        let content = "## Heading\n\nBody paragraph";
        let segmented = segment(content, ContentKind::Markdown);
        let template = segmented.template.to_string();
        assert!(!template.contains("Heading"));
        assert!(!template.contains("Body paragraph"));
    }

    #[test]
    fn test_inline_markup_stays_in_paragraph() {
        let content = "Press <kbd>Ctrl</kbd> and pay $5 or $6.";
        let segmented = segment(content, ContentKind::Markdown);
        assert_eq!(kinds(&segmented), vec![FragmentKind::Paragraph]);
    }

    #[test]
    fn test_lookalike_openers_are_translated_as_paragraphs() {
        for content in ["| leading pipe sentence", ": colon led line"] {
            let segmented = segment(content, ContentKind::Markdown);
            assert_eq!(kinds(&segmented), vec![FragmentKind::Paragraph]);
            assert_eq!(segmented.fragments[0].text, content);
        }
    }

    #[test]
    fn test_every_non_blank_line_reaches_a_fragment() {
        let content = "$$ never closed\nText after it\n\n```\nopen fence\n\n<details>\nno end";
        let segmented = segment(content, ContentKind::Markdown);
        let template = segmented.template.to_string();
        for line in content.lines().filter(|l| !l.trim().is_empty()) {
            assert!(!template.contains(line), "{:?} left in template", line);
        }
        assert!(
            segmented
                .fragments
                .iter()
                .all(|f| f.kind() == FragmentKind::Paragraph)
        );
    }

    #[test]
    fn test_trailing_whitespace_stays_in_template() {
        let segmented = segment("# Title   \n", ContentKind::Markdown);
        assert_eq!(segmented.template.to_string(), "$chunk-1   \n");
        assert_eq!(segmented.fragments[0].text, "# Title");
    }
}
