//! Ordered structural recognizers for Markdown
//!
//! Every recognizer scans the whole document line by line and reports the
//! blocks it claims, then extracts a [`Descriptor`] for each block. The
//! recognizers are kept mutually exclusive by construction: continuation
//! lines of one construct stop at any line that opens another one, list items
//! never include task items, and fenced code leaves `mermaid` fences to the
//! mermaid recognizer. The remaining overlaps (anything found inside a fenced
//! block, for instance) are resolved by the segmenter, which keeps the claim
//! with the lowest offset and, at equal offsets, the earlier recognizer in
//! [`FragmentKind::PRIORITY`].

use crate::fragment::{
    Alignment, Descriptor, FragmentKind, LinePad, ListLine, ListMarker, TableRow, TaskLine,
};
use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

static HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([ \t]*)(#{1,6})([ \t]+)\S").unwrap());
static LIST_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([ \t]*)([-*+]|\d+\.)[ \t]+\S").unwrap());
static TASK_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([ \t]*)[-*+][ \t]+\[([ xX])\](?:[ \t]|$)").unwrap());
static QUOTE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[ \t]*>(?:[ \t]*>)*[ \t]?").unwrap());
static FOOTNOTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[\^([^\]]+)\]:(?:[ \t]|$)").unwrap());
static DEFINITION_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[ \t]*:[ \t]+\S").unwrap());
static CONTAINER_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([ \t]*):::(\w+)[ \t]*$").unwrap());
static INLINE_MATH_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[ \t]*\$[^$\n]+\$[ \t]*$").unwrap());
static HTML_ELEMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<(\w+)(\s+[^>]*)?>([^<]*)</(\w+)>$").unwrap());
static HTML_SELF_CLOSING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<(\w+)(\s+[^>]*?)?\s*/>$").unwrap());
static TABLE_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\|?[ \t]*:?-+:?[ \t]*(?:\|[ \t]*:?-+:?[ \t]*)*\|?$").unwrap());

/// A line of the source with its byte offsets, newline excluded
#[derive(Debug, Clone, Copy)]
pub(crate) struct Line<'a> {
    pub start: usize,
    pub text: &'a str,
}

impl<'a> Line<'a> {
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn indent(&self) -> &'a str {
        leading_whitespace(self.text)
    }
}

/// Source content split into lines
pub(crate) struct Document<'a> {
    source: &'a str,
    lines: Vec<Line<'a>>,
}

/// Inclusive range of line indices claimed by a recognizer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Block {
    pub first: usize,
    pub last: usize,
}

impl<'a> Document<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut lines = Vec::new();
        let mut start = 0;
        for text in source.split('\n') {
            lines.push(Line { start, text });
            start += text.len() + 1;
        }
        Self { source, lines }
    }

    pub fn lines(&self) -> &[Line<'a>] {
        &self.lines
    }

    fn line(&self, index: usize) -> Option<&Line<'a>> {
        self.lines.get(index)
    }

    /// Byte span of a block: from the start of its first line to the last
    /// non-whitespace character of its last line.
    pub fn span(&self, block: Block) -> Range<usize> {
        let first = &self.lines[block.first];
        let last = &self.lines[block.last];
        first.start..last.start + last.text.trim_end().len()
    }

    pub fn block_lines(&self, block: Block) -> &[Line<'a>] {
        &self.lines[block.first..=block.last]
    }

    pub fn text(&self, block: Block) -> &'a str {
        &self.source[self.span(block)]
    }

    fn is_header(&self, i: usize) -> bool {
        self.line(i).is_some_and(|l| HEADER.is_match(l.text))
    }

    fn is_task_item(&self, i: usize) -> bool {
        self.line(i).is_some_and(|l| TASK_ITEM.is_match(l.text))
    }

    fn is_list_item(&self, i: usize) -> bool {
        self.line(i)
            .is_some_and(|l| LIST_ITEM.is_match(l.text) && !TASK_ITEM.is_match(l.text))
    }

    fn fence_language(&self, i: usize) -> Option<&'a str> {
        let trimmed = self.line(i)?.text.trim();
        let info = trimmed.strip_prefix("```")?;
        let end = info
            .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '-' || c == '+'))
            .unwrap_or(info.len());
        Some(&info[..end])
    }

    fn is_fence_close(&self, i: usize) -> bool {
        self.line(i).is_some_and(|l| {
            let trimmed = l.text.trim();
            trimmed.len() >= 3 && trimmed.chars().all(|c| c == '`')
        })
    }

    fn is_quote(&self, i: usize) -> bool {
        self.line(i).is_some_and(|l| l.text.trim_start().starts_with('>'))
    }

    fn is_table_row(&self, i: usize) -> bool {
        self.line(i).is_some_and(|l| l.text.trim().starts_with('|'))
    }

    fn is_table_start(&self, i: usize) -> bool {
        self.line(i).is_some_and(|l| {
            let trimmed = l.text.trim();
            trimmed.len() >= 2 && trimmed.starts_with('|') && trimmed.ends_with('|')
        })
    }

    fn is_footnote(&self, i: usize) -> bool {
        self.line(i).is_some_and(|l| FOOTNOTE.is_match(l.text))
    }

    fn is_definition_line(&self, i: usize) -> bool {
        self.line(i).is_some_and(|l| DEFINITION_LINE.is_match(l.text))
    }

    /// A term is a plain line directly followed by a `: definition` line
    fn is_definition_term(&self, i: usize) -> bool {
        self.line(i)
            .is_some_and(|l| !l.is_blank() && !self.opens_construct(i))
            && !self.is_definition_line(i)
            && self.is_definition_line(i + 1)
    }

    fn is_container_open(&self, i: usize) -> bool {
        self.line(i).is_some_and(|l| CONTAINER_OPEN.is_match(l.text))
    }

    fn is_container_close(&self, i: usize) -> bool {
        self.line(i).is_some_and(|l| l.text.trim() == ":::")
    }

    fn is_inline_math_line(&self, i: usize) -> bool {
        self.line(i).is_some_and(|l| INLINE_MATH_LINE.is_match(l.text))
    }

    fn is_html_line(&self, i: usize) -> bool {
        self.line(i).is_some_and(|l| parse_html(l.text.trim()).is_some())
    }

    fn is_details_open(&self, i: usize) -> bool {
        self.line(i).is_some_and(|l| {
            let trimmed = l.text.trim();
            trimmed.starts_with("<details>") || trimmed.starts_with("<details ")
        })
    }

    /// Whether a recognizer other than the paragraph one would claim a
    /// block starting at line `i`
    ///
    /// Lines that only look like an opener (a lone leading pipe, an
    /// unclosed `:::` or `$$`) stay paragraph text.
    fn opens_construct(&self, i: usize) -> bool {
        self.is_header(i)
            || self.is_list_item(i)
            || self.is_task_item(i)
            || self.fence_language(i).is_some()
            || self.is_quote(i)
            || self.is_table_start(i)
            || self.is_footnote(i)
            || (self.is_container_open(i)
                && self.find_closing(i + 1, |j| self.is_container_close(j)).is_some())
            || claim_math(self, i).is_some()
            || self.is_html_line(i)
            || (self.is_details_open(i) && self.details_close(i).is_some())
    }

    fn details_close(&self, from: usize) -> Option<usize> {
        self.find_closing(from, |j| {
            self.line(j).is_some_and(|l| l.text.contains("</details>"))
        })
    }

    /// Whether line `i` ends a running block: blank, opening another
    /// construct or introducing a definition term
    fn breaks_block(&self, i: usize) -> bool {
        match self.line(i) {
            None => true,
            Some(line) => {
                line.is_blank() || self.opens_construct(i) || self.is_definition_term(i)
            }
        }
    }

    fn find_closing(&self, from: usize, is_close: impl Fn(usize) -> bool) -> Option<usize> {
        (from..self.lines.len()).find(|&j| is_close(j))
    }
}

impl FragmentKind {
    /// Blocks claimed by this recognizer, in document order
    pub(crate) fn find(self, doc: &Document<'_>) -> Vec<Block> {
        match self {
            FragmentKind::Code => fences(doc)
                .into_iter()
                .filter(|(_, language)| *language != "mermaid")
                .map(|(block, _)| block)
                .collect(),
            FragmentKind::Mermaid => fences(doc)
                .into_iter()
                .filter(|(_, language)| *language == "mermaid")
                .map(|(block, _)| block)
                .collect(),
            _ => {
                let count = doc.lines().len();
                let mut blocks = Vec::new();
                let mut i = 0;
                while i < count {
                    match self.claim(doc, i) {
                        Some(last) => {
                            blocks.push(Block { first: i, last });
                            i = last + 1;
                        }
                        None => i += 1,
                    }
                }
                blocks
            }
        }
    }

    /// Last line of the block this recognizer would start at line `i`
    fn claim(self, doc: &Document<'_>, i: usize) -> Option<usize> {
        match self {
            FragmentKind::Header => doc.is_header(i).then_some(i),
            FragmentKind::List => doc.is_list_item(i).then(|| claim_list(doc, i)),
            FragmentKind::Quote => doc
                .is_quote(i)
                .then(|| extend_while(doc, i, |j| doc.is_quote(j))),
            FragmentKind::Table => doc
                .is_table_start(i)
                .then(|| extend_while(doc, i, |j| doc.is_table_row(j))),
            FragmentKind::TaskList => doc.is_task_item(i).then(|| {
                extend_while(doc, i, |j| doc.is_task_item(j) || !doc.breaks_block(j))
            }),
            FragmentKind::Footnote => doc
                .is_footnote(i)
                .then(|| extend_while(doc, i, |j| !doc.breaks_block(j))),
            FragmentKind::Definition => doc
                .is_definition_term(i)
                .then(|| extend_while(doc, i + 1, |j| doc.is_definition_line(j))),
            FragmentKind::Container => {
                if doc.is_container_open(i) {
                    doc.find_closing(i + 1, |j| doc.is_container_close(j))
                } else {
                    None
                }
            }
            FragmentKind::Math => claim_math(doc, i),
            FragmentKind::Html => doc.is_html_line(i).then_some(i),
            FragmentKind::Details => {
                if doc.is_details_open(i) {
                    doc.details_close(i)
                } else {
                    None
                }
            }
            FragmentKind::Code | FragmentKind::Mermaid => None,
            FragmentKind::Paragraph => {
                let starts = doc.line(i).is_some_and(|l| !l.is_blank())
                    && !doc.opens_construct(i)
                    && !doc.is_definition_term(i);
                starts.then(|| extend_while(doc, i, |j| !doc.breaks_block(j)))
            }
        }
    }

    /// Extract the format descriptor of a claimed block
    pub(crate) fn describe(self, doc: &Document<'_>, block: Block) -> Descriptor {
        let lines = doc.block_lines(block);
        let first = lines[0];

        match self {
            FragmentKind::Header => {
                let (indent, level, spacing) = HEADER
                    .captures(first.text)
                    .map(|c| (c[1].to_string(), c[2].len(), c[3].to_string()))
                    .unwrap_or_default();
                Descriptor::Header {
                    indent,
                    level,
                    spacing,
                }
            }
            FragmentKind::List => Descriptor::List {
                lines: describe_list(lines),
            },
            FragmentKind::Code => Descriptor::Code {
                indent: first.indent().to_string(),
                language: doc.fence_language(block.first).unwrap_or("").to_string(),
                line_indents: inner_indents(lines),
            },
            FragmentKind::Quote => {
                let prefixes: Vec<String> = lines
                    .iter()
                    .map(|l| {
                        QUOTE_PREFIX
                            .find(l.text)
                            .map(|m| m.as_str().to_string())
                            .unwrap_or_default()
                    })
                    .collect();
                let depth = prefixes
                    .first()
                    .map(|p| p.matches('>').count())
                    .unwrap_or(1);
                Descriptor::Quote { depth, prefixes }
            }
            FragmentKind::Table => describe_table(lines),
            FragmentKind::TaskList => Descriptor::TaskList {
                lines: lines
                    .iter()
                    .map(|l| TaskLine {
                        indent: l.indent().to_string(),
                        checked: TASK_ITEM
                            .captures(l.text)
                            .map(|c| c[2].eq_ignore_ascii_case("x")),
                    })
                    .collect(),
            },
            FragmentKind::Footnote => Descriptor::Footnote {
                id: FOOTNOTE
                    .captures(first.text)
                    .map(|c| c[1].to_string())
                    .unwrap_or_default(),
                line_indents: lines.iter().map(|l| l.indent().to_string()).collect(),
            },
            FragmentKind::Definition => Descriptor::Definition {
                indent: first.indent().to_string(),
                term: first.text.trim().to_string(),
            },
            FragmentKind::Container => Descriptor::Container {
                indent: first.indent().to_string(),
                name: CONTAINER_OPEN
                    .captures(first.text)
                    .map(|c| c[2].to_string())
                    .unwrap_or_default(),
            },
            FragmentKind::Math => {
                let trimmed = first.text.trim();
                Descriptor::Math {
                    indent: first.indent().to_string(),
                    inline: !trimmed.starts_with("$$"),
                    multiline: block.last > block.first,
                }
            }
            FragmentKind::Html => {
                let element = parse_html(first.text.trim());
                let (tag, attributes, self_closing) = element
                    .map(|e| (e.tag, e.attributes, e.self_closing))
                    .unwrap_or_default();
                Descriptor::Html {
                    indent: first.indent().to_string(),
                    tag,
                    attributes,
                    self_closing,
                    original: self_closing.then(|| doc.text(block).trim().to_string()),
                }
            }
            FragmentKind::Details => describe_details(lines),
            FragmentKind::Mermaid => Descriptor::Mermaid {
                indent: first.indent().to_string(),
                line_indents: inner_indents(lines),
            },
            FragmentKind::Paragraph => Descriptor::Paragraph {
                lines: line_pads(doc.text(block).split('\n')),
            },
        }
    }
}

/// Fenced blocks with their info string, paired in document order so a
/// closing fence is never mistaken for an opening one
fn fences<'a>(doc: &Document<'a>) -> Vec<(Block, &'a str)> {
    let count = doc.lines().len();
    let mut fences = Vec::new();
    let mut i = 0;

    while i < count {
        let closing = doc
            .fence_language(i)
            .and_then(|language| Some((language, doc.find_closing(i + 1, |j| doc.is_fence_close(j))?)));
        match closing {
            Some((language, last)) => {
                fences.push((Block { first: i, last }, language));
                i = last + 1;
            }
            None => i += 1,
        }
    }

    fences
}

fn extend_while(doc: &Document<'_>, from: usize, keep: impl Fn(usize) -> bool) -> usize {
    let mut last = from;
    while last + 1 < doc.lines().len() && keep(last + 1) {
        last += 1;
    }
    last
}

/// A list runs over item lines and their continuation lines. Blank lines
/// only separate items of the same list when another item follows.
fn claim_list(doc: &Document<'_>, start: usize) -> usize {
    let count = doc.lines().len();
    let mut last = start;
    let mut j = start + 1;

    while j < count {
        if doc.lines()[j].is_blank() {
            let next = (j..count).find(|&k| !doc.lines()[k].is_blank());
            match next {
                Some(k) if doc.is_list_item(k) => {
                    last = k;
                    j = k + 1;
                }
                _ => break,
            }
        } else if doc.is_list_item(j) || !doc.breaks_block(j) {
            last = j;
            j += 1;
        } else {
            break;
        }
    }

    last
}

fn claim_math(doc: &Document<'_>, i: usize) -> Option<usize> {
    let trimmed = doc.line(i)?.text.trim();
    if trimmed.starts_with("$$") {
        if trimmed.len() >= 4 && trimmed.ends_with("$$") {
            return Some(i);
        }
        return doc.find_closing(i + 1, |j| {
            doc.line(j).is_some_and(|l| l.text.trim_end().ends_with("$$"))
        });
    }
    doc.is_inline_math_line(i).then_some(i)
}

fn describe_list(lines: &[Line<'_>]) -> Vec<ListLine> {
    lines
        .iter()
        .map(|line| {
            let indent = line.indent();
            let marker = LIST_ITEM.captures(line.text).map(|c| {
                let token = &c[2];
                if token.ends_with('.') {
                    ListMarker::Ordered
                } else {
                    ListMarker::Bullet(token.chars().next().unwrap_or('-'))
                }
            });

            ListLine {
                indent: indent.to_string(),
                level: indent_width(indent) / 2,
                marker,
            }
        })
        .collect()
}

/// The opening runs through the line closing `<summary>`, or is the first
/// line alone when the summary is missing or never closed before the end
fn describe_details(lines: &[Line<'_>]) -> Descriptor {
    let last = lines.len() - 1;
    let summary_end = lines
        .iter()
        .position(|l| l.text.contains("</summary>"))
        .filter(|&j| j < last)
        .unwrap_or(0);
    let opening = lines[..=summary_end]
        .iter()
        .map(|l| l.text.trim_end())
        .collect::<Vec<_>>()
        .join("\n");
    let closing = if last > 0 {
        lines[last].text.trim_end().to_string()
    } else {
        String::new()
    };

    Descriptor::Details {
        indent: lines[0].indent().to_string(),
        opening,
        closing,
    }
}

fn describe_table(lines: &[Line<'_>]) -> Descriptor {
    let rows: Vec<TableRow> = lines
        .iter()
        .map(|l| {
            let trimmed = l.text.trim();
            TableRow {
                separator: is_separator_row(trimmed),
                cell_widths: split_cells(trimmed)
                    .iter()
                    .map(|cell| cell.chars().count())
                    .collect(),
            }
        })
        .collect();

    let alignments = lines
        .iter()
        .map(|l| l.text.trim())
        .find(|row| is_separator_row(row))
        .map(|row| split_cells(row).iter().map(|c| alignment_of(c)).collect())
        .unwrap_or_default();

    Descriptor::Table {
        indent: lines[0].indent().to_string(),
        rows,
        alignments,
    }
}

fn alignment_of(cell: &str) -> Alignment {
    match (cell.starts_with(':'), cell.ends_with(':')) {
        (true, true) => Alignment::Center,
        (false, true) => Alignment::Right,
        (true, false) => Alignment::Left,
        (false, false) => Alignment::None,
    }
}

pub(crate) fn is_separator_row(row: &str) -> bool {
    row.contains('-') && TABLE_SEPARATOR.is_match(row.trim())
}

/// Trimmed cells of a table row, outer pipes removed
pub(crate) fn split_cells(row: &str) -> Vec<&str> {
    let row = row.trim();
    let row = row.strip_prefix('|').unwrap_or(row);
    let row = row.strip_suffix('|').unwrap_or(row);
    row.split('|').map(str::trim).collect()
}

/// Indentation of the lines between an opening and a closing fence
fn inner_indents(lines: &[Line<'_>]) -> Vec<String> {
    if lines.len() < 2 {
        return Vec::new();
    }
    lines[1..lines.len() - 1]
        .iter()
        .map(|l| l.indent().to_string())
        .collect()
}

pub(crate) fn line_pads<'a>(lines: impl Iterator<Item = &'a str>) -> Vec<LinePad> {
    lines
        .map(|text| {
            let leading = leading_whitespace(text);
            let rest = &text[leading.len()..];
            let trailing = &rest[rest.trim_end().len()..];
            LinePad {
                leading: leading.to_string(),
                trailing: trailing.to_string(),
            }
        })
        .collect()
}

/// Split a quote line into its marker prefix and the quoted text
pub(crate) fn split_quote_prefix(line: &str) -> (&str, &str) {
    match QUOTE_PREFIX.find(line) {
        Some(m) => (m.as_str(), &line[m.end()..]),
        None => ("", line),
    }
}

pub(crate) fn leading_whitespace(text: &str) -> &str {
    &text[..text.len() - text.trim_start().len()]
}

fn indent_width(indent: &str) -> usize {
    indent.chars().map(|c| if c == '\t' { 4 } else { 1 }).sum()
}

pub(crate) struct HtmlElement {
    pub tag: String,
    pub attributes: String,
    pub self_closing: bool,
}

/// Parse a whole-line html element: `<tag attrs>text</tag>` or `<tag attrs/>`
pub(crate) fn parse_html(text: &str) -> Option<HtmlElement> {
    if let Some(c) = HTML_SELF_CLOSING.captures(text) {
        return Some(HtmlElement {
            tag: c[1].to_string(),
            attributes: c.get(2).map(|m| m.as_str().trim()).unwrap_or("").to_string(),
            self_closing: true,
        });
    }
    let c = HTML_ELEMENT.captures(text)?;
    if c[1] != c[4] {
        return None;
    }
    Some(HtmlElement {
        tag: c[1].to_string(),
        attributes: c.get(2).map(|m| m.as_str().trim()).unwrap_or("").to_string(),
        self_closing: false,
    })
}
