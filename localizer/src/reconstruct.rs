//! Reassembly of translated fragments
//!
//! Every fragment is rendered from its translated text and its descriptor,
//! then the rendered fragments are substituted into the template slots. The
//! renderers rebuild structure from the descriptor and only take prose from
//! the translation, so markers, fences, prefixes and alignment survive
//! whatever the model did to them.
//!
//! # Example
//!
//! ```
//! use localizer::{reconstruct, segment, ContentKind};
//!
//! let segmented = segment("1. one\n2. two", ContentKind::Markdown);
//! let translated = vec!["1. un\n1. deux".to_string()];
//! let output = reconstruct(&segmented.template, &translated, &segmented.fragments).unwrap();
//! assert_eq!(output, "1. un\n2. deux");
//! ```

use crate::error::ReconstructError;
use crate::fragment::{Alignment, Descriptor, Fragment, LinePad, ListMarker, TableRow};
use crate::patterns::{is_separator_row, split_cells, split_quote_prefix};
use crate::template::Template;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

static LEAKED_HEADER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#+[ \t]*").unwrap());
static LEAKED_LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[-*+]|\d+\.)[ \t]+").unwrap());
static LEAKED_TASK_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[-*+][ \t]+)?\[[ xX]\][ \t]*").unwrap());
static LEAKED_FOOTNOTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[\^[^\]]+\]:[ \t]*").unwrap());
static LEAKED_DEFINITION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^:[ \t]*").unwrap());
static MARKUP_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"</?\w+[^>]*>").unwrap());

/// Substitute the rendered translation of every fragment into the template
///
/// # Arguments
///
/// * `template` - Template produced by [`crate::segment`]
/// * `translated` - Translated text of each fragment, indexed by position
/// * `fragments` - The fragments produced alongside the template
///
/// # Returns
///
/// The reassembled document, or a `ReconstructError` when a translation is
/// missing or the counts do not line up with the template.
pub fn reconstruct(
    template: &Template,
    translated: &[String],
    fragments: &[Fragment],
) -> Result<String, ReconstructError> {
    let rendered = fragments
        .iter()
        .map(|fragment| {
            translated
                .get(fragment.position)
                .map(|text| render(fragment, text))
                .ok_or(ReconstructError::MissingTranslation(fragment.position))
        })
        .collect::<Result<Vec<_>, _>>()?;

    template.fill(rendered)
}

/// Render one fragment from its translated text
pub fn render(fragment: &Fragment, translated: &str) -> String {
    let translated = translated.trim_matches('\n');

    match &fragment.descriptor {
        Descriptor::Header {
            indent,
            level,
            spacing,
        } => {
            let text = LEAKED_HEADER.replace(translated.trim(), "");
            format!("{}{}{}{}", indent, "#".repeat(*level), spacing, text.trim())
        }
        Descriptor::List { lines } => {
            let mut counters: HashMap<usize, usize> = HashMap::new();
            translated
                .lines()
                .enumerate()
                .map(|(i, line)| {
                    let Some(structure) = lines.get(i).or(lines.last()) else {
                        return line.trim().to_string();
                    };
                    if line.trim().is_empty() {
                        return String::new();
                    }
                    let content = LEAKED_LIST_MARKER.replace(line.trim(), "");
                    match structure.marker {
                        None => format!("{}{}", structure.indent, line.trim()),
                        Some(marker) => {
                            counters.retain(|level, _| *level <= structure.level);
                            let counter = counters.entry(structure.level).or_insert(1);
                            let token = match marker {
                                ListMarker::Ordered => {
                                    let token = format!("{}.", counter);
                                    *counter += 1;
                                    token
                                }
                                ListMarker::Bullet(_) => "-".to_string(),
                            };
                            format!("{}{} {}", structure.indent, token, content)
                        }
                    }
                })
                .collect::<Vec<_>>()
                .join("\n")
        }
        Descriptor::Code {
            indent,
            language,
            line_indents,
        } => fenced(indent, language, line_indents, translated),
        Descriptor::Mermaid {
            indent,
            line_indents,
        } => fenced(indent, "mermaid", line_indents, translated),
        Descriptor::Quote { prefixes, .. } => translated
            .lines()
            .enumerate()
            .map(|(i, line)| {
                let prefix = prefixes
                    .get(i)
                    .or(prefixes.first())
                    .map(String::as_str)
                    .unwrap_or("> ");
                let (_, rest) = split_quote_prefix(line.trim());
                format!("{}{}", prefix, rest.trim())
            })
            .collect::<Vec<_>>()
            .join("\n"),
        Descriptor::Table {
            indent,
            rows,
            alignments,
        } => render_table(indent, rows, alignments, &fragment.text, translated),
        Descriptor::TaskList { lines } => translated
            .lines()
            .enumerate()
            .map(|(i, line)| {
                let Some(structure) = lines.get(i).or(lines.last()) else {
                    return line.trim().to_string();
                };
                match structure.checked {
                    None => format!("{}{}", structure.indent, line.trim()),
                    Some(checked) => {
                        let content = LEAKED_TASK_MARKER.replace(line.trim(), "");
                        let checkbox = if checked { "- [x]" } else { "- [ ]" };
                        if content.is_empty() {
                            format!("{}{}", structure.indent, checkbox)
                        } else {
                            format!("{}{} {}", structure.indent, checkbox, content)
                        }
                    }
                }
            })
            .collect::<Vec<_>>()
            .join("\n"),
        Descriptor::Footnote { id, line_indents } => translated
            .lines()
            .enumerate()
            .map(|(i, line)| {
                if i == 0 {
                    let content = LEAKED_FOOTNOTE.replace(line.trim(), "");
                    format!("[^{}]: {}", id, content)
                } else {
                    let indent = line_indents
                        .get(i)
                        .or(line_indents.last())
                        .map(String::as_str)
                        .unwrap_or("");
                    format!("{}{}", indent, line.trim())
                }
            })
            .collect::<Vec<_>>()
            .join("\n"),
        Descriptor::Definition { indent, term } => {
            let lines: Vec<&str> = translated
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .collect();
            let marked: Vec<&str> = lines.iter().copied().filter(|l| l.starts_with(':')).collect();
            let definitions = if marked.is_empty() {
                lines.iter().skip(1).copied().collect()
            } else {
                marked
            };

            let mut output = vec![format!("{}{}", indent, term)];
            output.extend(definitions.into_iter().map(|definition| {
                format!(
                    "{}: {}",
                    indent,
                    LEAKED_DEFINITION.replace(definition, "").trim()
                )
            }));
            output.join("\n")
        }
        Descriptor::Container { indent, name } => {
            let body = unwrap_body(translated, |l| l.starts_with(":::"), |l| l == ":::");
            let mut output = vec![format!("{}:::{}", indent, name)];
            output.extend(body.iter().map(|line| indent_line(indent, line)));
            output.push(format!("{}:::", indent));
            output.join("\n")
        }
        Descriptor::Details {
            indent,
            opening,
            closing,
        } => {
            if closing.is_empty() {
                return opening.clone();
            }
            let body: Vec<&str> = translated
                .lines()
                .map(str::trim)
                .filter(|l| {
                    !(l.starts_with("<details") || *l == "</details>" || l.starts_with("<summary>"))
                })
                .collect();
            let mut output = vec![opening.clone()];
            output.extend(body.iter().map(|line| indent_line(indent, line)));
            output.push(closing.clone());
            output.join("\n")
        }
        Descriptor::Math {
            indent,
            inline,
            multiline,
        } => {
            let content = translated.trim().trim_matches('$').trim();
            if *inline {
                format!("{}${}$", indent, content)
            } else if *multiline {
                format!("{}$$\n{}\n{}$$", indent, content, indent)
            } else {
                format!("{}$${}$$", indent, content)
            }
        }
        Descriptor::Html {
            indent,
            tag,
            attributes,
            original,
            ..
        } => {
            if let Some(original) = original {
                return format!("{}{}", indent, original);
            }
            let inner = MARKUP_TAG.replace_all(translated.trim(), "");
            let inner = inner.trim();
            if attributes.is_empty() {
                format!("{}<{}>{}</{}>", indent, tag, inner, tag)
            } else {
                format!("{}<{} {}>{}</{}>", indent, tag, attributes, inner, tag)
            }
        }
        Descriptor::Paragraph { lines } => render_paragraph(lines, translated),
    }
}

fn render_paragraph(pads: &[LinePad], translated: &str) -> String {
    let fallback = LinePad::default();
    translated
        .lines()
        .enumerate()
        .map(|(i, line)| {
            let pad = pads.get(i).or(pads.last()).unwrap_or(&fallback);
            format!("{}{}{}", pad.leading, line.trim(), pad.trailing)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Re-wrap translated content in a fence, one original indent per line
fn fenced(indent: &str, language: &str, line_indents: &[String], translated: &str) -> String {
    let body = unwrap_body(
        translated,
        |l| l.starts_with("```"),
        |l| l.len() >= 3 && l.chars().all(|c| c == '`'),
    );

    let mut output = vec![format!("{}```{}", indent, language)];
    output.extend(body.iter().enumerate().map(|(i, line)| {
        let line_indent = line_indents
            .get(i)
            .map(String::as_str)
            .unwrap_or(indent);
        format!("{}{}", line_indent, line)
    }));
    output.push(format!("{}```", indent));
    output.join("\n")
}

/// Trimmed body lines with the wrapper's opening and closing lines removed
fn unwrap_body<'a>(
    translated: &'a str,
    is_open: impl Fn(&str) -> bool,
    is_close: impl Fn(&str) -> bool,
) -> Vec<&'a str> {
    let mut lines: Vec<&str> = translated.lines().map(str::trim).collect();
    if lines.first().is_some_and(|l| is_open(l)) {
        lines.remove(0);
    }
    if lines.last().is_some_and(|l| is_close(l)) {
        lines.pop();
    }
    lines
}

fn indent_line(indent: &str, line: &str) -> String {
    if line.is_empty() {
        String::new()
    } else {
        format!("{}{}", indent, line)
    }
}

fn render_table(
    indent: &str,
    rows: &[TableRow],
    alignments: &[Alignment],
    original: &str,
    translated: &str,
) -> String {
    let original_rows: Vec<Vec<&str>> = content_rows(original);
    let translated_rows: Vec<Vec<&str>> = content_rows(translated);

    let columns = rows
        .iter()
        .map(|r| r.cell_widths.len())
        .chain(std::iter::once(alignments.len()))
        .max()
        .unwrap_or(0);

    // Content rows in order, falling back to the original cell when the
    // translation is short.
    let cells: Vec<Vec<&str>> = original_rows
        .iter()
        .enumerate()
        .map(|(r, original_row)| {
            (0..columns)
                .map(|c| {
                    translated_rows
                        .get(r)
                        .and_then(|row| row.get(c))
                        .or(original_row.get(c))
                        .copied()
                        .unwrap_or("")
                })
                .collect()
        })
        .collect();

    let mut widths = vec![1; columns];
    for row in rows.iter().filter(|r| !r.separator) {
        for (c, width) in row.cell_widths.iter().enumerate().take(columns) {
            widths[c] = widths[c].max(*width);
        }
    }
    for row in &cells {
        for (c, cell) in row.iter().enumerate() {
            widths[c] = widths[c].max(cell.chars().count());
        }
    }

    let alignment = |c: usize| alignments.get(c).copied().unwrap_or_default();
    let mut content = cells.iter();
    let mut output = Vec::with_capacity(rows.len());

    for row in rows {
        let line = if row.separator {
            let parts: Vec<String> = widths
                .iter()
                .enumerate()
                .map(|(c, w)| separator_cell(*w, alignment(c)))
                .collect();
            format!("|{}|", parts.join("|"))
        } else {
            let Some(cells) = content.next() else {
                continue;
            };
            let parts: Vec<String> = cells
                .iter()
                .enumerate()
                .map(|(c, cell)| format!(" {} ", pad_cell(cell, widths[c], alignment(c))))
                .collect();
            format!("|{}|", parts.join("|"))
        };
        output.push(format!("{}{}", indent, line));
    }

    output.join("\n")
}

fn content_rows(table: &str) -> Vec<Vec<&str>> {
    table
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !is_separator_row(l))
        .map(split_cells)
        .collect()
}

fn pad_cell(cell: &str, width: usize, alignment: Alignment) -> String {
    let gap = width.saturating_sub(cell.chars().count());
    match alignment {
        Alignment::Right => format!("{}{}", " ".repeat(gap), cell),
        Alignment::Center => {
            let left = gap / 2;
            format!("{}{}{}", " ".repeat(left), cell, " ".repeat(gap - left))
        }
        Alignment::Left | Alignment::None => format!("{}{}", cell, " ".repeat(gap)),
    }
}

/// Separator cell spanning a padded cell of `width` characters
fn separator_cell(width: usize, alignment: Alignment) -> String {
    match alignment {
        Alignment::None => "-".repeat(width + 2),
        Alignment::Left => format!(":{}", "-".repeat(width + 1)),
        Alignment::Center => format!(":{}:", "-".repeat(width)),
        Alignment::Right => format!("{}:", "-".repeat(width + 1)),
    }
}
