//! Fragments and their format descriptors
//!
//! A fragment is one translatable unit cut out of a document. Its descriptor
//! records everything needed to regenerate the formatting around the
//! translated text: indentation, markers, fences, alignment and so on. The
//! descriptor never carries the prose itself; the only exceptions are the
//! pieces that are deliberately kept untranslated (a definition term, a
//! details summary and self-closing markup).

use std::fmt;
use std::ops::Range;

/// Structural type of a fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FragmentKind {
    Header,
    List,
    Code,
    Quote,
    Table,
    TaskList,
    Footnote,
    Definition,
    Container,
    Math,
    Html,
    Details,
    Mermaid,
    Paragraph,
}

impl FragmentKind {
    /// Recognizer priority order. Earlier kinds win claims starting at the
    /// same source offset.
    pub const PRIORITY: [FragmentKind; 14] = [
        FragmentKind::Header,
        FragmentKind::List,
        FragmentKind::Code,
        FragmentKind::Quote,
        FragmentKind::Table,
        FragmentKind::TaskList,
        FragmentKind::Footnote,
        FragmentKind::Definition,
        FragmentKind::Container,
        FragmentKind::Math,
        FragmentKind::Html,
        FragmentKind::Details,
        FragmentKind::Mermaid,
        FragmentKind::Paragraph,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FragmentKind::Header => "header",
            FragmentKind::List => "list",
            FragmentKind::Code => "code",
            FragmentKind::Quote => "quote",
            FragmentKind::Table => "table",
            FragmentKind::TaskList => "taskList",
            FragmentKind::Footnote => "footnote",
            FragmentKind::Definition => "definition",
            FragmentKind::Container => "container",
            FragmentKind::Math => "math",
            FragmentKind::Html => "html",
            FragmentKind::Details => "details",
            FragmentKind::Mermaid => "mermaid",
            FragmentKind::Paragraph => "paragraph",
        }
    }
}

impl fmt::Display for FragmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Marker of a list line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMarker {
    /// `-`, `*` or `+`
    Bullet(char),
    /// `1.`, `2.`, ...
    Ordered,
}

/// Per-line structure of a list block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListLine {
    /// Leading whitespace as found in the source
    pub indent: String,
    /// Nesting level, two columns of indentation per level
    pub level: usize,
    /// `None` for a continuation line without its own marker
    pub marker: Option<ListMarker>,
}

/// Column alignment taken from a table's separator row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    #[default]
    None,
    Left,
    Center,
    Right,
}

/// Row of a table: cell widths only, never the cell text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub separator: bool,
    /// Trimmed character width of every cell
    pub cell_widths: Vec<usize>,
}

/// Per-line structure of a task list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskLine {
    pub indent: String,
    /// `None` for a continuation line without a checkbox
    pub checked: Option<bool>,
}

/// Whitespace surrounding the text of one line
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LinePad {
    pub leading: String,
    pub trailing: String,
}

/// Type-specific format metadata of a fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Descriptor {
    Header {
        indent: String,
        level: usize,
        spacing: String,
    },
    List {
        lines: Vec<ListLine>,
    },
    Code {
        indent: String,
        language: String,
        /// Indentation of each content line between the fences
        line_indents: Vec<String>,
    },
    Quote {
        depth: usize,
        /// Indentation plus quote markers of every line
        prefixes: Vec<String>,
    },
    Table {
        indent: String,
        rows: Vec<TableRow>,
        alignments: Vec<Alignment>,
    },
    TaskList {
        lines: Vec<TaskLine>,
    },
    Footnote {
        id: String,
        line_indents: Vec<String>,
    },
    Definition {
        indent: String,
        /// Term line, re-emitted unchanged
        term: String,
    },
    Container {
        indent: String,
        name: String,
    },
    Math {
        /// Leading whitespace of the line holding the expression
        indent: String,
        inline: bool,
        multiline: bool,
    },
    Html {
        indent: String,
        tag: String,
        attributes: String,
        self_closing: bool,
        /// Source text of a self-closing element, passed through as is
        original: Option<String>,
    },
    Details {
        indent: String,
        /// Source lines from `<details>` through the summary, re-emitted as is
        opening: String,
        /// Source line holding `</details>`
        closing: String,
    },
    Mermaid {
        indent: String,
        line_indents: Vec<String>,
    },
    Paragraph {
        lines: Vec<LinePad>,
    },
}

impl Descriptor {
    pub fn kind(&self) -> FragmentKind {
        match self {
            Descriptor::Header { .. } => FragmentKind::Header,
            Descriptor::List { .. } => FragmentKind::List,
            Descriptor::Code { .. } => FragmentKind::Code,
            Descriptor::Quote { .. } => FragmentKind::Quote,
            Descriptor::Table { .. } => FragmentKind::Table,
            Descriptor::TaskList { .. } => FragmentKind::TaskList,
            Descriptor::Footnote { .. } => FragmentKind::Footnote,
            Descriptor::Definition { .. } => FragmentKind::Definition,
            Descriptor::Container { .. } => FragmentKind::Container,
            Descriptor::Math { .. } => FragmentKind::Math,
            Descriptor::Html { .. } => FragmentKind::Html,
            Descriptor::Details { .. } => FragmentKind::Details,
            Descriptor::Mermaid { .. } => FragmentKind::Mermaid,
            Descriptor::Paragraph { .. } => FragmentKind::Paragraph,
        }
    }

    /// Whether the fragment must bypass the model entirely
    pub fn is_passthrough(&self) -> bool {
        matches!(
            self,
            Descriptor::Html {
                self_closing: true,
                ..
            }
        )
    }
}

/// One translatable unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    /// Trimmed source text sent for translation
    pub text: String,
    pub descriptor: Descriptor,
    /// Zero-based slot index in the template
    pub position: usize,
    /// Byte range in the source content replaced by the slot
    pub span: Range<usize>,
}

impl Fragment {
    pub fn kind(&self) -> FragmentKind {
        self.descriptor.kind()
    }
}
