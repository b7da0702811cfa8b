//! Format-preserving segmentation and reassembly of translatable content
//!
//! This crate cuts plain text and Markdown into translatable fragments,
//! cleans up what a language model sends back, and puts the translated
//! fragments back together without losing the original formatting.
//!
//! # Example
//!
//! ```
//! use localizer::{reconstruct, sanitize, segment, ContentKind};
//!
//! let content = "# Welcome\n\n- first\n- second";
//! let segmented = segment(content, ContentKind::Markdown);
//!
//! let translated: Vec<String> = segmented
//!     .fragments
//!     .iter()
//!     .map(|f| sanitize(&format!("\"\"\"{}\"\"\"", f.text), &f.text, ContentKind::Markdown))
//!     .collect();
//!
//! let output = reconstruct(&segmented.template, &translated, &segmented.fragments).unwrap();
//! assert_eq!(output, content);
//! ```

pub mod error;
pub mod fragment;
pub mod kind;
mod patterns;
pub mod reconstruct;
pub mod sanitize;
pub mod segment;
pub mod template;

pub use error::ReconstructError;
pub use fragment::{
    Alignment, Descriptor, Fragment, FragmentKind, LinePad, ListLine, ListMarker, TableRow,
    TaskLine,
};
pub use kind::{ContentKind, FileKind};
pub use reconstruct::{reconstruct, render};
pub use sanitize::sanitize;
pub use segment::{Segmented, segment};
pub use template::{Segment, Template};
