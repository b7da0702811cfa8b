//! Document templates
//!
//! A template is the source content with every fragment cut out and replaced
//! by a numbered slot. Rendering it shows the slots as `$chunk-N` placeholder
//! tokens, counted from 1.
//!
//! # Example
//!
//! ```
//! use localizer::Template;
//!
//! let mut template = Template::default();
//! template.push_literal("Title: ");
//! template.push_slot();
//! assert_eq!(template.to_string(), "Title: $chunk-1");
//!
//! let filled = template.fill(vec!["Titre".to_string()]).unwrap();
//! assert_eq!(filled, "Title: Titre");
//! ```

use crate::error::ReconstructError;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Source text kept as is
    Literal(String),
    /// Zero-based fragment position
    Slot(usize),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
    slots: usize,
}

impl Template {
    /// Append literal text, merging it with a preceding literal
    pub fn push_literal(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(Segment::Literal(last)) = self.segments.last_mut() {
            last.push_str(text);
        } else {
            self.segments.push(Segment::Literal(text.to_string()));
        }
    }

    /// Append the next slot and return its position
    pub fn push_slot(&mut self) -> usize {
        let position = self.slots;
        self.segments.push(Segment::Slot(position));
        self.slots += 1;
        position
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn slot_count(&self) -> usize {
        self.slots
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Placeholder token of a zero-based slot position
    pub fn placeholder(position: usize) -> String {
        format!("$chunk-{}", position + 1)
    }

    /// Substitute one rendered fragment into every slot
    ///
    /// # Arguments
    ///
    /// * `rendered` - Rendered fragments, indexed by position
    ///
    /// # Returns
    ///
    /// The filled document, or `SlotCountMismatch` when the number of
    /// fragments differs from the number of slots.
    pub fn fill(&self, rendered: Vec<String>) -> Result<String, ReconstructError> {
        if rendered.len() != self.slots {
            return Err(ReconstructError::SlotCountMismatch {
                slots: self.slots,
                fragments: rendered.len(),
            });
        }

        let mut output = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => output.push_str(text),
                Segment::Slot(position) => output.push_str(&rendered[*position]),
            }
        }
        Ok(output)
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => f.write_str(text)?,
                Segment::Slot(position) => f.write_str(&Template::placeholder(*position))?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders_are_one_based() {
        let mut template = Template::default();
        template.push_slot();
        template.push_literal("\n\n");
        template.push_slot();
        assert_eq!(template.to_string(), "$chunk-1\n\n$chunk-2");
        assert_eq!(template.slot_count(), 2);
    }

    #[test]
    fn test_adjacent_literals_merge() {
        let mut template = Template::default();
        template.push_literal("a");
        template.push_literal("");
        template.push_literal("b");
        assert_eq!(template.segments(), &[Segment::Literal("ab".to_string())]);
    }

    #[test]
    fn test_fill_rejects_wrong_fragment_count() {
        let mut template = Template::default();
        template.push_slot();
        let err = template.fill(vec![]).unwrap_err();
        assert_eq!(
            err,
            ReconstructError::SlotCountMismatch {
                slots: 1,
                fragments: 0
            }
        );
    }

    #[test]
    fn test_fill_places_each_fragment_once() {
        let mut template = Template::default();
        template.push_literal("<");
        template.push_slot();
        template.push_literal("|");
        template.push_slot();
        template.push_literal(">");
        let filled = template
            .fill(vec!["one".to_string(), "two".to_string()])
            .unwrap();
        assert_eq!(filled, "<one|two>");
    }
}
