use thiserror::Error;

/// Errors raised while putting translated fragments back into a template
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReconstructError {
    #[error("template has {slots} slots but {fragments} fragments were supplied")]
    SlotCountMismatch { slots: usize, fragments: usize },

    #[error("no translation supplied for fragment at position {0}")]
    MissingTranslation(usize),
}
