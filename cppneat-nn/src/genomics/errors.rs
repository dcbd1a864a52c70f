use crate::Innovation;

use thiserror::Error;

/// Errors returned by gene-level operations.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum GeneError {
    /// The genome has no link with this innovation number.
    #[error("no link gene with id {0} in the genome")]
    UnknownLink(Innovation),
    /// The history never issued this link innovation number.
    #[error("link innovation {0} was never registered")]
    UnregisteredLink(Innovation),
}
