//!
//! # Gdshier Errors
//!

use thiserror::Error;

use gdsio::GdsError;

/// # HierResult Type-Alias
pub type HierResult<T> = Result<T, HierError>;

/// # Hierarchy Error Enumeration
#[derive(Debug, Error)]
pub enum HierError {
    /// Requested top cell is not defined in the library
    #[error("top cell {0:?} not found in the GDS file")]
    UnknownTopCell(String),
    /// Depth bounds must be at least one
    #[error("invalid depth {0}; must be at least 1")]
    InvalidDepth(usize),
    /// GDSII reading & parsing
    #[error("reading GDS: {0}")]
    Gds(#[from] GdsError),
    /// Writing output
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Serializing the hierarchy map
    #[error("dumping hierarchy: {0}")]
    Ser(#[from] crate::ser::Error),
}
