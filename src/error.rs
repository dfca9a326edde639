// In: src/error.rs

//! This module defines the single, unified error type for the entire ncd-matrix library.
//! It uses the `thiserror` crate to provide ergonomic, context-aware error handling.

use thiserror::Error;

use crate::types::TextEncoding;

#[derive(Error, Debug)]
pub enum NcdError {
    // =========================================================================
    // === High-Level, Semantic Errors (Specific to our library's logic)
    // =========================================================================
    /// A text item holds a character that the declared encoding cannot represent.
    #[error("Item not representable as {encoding}: {character:?} at byte offset {index}")]
    Encoding {
        encoding: TextEncoding,
        index: usize,
        character: char,
    },

    /// Both items of a pair compress to zero bytes, so the distance divisor is zero.
    #[error("Degenerate pair: both items compress to zero bytes (sizes {size_a} and {size_b})")]
    DivisionByZero { size_a: usize, size_b: usize },

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Distance computation failed for pair ({row}, {col}): {source}")]
    PairFailed {
        row: usize,
        col: usize,
        #[source]
        source: Box<NcdError>,
    },

    #[error("Processing failed for item {index}: {source}")]
    ItemFailed {
        index: usize,
        #[source]
        source: Box<NcdError>,
    },

    #[error("Distance matrix is incomplete: {failed} cell(s) failed")]
    IncompleteMatrix { failed: usize },

    #[error("Internal logic error (this is a bug): {0}")]
    InternalError(String),

    // =========================================================================
    // === External Error Wrappers (Using #[from] for automatic conversion)
    // =========================================================================
    /// An error originating from the underlying I/O subsystem (e.g., file not found).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error from the Serde JSON library, typically while loading a config or
    /// serializing a matrix report.
    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    /// An error for Python FFI (Foreign Function Interface) operations.
    #[error("FFI operation failed: {0}")]
    FfiError(String), // PyErr doesn't impl Error, so we can't use #[from] here.

    // =========================================================================
    // === Low-Level Kernel Errors
    // =========================================================================
    #[error("Zstd operation failed: {0}")]
    ZstdError(String),

    #[error("Deflate operation failed: {0}")]
    DeflateError(String),

    #[error("LZ4 operation failed: {0}")]
    Lz4Error(String),
}

impl NcdError {
    /// Wraps `self` with the matrix coordinates of the pair that produced it.
    pub fn at_pair(self, row: usize, col: usize) -> Self {
        NcdError::PairFailed {
            row,
            col,
            source: Box::new(self),
        }
    }

    /// Wraps `self` with the index of the item that produced it.
    pub fn at_item(self, index: usize) -> Self {
        NcdError::ItemFailed {
            index,
            source: Box::new(self),
        }
    }

    /// Returns the innermost error, skipping any pair/item wrappers.
    pub fn root_cause(&self) -> &NcdError {
        match self {
            NcdError::PairFailed { source, .. } | NcdError::ItemFailed { source, .. } => {
                source.root_cause()
            }
            other => other,
        }
    }
}

// =============================================================================
// === Manual `From` Implementations ===
// =============================================================================

#[cfg(feature = "python")]
impl From<pyo3::PyErr> for NcdError {
    fn from(err: pyo3::PyErr) -> Self {
        NcdError::FfiError(err.to_string())
    }
}

#[cfg(feature = "python")]
impl From<NcdError> for pyo3::PyErr {
    fn from(err: NcdError) -> pyo3::PyErr {
        pyo3::exceptions::PyValueError::new_err(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_wrapper_names_the_pair() {
        let err = NcdError::DivisionByZero {
            size_a: 0,
            size_b: 0,
        }
        .at_pair(2, 5);
        let message = err.to_string();
        assert!(message.contains("(2, 5)"), "got: {}", message);
        assert!(message.contains("Degenerate pair"), "got: {}", message);
    }

    #[test]
    fn test_root_cause_unwraps_nested_wrappers() {
        let err = NcdError::Configuration("bad".into()).at_item(1).at_pair(0, 1);
        assert!(matches!(err.root_cause(), NcdError::Configuration(_)));
    }
}
