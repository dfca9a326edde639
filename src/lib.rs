//! This file is the root of the `ncd_matrix` Rust crate.
//!
//! Its responsibilities are strictly limited to:
//! 1.  Declaring the top-level modules of the library (`oracle`, `ncd`, `matrix`, etc.)
//!     and re-exporting the types most callers need.
//! 2.  Defining the `#[pymodule]` which acts as the entry point when the compiled
//!     library is imported into Python (feature `python`).

//==================================================================================
// 0. Constants
//==================================================================================
/// The crate version, automatically set from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//==================================================================================
// 1. Module Declarations
//==================================================================================
#[macro_use]
pub mod observability; // Make macros available throughout the crate

pub mod bridge;
pub mod config;
pub mod error;
pub mod kernels;
pub mod matrix;
pub mod ncd;
pub mod oracle;
pub mod search;
pub mod traits;
pub mod types;

#[cfg(feature = "python")]
mod ffi;

#[doc(hidden)]
pub use log as __log;

pub use config::{
    CompressionAlgorithm, CompressionProfile, CompressorSettings, DistanceMetric, FailurePolicy,
    NcdConfig,
};
pub use error::NcdError;
pub use matrix::{DistanceMatrix, MatrixBuilder, MatrixReport, MatrixRow};
pub use ncd::{NcdBreakdown, NcdCalculator};
pub use oracle::CompressionOracle;
pub use search::{SimilarItem, SimilaritySearch};
pub use traits::SizeOracle;
pub use types::{Item, TextEncoding};

//==================================================================================
// 2. Python Module Definition
//==================================================================================
#[cfg(feature = "python")]
use pyo3::prelude::*;

/// The `ncd_matrix` Python module, containing all exposed Rust functions.
#[cfg(feature = "python")]
#[pymodule]
fn ncd_matrix(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(ffi::python::compressed_size_py, m)?)?;
    m.add_function(wrap_pyfunction!(ffi::python::ncd_py, m)?)?;
    m.add_function(wrap_pyfunction!(ffi::python::build_matrix_py, m)?)?;
    m.add_function(wrap_pyfunction!(ffi::python::enable_verbose_logging_py, m)?)?;
    m.add("__version__", VERSION)?;
    Ok(())
}
