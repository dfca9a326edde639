// In: src/ffi/python.rs

use log::LevelFilter;
use pyo3::prelude::*;
use std::path::PathBuf;

use crate::config::{FailurePolicy, NcdConfig};
use crate::error::NcdError;
use crate::matrix::MatrixBuilder;
use crate::ncd::NcdCalculator;
use crate::observability;
use crate::oracle::CompressionOracle;
use crate::traits::SizeOracle;
use crate::types::Item;

/// Parses the string keyword arguments shared by every function into a validated config.
fn config_from_args(
    algorithm: &str,
    level: Option<i32>,
    metric: &str,
) -> Result<NcdConfig, NcdError> {
    let config = NcdConfig {
        algorithm: algorithm.parse()?,
        level,
        metric: metric.parse()?,
        ..Default::default()
    };
    config.validate()?;
    Ok(config)
}

//==================================================================================
// I. Stateless Functions
//==================================================================================

#[pyfunction]
#[pyo3(name = "compressed_size", signature = (data, algorithm = "zlib", level = None))]
pub fn compressed_size_py(
    py: Python,
    data: &[u8],
    algorithm: &str,
    level: Option<i32>,
) -> PyResult<usize> {
    let config = config_from_args(algorithm, level, "ncd")?;
    let oracle = CompressionOracle::from_config(&config)?;
    let size = py.allow_threads(move || oracle.compressed_size(data))?;
    Ok(size)
}

#[pyfunction]
#[pyo3(name = "ncd", signature = (a, b, algorithm = "zlib", level = None, metric = "ncd"))]
pub fn ncd_py(
    py: Python,
    a: String,
    b: String,
    algorithm: &str,
    level: Option<i32>,
    metric: &str,
) -> PyResult<f64> {
    let config = config_from_args(algorithm, level, metric)?;
    let oracle = CompressionOracle::from_config(&config)?;
    let (a, b) = (Item::Text(a), Item::Text(b));
    let value = py.allow_threads(move || {
        NcdCalculator::new(&oracle).distance(config.metric, &a, &b)
    })?;
    Ok(value)
}

/// Builds the full matrix. Returns a list of rows; failed cells (only possible with
/// `best_effort=True`) are `None`.
#[pyfunction]
#[pyo3(
    name = "build_matrix",
    signature = (
        items,
        algorithm = "zlib",
        level = None,
        metric = "ncd",
        best_effort = false,
        parallel = false
    )
)]
pub fn build_matrix_py(
    py: Python,
    items: Vec<String>,
    algorithm: &str,
    level: Option<i32>,
    metric: &str,
    best_effort: bool,
    parallel: bool,
) -> PyResult<Vec<Vec<Option<f64>>>> {
    let mut config = config_from_args(algorithm, level, metric)?;
    config.parallel = parallel;
    if best_effort {
        config.failure_policy = FailurePolicy::BestEffort;
    }
    let oracle = CompressionOracle::from_config(&config)?;
    let items: Vec<Item> = items.into_iter().map(Item::Text).collect();

    let matrix =
        py.allow_threads(move || MatrixBuilder::from_config(&oracle, &config).build(&items))?;
    Ok(matrix.rows().map(|row| row.to_vec()).collect())
}

//==================================================================================
// II. Diagnostics
//==================================================================================

#[pyfunction]
#[pyo3(name = "enable_verbose_logging", signature = (log_file = None))]
pub fn enable_verbose_logging_py(log_file: Option<String>) -> PyResult<()> {
    let path = log_file.map(PathBuf::from);
    observability::init_logging(LevelFilter::Info, path.as_deref())?;
    Ok(())
}
