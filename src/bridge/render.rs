// In: src/bridge/render.rs

use std::io::Write;

use crate::error::NcdError;
use crate::matrix::DistanceMatrix;

/// Writes one matrix row as a CSV line. Failed cells become empty fields.
pub fn write_csv_row<W: Write>(
    writer: &mut W,
    values: &[Option<f64>],
    precision: Option<usize>,
) -> Result<(), NcdError> {
    let line = values
        .iter()
        .map(|cell| match (cell, precision) {
            (Some(v), Some(p)) => format!("{:.*}", p, v),
            (Some(v), None) => v.to_string(),
            (None, _) => String::new(),
        })
        .collect::<Vec<_>>()
        .join(",");
    writeln!(writer, "{}", line)?;
    Ok(())
}

pub fn write_csv<W: Write>(
    matrix: &DistanceMatrix,
    writer: &mut W,
    precision: Option<usize>,
) -> Result<(), NcdError> {
    for row in matrix.rows() {
        write_csv_row(writer, &row.to_vec(), precision)?;
    }
    writer.flush()?;
    Ok(())
}

/// The full report (settings, cells, failures) as pretty-printed JSON.
pub fn to_json(matrix: &DistanceMatrix) -> Result<String, NcdError> {
    Ok(serde_json::to_string_pretty(&matrix.report())?)
}
