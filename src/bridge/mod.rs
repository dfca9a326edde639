// In: src/bridge/mod.rs

// ====================================================================================
// ARCHITECTURAL OVERVIEW: The Bridge Layer
// ====================================================================================
//
// The `bridge` is the I/O boundary around the pure distance engine. The engine only
// ever sees `&[Item]` and produces a `DistanceMatrix`; everything about files, lines,
// headers and output formats lives here.
//
// Data Flow:
//
//   1. [source]  -> Reads a delimited file (one record per line) or whole files
//         |
//         `-> Returns `Vec<Item>` in input order
//
//   2. [matrix::MatrixBuilder] -> Returns `RowIter` / `DistanceMatrix`
//
//   3. [render]  -> Writes rows as CSV lines as they arrive, or the full report as JSON
//
// ====================================================================================
pub mod render;
pub mod source;

pub use render::{to_json, write_csv, write_csv_row};
pub use source::{read_items, read_items_from_files, read_items_from_path, SourceOptions};
