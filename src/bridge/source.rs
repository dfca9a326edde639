// In: src/bridge/source.rs

//! Item sources.
//!
//! A delimited file yields one text item per record. A record ends at a newline
//! outside double quotes, so a quoted field may span lines. The record is kept as its
//! raw text, fields in file order with the original delimiter and quotes; no field
//! splitting is applied.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::NcdError;
use crate::types::{Item, TextEncoding};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceOptions {
    /// Skip the first record.
    pub has_header: bool,
    /// How record bytes are decoded into text.
    pub encoding: TextEncoding,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            has_header: true,
            encoding: TextEncoding::default(),
        }
    }
}

/// Splits `data` into records at newlines that are not inside a quoted field.
/// A trailing `\r` is removed from each record.
fn split_records(data: &[u8]) -> Vec<&[u8]> {
    let mut records = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    for (i, &byte) in data.iter().enumerate() {
        match byte {
            // An escaped `""` toggles twice, leaving the state unchanged.
            b'"' => in_quotes = !in_quotes,
            b'\n' if !in_quotes => {
                records.push(&data[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if in_quotes {
        log::warn!("Unterminated quoted field; the last record runs to end of input");
    }
    if start < data.len() {
        records.push(&data[start..]);
    }
    records
        .into_iter()
        .map(|record| record.strip_suffix(b"\r").unwrap_or(record))
        .collect()
}

/// Reads one `Item::Text` per non-empty record.
///
/// A record that is not valid in `options.encoding` fails with
/// [`NcdError::ItemFailed`] carrying the index the item would have had.
pub fn read_items<R: Read>(mut reader: R, options: &SourceOptions) -> Result<Vec<Item>, NcdError> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;

    let mut records = split_records(&data).into_iter();
    if options.has_header {
        if let Some(header) = records.next() {
            log::debug!("Skipping header: {}", String::from_utf8_lossy(header));
        }
    }

    let mut items = Vec::new();
    for record in records.filter(|r| !r.is_empty()) {
        let text = options
            .encoding
            .decode(record)
            .map_err(|e| e.at_item(items.len()))?;
        items.push(Item::Text(text.into_owned()));
    }
    log::info!("Read {} items", items.len());
    Ok(items)
}

pub fn read_items_from_path(
    path: impl AsRef<Path>,
    options: &SourceOptions,
) -> Result<Vec<Item>, NcdError> {
    let file = File::open(path.as_ref())?;
    read_items(BufReader::new(file), options)
}

/// Loads each file as a single `Item::Bytes`, in the order given.
pub fn read_items_from_files<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<Item>, NcdError> {
    paths
        .iter()
        .map(|path| -> Result<Item, NcdError> {
            let bytes = std::fs::read(path.as_ref())?;
            log::debug!("{}: {} bytes", path.as_ref().display(), bytes.len());
            Ok(Item::Bytes(bytes))
        })
        .collect()
}
