//! DEFLATE-family kernels backed by `flate2`.
//!
//! Two framings are offered: zlib (2-byte header plus Adler-32 trailer) and raw
//! DEFLATE. Both are fast and fully deterministic for a fixed level.

use std::io::Write;

use flate2::write::{DeflateEncoder, ZlibEncoder};
use flate2::Compression;

use crate::error::NcdError;

fn to_compression(level: i32) -> Result<Compression, NcdError> {
    u32::try_from(level)
        .ok()
        .filter(|l| *l <= 9)
        .map(Compression::new)
        .ok_or_else(|| NcdError::DeflateError(format!("invalid deflate level {}", level)))
}

/// Compressed length of `input_bytes` in the zlib format.
pub fn zlib_compressed_len(
    input_bytes: &[u8],
    level: i32,
    scratch: &mut Vec<u8>,
) -> Result<usize, NcdError> {
    if input_bytes.is_empty() {
        return Ok(0);
    }
    scratch.clear();
    let mut encoder = ZlibEncoder::new(scratch, to_compression(level)?);
    encoder
        .write_all(input_bytes)
        .map_err(|e| NcdError::DeflateError(e.to_string()))?;
    let out = encoder
        .finish()
        .map_err(|e| NcdError::DeflateError(e.to_string()))?;
    Ok(out.len())
}

/// Compressed length of `input_bytes` as a raw DEFLATE stream.
pub fn raw_compressed_len(
    input_bytes: &[u8],
    level: i32,
    scratch: &mut Vec<u8>,
) -> Result<usize, NcdError> {
    if input_bytes.is_empty() {
        return Ok(0);
    }
    scratch.clear();
    let mut encoder = DeflateEncoder::new(scratch, to_compression(level)?);
    encoder
        .write_all(input_bytes)
        .map_err(|e| NcdError::DeflateError(e.to_string()))?;
    let out = encoder
        .finish()
        .map_err(|e| NcdError::DeflateError(e.to_string()))?;
    Ok(out.len())
}
