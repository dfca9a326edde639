//! This module contains the pure, stateless kernel for measuring Zstandard
//! compressed sizes.
//!
//! It is a safe, panic-free wrapper around the `zstd` crate's streaming encoder.
//! Single items and concatenations both go through the same streaming path, so
//! the frame layout (no content-size field) is identical for every measurement.

use std::io::Write;
use zstd::stream::Encoder;

use crate::error::NcdError;

//==================================================================================
// 1. Core Logic (The "Engine")
//==================================================================================

/// Compresses a byte slice using the Zstandard algorithm, writing to an output buffer.
fn compress_slice(
    input_bytes: &[u8],
    output_buf: &mut Vec<u8>,
    level: i32,
) -> Result<(), NcdError> {
    // We use the streaming Encoder, which writes directly to the output buffer.
    let mut encoder =
        Encoder::new(output_buf, level).map_err(|e| NcdError::ZstdError(e.to_string()))?;
    encoder
        .write_all(input_bytes)
        .map_err(|e| NcdError::ZstdError(e.to_string()))?;

    // `finish` is essential to finalize the Zstd frame.
    encoder
        .finish()
        .map_err(|e| NcdError::ZstdError(e.to_string()))?;
    Ok(())
}

//==================================================================================
// 2. Public API
//==================================================================================

/// Returns the compressed length of `input_bytes`, using `scratch` as the output
/// buffer so repeated calls reuse one allocation.
///
/// Empty input produces no frame at all and measures as zero bytes.
pub fn compressed_len(
    input_bytes: &[u8],
    level: i32,
    scratch: &mut Vec<u8>,
) -> Result<usize, NcdError> {
    if input_bytes.is_empty() {
        return Ok(0);
    }
    scratch.clear();
    compress_slice(input_bytes, scratch, level)?;
    Ok(scratch.len())
}

//==================================================================================
// 3. Unit Tests
//==================================================================================
