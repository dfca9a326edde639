//! This module defines the shared trait at the seam between the distance formulas
//! and the compressors that feed them.

use crate::config::CompressorSettings;
use crate::error::NcdError;

/// A source of compressed sizes.
///
/// Implementations must be deterministic: the same bytes always yield the same
/// size for the lifetime of the oracle. They must not mutate shared state, which is
/// what makes the `Sync` bound sound for parallel matrix builds.
pub trait SizeOracle: Sync {
    /// Returns the compressed length of `data` in bytes.
    fn compressed_size(&self, data: &[u8]) -> Result<usize, NcdError> {
        let mut scratch = Vec::new();
        self.compressed_size_with(data, &mut scratch)
    }

    /// Same as [`SizeOracle::compressed_size`], but the caller lends an output buffer
    /// that may be reused across calls.
    fn compressed_size_with(&self, data: &[u8], scratch: &mut Vec<u8>)
        -> Result<usize, NcdError>;

    /// Compressed length of `a` immediately followed by `b`, no separator.
    ///
    /// `concat_buf` holds the concatenation and `scratch` the compressor output; both
    /// are overwritten. Reusing them across a matrix row avoids re-allocating
    /// concatenations of large items for every pair.
    fn compressed_size_concat(
        &self,
        a: &[u8],
        b: &[u8],
        concat_buf: &mut Vec<u8>,
        scratch: &mut Vec<u8>,
    ) -> Result<usize, NcdError> {
        concat_buf.clear();
        concat_buf.reserve(a.len() + b.len());
        concat_buf.extend_from_slice(a);
        concat_buf.extend_from_slice(b);
        self.compressed_size_with(concat_buf, scratch)
    }

    /// The compressor configuration behind this oracle, if it has one worth recording.
    fn settings(&self) -> Option<CompressorSettings> {
        None
    }
}

impl<T: SizeOracle + ?Sized> SizeOracle for &T {
    fn compressed_size_with(
        &self,
        data: &[u8],
        scratch: &mut Vec<u8>,
    ) -> Result<usize, NcdError> {
        (**self).compressed_size_with(data, scratch)
    }

    fn settings(&self) -> Option<CompressorSettings> {
        (**self).settings()
    }
}
