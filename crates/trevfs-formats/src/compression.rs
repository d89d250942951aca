//! TRE compression methods and the block inflater

use crate::error::{TreError, TreResult};
use flate2::read::ZlibDecoder;
use std::io::Read;

/// Largest inflated size accepted for a single block (1 GiB)
///
/// Sizes come straight from the container, so anything above this is
/// treated as corruption rather than allocated.
pub const MAX_INFLATED_SIZE: usize = 1024 * 1024 * 1024;

/// Compression methods recognized in TRE headers and records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum CompressionMethod {
    /// Stored verbatim (method 0)
    None = 0,
    /// `ZLib` stream (method 2)
    ZLib = 2,
}

impl CompressionMethod {
    /// Parse a method code as stored on disk
    pub fn from_u32(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::None),
            2 => Some(Self::ZLib),
            _ => None,
        }
    }

    /// Method code as stored on disk
    pub fn as_u32(self) -> u32 {
        self as u32
    }

    /// Number of source bytes a block with these sizes occupies
    ///
    /// Stored blocks always span their inflated size, whatever the deflated
    /// field says.
    pub fn consumed_size(self, deflated_size: usize, inflated_size: usize) -> usize {
        match self {
            Self::None => inflated_size,
            Self::ZLib => deflated_size,
        }
    }
}

/// Inflate one block into an owned buffer of exactly `inflated_size` bytes.
///
/// Never reads more than the block's consumed size from `source` and never
/// produces more than `inflated_size` bytes.
pub fn inflate(
    source: &[u8],
    method: u32,
    deflated_size: usize,
    inflated_size: usize,
) -> TreResult<Vec<u8>> {
    let method =
        CompressionMethod::from_u32(method).ok_or(TreError::UnsupportedCompression(method))?;

    if inflated_size > MAX_INFLATED_SIZE {
        return Err(TreError::corrupt(format!(
            "inflated size {inflated_size} exceeds limit of {MAX_INFLATED_SIZE} bytes"
        )));
    }

    let consumed = method.consumed_size(deflated_size, inflated_size);
    let input = source.get(..consumed).ok_or_else(|| {
        TreError::corrupt(format!(
            "block needs {consumed} bytes, only {} available",
            source.len()
        ))
    })?;

    if inflated_size == 0 {
        return Ok(Vec::new());
    }

    match method {
        CompressionMethod::None => Ok(input.to_vec()),
        CompressionMethod::ZLib => {
            let mut decoder = ZlibDecoder::new(input).take(inflated_size as u64 + 1);
            let mut inflated = Vec::with_capacity(inflated_size);
            decoder
                .read_to_end(&mut inflated)
                .map_err(|e| TreError::corrupt(format!("ZLib decompression failed: {e}")))?;

            if inflated.len() > inflated_size {
                return Err(TreError::corrupt(format!(
                    "ZLib stream exceeds declared size of {inflated_size} bytes"
                )));
            }
            if inflated.len() < inflated_size {
                return Err(TreError::corrupt(format!(
                    "ZLib size mismatch: expected {inflated_size}, got {}",
                    inflated.len()
                )));
            }

            Ok(inflated)
        }
    }
}

/// Compress a block with `method`, the inverse of [`inflate`]
#[cfg(any(test, feature = "test-support"))]
pub fn deflate(data: &[u8], method: CompressionMethod) -> TreResult<Vec<u8>> {
    use flate2::Compression;
    use flate2::read::ZlibEncoder;

    match method {
        CompressionMethod::None => Ok(data.to_vec()),
        CompressionMethod::ZLib => {
            let mut encoder = ZlibEncoder::new(data, Compression::default());
            let mut compressed = Vec::new();
            encoder
                .read_to_end(&mut compressed)
                .map_err(|e| TreError::corrupt(format!("ZLib compression failed: {e}")))?;
            Ok(compressed)
        }
    }
}
