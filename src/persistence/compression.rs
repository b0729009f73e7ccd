use std::io::{Read, Write};
use flate2::Compression as FlateCompression;
use flate2::read::{GzDecoder, ZlibDecoder};
use flate2::write::{GzEncoder, ZlibEncoder};
use serde::{Deserialize, Serialize};

use crate::constants::region::DEFAULT_COMPRESSION_TAG;
use crate::persistence::{RegionError, RegionResult};

/// Compression schemes a chunk payload can be stored with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionType {
    /// Gzip stream (tag 1)
    Gzip,
    /// Zlib stream (tag 2), the default
    Zlib,
    /// Stored as-is (tag 3)
    Uncompressed,
}

impl Default for CompressionType {
    fn default() -> Self {
        CompressionType::Zlib
    }
}

impl CompressionType {
    /// The single byte written in front of each chunk payload
    pub fn tag(self) -> u8 {
        match self {
            CompressionType::Gzip => 1,
            CompressionType::Zlib => DEFAULT_COMPRESSION_TAG,
            CompressionType::Uncompressed => 3,
        }
    }

    pub fn from_tag(tag: u8) -> RegionResult<Self> {
        match tag {
            1 => Ok(CompressionType::Gzip),
            DEFAULT_COMPRESSION_TAG => Ok(CompressionType::Zlib),
            3 => Ok(CompressionType::Uncompressed),
            other => Err(RegionError::Compression(format!(
                "Unknown compression tag: {}",
                other
            ))),
        }
    }
}

/// Compression level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionLevel {
    Fast,
    #[default]
    Default,
    Best,
}

impl CompressionLevel {
    fn to_flate2(self) -> FlateCompression {
        match self {
            CompressionLevel::Fast => FlateCompression::fast(),
            CompressionLevel::Default => FlateCompression::default(),
            CompressionLevel::Best => FlateCompression::best(),
        }
    }
}

/// Handles compression and decompression of chunk payloads
#[derive(Debug, Clone, Copy)]
pub struct Compressor {
    compression_type: CompressionType,
    compression_level: CompressionLevel,
}

impl Compressor {
    /// Create a new compressor
    pub fn new(compression_type: CompressionType, compression_level: CompressionLevel) -> Self {
        Self {
            compression_type,
            compression_level,
        }
    }

    /// Compressor for the scheme identified by a payload's tag byte
    pub fn for_tag(tag: u8) -> RegionResult<Self> {
        Ok(Self::new(CompressionType::from_tag(tag)?, CompressionLevel::Default))
    }

    pub fn compression_type(&self) -> CompressionType {
        self.compression_type
    }

    /// Compress data
    pub fn compress(&self, data: &[u8]) -> RegionResult<Vec<u8>> {
        match self.compression_type {
            CompressionType::Uncompressed => Ok(data.to_vec()),
            CompressionType::Gzip => self.compress_gzip(data),
            CompressionType::Zlib => self.compress_zlib(data),
        }
    }

    /// Decompress data
    pub fn decompress(&self, data: &[u8]) -> RegionResult<Vec<u8>> {
        match self.compression_type {
            CompressionType::Uncompressed => Ok(data.to_vec()),
            CompressionType::Gzip => self.decompress_gzip(data),
            CompressionType::Zlib => self.decompress_zlib(data),
        }
    }

    fn compress_gzip(&self, data: &[u8]) -> RegionResult<Vec<u8>> {
        let mut encoder = GzEncoder::new(Vec::new(), self.compression_level.to_flate2());
        encoder.write_all(data)
            .map_err(|e| RegionError::Compression(format!("Gzip compression failed: {}", e)))?;
        encoder.finish()
            .map_err(|e| RegionError::Compression(format!("Gzip finalization failed: {}", e)))
    }

    fn decompress_gzip(&self, data: &[u8]) -> RegionResult<Vec<u8>> {
        let mut decoder = GzDecoder::new(data);
        let mut decompressed = Vec::new();
        decoder.read_to_end(&mut decompressed)
            .map_err(|e| RegionError::Compression(format!("Gzip decompression failed: {}", e)))?;
        Ok(decompressed)
    }

    fn compress_zlib(&self, data: &[u8]) -> RegionResult<Vec<u8>> {
        let mut encoder = ZlibEncoder::new(Vec::new(), self.compression_level.to_flate2());
        encoder.write_all(data)
            .map_err(|e| RegionError::Compression(format!("Zlib compression failed: {}", e)))?;
        encoder.finish()
            .map_err(|e| RegionError::Compression(format!("Zlib finalization failed: {}", e)))
    }

    fn decompress_zlib(&self, data: &[u8]) -> RegionResult<Vec<u8>> {
        let mut decoder = ZlibDecoder::new(data);
        let mut decompressed = Vec::new();
        decoder.read_to_end(&mut decompressed)
            .map_err(|e| RegionError::Compression(format!("Zlib decompression failed: {}", e)))?;
        Ok(decompressed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compression_types() {
        let data = b"Hello, World! This is a test of compression. This is a test of compression.";

        for &compression_type in &[CompressionType::Gzip, CompressionType::Zlib] {
            let compressor = Compressor::new(compression_type, CompressionLevel::Default);

            let compressed = compressor.compress(data).expect("Compression should succeed");
            let decompressed = compressor.decompress(&compressed).expect("Decompression should succeed");

            assert_eq!(data.to_vec(), decompressed);
            assert!(compressed.len() < data.len());
        }
    }

    #[test]
    fn test_tags() {
        assert_eq!(CompressionType::default().tag(), 2);
        for tag in 1..=3u8 {
            let compression = CompressionType::from_tag(tag).expect("known tag");
            assert_eq!(compression.tag(), tag);
        }
        assert!(matches!(
            CompressionType::from_tag(4),
            Err(RegionError::Compression(_))
        ));
        assert!(Compressor::for_tag(0).is_err());
    }

    #[test]
    fn test_garbage_does_not_decompress() {
        let compressor = Compressor::new(CompressionType::Zlib, CompressionLevel::Default);
        assert!(compressor.decompress(&[0xde, 0xad, 0xbe, 0xef]).is_err());
    }
}
