//! Region and chunk error types
//!
//! Errors that belong to a single chunk are reported as `CorruptChunkData`
//! so callers can keep working with the sibling chunks of the container.

use std::fmt::Display;

/// Result type for region and chunk operations
pub type RegionResult<T> = Result<T, RegionError>;

/// Errors that can occur while reading, mutating or writing a region
#[derive(Debug, thiserror::Error)]
pub enum RegionError {
    #[error("{axis} coordinate {value} is out of range 0..{limit}")]
    OutOfRange {
        axis: &'static str,
        value: i64,
        limit: usize,
    },

    #[error("Malformed region container: {0}")]
    MalformedContainer(String),

    #[error("Corrupt chunk data: {0}")]
    CorruptChunkData(String),

    #[error("Chunk payload of {bytes} bytes needs {sectors} sectors, at most {max} allowed")]
    ChunkTooLarge {
        bytes: usize,
        sectors: usize,
        max: usize,
    },

    #[error("Compression error: {0}")]
    Compression(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Helper trait for attaching chunk context to collaborator errors
///
/// Decompression and tag tree failures surface as `CorruptChunkData` at
/// the chunk boundary.
pub trait ChunkErrorContext<T> {
    fn chunk_context(self, context: &str) -> RegionResult<T>;
}

impl<T, E> ChunkErrorContext<T> for Result<T, E>
where
    E: Display,
{
    fn chunk_context(self, context: &str) -> RegionResult<T> {
        self.map_err(|e| RegionError::CorruptChunkData(format!("{}: {}", context, e)))
    }
}

/// Create an out of range error for a coordinate that failed a bounds check
pub fn out_of_range(axis: &'static str, value: impl Into<i64>, limit: usize) -> RegionError {
    RegionError::OutOfRange {
        axis,
        value: value.into(),
        limit,
    }
}

/// Create a malformed container error
pub fn malformed(reason: impl Into<String>) -> RegionError {
    RegionError::MalformedContainer(reason.into())
}

/// Create a corrupt chunk error
pub fn corrupt_chunk(reason: impl Into<String>) -> RegionError {
    RegionError::CorruptChunkData(reason.into())
}

/// Convert a coordinate into an index, checking `0 <= value < limit`
pub fn checked_index(axis: &'static str, value: i64, limit: usize) -> RegionResult<usize> {
    if value < 0 || value as u64 >= limit as u64 {
        return Err(out_of_range(axis, value, limit));
    }
    Ok(value as usize)
}
