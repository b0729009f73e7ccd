//! Persistence system for loading and saving region containers

pub mod chunk;
pub mod compression;
pub mod error;
pub mod lazy_chunk;
pub mod region;

pub use chunk::{Chunk, ChunkOptions};
pub use compression::{CompressionLevel, CompressionType, Compressor};
pub use error::{ChunkErrorContext, RegionError, RegionResult};
pub use lazy_chunk::{LazyChunk, RawChunk};
pub use region::{sectors_for, RegionContainer, RegionWriter};
