//! Region container storage engine
//!
//! Reads and writes the sector-addressed region format: a 32x32 grid of
//! independently compressed chunk records, each holding a dense block grid
//! with nibble-packed block data and a per-column height map. Chunks are
//! kept encoded until a caller touches their blocks.

pub mod constants;
pub mod persistence;
pub mod world;

pub use persistence::{
    Chunk, ChunkOptions, CompressionType, LazyChunk, RawChunk, RegionContainer, RegionError,
    RegionResult, RegionWriter,
};
pub use world::{Block, BlockId, BlockMatrix3D, BlockPos};
