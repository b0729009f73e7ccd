//! Block-level data types
//!
//! `Block` describes one voxel and `BlockMatrix3D` stores a dense grid of
//! them. Both are independent of how chunks are encoded on disk.

mod block;
mod matrix;

pub use block::{Block, BlockId, BlockPos};
pub use matrix::{BlockMatrix3D, MatrixView, MatrixViewMut};
