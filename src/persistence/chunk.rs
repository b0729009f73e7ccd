//! Chunk record codec
//!
//! Converts between the tag tree form of a chunk (`Level` compound holding
//! `Blocks`, `Data` and `HeightMap` byte arrays) and a [`BlockMatrix3D`].
//! Entries of the tree that the codec does not understand are carried
//! through untouched.

use std::io::Cursor;

use quartz_nbt::io::{self as nbt_io, Flavor};
use quartz_nbt::{NbtCompound, NbtTag};
use serde::{Deserialize, Serialize};

use crate::constants::chunk::{
    BLOCKS_TAG, DATA_TAG, DEFAULT_HEIGHT, DEFAULT_LENGTH, DEFAULT_WIDTH, HEIGHT_MAP_TAG,
    LEVEL_TAG, MAX_BYTE_HEIGHT, MAX_HEIGHT, NIBBLE_MASK,
};
use crate::persistence::error::{corrupt_chunk, out_of_range, ChunkErrorContext};
use crate::persistence::{CompressionLevel, CompressionType, Compressor, RegionError, RegionResult};
use crate::world::{Block, BlockId, BlockMatrix3D};

/// Fixed extents and encoding settings shared by the chunks of a region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkOptions {
    /// Extent along x
    pub width: usize,
    /// Extent along z
    pub length: usize,
    /// Extent along y
    pub height: usize,
    /// Scheme used when a decoded chunk is encoded again
    pub compression: CompressionType,
}

impl Default for ChunkOptions {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            length: DEFAULT_LENGTH,
            height: DEFAULT_HEIGHT,
            compression: CompressionType::default(),
        }
    }
}

impl ChunkOptions {
    pub fn new(width: usize, length: usize, height: usize) -> Self {
        Self {
            width,
            length,
            height,
            ..Self::default()
        }
    }

    /// Parse options from TOML. Missing keys fall back to the defaults.
    pub fn from_toml_str(raw: &str) -> RegionResult<Self> {
        let options: ChunkOptions =
            toml::from_str(raw).map_err(|e| RegionError::Config(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> RegionResult<()> {
        if self.width == 0 || self.length == 0 || self.height == 0 {
            return Err(RegionError::Config(format!(
                "Chunk extents must be non-zero, got {}x{}x{}",
                self.width, self.length, self.height
            )));
        }
        if self.height > MAX_HEIGHT {
            return Err(RegionError::Config(format!(
                "Chunk height {} exceeds maximum {}",
                self.height, MAX_HEIGHT
            )));
        }
        Ok(())
    }

    /// Number of blocks in a chunk
    #[inline]
    pub fn volume(&self) -> usize {
        self.width * self.length * self.height
    }

    /// Number of columns, one height map entry each
    #[inline]
    pub fn area(&self) -> usize {
        self.width * self.length
    }

    /// Length of the nibble-packed data array
    #[inline]
    pub fn packed_len(&self) -> usize {
        (self.volume() + 1) / 2
    }
}

/// A fully decoded chunk
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    name: String,
    root: NbtCompound,
    blocks: BlockMatrix3D,
    options: ChunkOptions,
}

impl Chunk {
    /// An all-air chunk with an otherwise empty `Level` compound
    pub fn new(options: ChunkOptions) -> Self {
        let mut root = NbtCompound::new();
        root.insert(LEVEL_TAG, NbtCompound::new());

        Self {
            name: String::new(),
            root,
            blocks: BlockMatrix3D::new(options.width, options.length, options.height),
            options,
        }
    }

    /// Decode a chunk from its tag tree
    pub fn from_nbt(name: String, root: NbtCompound, options: ChunkOptions) -> RegionResult<Self> {
        let blocks = {
            let level = root
                .get::<_, &NbtCompound>(LEVEL_TAG)
                .chunk_context("Missing Level compound")?;
            let ids = level
                .get::<_, &[u8]>(BLOCKS_TAG)
                .chunk_context("Missing Blocks array")?;
            let data = level
                .get::<_, &[u8]>(DATA_TAG)
                .chunk_context("Missing Data array")?;

            if ids.len() != options.volume() {
                return Err(corrupt_chunk(format!(
                    "Blocks array has {} entries, expected {}",
                    ids.len(),
                    options.volume()
                )));
            }
            if data.len() != options.packed_len() {
                return Err(corrupt_chunk(format!(
                    "Data array has {} entries, expected {}",
                    data.len(),
                    options.packed_len()
                )));
            }

            let mut index = 0;
            BlockMatrix3D::from_fn(options.width, options.length, options.height, |_| {
                let block = (BlockId(ids[index]), unpack_nibble(data, index));
                index += 1;
                block
            })
        };

        Ok(Self {
            name,
            root,
            blocks,
            options,
        })
    }

    /// Decompress and decode a chunk payload
    pub fn from_bytes(
        bytes: &[u8],
        compression: CompressionType,
        options: ChunkOptions,
    ) -> RegionResult<Self> {
        let compressor = Compressor::new(compression, CompressionLevel::Default);
        let decompressed = compressor
            .decompress(bytes)
            .chunk_context("Failed to decompress chunk")?;
        let (root, name) = nbt_io::read_nbt(&mut Cursor::new(decompressed), Flavor::Uncompressed)
            .chunk_context("Failed to parse chunk tag tree")?;

        Self::from_nbt(name, root, options)
    }

    /// Encode the current blocks back into a tag tree, recomputing the
    /// height map. Unrelated entries of the decoded tree are kept.
    pub fn export(&self) -> RegionResult<(String, NbtCompound)> {
        let ids: Vec<u8> = self.blocks.iter().map(|b| b.id().0).collect();
        let data = pack_nibbles(self.blocks.as_slice());
        let heights = self.height_map();

        let mut root = self.root.clone();
        let level = root
            .get_mut::<_, &mut NbtCompound>(LEVEL_TAG)
            .chunk_context("Missing Level compound")?;

        let int_height_map = self.options.height > MAX_BYTE_HEIGHT
            || matches!(level.inner().get(HEIGHT_MAP_TAG), Some(NbtTag::IntArray(_)));
        let height_map = if int_height_map {
            NbtTag::IntArray(heights.iter().map(|&h| h as i32).collect())
        } else {
            NbtTag::from(heights.iter().map(|&h| h as u8).collect::<Vec<u8>>())
        };

        level.insert(HEIGHT_MAP_TAG, height_map);
        level.insert(BLOCKS_TAG, ids);
        level.insert(DATA_TAG, data);

        Ok((self.name.clone(), root))
    }

    /// Encode and compress with the configured scheme
    pub fn to_bytes(&self) -> RegionResult<Vec<u8>> {
        let (name, root) = self.export()?;
        let mut serialized = Vec::new();
        nbt_io::write_nbt(&mut serialized, Some(&name), &root, Flavor::Uncompressed)
            .map_err(|e| RegionError::Compression(format!("Failed to write chunk tag tree: {}", e)))?;

        Compressor::new(self.options.compression, CompressionLevel::Default).compress(&serialized)
    }

    /// One entry per column in `z * width + x` order: one past the highest
    /// non-air block, 0 for an all-air column
    pub fn height_map(&self) -> Vec<u32> {
        let mut heights = Vec::with_capacity(self.options.area());
        for z in 0..self.blocks.length() {
            for x in 0..self.blocks.width() {
                let height = self
                    .blocks
                    .column(z, x)
                    .and_then(|column| column.iter().rposition(|b| !b.is_air()))
                    .map_or(0, |y| y as u32 + 1);
                heights.push(height);
            }
        }
        heights
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> &ChunkOptions {
        &self.options
    }

    pub fn blocks(&self) -> &BlockMatrix3D {
        &self.blocks
    }

    pub fn blocks_mut(&mut self) -> &mut BlockMatrix3D {
        &mut self.blocks
    }

    pub fn get(&self, z: usize, x: usize, y: usize) -> RegionResult<Block> {
        self.blocks
            .get(z, x, y)
            .copied()
            .ok_or_else(|| bounds_error(&self.blocks, z, x, y))
    }

    pub fn get_mut(&mut self, z: usize, x: usize, y: usize) -> RegionResult<&mut Block> {
        if !self.blocks.contains(z, x, y) {
            return Err(bounds_error(&self.blocks, z, x, y));
        }
        self.blocks
            .get_mut(z, x, y)
            .ok_or_else(|| corrupt_chunk("Block matrix lost a position"))
    }

    /// Replace the type of the block at `[z][x][y]`
    pub fn set(&mut self, z: usize, x: usize, y: usize, id: BlockId) -> RegionResult<()> {
        self.get_mut(z, x, y)?.set_id(id);
        Ok(())
    }

    /// Visit every block in scan order with full mutable access
    pub fn each<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut Block),
    {
        for block in self.blocks.iter_mut() {
            f(block);
        }
    }

    /// Replace every block's type with what `f` returns. The visitor sees
    /// position and current type but cannot change anything else.
    pub fn block_map<F>(&mut self, mut f: F)
    where
        F: FnMut(&Block) -> BlockId,
    {
        for block in self.blocks.iter_mut() {
            let id = f(block);
            block.set_id(id);
        }
    }

    /// Type-only remap
    pub fn block_type_map<F>(&mut self, mut f: F)
    where
        F: FnMut(BlockId) -> BlockId,
    {
        for block in self.blocks.iter_mut() {
            block.set_id(f(block.id()));
        }
    }
}

/// Name the first axis that is out of range
fn bounds_error(blocks: &BlockMatrix3D, z: usize, x: usize, y: usize) -> RegionError {
    if z >= blocks.length() {
        out_of_range("z", z as i64, blocks.length())
    } else if x >= blocks.width() {
        out_of_range("x", x as i64, blocks.width())
    } else {
        out_of_range("y", y as i64, blocks.height())
    }
}

/// Even-indexed blocks use the low nibble, odd-indexed ones the high nibble
#[inline]
fn unpack_nibble(packed: &[u8], index: usize) -> u8 {
    let byte = packed[index / 2];
    if index % 2 == 0 {
        byte & NIBBLE_MASK
    } else {
        byte >> 4
    }
}

fn pack_nibbles(blocks: &[Block]) -> Vec<u8> {
    blocks
        .chunks(2)
        .map(|pair| {
            let low = pair[0].data();
            let high = pair.get(1).map_or(0, |b| b.data());
            (high << 4) | low
        })
        .collect()
}
