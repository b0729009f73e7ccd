//! Chunks that stay encoded until first touched
//!
//! A region usually holds far more chunks than a caller looks at. Keeping
//! the untouched ones as compressed bytes bounds memory; only chunks whose
//! blocks are accessed pay for decoding.

use std::borrow::Cow;

use quartz_nbt::NbtCompound;

use crate::persistence::error::{corrupt_chunk, ChunkErrorContext};
use crate::persistence::{Chunk, ChunkOptions, CompressionType, RegionResult};
use crate::world::{Block, BlockId};

/// Encoded chunk payload as stored in a region: compression tag plus the
/// compressed tag tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawChunk {
    compression: u8,
    bytes: Vec<u8>,
}

impl RawChunk {
    pub fn new(compression: u8, bytes: Vec<u8>) -> Self {
        Self { compression, bytes }
    }

    /// Compression tag byte
    pub fn compression(&self) -> u8 {
        self.compression
    }

    /// Compressed tag tree
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Value of the length prefix: compressed bytes plus the tag byte
    pub fn payload_len(&self) -> usize {
        self.bytes.len() + 1
    }

    /// Decompress and decode into a full chunk
    pub fn decode(&self, options: ChunkOptions) -> RegionResult<Chunk> {
        let compression = CompressionType::from_tag(self.compression)
            .chunk_context("Unsupported chunk compression")?;
        Chunk::from_bytes(&self.bytes, compression, options)
    }

    /// Encode a chunk with its configured compression
    pub fn encode(chunk: &Chunk) -> RegionResult<Self> {
        let compression = chunk.options().compression.tag();
        Ok(Self::new(compression, chunk.to_bytes()?))
    }
}

/// Either form of a chunk, never both
#[derive(Debug, Clone)]
enum ChunkState {
    Raw(RawChunk),
    Decoded(Box<Chunk>),
}

/// A chunk slot that decodes on first block access
#[derive(Debug, Clone)]
pub struct LazyChunk {
    state: ChunkState,
    options: ChunkOptions,
}

impl LazyChunk {
    /// Wrap encoded bytes without decoding them
    pub fn from_raw(raw: RawChunk, options: ChunkOptions) -> Self {
        Self {
            state: ChunkState::Raw(raw),
            options,
        }
    }

    /// Wrap an already decoded chunk
    pub fn from_chunk(chunk: Chunk) -> Self {
        let options = *chunk.options();
        Self {
            state: ChunkState::Decoded(Box::new(chunk)),
            options,
        }
    }

    /// Whether the decoded form is currently resident
    pub fn is_loaded(&self) -> bool {
        matches!(self.state, ChunkState::Decoded(_))
    }

    pub fn options(&self) -> &ChunkOptions {
        &self.options
    }

    /// The decoded chunk, decoding it first if necessary
    pub fn chunk(&mut self) -> RegionResult<&Chunk> {
        self.chunk_mut().map(|chunk| &*chunk)
    }

    /// Mutable access to the decoded chunk, decoding it first if necessary.
    /// A chunk that fails to decode stays raw so its bytes are not lost.
    pub fn chunk_mut(&mut self) -> RegionResult<&mut Chunk> {
        if let ChunkState::Raw(raw) = &self.state {
            let chunk = raw.decode(self.options)?;
            log::trace!("Decoded chunk ({} compressed bytes)", raw.bytes().len());
            self.state = ChunkState::Decoded(Box::new(chunk));
        }

        match &mut self.state {
            ChunkState::Decoded(chunk) => Ok(chunk.as_mut()),
            ChunkState::Raw(_) => Err(corrupt_chunk("Chunk is still raw after decoding")),
        }
    }

    pub fn get(&mut self, z: usize, x: usize, y: usize) -> RegionResult<Block> {
        self.chunk_mut()?.get(z, x, y)
    }

    pub fn get_mut(&mut self, z: usize, x: usize, y: usize) -> RegionResult<&mut Block> {
        self.chunk_mut()?.get_mut(z, x, y)
    }

    pub fn set(&mut self, z: usize, x: usize, y: usize, id: BlockId) -> RegionResult<()> {
        self.chunk_mut()?.set(z, x, y, id)
    }

    pub fn each<F>(&mut self, f: F) -> RegionResult<()>
    where
        F: FnMut(&mut Block),
    {
        self.chunk_mut()?.each(f);
        Ok(())
    }

    pub fn block_map<F>(&mut self, f: F) -> RegionResult<()>
    where
        F: FnMut(&Block) -> BlockId,
    {
        self.chunk_mut()?.block_map(f);
        Ok(())
    }

    pub fn block_type_map<F>(&mut self, f: F) -> RegionResult<()>
    where
        F: FnMut(BlockId) -> BlockId,
    {
        self.chunk_mut()?.block_type_map(f);
        Ok(())
    }

    /// Tag tree of the current contents. Decodes if needed but does not
    /// unload afterwards.
    pub fn export(&mut self) -> RegionResult<(String, NbtCompound)> {
        self.chunk_mut()?.export()
    }

    /// Current encoded form. Raw chunks are borrowed as-is; decoded chunks
    /// are freshly encoded and stay decoded.
    pub fn to_raw(&self) -> RegionResult<Cow<'_, RawChunk>> {
        match &self.state {
            ChunkState::Raw(raw) => Ok(Cow::Borrowed(raw)),
            ChunkState::Decoded(chunk) => Ok(Cow::Owned(RawChunk::encode(chunk)?)),
        }
    }

    /// Re-encode the decoded chunk and drop it. No-op when already raw.
    pub fn unload(&mut self) -> RegionResult<()> {
        if let ChunkState::Decoded(chunk) = &self.state {
            let raw = RawChunk::encode(chunk)?;
            log::trace!("Unloaded chunk into {} compressed bytes", raw.bytes().len());
            self.state = ChunkState::Raw(raw);
        }
        Ok(())
    }

    /// Check that the chunk decodes, without keeping the decoded form
    pub fn verify(&self) -> RegionResult<()> {
        match &self.state {
            ChunkState::Raw(raw) => raw.decode(self.options).map(|_| ()),
            ChunkState::Decoded(_) => Ok(()),
        }
    }
}

impl From<Chunk> for LazyChunk {
    fn from(chunk: Chunk) -> Self {
        LazyChunk::from_chunk(chunk)
    }
}
