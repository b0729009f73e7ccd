//! Region container codec
//!
//! A region is a 32x32 grid of optional chunks stored in 4096-byte sectors.
//! Sector 0 is the offset table (3-byte big-endian sector index plus 1-byte
//! sector count per slot, row-major `z * 32 + x`), sector 1 the timestamp
//! table. Each chunk payload starts with a 4-byte big-endian length covering
//! the compression tag and the compressed bytes, and is padded with zeros up
//! to the next sector boundary.

use std::borrow::Cow;
use std::io::Write;

use crate::constants::region::{
    CHUNK_METADATA_SIZE, DEFAULT_COMPRESSION_TAG, DUMMY_TIMESTAMP, HEADER_SECTORS, HEADER_SIZE,
    LENGTH_PREFIX_SIZE, MAX_SECTORS_PER_CHUNK, MAX_SECTOR_INDEX, OFFSET_ENTRY_SIZE, REGION_CHUNKS, REGION_WIDTH,
    SECTOR_SIZE, TIMESTAMP_ENTRY_SIZE,
};
use crate::persistence::error::{checked_index, corrupt_chunk, malformed, out_of_range};
use crate::persistence::{ChunkOptions, LazyChunk, RawChunk, RegionError, RegionResult};
use crate::world::{Block, BlockPos};

/// Number of sectors a payload of `compressed_len` bytes occupies
pub fn sectors_for(compressed_len: usize) -> usize {
    (compressed_len + CHUNK_METADATA_SIZE + SECTOR_SIZE - 1) / SECTOR_SIZE
}

/// Output sink for region bytes: sequential writes plus zero padding
pub struct RegionWriter<W: Write> {
    inner: W,
    written: usize,
}

impl<W: Write> RegionWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, written: 0 }
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> RegionResult<()> {
        self.inner.write_all(bytes)?;
        self.written += bytes.len();
        Ok(())
    }

    /// Write `count` copies of `filler`
    pub fn pad(&mut self, count: usize, filler: u8) -> RegionResult<()> {
        const PAD_CHUNK: usize = 512;
        let block = [filler; PAD_CHUNK];
        let mut remaining = count;
        while remaining > 0 {
            let n = remaining.min(PAD_CHUNK);
            self.write_bytes(&block[..n])?;
            remaining -= n;
        }
        Ok(())
    }

    /// Pad with zeros up to the next sector boundary
    pub fn pad_to_sector(&mut self) -> RegionResult<()> {
        let remainder = self.written % SECTOR_SIZE;
        if remainder != 0 {
            self.pad(SECTOR_SIZE - remainder, 0)?;
        }
        Ok(())
    }

    /// Bytes written so far
    pub fn position(&self) -> usize {
        self.written
    }

    pub fn finish(mut self) -> RegionResult<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

/// Where one chunk lives in the exported layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SectorEntry {
    index: usize,
    count: usize,
}

/// One slot of the grid
#[derive(Debug, Clone, Default)]
struct Slot {
    chunk: Option<LazyChunk>,
    timestamp: u32,
}

/// A 32x32 grid of lazily decoded chunks
#[derive(Debug, Clone)]
pub struct RegionContainer {
    slots: Vec<Slot>,
    options: ChunkOptions,
}

impl Default for RegionContainer {
    fn default() -> Self {
        Self::new(ChunkOptions::default())
    }
}

impl RegionContainer {
    /// An empty region whose chunks use `options`
    pub fn new(options: ChunkOptions) -> Self {
        Self {
            slots: vec![Slot::default(); REGION_CHUNKS],
            options,
        }
    }

    /// Parse a region with the default chunk options
    pub fn load(bytes: &[u8]) -> RegionResult<Self> {
        Self::load_with_options(bytes, ChunkOptions::default())
    }

    /// Parse the offset table and keep every present chunk in raw form.
    /// An empty buffer is an empty region.
    pub fn load_with_options(bytes: &[u8], options: ChunkOptions) -> RegionResult<Self> {
        options.validate()?;
        let mut region = Self::new(options);
        if bytes.is_empty() {
            return Ok(region);
        }
        if bytes.len() < HEADER_SIZE {
            return Err(malformed(format!(
                "Region of {} bytes is smaller than its {} byte header",
                bytes.len(),
                HEADER_SIZE
            )));
        }

        let offsets = &bytes[..SECTOR_SIZE];
        let timestamps = &bytes[SECTOR_SIZE..HEADER_SIZE];

        for (i, slot) in region.slots.iter_mut().enumerate() {
            let entry = &offsets[i * OFFSET_ENTRY_SIZE..(i + 1) * OFFSET_ENTRY_SIZE];
            let sector_index = u32::from_be_bytes([0, entry[0], entry[1], entry[2]]) as usize;
            let sector_count = entry[3] as usize;
            // Sector index 0 marks an absent slot whatever the count says
            if sector_count == 0 || sector_index == 0 {
                continue;
            }

            let raw = read_chunk(bytes, i, sector_index, sector_count)?;
            let ts = &timestamps[i * TIMESTAMP_ENTRY_SIZE..(i + 1) * TIMESTAMP_ENTRY_SIZE];
            slot.timestamp = u32::from_be_bytes([ts[0], ts[1], ts[2], ts[3]]);
            slot.chunk = Some(LazyChunk::from_raw(raw, options));
        }

        log::debug!(
            "Loaded region of {} bytes with {} chunks",
            bytes.len(),
            region.occupied_count()
        );
        Ok(region)
    }

    pub fn options(&self) -> &ChunkOptions {
        &self.options
    }

    fn slot_index(z: i32, x: i32) -> RegionResult<usize> {
        let z = checked_index("z", z as i64, REGION_WIDTH)?;
        let x = checked_index("x", x as i64, REGION_WIDTH)?;
        Ok(z * REGION_WIDTH + x)
    }

    /// The chunk at grid position `(z, x)`, `None` if the slot is absent
    pub fn chunk(&self, z: i32, x: i32) -> RegionResult<Option<&LazyChunk>> {
        let i = Self::slot_index(z, x)?;
        Ok(self.slots[i].chunk.as_ref())
    }

    pub fn chunk_mut(&mut self, z: i32, x: i32) -> RegionResult<Option<&mut LazyChunk>> {
        let i = Self::slot_index(z, x)?;
        Ok(self.slots[i].chunk.as_mut())
    }

    /// Put a chunk into a slot, returning what was there
    pub fn insert_chunk(
        &mut self,
        z: i32,
        x: i32,
        chunk: impl Into<LazyChunk>,
    ) -> RegionResult<Option<LazyChunk>> {
        let i = Self::slot_index(z, x)?;
        Ok(self.slots[i].chunk.replace(chunk.into()))
    }

    /// Make a slot absent, returning its chunk
    pub fn remove_chunk(&mut self, z: i32, x: i32) -> RegionResult<Option<LazyChunk>> {
        let i = Self::slot_index(z, x)?;
        self.slots[i].timestamp = DUMMY_TIMESTAMP;
        Ok(self.slots[i].chunk.take())
    }

    /// Return a chunk to its raw form. Absent slots are left alone.
    pub fn unload_chunk(&mut self, z: i32, x: i32) -> RegionResult<()> {
        match self.chunk_mut(z, x)? {
            Some(chunk) => chunk.unload(),
            None => Ok(()),
        }
    }

    pub fn unload_all(&mut self) -> RegionResult<()> {
        for (_, chunk) in self.iter_mut() {
            chunk.unload()?;
        }
        Ok(())
    }

    /// Opaque timestamp stored for a slot
    pub fn timestamp(&self, z: i32, x: i32) -> RegionResult<u32> {
        let i = Self::slot_index(z, x)?;
        Ok(self.slots[i].timestamp)
    }

    pub fn occupied_count(&self) -> usize {
        self.slots.iter().filter(|s| s.chunk.is_some()).count()
    }

    /// Occupied slots in row-major order with their `(z, x)` position
    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), &LazyChunk)> {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            slot.chunk
                .as_ref()
                .map(|chunk| ((i / REGION_WIDTH, i % REGION_WIDTH), chunk))
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = ((usize, usize), &mut LazyChunk)> {
        self.slots.iter_mut().enumerate().filter_map(|(i, slot)| {
            slot.chunk
                .as_mut()
                .map(|chunk| ((i / REGION_WIDTH, i % REGION_WIDTH), chunk))
        })
    }

    /// One line per grid row, `X` for an occupied slot and `?` for an
    /// absent one
    pub fn chunk_occupancy_map(&self) -> String {
        let mut map = String::with_capacity(REGION_CHUNKS + REGION_WIDTH);
        for (row, line) in self.slots.chunks(REGION_WIDTH).enumerate() {
            if row > 0 {
                map.push('\n');
            }
            for slot in line {
                map.push(if slot.chunk.is_some() { 'X' } else { '?' });
            }
        }
        map
    }

    /// Try to decode every raw chunk without keeping the result.
    /// Returns the slots that fail, leaving every chunk in place.
    pub fn verify_chunks(&self) -> Vec<((usize, usize), RegionError)> {
        let mut failures = Vec::new();
        for (pos, chunk) in self.iter() {
            if let Err(e) = chunk.verify() {
                log::warn!("Chunk at {:?} does not decode: {}", pos, e);
                failures.push((pos, e));
            }
        }
        failures
    }

    /// Visit every block of a region-local box spanning one or more chunks.
    ///
    /// `origin` and `extents` are in region block coordinates
    /// (`z` and `x` across chunks, `y` within the chunk height). Absent
    /// chunks are skipped; touched chunks stay decoded. Every touched chunk
    /// is decoded before the visitor runs, so a corrupt chunk fails the call
    /// without any block having changed.
    pub fn cube<F>(
        &mut self,
        origin: BlockPos,
        extents: (usize, usize, usize),
        mut f: F,
    ) -> RegionResult<()>
    where
        F: FnMut(BlockPos, &mut Block),
    {
        let (width, length, height) = extents;
        let (cw, cl, ch) = (self.options.width, self.options.length, self.options.height);
        let (x0, y0, z0) = (origin.x as usize, origin.y as usize, origin.z as usize);

        let x1 = span_end("x", x0, width, cw * REGION_WIDTH)?;
        let z1 = span_end("z", z0, length, cl * REGION_WIDTH)?;
        span_end("y", y0, height, ch)?;
        if width == 0 || length == 0 || height == 0 {
            return Ok(());
        }

        let chunk_xs = x0 / cw..=(x1 - 1) / cw;
        let chunk_zs = z0 / cl..=(z1 - 1) / cl;

        // Decode every touched chunk first so a corrupt one leaves all blocks untouched
        for chunk_x in chunk_xs.clone() {
            for chunk_z in chunk_zs.clone() {
                if let Some(chunk) = self.slots[chunk_z * REGION_WIDTH + chunk_x].chunk.as_mut() {
                    chunk.chunk_mut()?;
                }
            }
        }

        for chunk_x in chunk_xs {
            for chunk_z in chunk_zs.clone() {
                let slot = &mut self.slots[chunk_z * REGION_WIDTH + chunk_x];
                let chunk = match slot.chunk.as_mut() {
                    Some(chunk) => chunk.chunk_mut()?,
                    None => continue,
                };

                // Intersection of the box with this chunk, in chunk-local coordinates
                let base_x = chunk_x * cw;
                let base_z = chunk_z * cl;
                let local_x = x0.max(base_x) - base_x;
                let local_z = z0.max(base_z) - base_z;
                let span_x = x1.min(base_x + cw) - base_x - local_x;
                let span_z = z1.min(base_z + cl) - base_z - local_z;

                let window_origin = BlockPos::new(local_x as u32, y0 as u32, local_z as u32);
                let mut view = chunk
                    .blocks_mut()
                    .view_mut(window_origin, (span_x, span_z, height))
                    .ok_or_else(|| corrupt_chunk("Chunk extents do not match the region options"))?;
                view.for_each_mut(|block| {
                    let pos = block.pos();
                    let region_pos = BlockPos::new(
                        pos.x + base_x as u32,
                        pos.y,
                        pos.z + base_z as u32,
                    );
                    f(region_pos, block);
                });
            }
        }
        Ok(())
    }

    /// Encode the whole grid into `writer`. Decoded chunks are encoded but
    /// stay decoded.
    pub fn export_to<W: Write>(&self, writer: W) -> RegionResult<W> {
        let mut chunks: Vec<Option<Cow<'_, RawChunk>>> = Vec::with_capacity(REGION_CHUNKS);
        for slot in &self.slots {
            chunks.push(match &slot.chunk {
                Some(chunk) => Some(chunk.to_raw()?),
                None => None,
            });
        }

        let layout = plan_sectors(&chunks)?;
        let mut output = RegionWriter::new(writer);

        for entry in &layout {
            match entry {
                Some(entry) => {
                    let index = (entry.index as u32).to_be_bytes();
                    output.write_bytes(&index[1..])?;
                    output.write_bytes(&[entry.count as u8])?;
                }
                None => output.pad(OFFSET_ENTRY_SIZE, 0)?,
            }
        }

        for (slot, chunk) in self.slots.iter().zip(&chunks) {
            let timestamp = if chunk.is_some() { slot.timestamp } else { DUMMY_TIMESTAMP };
            output.write_bytes(&timestamp.to_be_bytes())?;
        }

        for raw in chunks.iter().flatten() {
            output.write_bytes(&(raw.payload_len() as u32).to_be_bytes())?;
            output.write_bytes(&[raw.compression()])?;
            output.write_bytes(raw.bytes())?;
            output.pad_to_sector()?;
        }

        log::debug!(
            "Exported region with {} chunks in {} bytes",
            chunks.iter().flatten().count(),
            output.position()
        );
        output.finish()
    }

    /// Encode the whole grid into a byte vector
    pub fn to_bytes(&self) -> RegionResult<Vec<u8>> {
        self.export_to(Vec::new())
    }
}

/// Exclusive end of `start..start + extent`, checked against `limit`
fn span_end(axis: &'static str, start: usize, extent: usize, limit: usize) -> RegionResult<usize> {
    match start.checked_add(extent) {
        Some(end) if end <= limit => Ok(end),
        Some(end) => Err(out_of_range(axis, i64::try_from(end).unwrap_or(i64::MAX), limit)),
        None => Err(out_of_range(axis, i64::MAX, limit)),
    }
}

/// Slice one chunk payload out of the region bytes
fn read_chunk(
    bytes: &[u8],
    slot: usize,
    sector_index: usize,
    sector_count: usize,
) -> RegionResult<RawChunk> {
    if sector_index < HEADER_SECTORS {
        return Err(malformed(format!(
            "Slot {} points into the header (sector {})",
            slot, sector_index
        )));
    }

    let start = sector_index * SECTOR_SIZE;
    let end = start + sector_count * SECTOR_SIZE;
    if start + CHUNK_METADATA_SIZE > bytes.len() {
        return Err(malformed(format!(
            "Slot {} starts at byte {} past the end of the {} byte region",
            slot,
            start,
            bytes.len()
        )));
    }

    let prefix = &bytes[start..start + LENGTH_PREFIX_SIZE];
    let length = u32::from_be_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]) as usize;
    if length == 0 {
        return Err(malformed(format!("Slot {} has a zero length prefix", slot)));
    }

    let payload_end = start + LENGTH_PREFIX_SIZE + length;
    if payload_end > end {
        return Err(malformed(format!(
            "Slot {} declares {} bytes but only has {} sectors",
            slot, length, sector_count
        )));
    }
    if payload_end > bytes.len() {
        return Err(malformed(format!(
            "Slot {} payload ends at byte {} past the end of the {} byte region",
            slot,
            payload_end,
            bytes.len()
        )));
    }

    let compression = bytes[start + LENGTH_PREFIX_SIZE];
    if compression != DEFAULT_COMPRESSION_TAG {
        log::warn!("Slot {} uses compression tag {}", slot, compression);
    }
    let data = bytes[start + CHUNK_METADATA_SIZE..payload_end].to_vec();
    Ok(RawChunk::new(compression, data))
}

/// Assign sectors to the occupied slots in grid order, starting right after
/// the header
fn plan_sectors(chunks: &[Option<Cow<'_, RawChunk>>]) -> RegionResult<Vec<Option<SectorEntry>>> {
    let mut next_sector = HEADER_SECTORS;
    let mut layout = Vec::with_capacity(chunks.len());

    for chunk in chunks {
        let entry = match chunk {
            Some(raw) => {
                let count = sectors_for(raw.bytes().len());
                if count > MAX_SECTORS_PER_CHUNK {
                    return Err(RegionError::ChunkTooLarge {
                        bytes: raw.bytes().len(),
                        sectors: count,
                        max: MAX_SECTORS_PER_CHUNK,
                    });
                }
                if next_sector > MAX_SECTOR_INDEX {
                    return Err(malformed(format!(
                        "Sector index {} does not fit the offset table",
                        next_sector
                    )));
                }

                let entry = SectorEntry {
                    index: next_sector,
                    count,
                };
                next_sector += count;
                Some(entry)
            }
            None => None,
        };
        layout.push(entry);
    }

    Ok(layout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::Chunk;
    use crate::world::BlockId;

    fn options() -> ChunkOptions {
        ChunkOptions::new(2, 2, 8)
    }

    fn filled_chunk(id: BlockId) -> Chunk {
        let mut chunk = Chunk::new(options());
        chunk.block_type_map(|_| id);
        chunk
    }

    fn header_entry(bytes: &[u8], slot: usize) -> (usize, usize) {
        let e = &bytes[slot * 4..slot * 4 + 4];
        (u32::from_be_bytes([0, e[0], e[1], e[2]]) as usize, e[3] as usize)
    }

    #[test]
    fn test_sector_count() {
        assert_eq!(sectors_for(1), 1);
        assert_eq!(sectors_for(SECTOR_SIZE - CHUNK_METADATA_SIZE), 1);
        assert_eq!(sectors_for(SECTOR_SIZE - CHUNK_METADATA_SIZE + 1), 2);
        assert_eq!(sectors_for(3 * SECTOR_SIZE), 4);
    }

    #[test]
    fn test_writer_padding() {
        let mut writer = RegionWriter::new(Vec::new());
        writer.write_bytes(&[1, 2, 3]).expect("write");
        writer.pad_to_sector().expect("pad");
        assert_eq!(writer.position(), SECTOR_SIZE);
        writer.pad_to_sector().expect("pad");
        assert_eq!(writer.position(), SECTOR_SIZE);
        writer.pad(3, 7).expect("pad");

        let bytes = writer.finish().expect("finish");
        assert_eq!(bytes.len(), SECTOR_SIZE + 3);
        assert_eq!(&bytes[..3], &[1, 2, 3]);
        assert!(bytes[3..SECTOR_SIZE].iter().all(|&b| b == 0));
        assert_eq!(&bytes[SECTOR_SIZE..], &[7, 7, 7]);
    }

    #[test]
    fn test_empty_region() {
        let region = RegionContainer::load(&[]).expect("empty input is an empty region");
        assert_eq!(region.occupied_count(), 0);

        let bytes = region.to_bytes().expect("export");
        assert_eq!(bytes.len(), HEADER_SIZE);
        assert!(bytes.iter().all(|&b| b == 0));

        let map = region.chunk_occupancy_map();
        assert_eq!(map.lines().count(), REGION_WIDTH);
        assert!(map.lines().all(|line| line == "?".repeat(REGION_WIDTH)));
    }

    #[test]
    fn test_export_layout() {
        let mut region = RegionContainer::new(options());
        region.insert_chunk(0, 1, filled_chunk(BlockId::STONE)).expect("in range");
        region.insert_chunk(3, 0, filled_chunk(BlockId::GOLD)).expect("in range");

        let bytes = region.to_bytes().expect("export");
        assert_eq!(bytes.len(), HEADER_SIZE + 2 * SECTOR_SIZE);

        assert_eq!(header_entry(&bytes, 0), (0, 0));
        assert_eq!(header_entry(&bytes, 1), (2, 1));
        assert_eq!(header_entry(&bytes, 3 * 32), (3, 1));

        let first = 2 * SECTOR_SIZE;
        let length = u32::from_be_bytes([bytes[first], bytes[first + 1], bytes[first + 2], bytes[first + 3]]);
        assert!(length > 1);
        assert_eq!(bytes[first + 4], 2);
        assert!(bytes[first + 4 + length as usize..3 * SECTOR_SIZE].iter().all(|&b| b == 0));

        assert!(bytes[SECTOR_SIZE..HEADER_SIZE].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_load_keeps_chunks_raw() {
        let mut region = RegionContainer::new(options());
        region.insert_chunk(5, 7, filled_chunk(BlockId::STONE)).expect("in range");
        let bytes = region.to_bytes().expect("export");

        let mut loaded = RegionContainer::load_with_options(&bytes, options()).expect("load");
        assert_eq!(loaded.occupied_count(), 1);
        let chunk = loaded.chunk_mut(5, 7).expect("in range").expect("occupied");
        assert!(!chunk.is_loaded());
        assert_eq!(chunk.get(1, 1, 1).expect("in range").id(), BlockId::STONE);
        assert!(chunk.is_loaded());

        loaded.unload_chunk(5, 7).expect("unload");
        assert!(!loaded.chunk(5, 7).expect("in range").expect("occupied").is_loaded());
        assert!(loaded.chunk(7, 5).expect("in range").is_none());
    }

    #[test]
    fn test_grid_bounds() {
        let mut region = RegionContainer::new(options());
        assert!(region.chunk(31, 31).is_ok());
        for (z, x) in [(32, 0), (0, 32), (-1, 0), (0, -1)] {
            assert!(matches!(region.chunk(z, x), Err(RegionError::OutOfRange { .. })));
            assert!(matches!(region.chunk_mut(z, x), Err(RegionError::OutOfRange { .. })));
            assert!(matches!(region.unload_chunk(z, x), Err(RegionError::OutOfRange { .. })));
        }
    }

    #[test]
    fn test_malformed_inputs() {
        assert!(matches!(
            RegionContainer::load(&[0u8; 100]),
            Err(RegionError::MalformedContainer(_))
        ));

        // Slot 0 points at sector 2, which the buffer does not contain
        let mut bytes = vec![0u8; HEADER_SIZE];
        bytes[..4].copy_from_slice(&[0, 0, 2, 1]);
        assert!(matches!(
            RegionContainer::load(&bytes),
            Err(RegionError::MalformedContainer(_))
        ));

        // Length prefix runs past the buffer
        bytes.resize(HEADER_SIZE + 16, 0);
        bytes[HEADER_SIZE..HEADER_SIZE + 4].copy_from_slice(&100u32.to_be_bytes());
        assert!(matches!(
            RegionContainer::load(&bytes),
            Err(RegionError::MalformedContainer(_))
        ));

        // Zero length prefix
        bytes[HEADER_SIZE..HEADER_SIZE + 4].copy_from_slice(&0u32.to_be_bytes());
        assert!(matches!(
            RegionContainer::load(&bytes),
            Err(RegionError::MalformedContainer(_))
        ));

        // Offset into the header itself
        bytes[..4].copy_from_slice(&[0, 0, 1, 1]);
        assert!(matches!(
            RegionContainer::load(&bytes),
            Err(RegionError::MalformedContainer(_))
        ));
    }

    #[test]
    fn test_sector_index_zero_is_absent() {
        let mut bytes = vec![0u8; HEADER_SIZE];
        bytes[5 * 4..5 * 4 + 4].copy_from_slice(&[0, 0, 0, 1]);

        let region = RegionContainer::load_with_options(&bytes, options()).expect("slot 5 is absent");
        assert_eq!(region.occupied_count(), 0);
        assert!(region.chunk(0, 5).expect("in range").is_none());
        assert_eq!(region.to_bytes().expect("export"), vec![0u8; HEADER_SIZE]);
    }

    #[test]
    fn test_corrupt_chunk_is_isolated() {
        let mut region = RegionContainer::new(options());
        region.insert_chunk(0, 0, filled_chunk(BlockId::STONE)).expect("in range");
        region
            .insert_chunk(0, 1, LazyChunk::from_raw(RawChunk::new(2, vec![1, 2, 3]), options()))
            .expect("in range");
        let bytes = region.to_bytes().expect("corrupt chunk bytes are exported verbatim");

        let mut loaded = RegionContainer::load_with_options(&bytes, options()).expect("load");
        let failures = loaded.verify_chunks();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, (0, 1));
        assert!(matches!(failures[0].1, RegionError::CorruptChunkData(_)));

        let broken = loaded.chunk_mut(0, 1).expect("in range").expect("occupied");
        assert!(matches!(broken.get(0, 0, 0), Err(RegionError::CorruptChunkData(_))));
        let good = loaded.chunk_mut(0, 0).expect("in range").expect("occupied");
        assert_eq!(good.get(0, 0, 0).expect("in range").id(), BlockId::STONE);
    }

    #[test]
    fn test_timestamps_pass_through() {
        let mut region = RegionContainer::new(options());
        region.insert_chunk(0, 2, filled_chunk(BlockId::STONE)).expect("in range");
        let mut bytes = region.to_bytes().expect("export");
        bytes[SECTOR_SIZE + 8..SECTOR_SIZE + 12].copy_from_slice(&0x1234_5678u32.to_be_bytes());

        let loaded = RegionContainer::load_with_options(&bytes, options()).expect("load");
        assert_eq!(loaded.timestamp(0, 2).expect("in range"), 0x1234_5678);
        assert_eq!(loaded.to_bytes().expect("export"), bytes);
    }

    #[test]
    fn test_remove_chunk() {
        let mut region = RegionContainer::new(options());
        region.insert_chunk(4, 4, filled_chunk(BlockId::STONE)).expect("in range");
        assert!(region.remove_chunk(4, 4).expect("in range").is_some());
        assert!(region.remove_chunk(4, 4).expect("in range").is_none());
        assert_eq!(region.to_bytes().expect("export").len(), HEADER_SIZE);
    }

    #[test]
    fn test_cube_spans_chunks() {
        let mut region = RegionContainer::new(options());
        region.insert_chunk(0, 0, filled_chunk(BlockId::STONE)).expect("in range");
        region.insert_chunk(0, 1, filled_chunk(BlockId::STONE)).expect("in range");
        region.insert_chunk(1, 1, filled_chunk(BlockId::STONE)).expect("in range");

        // x 1..3 crosses chunk columns 0 and 1, z 1..3 crosses rows 0 and 1;
        // chunk (z=1, x=0) is absent
        let mut visited = Vec::new();
        region
            .cube(BlockPos::new(1, 2, 1), (2, 2, 3), |pos, block| {
                visited.push(pos);
                block.set_id(BlockId::GOLD);
            })
            .expect("cube in range");

        assert_eq!(visited.len(), 3 * 3);
        assert!(visited.iter().all(|p| (1..3).contains(&p.x) && (1..3).contains(&p.z) && (2..5).contains(&p.y)));
        assert!(!visited.iter().any(|p| p.x < 2 && p.z >= 2));

        let c00 = region.chunk_mut(0, 0).expect("in range").expect("occupied");
        assert_eq!(c00.get(1, 1, 2).expect("in range").id(), BlockId::GOLD);
        assert_eq!(c00.get(1, 1, 5).expect("in range").id(), BlockId::STONE);
        let c11 = region.chunk_mut(1, 1).expect("in range").expect("occupied");
        assert_eq!(c11.get(0, 0, 4).expect("in range").id(), BlockId::GOLD);
        assert_eq!(c11.get(1, 0, 4).expect("in range").id(), BlockId::STONE);

        assert!(matches!(
            region.cube(BlockPos::new(0, 6, 0), (1, 1, 3), |_, _| {}),
            Err(RegionError::OutOfRange { axis: "y", .. })
        ));
    }

    #[test]
    fn test_cube_rejects_overflowing_extents() {
        let mut region = RegionContainer::new(options());
        region.insert_chunk(0, 0, filled_chunk(BlockId::STONE)).expect("in range");

        assert!(matches!(
            region.cube(BlockPos::new(1, 0, 0), (usize::MAX, 1, 1), |_, _| {}),
            Err(RegionError::OutOfRange { axis: "x", .. })
        ));
        assert!(matches!(
            region.cube(BlockPos::new(0, 0, 1), (1, usize::MAX, 1), |_, _| {}),
            Err(RegionError::OutOfRange { axis: "z", .. })
        ));
        assert!(matches!(
            region.cube(BlockPos::new(0, 1, 0), (1, 1, usize::MAX), |_, _| {}),
            Err(RegionError::OutOfRange { axis: "y", .. })
        ));
    }

    #[test]
    fn test_cube_over_corrupt_chunk_changes_nothing() {
        let mut region = RegionContainer::new(options());
        region.insert_chunk(0, 0, filled_chunk(BlockId::STONE)).expect("in range");
        region
            .insert_chunk(0, 1, LazyChunk::from_raw(RawChunk::new(2, vec![1, 2, 3]), options()))
            .expect("in range");

        let mut visited = 0;
        let result = region.cube(BlockPos::new(0, 0, 0), (4, 2, 8), |_, block| {
            block.set_id(BlockId::GOLD);
            visited += 1;
        });
        assert!(matches!(result, Err(RegionError::CorruptChunkData(_))));
        assert_eq!(visited, 0);

        let good = region.chunk_mut(0, 0).expect("in range").expect("occupied");
        assert!(good.chunk().expect("decoded").blocks().iter().all(|b| b.is(BlockId::STONE)));
    }
}
