// Region format constants - SINGLE SOURCE OF TRUTH
//
// These values are part of the on-disk contract. Encoder and decoder both
// read them from here so the two sides cannot drift apart.

/// Region container layout
pub mod region {
    /// Size of one allocation unit in the region byte layout
    pub const SECTOR_SIZE: usize = 4096;

    /// Sector 0 holds the offset table, sector 1 the timestamps
    pub const HEADER_SECTORS: usize = 2;
    pub const HEADER_SIZE: usize = SECTOR_SIZE * HEADER_SECTORS;

    /// The grid is always 32x32 chunks
    pub const REGION_WIDTH: usize = 32;
    pub const REGION_CHUNKS: usize = REGION_WIDTH * REGION_WIDTH;

    /// Offset table entry: 3 bytes sector index + 1 byte sector count
    pub const OFFSET_ENTRY_SIZE: usize = 4;
    pub const TIMESTAMP_ENTRY_SIZE: usize = 4;

    /// Big-endian length prefix in front of every chunk payload
    pub const LENGTH_PREFIX_SIZE: usize = 4;

    /// Length prefix plus compression tag
    pub const CHUNK_METADATA_SIZE: usize = LENGTH_PREFIX_SIZE + 1;

    /// Largest sector index expressible in 3 bytes
    pub const MAX_SECTOR_INDEX: usize = 0x00FF_FFFF;

    /// Sector count is a single byte
    pub const MAX_SECTORS_PER_CHUNK: usize = u8::MAX as usize;

    /// Compression tag written for re-encoded chunks (zlib)
    pub const DEFAULT_COMPRESSION_TAG: u8 = 2;

    /// Placeholder written into the timestamp sector for absent or new slots
    pub const DUMMY_TIMESTAMP: u32 = 0;
}

/// Chunk record layout
pub mod chunk {
    pub const DEFAULT_WIDTH: usize = 16;
    pub const DEFAULT_LENGTH: usize = 16;
    pub const DEFAULT_HEIGHT: usize = 128;

    /// A byte height map can store column heights up to this value
    pub const MAX_BYTE_HEIGHT: usize = u8::MAX as usize;
    pub const MAX_HEIGHT: usize = 256;

    /// Tag tree keys
    pub const LEVEL_TAG: &str = "Level";
    pub const BLOCKS_TAG: &str = "Blocks";
    pub const DATA_TAG: &str = "Data";
    pub const HEIGHT_MAP_TAG: &str = "HeightMap";

    /// Data values are 4-bit nibbles, two per byte
    pub const NIBBLE_MASK: u8 = 0x0F;
}

/// Classic block ids (raw u8 values)
pub mod blocks {
    pub const AIR: u8 = 0;
    pub const STONE: u8 = 1;
    pub const GRASS: u8 = 2;
    pub const DIRT: u8 = 3;
    pub const COBBLESTONE: u8 = 4;
    pub const PLANKS: u8 = 5;
    pub const SAPLING: u8 = 6;
    pub const BEDROCK: u8 = 7;
    pub const WATER: u8 = 8;
    pub const STILL_WATER: u8 = 9;
    pub const LAVA: u8 = 10;
    pub const STILL_LAVA: u8 = 11;
    pub const SAND: u8 = 12;
    pub const GRAVEL: u8 = 13;
    pub const GOLD_ORE: u8 = 14;
    pub const IRON_ORE: u8 = 15;
    pub const COAL_ORE: u8 = 16;
    pub const LOG: u8 = 17;
    pub const LEAVES: u8 = 18;
    pub const SPONGE: u8 = 19;
    pub const GLASS: u8 = 20;
    pub const LAPIS_ORE: u8 = 21;
    pub const LAPIS_BLOCK: u8 = 22;
    pub const SANDSTONE: u8 = 24;
    pub const WOOL: u8 = 35;
    pub const GOLD: u8 = 41;
    pub const IRON: u8 = 42;
    pub const BRICK: u8 = 45;
    pub const TNT: u8 = 46;
    pub const OBSIDIAN: u8 = 49;
    pub const TORCH: u8 = 50;
    pub const DIAMOND_ORE: u8 = 56;
    pub const DIAMOND: u8 = 57;
    pub const SNOW: u8 = 78;
    pub const ICE: u8 = 79;
    pub const CACTUS: u8 = 81;
    pub const CLAY: u8 = 82;
    pub const NETHERRACK: u8 = 87;
    pub const GLOWSTONE: u8 = 89;
}
