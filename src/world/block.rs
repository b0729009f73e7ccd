use std::fmt;

use crate::constants::{blocks, chunk::NIBBLE_MASK};

/// Unique identifier for a block type. The default id is 0, air.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(transparent)]
pub struct BlockId(pub u8);

impl BlockId {
    pub const AIR: BlockId = BlockId(blocks::AIR);
    pub const STONE: BlockId = BlockId(blocks::STONE);
    pub const GRASS: BlockId = BlockId(blocks::GRASS);
    pub const DIRT: BlockId = BlockId(blocks::DIRT);
    pub const COBBLESTONE: BlockId = BlockId(blocks::COBBLESTONE);
    pub const PLANKS: BlockId = BlockId(blocks::PLANKS);
    pub const BEDROCK: BlockId = BlockId(blocks::BEDROCK);
    pub const WATER: BlockId = BlockId(blocks::WATER);
    pub const LAVA: BlockId = BlockId(blocks::LAVA);
    pub const SAND: BlockId = BlockId(blocks::SAND);
    pub const GRAVEL: BlockId = BlockId(blocks::GRAVEL);
    pub const LOG: BlockId = BlockId(blocks::LOG);
    pub const LEAVES: BlockId = BlockId(blocks::LEAVES);
    pub const GLASS: BlockId = BlockId(blocks::GLASS);
    pub const WOOL: BlockId = BlockId(blocks::WOOL);
    pub const GOLD: BlockId = BlockId(blocks::GOLD);
    pub const IRON: BlockId = BlockId(blocks::IRON);
    pub const DIAMOND: BlockId = BlockId(blocks::DIAMOND);
    pub const OBSIDIAN: BlockId = BlockId(blocks::OBSIDIAN);

    /// Look up a block id by its symbolic name (`"stone"`, `"gold"`, ...)
    pub fn from_name(name: &str) -> Option<BlockId> {
        BLOCK_NAMES
            .iter()
            .find(|(_, n)| *n == name)
            .map(|(id, _)| BlockId(*id))
    }

    /// Symbolic name, if the id is in the known table
    pub fn name(self) -> Option<&'static str> {
        BLOCK_NAMES
            .iter()
            .find(|(id, _)| *id == self.0)
            .map(|(_, n)| *n)
    }

    #[inline]
    pub fn is_air(self) -> bool {
        self == BlockId::AIR
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "block({})", self.0),
        }
    }
}

impl From<u8> for BlockId {
    fn from(id: u8) -> Self {
        BlockId(id)
    }
}

const BLOCK_NAMES: &[(u8, &str)] = &[
    (blocks::AIR, "air"),
    (blocks::STONE, "stone"),
    (blocks::GRASS, "grass"),
    (blocks::DIRT, "dirt"),
    (blocks::COBBLESTONE, "cobblestone"),
    (blocks::PLANKS, "planks"),
    (blocks::SAPLING, "sapling"),
    (blocks::BEDROCK, "bedrock"),
    (blocks::WATER, "water"),
    (blocks::STILL_WATER, "still_water"),
    (blocks::LAVA, "lava"),
    (blocks::STILL_LAVA, "still_lava"),
    (blocks::SAND, "sand"),
    (blocks::GRAVEL, "gravel"),
    (blocks::GOLD_ORE, "gold_ore"),
    (blocks::IRON_ORE, "iron_ore"),
    (blocks::COAL_ORE, "coal_ore"),
    (blocks::LOG, "log"),
    (blocks::LEAVES, "leaves"),
    (blocks::SPONGE, "sponge"),
    (blocks::GLASS, "glass"),
    (blocks::LAPIS_ORE, "lapis_ore"),
    (blocks::LAPIS_BLOCK, "lapis_block"),
    (blocks::SANDSTONE, "sandstone"),
    (blocks::WOOL, "wool"),
    (blocks::GOLD, "gold"),
    (blocks::IRON, "iron"),
    (blocks::BRICK, "brick"),
    (blocks::TNT, "tnt"),
    (blocks::OBSIDIAN, "obsidian"),
    (blocks::TORCH, "torch"),
    (blocks::DIAMOND_ORE, "diamond_ore"),
    (blocks::DIAMOND, "diamond"),
    (blocks::SNOW, "snow"),
    (blocks::ICE, "ice"),
    (blocks::CACTUS, "cactus"),
    (blocks::CLAY, "clay"),
    (blocks::NETHERRACK, "netherrack"),
    (blocks::GLOWSTONE, "glowstone"),
];

/// Position of a block inside its chunk (chunk-local coordinates)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BlockPos {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl BlockPos {
    pub fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }

    /// Same position in the `[z][x][y]` addressing order used by matrices
    pub fn zxy(&self) -> (u32, u32, u32) {
        (self.z, self.x, self.y)
    }
}

/// One voxel: its type, a 4-bit data value and a fixed position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    id: BlockId,
    data: u8,
    pos: BlockPos,
}

impl Block {
    pub fn new(id: BlockId, data: u8, pos: BlockPos) -> Self {
        Self {
            id,
            data: data & NIBBLE_MASK,
            pos,
        }
    }

    #[inline]
    pub fn id(&self) -> BlockId {
        self.id
    }

    #[inline]
    pub fn set_id(&mut self, id: BlockId) {
        self.id = id;
    }

    /// The 4-bit auxiliary value
    #[inline]
    pub fn data(&self) -> u8 {
        self.data
    }

    /// Values above 15 are truncated to their low nibble
    #[inline]
    pub fn set_data(&mut self, data: u8) {
        self.data = data & NIBBLE_MASK;
    }

    #[inline]
    pub fn pos(&self) -> BlockPos {
        self.pos
    }

    #[inline]
    pub fn is(&self, id: BlockId) -> bool {
        self.id == id
    }

    #[inline]
    pub fn is_air(&self) -> bool {
        self.id.is_air()
    }
}
