//! Dense fixed-extent block storage
//!
//! Blocks are stored in one flat vector in scan order: x is the outermost
//! axis, then z, then y. Positional access uses the `[z][x][y]` argument
//! order everywhere.

use super::block::{Block, BlockId, BlockPos};

/// Dense 3D grid of blocks with extents fixed at construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockMatrix3D {
    width: usize,
    length: usize,
    height: usize,
    blocks: Vec<Block>,
}

impl BlockMatrix3D {
    /// Create a matrix filled with air
    pub fn new(width: usize, length: usize, height: usize) -> Self {
        Self::from_fn(width, length, height, |_| (BlockId::AIR, 0))
    }

    /// Build a matrix by asking `f` for the type and data of every position,
    /// visited in scan order
    pub fn from_fn<F>(width: usize, length: usize, height: usize, mut f: F) -> Self
    where
        F: FnMut(BlockPos) -> (BlockId, u8),
    {
        let mut blocks = Vec::with_capacity(width * length * height);
        for x in 0..width {
            for z in 0..length {
                for y in 0..height {
                    let pos = BlockPos::new(x as u32, y as u32, z as u32);
                    let (id, data) = f(pos);
                    blocks.push(Block::new(id, data, pos));
                }
            }
        }

        Self {
            width,
            length,
            height,
            blocks,
        }
    }

    /// Extent along x
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Extent along z
    #[inline]
    pub fn length(&self) -> usize {
        self.length
    }

    /// Extent along y
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn volume(&self) -> usize {
        self.blocks.len()
    }

    pub fn contains(&self, z: usize, x: usize, y: usize) -> bool {
        z < self.length && x < self.width && y < self.height
    }

    /// Flat index of `[z][x][y]`, or `None` outside the extents
    #[inline]
    pub fn index(&self, z: usize, x: usize, y: usize) -> Option<usize> {
        if self.contains(z, x, y) {
            Some(self.index_unchecked(z, x, y))
        } else {
            None
        }
    }

    #[inline]
    fn index_unchecked(&self, z: usize, x: usize, y: usize) -> usize {
        (x * self.length + z) * self.height + y
    }

    pub fn get(&self, z: usize, x: usize, y: usize) -> Option<&Block> {
        self.index(z, x, y).map(|i| &self.blocks[i])
    }

    pub fn get_mut(&mut self, z: usize, x: usize, y: usize) -> Option<&mut Block> {
        self.index(z, x, y).map(move |i| &mut self.blocks[i])
    }

    /// All blocks in scan order
    pub fn as_slice(&self) -> &[Block] {
        &self.blocks
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Block> {
        self.blocks.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Block> {
        self.blocks.iter_mut()
    }

    /// The block column at `(x, z)`, bottom to top
    pub fn column(&self, z: usize, x: usize) -> Option<&[Block]> {
        let start = self.index(z, x, 0)?;
        Some(&self.blocks[start..start + self.height])
    }

    /// Read-only window of `extents = (width, length, height)` starting at
    /// `origin`. Returns `None` if the window does not fit.
    pub fn view(&self, origin: BlockPos, extents: (usize, usize, usize)) -> Option<MatrixView<'_>> {
        let window = Window::fit(self, origin, extents)?;
        Some(MatrixView {
            matrix: self,
            window,
        })
    }

    /// Mutable window sharing this matrix's storage
    pub fn view_mut(
        &mut self,
        origin: BlockPos,
        extents: (usize, usize, usize),
    ) -> Option<MatrixViewMut<'_>> {
        let window = Window::fit(self, origin, extents)?;
        Some(MatrixViewMut {
            matrix: self,
            window,
        })
    }
}

impl<'a> IntoIterator for &'a BlockMatrix3D {
    type Item = &'a Block;
    type IntoIter = std::slice::Iter<'a, Block>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.iter()
    }
}

impl<'a> IntoIterator for &'a mut BlockMatrix3D {
    type Item = &'a mut Block;
    type IntoIter = std::slice::IterMut<'a, Block>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.iter_mut()
    }
}

/// Offset and extents of a sub-cube
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Window {
    x: usize,
    y: usize,
    z: usize,
    width: usize,
    length: usize,
    height: usize,
}

impl Window {
    fn fit(matrix: &BlockMatrix3D, origin: BlockPos, extents: (usize, usize, usize)) -> Option<Self> {
        let (width, length, height) = extents;
        let window = Self {
            x: origin.x as usize,
            y: origin.y as usize,
            z: origin.z as usize,
            width,
            length,
            height,
        };

        let fits = |start: usize, extent: usize, limit: usize| {
            start.checked_add(extent).map_or(false, |end| end <= limit)
        };
        (fits(window.x, width, matrix.width)
            && fits(window.z, length, matrix.length)
            && fits(window.y, height, matrix.height))
        .then_some(window)
    }

    fn contains(&self, z: usize, x: usize, y: usize) -> bool {
        z < self.length && x < self.width && y < self.height
    }

    /// Matrix coordinates `(z, x, y)` for window-local coordinates
    fn to_matrix(&self, z: usize, x: usize, y: usize) -> (usize, usize, usize) {
        (self.z + z, self.x + x, self.y + y)
    }

    fn positions(self) -> impl Iterator<Item = (usize, usize, usize)> {
        (0..self.width).flat_map(move |x| {
            (0..self.length)
                .flat_map(move |z| (0..self.height).map(move |y| self.to_matrix(z, x, y)))
        })
    }
}

/// Read-only sub-cube of a [`BlockMatrix3D`]
#[derive(Debug, Clone, Copy)]
pub struct MatrixView<'a> {
    matrix: &'a BlockMatrix3D,
    window: Window,
}

impl<'a> MatrixView<'a> {
    pub fn extents(&self) -> (usize, usize, usize) {
        (self.window.width, self.window.length, self.window.height)
    }

    /// Block at window-local `[z][x][y]`
    pub fn get(&self, z: usize, x: usize, y: usize) -> Option<&'a Block> {
        if !self.window.contains(z, x, y) {
            return None;
        }
        let (mz, mx, my) = self.window.to_matrix(z, x, y);
        self.matrix.get(mz, mx, my)
    }

    /// Blocks inside the window in scan order
    pub fn iter(&self) -> impl Iterator<Item = &'a Block> + 'a {
        let matrix = self.matrix;
        self.window
            .positions()
            .map(move |(z, x, y)| &matrix.blocks[matrix.index_unchecked(z, x, y)])
    }
}

/// Mutable sub-cube of a [`BlockMatrix3D`]
#[derive(Debug)]
pub struct MatrixViewMut<'a> {
    matrix: &'a mut BlockMatrix3D,
    window: Window,
}

impl<'a> MatrixViewMut<'a> {
    pub fn extents(&self) -> (usize, usize, usize) {
        (self.window.width, self.window.length, self.window.height)
    }

    pub fn get(&self, z: usize, x: usize, y: usize) -> Option<&Block> {
        if !self.window.contains(z, x, y) {
            return None;
        }
        let (mz, mx, my) = self.window.to_matrix(z, x, y);
        self.matrix.get(mz, mx, my)
    }

    pub fn get_mut(&mut self, z: usize, x: usize, y: usize) -> Option<&mut Block> {
        if !self.window.contains(z, x, y) {
            return None;
        }
        let (mz, mx, my) = self.window.to_matrix(z, x, y);
        self.matrix.get_mut(mz, mx, my)
    }

    /// Visit every block inside the window in scan order
    pub fn for_each_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut Block),
    {
        for (z, x, y) in self.window.positions() {
            let i = self.matrix.index_unchecked(z, x, y);
            f(&mut self.matrix.blocks[i]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_order() {
        let matrix = BlockMatrix3D::new(2, 3, 4);
        assert_eq!(matrix.volume(), 24);

        let first: Vec<BlockPos> = matrix.iter().take(6).map(|b| b.pos()).collect();
        assert_eq!(
            first,
            vec![
                BlockPos::new(0, 0, 0),
                BlockPos::new(0, 1, 0),
                BlockPos::new(0, 2, 0),
                BlockPos::new(0, 3, 0),
                BlockPos::new(0, 0, 1),
                BlockPos::new(0, 1, 1),
            ]
        );
        assert_eq!(matrix.as_slice()[12].pos(), BlockPos::new(1, 0, 0));
    }

    #[test]
    fn test_every_position_is_stored_once() {
        let matrix = BlockMatrix3D::new(3, 2, 5);
        for (i, block) in matrix.iter().enumerate() {
            let pos = block.pos();
            let index = matrix
                .index(pos.z as usize, pos.x as usize, pos.y as usize)
                .expect("stored position must be in range");
            assert_eq!(index, i);
        }
    }

    #[test]
    fn test_bounds() {
        let mut matrix = BlockMatrix3D::new(2, 2, 8);
        assert!(matrix.get(1, 1, 7).is_some());
        assert!(matrix.get(2, 0, 0).is_none());
        assert!(matrix.get(0, 2, 0).is_none());
        assert!(matrix.get(0, 0, 8).is_none());
        assert!(matrix.get_mut(0, 0, 8).is_none());
    }

    #[test]
    fn test_column() {
        let matrix = BlockMatrix3D::from_fn(2, 2, 4, |pos| (BlockId(pos.y as u8), 0));
        let column = matrix.column(1, 1).expect("column in range");
        let ids: Vec<u8> = column.iter().map(|b| b.id().0).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
        assert!(column.iter().all(|b| b.pos().x == 1 && b.pos().z == 1));
    }

    #[test]
    fn test_view_shares_storage() {
        let mut matrix = BlockMatrix3D::new(4, 4, 4);

        {
            let mut view = matrix
                .view_mut(BlockPos::new(1, 1, 1), (2, 2, 2))
                .expect("window fits");
            view.for_each_mut(|block| block.set_id(BlockId::GOLD));
            view.get_mut(0, 0, 0)
                .expect("window origin")
                .set_data(3);
        }

        let gold = matrix.iter().filter(|b| b.is(BlockId::GOLD)).count();
        assert_eq!(gold, 8);
        assert_eq!(matrix.get(1, 1, 1).map(|b| b.data()), Some(3));
        assert!(matrix.get(0, 0, 0).map(|b| b.is_air()).unwrap_or(false));

        let view = matrix.view(BlockPos::new(1, 1, 1), (2, 2, 2)).expect("window fits");
        assert_eq!(view.iter().count(), 8);
        assert!(view.iter().all(|b| b.is(BlockId::GOLD)));
        assert_eq!(view.get(1, 1, 1).map(|b| b.pos()), Some(BlockPos::new(2, 2, 2)));
        assert!(view.get(2, 0, 0).is_none());
    }

    #[test]
    fn test_view_must_fit() {
        let matrix = BlockMatrix3D::new(4, 4, 4);
        assert!(matrix.view(BlockPos::new(3, 0, 0), (2, 1, 1)).is_none());
        assert!(matrix.view(BlockPos::new(0, 0, 0), (4, 4, 4)).is_some());
        assert!(matrix.view(BlockPos::new(1, 0, 0), (usize::MAX, 1, 1)).is_none());

        let mut matrix = matrix;
        assert!(matrix
            .view_mut(BlockPos::new(0, 0, 2), (1, 1, usize::MAX))
            .is_none());
    }
}
