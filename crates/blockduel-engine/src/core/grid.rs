use arrayvec::ArrayVec;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::piece::{CellColor, Piece, PieceKind, SpawnKind};

/// A single cell of the playing grid.
///
/// The serialized form is one character: `.` for empty, the kind letter for
/// locked standard cells, `G` for garbage, `B` for bomb cells and `*` for a
/// pending buster overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Cell {
    #[default]
    Empty,
    /// Locked cell of a standard piece.
    Standard(PieceKind),
    /// Garbage row cell.
    Garbage,
    /// Cell of a placed, still armed bomb.
    Bomb,
    /// Cell of a color buster; only appears in overlays, never locked.
    BusterPending,
}

impl Cell {
    #[must_use]
    pub fn is_empty(self) -> bool {
        self == Cell::Empty
    }

    #[must_use]
    pub fn is_filled(self) -> bool {
        !self.is_empty()
    }

    /// Color of a standard cell; garbage and hazards have none.
    #[must_use]
    pub fn color(self) -> Option<CellColor> {
        match self {
            Cell::Standard(kind) => Some(kind.color()),
            Cell::Empty | Cell::Garbage | Cell::Bomb | Cell::BusterPending => None,
        }
    }

    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Cell::Empty => '.',
            Cell::Standard(kind) => kind.as_char(),
            Cell::Garbage => 'G',
            Cell::Bomb => 'B',
            Cell::BusterPending => '*',
        }
    }

    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            '.' => Some(Cell::Empty),
            'G' => Some(Cell::Garbage),
            'B' => Some(Cell::Bomb),
            '*' => Some(Cell::BusterPending),
            _ => match PieceKind::from_char(c) {
                Some(kind) => Some(Cell::Standard(kind)),
                None => None,
            },
        }
    }
}

impl From<SpawnKind> for Cell {
    fn from(kind: SpawnKind) -> Self {
        match kind {
            SpawnKind::Standard(kind) => Cell::Standard(kind),
            SpawnKind::Bomb => Cell::Bomb,
            SpawnKind::Buster => Cell::BusterPending,
        }
    }
}

impl Serialize for Cell {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_char(self.as_char())
    }
}

impl<'de> Deserialize<'de> for Cell {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let c = char::deserialize(deserializer)?;
        Cell::from_char(c).ok_or_else(|| serde::de::Error::custom(format!("invalid cell: {c}")))
    }
}

/// Error for externally supplied grids that do not have the board's shape.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum SnapshotError {
    #[display("snapshot grid is empty")]
    Empty,
    #[display("snapshot row {row} has {actual} cells, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[display("snapshot grid is {rows}x{cols}, expected {}x{}", Grid::HEIGHT, Grid::WIDTH)]
    Dimensions { rows: usize, cols: usize },
}

/// Row indices removed by a single line clear, top to bottom.
pub type ClearedRows = ArrayVec<usize, { Grid::HEIGHT }>;

/// Where each cell ended up after per-column compaction.
#[derive(Debug, Clone)]
pub struct Compaction {
    new_y: [[usize; Grid::HEIGHT]; Grid::WIDTH],
}

impl Compaction {
    /// New row of the cell that was at `(x, y)` before compaction.
    #[must_use]
    pub fn moved_row(&self, x: usize, y: usize) -> usize {
        self.new_y[x][y]
    }
}

/// The 20×12 playing grid, row 0 at the top.
///
/// The grid only holds locked content. The falling piece lives in
/// [`GameField`](crate::GameField) and is merged in on lock.
///
/// # Example
///
/// ```
/// use blockduel_engine::{Cell, Grid, PieceKind};
///
/// let mut grid = Grid::EMPTY;
/// grid.set(0, Grid::HEIGHT - 1, Cell::Standard(PieceKind::I));
/// assert!(grid.get(0, Grid::HEIGHT - 1).is_filled());
/// assert!(!grid.is_in_danger());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    rows: [[Cell; Grid::WIDTH]; Grid::HEIGHT],
}

impl Default for Grid {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Grid {
    pub const WIDTH: usize = 12;
    pub const HEIGHT: usize = 20;
    /// Rows from the top that put a board "in danger" when occupied.
    pub const DANGER_ROWS: usize = 6;

    pub const EMPTY: Self = Self {
        rows: [[Cell::Empty; Self::WIDTH]; Self::HEIGHT],
    };

    /// Builds a grid from rows of cells, checking that it is exactly 20×12.
    pub fn try_from_rows(rows: &[Vec<Cell>]) -> Result<Self, SnapshotError> {
        let Some(first) = rows.first() else {
            return Err(SnapshotError::Empty);
        };
        if first.is_empty() {
            return Err(SnapshotError::Empty);
        }
        let expected = first.len();
        if let Some((row, r)) = rows.iter().enumerate().find(|(_, r)| r.len() != expected) {
            return Err(SnapshotError::Ragged {
                row,
                expected,
                actual: r.len(),
            });
        }
        if rows.len() != Self::HEIGHT || expected != Self::WIDTH {
            return Err(SnapshotError::Dimensions {
                rows: rows.len(),
                cols: expected,
            });
        }
        let mut grid = Self::EMPTY;
        for (dst, src) in grid.rows.iter_mut().zip(rows) {
            dst.copy_from_slice(src);
        }
        Ok(grid)
    }

    #[must_use]
    pub fn to_rows(&self) -> Vec<Vec<Cell>> {
        self.rows.iter().map(|row| row.to_vec()).collect()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell; Self::WIDTH]> {
        self.rows.iter()
    }

    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> Cell {
        self.rows[y][x]
    }

    pub fn set(&mut self, x: usize, y: usize, cell: Cell) {
        self.rows[y][x] = cell;
    }

    /// Cell at signed coordinates, or `None` outside the grid.
    #[must_use]
    pub fn cell_at(&self, x: i32, y: i32) -> Option<Cell> {
        let x = usize::try_from(x).ok().filter(|&x| x < Self::WIDTH)?;
        let y = usize::try_from(y).ok().filter(|&y| y < Self::HEIGHT)?;
        Some(self.rows[y][x])
    }

    /// Whether any cell of the piece is outside the grid or on a filled cell.
    ///
    /// Cells above the top edge count as outside.
    #[must_use]
    pub fn is_colliding(&self, piece: &Piece) -> bool {
        piece
            .occupied_positions()
            .any(|(x, y)| self.cell_at(x, y).is_none_or(Cell::is_filled))
    }

    /// Corner test used by T-spin detection.
    ///
    /// Off-grid to the left, right or below is blocked; above the top edge is
    /// open.
    #[must_use]
    pub fn is_corner_blocked(&self, x: i32, y: i32) -> bool {
        if y < 0 {
            return self.cell_at(x, 0).is_none();
        }
        self.cell_at(x, y).is_none_or(Cell::is_filled)
    }

    /// Writes the piece's cells into the grid using its kind's cell tag.
    pub fn fill_piece(&mut self, piece: &Piece) {
        self.fill_piece_as(piece, Cell::from(piece.kind()));
    }

    /// Writes the piece's in-grid cells with an arbitrary cell tag.
    pub fn fill_piece_as(&mut self, piece: &Piece, cell: Cell) {
        for (x, y) in piece.occupied_positions() {
            if let (Ok(x), Ok(y)) = (usize::try_from(x), usize::try_from(y))
                && x < Self::WIDTH
                && y < Self::HEIGHT
            {
                self.rows[y][x] = cell;
            }
        }
    }

    /// Removes every full row, shifts the rows above down and returns the
    /// original indices of the removed rows.
    pub fn clear_lines(&mut self) -> ClearedRows {
        let mut cleared = ClearedRows::new();
        for y in 0..Self::HEIGHT {
            if self.rows[y].iter().all(|c| c.is_filled()) {
                cleared.push(y);
            }
        }
        let count = cleared.len();
        if count == 0 {
            return cleared;
        }
        let mut dst = Self::HEIGHT;
        for y in (0..Self::HEIGHT).rev() {
            if cleared.contains(&y) {
                continue;
            }
            dst -= 1;
            if dst != y {
                self.rows[dst] = self.rows[y];
            }
        }
        self.rows[..count].fill([Cell::Empty; Self::WIDTH]);
        cleared
    }

    /// Compacts each column downward, preserving the order of filled cells.
    pub fn apply_gravity(&mut self) -> Compaction {
        let mut compaction = Compaction {
            new_y: [[0; Self::HEIGHT]; Self::WIDTH],
        };
        for x in 0..Self::WIDTH {
            let mut dst = Self::HEIGHT;
            for y in (0..Self::HEIGHT).rev() {
                let cell = self.rows[y][x];
                if cell.is_empty() {
                    continue;
                }
                dst -= 1;
                self.rows[y][x] = Cell::Empty;
                self.rows[dst][x] = cell;
                compaction.new_y[x][y] = dst;
            }
        }
        compaction
    }

    /// Clears every standard cell of the given color and returns how many
    /// cells were removed.
    pub fn remove_color(&mut self, color: CellColor) -> usize {
        let mut removed = 0;
        for cell in self.rows.iter_mut().flatten() {
            if cell.color() == Some(color) {
                *cell = Cell::Empty;
                removed += 1;
            }
        }
        removed
    }

    /// Tallies standard-cell colors at and orthogonally around the given
    /// positions.
    ///
    /// Neighbors shared by several positions are counted once per position.
    #[must_use]
    pub fn color_tally<I>(&self, positions: I) -> ColorTally
    where
        I: IntoIterator<Item = (i32, i32)>,
    {
        const AROUND: [(i32, i32); 5] = [(-1, 0), (1, 0), (0, -1), (0, 1), (0, 0)];
        let mut tally = ColorTally::default();
        for (x, y) in positions {
            for (dx, dy) in AROUND {
                if let Some(color) = self.cell_at(x + dx, y + dy).and_then(Cell::color) {
                    tally.counts[color as usize] += 1;
                }
            }
        }
        tally
    }

    /// Pushes the grid up by `count` rows and fills the bottom with garbage
    /// rows, each with a single random hole.
    ///
    /// Whatever occupied the top `count` rows is discarded.
    pub fn push_garbage_rows<R>(&mut self, count: usize, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        let count = count.min(Self::HEIGHT);
        if count == 0 {
            return;
        }
        self.rows.copy_within(count.., 0);
        for row in &mut self.rows[Self::HEIGHT - count..] {
            *row = [Cell::Garbage; Self::WIDTH];
            row[rng.random_range(0..Self::WIDTH)] = Cell::Empty;
        }
    }

    /// Whether any cell in the top [`Self::DANGER_ROWS`] rows is filled.
    #[must_use]
    pub fn is_in_danger(&self) -> bool {
        self.rows[..Self::DANGER_ROWS]
            .iter()
            .flatten()
            .any(|c| c.is_filled())
    }

    /// Height of each column, counted from the floor.
    #[must_use]
    pub fn column_heights(&self) -> [usize; Self::WIDTH] {
        let mut heights = [0; Self::WIDTH];
        for (x, height) in heights.iter_mut().enumerate() {
            *height = (0..Self::HEIGHT)
                .find(|&y| self.rows[y][x].is_filled())
                .map_or(0, |y| Self::HEIGHT - y);
        }
        heights
    }

    /// Number of empty cells with a filled cell somewhere above them.
    #[must_use]
    pub fn count_holes(&self) -> usize {
        let mut holes = 0;
        for x in 0..Self::WIDTH {
            let mut covered = false;
            for y in 0..Self::HEIGHT {
                match (covered, self.rows[y][x].is_filled()) {
                    (_, true) => covered = true,
                    (true, false) => holes += 1,
                    (false, false) => {}
                }
            }
        }
        holes
    }
}

/// Per-color neighbor counts gathered for a color buster.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColorTally {
    counts: [u32; CellColor::ALL.len()],
}

impl ColorTally {
    #[must_use]
    pub fn count(&self, color: CellColor) -> u32 {
        self.counts[color as usize]
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.iter().all(|&c| c == 0)
    }

    /// All colors sharing the highest non-zero count, in palette order.
    #[must_use]
    pub fn leaders(&self) -> ArrayVec<CellColor, 7> {
        let max = self.counts.iter().copied().max().unwrap_or(0);
        if max == 0 {
            return ArrayVec::new();
        }
        CellColor::ALL
            .into_iter()
            .filter(|&color| self.count(color) == max)
            .collect()
    }

    /// Highest-count color, ties broken uniformly at random.
    pub fn pick_target<R>(&self, rng: &mut R) -> Option<CellColor>
    where
        R: Rng + ?Sized,
    {
        let leaders = self.leaders();
        if leaders.is_empty() {
            return None;
        }
        Some(leaders[rng.random_range(0..leaders.len())])
    }
}
