use std::time::Duration;

use arrayvec::ArrayVec;

use crate::core::grid::{Cell, ClearedRows, Compaction, Grid};

/// Identifier of one bomb placement, unique within a board's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub struct BombId(u32);

/// A locked bomb: its cells on the grid and when its fuse runs out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedBomb {
    id: BombId,
    cells: ArrayVec<(usize, usize), 4>,
    expires_at: Duration,
}

impl PlacedBomb {
    #[must_use]
    pub fn id(&self) -> BombId {
        self.id
    }

    /// Current `(x, y)` grid positions of the bomb's cells.
    #[must_use]
    pub fn cells(&self) -> &[(usize, usize)] {
        &self.cells
    }

    #[must_use]
    pub fn expires_at(&self) -> Duration {
        self.expires_at
    }
}

/// Armed bombs on one board.
///
/// Every operation that moves grid rows must be mirrored here so that bomb
/// cells keep pointing at the grid cells they occupy.
#[derive(Debug, Clone, Default)]
pub struct ActiveHazards {
    bombs: Vec<PlacedBomb>,
    next_id: u32,
}

impl ActiveHazards {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bombs(&self) -> impl Iterator<Item = &PlacedBomb> {
        self.bombs.iter()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bombs.is_empty()
    }

    /// Registers a freshly locked bomb.
    pub fn place<I>(&mut self, cells: I, expires_at: Duration) -> BombId
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        let id = BombId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.bombs.push(PlacedBomb {
            id,
            cells: cells.into_iter().take(4).collect(),
            expires_at,
        });
        id
    }

    /// Defuses every bomb with a cell in one of the `cleared` rows and
    /// re-indexes the rest.
    ///
    /// Must be called right after [`Grid::clear_lines`] with its result.
    /// Leftover cells of defused bombs (in rows that were not cleared) are
    /// emptied on `grid`.
    pub fn resolve_line_clear(&mut self, grid: &mut Grid, cleared: &ClearedRows) -> Vec<BombId> {
        if cleared.is_empty() {
            return vec![];
        }
        let moved_row = |y: usize| y + cleared.iter().filter(|&&c| c > y).count();

        let mut defused = vec![];
        self.bombs.retain_mut(|bomb| {
            let hit = bomb.cells.iter().any(|(_, y)| cleared.contains(y));
            bomb.cells.retain(|(_, y)| !cleared.contains(y));
            for (_, y) in &mut bomb.cells {
                *y = moved_row(*y);
            }
            if hit {
                for &(x, y) in &bomb.cells {
                    if grid.get(x, y) == Cell::Bomb {
                        grid.set(x, y, Cell::Empty);
                    }
                }
                defused.push(bomb.id);
                return false;
            }
            true
        });
        defused
    }

    /// Follows cells moved by [`Grid::apply_gravity`].
    pub fn follow_compaction(&mut self, compaction: &Compaction) {
        for bomb in &mut self.bombs {
            for (x, y) in &mut bomb.cells {
                *y = compaction.moved_row(*x, *y);
            }
        }
    }

    /// Follows a grid pushed up by `rows` garbage rows; cells pushed off the
    /// top are forgotten, and so are bombs left without cells.
    pub fn follow_garbage(&mut self, rows: usize) {
        if rows == 0 {
            return;
        }
        self.bombs.retain_mut(|bomb| {
            bomb.cells.retain(|(_, y)| *y >= rows);
            for (_, y) in &mut bomb.cells {
                *y -= rows;
            }
            !bomb.cells.is_empty()
        });
    }

    /// Detonates every bomb whose fuse has run out by `now`.
    ///
    /// Detonated cells are emptied without compaction, leaving holes.
    pub fn detonate_expired(&mut self, grid: &mut Grid, now: Duration) -> Vec<BombId> {
        let mut detonated = vec![];
        self.bombs.retain(|bomb| {
            if bomb.expires_at > now {
                return true;
            }
            for &(x, y) in &bomb.cells {
                if grid.get(x, y) == Cell::Bomb {
                    grid.set(x, y, Cell::Empty);
                }
            }
            detonated.push(bomb.id);
            false
        });
        detonated
    }

    /// Earliest fuse deadline among armed bombs.
    #[must_use]
    pub fn next_expiry(&self) -> Option<Duration> {
        self.bombs.iter().map(|b| b.expires_at).min()
    }

    /// Pushes every fuse deadline back, e.g. after a pause.
    pub fn postpone(&mut self, by: Duration) {
        for bomb in &mut self.bombs {
            bomb.expires_at += by;
        }
    }

    pub fn clear(&mut self) {
        self.bombs.clear();
    }
}
