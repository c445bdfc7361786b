use std::time::Duration;

use rand::Rng as _;
use rand_pcg::Pcg32;

use crate::{
    HoldError, PieceCollisionError,
    core::{
        grid::{ClearedRows, Grid},
        piece::{CellColor, Piece, SpawnKind},
    },
};

use super::{
    hazards::{ActiveHazards, BombId},
    piece_queue::{PieceQueue, PieceSeed},
};

const DEFAULT_BOMB_FUSE: Duration = Duration::from_secs(10);

/// One player's board: grid, falling piece, queue, hold and armed bombs.
///
/// Every mutation either fully applies or leaves the field untouched. Once a
/// piece fails to spawn the field is topped out and only [`Self::reset`]
/// brings it back.
#[derive(Debug, Clone)]
pub struct GameField {
    grid: Grid,
    falling_piece: Piece,
    queue: PieceQueue,
    hazards: ActiveHazards,
    rng: Pcg32,
    bomb_fuse: Duration,
    can_hold: bool,
    last_move_was_rotation: bool,
    topped_out: bool,
}

/// Color removed by a locked color buster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusterOutcome {
    pub target: CellColor,
    pub removed: usize,
}

/// Everything that happened when a piece locked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockReport {
    pub kind: SpawnKind,
    /// Grid rows removed by the clear, as indexed before removal.
    pub cleared_rows: ClearedRows,
    pub t_spin: bool,
    pub bomb_placed: Option<BombId>,
    pub bombs_defused: Vec<BombId>,
    /// `None` for non-buster pieces and for busters that touched no color.
    pub buster: Option<BusterOutcome>,
}

impl LockReport {
    #[must_use]
    pub fn lines(&self) -> usize {
        self.cleared_rows.len()
    }
}

impl Default for GameField {
    fn default() -> Self {
        Self::new()
    }
}

impl GameField {
    /// Creates a field with a random seed and the default bomb fuse.
    #[must_use]
    pub fn new() -> Self {
        Self::with_seed(rand::rng().random(), DEFAULT_BOMB_FUSE)
    }

    #[must_use]
    pub fn with_seed(seed: PieceSeed, bomb_fuse: Duration) -> Self {
        let mut queue = PieceQueue::with_seed(seed);
        let mut rng = seed.field_rng();
        let falling_piece = Piece::spawn(queue.pop_next(), &mut rng);
        Self {
            grid: Grid::EMPTY,
            falling_piece,
            queue,
            hazards: ActiveHazards::new(),
            rng,
            bomb_fuse,
            can_hold: true,
            last_move_was_rotation: false,
            topped_out: false,
        }
    }

    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    #[cfg(test)]
    pub(crate) fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    #[must_use]
    pub fn falling_piece(&self) -> Piece {
        self.falling_piece
    }

    #[must_use]
    pub fn hazards(&self) -> &ActiveHazards {
        &self.hazards
    }

    #[must_use]
    pub fn held_piece(&self) -> Option<SpawnKind> {
        self.queue.held_piece()
    }

    pub fn next_pieces(&self) -> impl Iterator<Item = SpawnKind> + '_ {
        self.queue.next_pieces()
    }

    #[must_use]
    pub fn can_hold(&self) -> bool {
        self.can_hold && !self.topped_out
    }

    #[must_use]
    pub fn is_topped_out(&self) -> bool {
        self.topped_out
    }

    /// Pushes an entry ahead of the bag-derived queue.
    pub fn insert_front(&mut self, kind: SpawnKind) {
        self.queue.insert_front(kind);
    }

    /// Moves the falling piece to an arbitrary non-colliding placement.
    ///
    /// Counts as a translation for T-spin purposes.
    pub fn set_falling_piece(&mut self, piece: Piece) -> Result<(), PieceCollisionError> {
        if self.grid.is_colliding(&piece) {
            return Err(PieceCollisionError);
        }
        self.falling_piece = piece;
        self.last_move_was_rotation = false;
        Ok(())
    }

    fn try_translate(&mut self, piece: Option<Piece>) -> Result<(), PieceCollisionError> {
        self.set_falling_piece(piece.ok_or(PieceCollisionError)?)
    }

    pub fn try_move_left(&mut self) -> Result<(), PieceCollisionError> {
        self.try_translate(self.falling_piece.left())
    }

    pub fn try_move_right(&mut self) -> Result<(), PieceCollisionError> {
        self.try_translate(self.falling_piece.right())
    }

    /// One step down. An error means the piece rests on something and the
    /// next step is a lock.
    pub fn try_move_down(&mut self) -> Result<(), PieceCollisionError> {
        self.try_translate(self.falling_piece.down())
    }

    fn try_rotate(&mut self, rotated: Option<Piece>) -> Result<(), PieceCollisionError> {
        let piece = rotated.ok_or(PieceCollisionError)?;
        self.falling_piece = piece;
        self.last_move_was_rotation = true;
        Ok(())
    }

    pub fn try_rotate_right(&mut self) -> Result<(), PieceCollisionError> {
        self.try_rotate(self.falling_piece.super_rotated_right(&self.grid))
    }

    pub fn try_rotate_left(&mut self) -> Result<(), PieceCollisionError> {
        self.try_rotate(self.falling_piece.super_rotated_left(&self.grid))
    }

    /// Whether locking right now would count as a T-spin.
    #[must_use]
    pub fn is_t_spin(&self) -> bool {
        self.last_move_was_rotation && self.falling_piece.is_t_slot(&self.grid)
    }

    /// Where the falling piece would land if hard-dropped.
    #[must_use]
    pub fn simulate_drop_position(&self) -> Piece {
        self.falling_piece.simulate_drop_position(&self.grid)
    }

    /// Color a falling buster would remove if hard-dropped now.
    ///
    /// Ties resolve to the first color in palette order; the actual lock
    /// breaks ties at random.
    #[must_use]
    pub fn buster_target_preview(&self) -> Option<CellColor> {
        if self.falling_piece.kind() != SpawnKind::Buster {
            return None;
        }
        let landing = self.simulate_drop_position();
        let tally = self.grid.color_tally(landing.occupied_positions());
        tally.leaders().first().copied()
    }

    /// Swaps the falling piece with the hold slot, or stores it and spawns the
    /// next queued piece. Allowed once per spawned piece.
    ///
    /// The returned piece spawns fresh at the spawn position. If it collides
    /// there, the field tops out.
    pub fn try_hold(&mut self) -> Result<(), HoldError> {
        if !self.can_hold() {
            return Err(HoldError::HoldAlreadyUsed);
        }
        let next = self.queue.hold(self.falling_piece.kind());
        self.place_spawned(next).map_err(HoldError::PieceCollision)?;
        self.can_hold = false;
        Ok(())
    }

    fn place_spawned(&mut self, kind: SpawnKind) -> Result<(), PieceCollisionError> {
        self.falling_piece = Piece::spawn(kind, &mut self.rng);
        self.can_hold = true;
        self.last_move_was_rotation = false;
        if self.grid.is_colliding(&self.falling_piece) {
            log::info!("spawn of {} collided, board topped out", kind.as_char());
            self.topped_out = true;
            return Err(PieceCollisionError);
        }
        Ok(())
    }

    fn spawn_next(&mut self) -> Result<(), PieceCollisionError> {
        let kind = self.queue.pop_next();
        self.place_spawned(kind)
    }

    /// Locks the falling piece where it is, resolves bombs, busters and line
    /// clears, and spawns the next piece.
    ///
    /// The error reports that the next piece could not spawn; the lock itself
    /// has been applied either way.
    pub fn complete_piece_drop(
        &mut self,
        now: Duration,
    ) -> (LockReport, Result<(), PieceCollisionError>) {
        let piece = self.falling_piece;
        let t_spin = self.is_t_spin();
        let mut bomb_placed = None;
        let mut buster = None;

        match piece.kind() {
            SpawnKind::Standard(_) => self.grid.fill_piece(&piece),
            SpawnKind::Bomb => {
                self.grid.fill_piece(&piece);
                let cells = piece
                    .occupied_positions()
                    .filter_map(|(x, y)| Some((usize::try_from(x).ok()?, usize::try_from(y).ok()?)));
                bomb_placed = Some(self.hazards.place(cells, now + self.bomb_fuse));
            }
            SpawnKind::Buster => {
                let tally = self.grid.color_tally(piece.occupied_positions());
                if let Some(target) = tally.pick_target(&mut self.rng) {
                    let removed = self.grid.remove_color(target);
                    let compaction = self.grid.apply_gravity();
                    self.hazards.follow_compaction(&compaction);
                    log::debug!("buster removed {removed} {target:?} cells");
                    buster = Some(BusterOutcome { target, removed });
                }
            }
        }

        let cleared_rows = self.grid.clear_lines();
        let bombs_defused = self.hazards.resolve_line_clear(&mut self.grid, &cleared_rows);
        if !bombs_defused.is_empty() {
            log::debug!("{} bombs defused by line clear", bombs_defused.len());
        }

        let report = LockReport {
            kind: piece.kind(),
            cleared_rows,
            t_spin,
            bomb_placed,
            bombs_defused,
            buster,
        };
        (report, self.spawn_next())
    }

    /// Hard drop: falls to the landing position, then locks.
    pub fn hard_drop_and_complete(
        &mut self,
        now: Duration,
    ) -> (LockReport, Result<(), PieceCollisionError>) {
        let dropped = self.simulate_drop_position();
        if dropped != self.falling_piece {
            self.falling_piece = dropped;
            self.last_move_was_rotation = false;
        }
        self.complete_piece_drop(now)
    }

    /// Inserts `rows` garbage rows at the bottom.
    ///
    /// A falling piece that now overlaps the stack is lifted by up to `rows`
    /// cells; if it still overlaps, the field tops out.
    pub fn insert_garbage(&mut self, rows: usize) -> Result<(), PieceCollisionError> {
        if rows == 0 {
            return Ok(());
        }
        self.grid.push_garbage_rows(rows, &mut self.rng);
        self.hazards.follow_garbage(rows);
        if !self.grid.is_colliding(&self.falling_piece) {
            return Ok(());
        }
        let lifted = (1..=i32::try_from(rows).unwrap_or(i32::MAX))
            .map_while(|dy| self.falling_piece.shifted(0, -dy))
            .find(|piece| !self.grid.is_colliding(piece));
        if let Some(piece) = lifted {
            self.falling_piece = piece;
            return Ok(());
        }
        log::info!("garbage pushed the stack into the falling piece, board topped out");
        self.topped_out = true;
        Err(PieceCollisionError)
    }

    /// Detonates bombs whose fuse ran out by `now`, leaving holes.
    pub fn detonate_expired(&mut self, now: Duration) -> Vec<BombId> {
        self.hazards.detonate_expired(&mut self.grid, now)
    }

    /// Stops every fuse; bomb cells stay on the grid as inert blocks.
    pub fn disarm_bombs(&mut self) {
        self.hazards.clear();
    }

    /// Pushes every bomb fuse back by `by`.
    pub fn postpone_fuses(&mut self, by: Duration) {
        self.hazards.postpone(by);
    }

    /// Whole seconds left on the earliest fuse, rounded up.
    #[must_use]
    pub fn bomb_countdown(&self, now: Duration) -> Option<u64> {
        let left = self.hazards.next_expiry()?.saturating_sub(now);
        Some(left.as_millis().div_ceil(1000).try_into().unwrap_or(u64::MAX))
    }

    /// Empties the grid and disarms every bomb, then spawns a fresh piece.
    ///
    /// The queue and the hold slot are kept.
    pub fn reset(&mut self) -> Result<(), PieceCollisionError> {
        self.grid = Grid::EMPTY;
        self.hazards.clear();
        self.topped_out = false;
        self.spawn_next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Cell, PieceKind, PiecePosition};

    const SEED: PieceSeed = PieceSeed::from_bytes([7; 16]);
    const FUSE: Duration = Duration::from_secs(10);
    const BOTTOM: usize = Grid::HEIGHT - 1;

    fn field() -> GameField {
        GameField::with_seed(SEED, FUSE)
    }

    fn field_with_falling(piece: Piece) -> GameField {
        let mut field = field();
        field.falling_piece = piece;
        field
    }

    fn fill_row_except(field: &mut GameField, y: usize, skip: &[usize]) {
        for x in 0..Grid::WIDTH {
            if !skip.contains(&x) {
                field.grid.set(x, y, Cell::Garbage);
            }
        }
    }

    #[test]
    fn test_rejected_move_keeps_state() {
        let mut field = field_with_falling(
            Piece::new(PieceKind::O).at(PiecePosition::new(0, 3)),
        );
        let before = field.falling_piece();
        assert!(field.try_move_left().is_err());
        assert_eq!(field.falling_piece(), before);
        assert!(field.try_move_right().is_ok());
        assert_eq!(field.falling_piece().position().x(), 1);
    }

    #[test]
    fn test_locked_cells_inside_grid_and_not_overlapping() {
        let mut field = field();
        for _ in 0..40 {
            let before: Vec<_> = field
                .grid()
                .rows()
                .flatten()
                .map(|c| c.is_filled())
                .collect();
            let landing = field.simulate_drop_position();
            let (report, result) = field.hard_drop_and_complete(Duration::ZERO);
            if report.kind.is_standard() && report.lines() == 0 {
                for (x, y) in landing.occupied_positions() {
                    let (x, y) = (usize::try_from(x).unwrap(), usize::try_from(y).unwrap());
                    assert!(x < Grid::WIDTH && y < Grid::HEIGHT);
                    assert!(!before[y * Grid::WIDTH + x]);
                    assert!(field.grid().get(x, y).is_filled());
                }
            }
            if result.is_err() {
                assert!(field.is_topped_out());
                break;
            }
        }
    }

    #[test]
    fn test_line_clear_on_lock() {
        let mut field = field_with_falling(
            Piece::new(PieceKind::I).at(PiecePosition::new(8, 0)),
        );
        fill_row_except(&mut field, BOTTOM, &[8, 9, 10, 11]);
        let (report, result) = field.hard_drop_and_complete(Duration::ZERO);
        assert!(result.is_ok());
        assert_eq!(report.cleared_rows.as_slice(), &[BOTTOM]);
        assert!(!report.t_spin);
        assert!(field.grid().rows().flatten().all(|c| c.is_empty()));
    }

    #[test]
    fn test_t_spin_requires_rotation_as_last_move() {
        // Pocket for a T pointing down: corners of the box blocked.
        let mut field = field_with_falling(
            Piece::new(PieceKind::T)
                .rotated_right()
                .at(PiecePosition::new(3, 16)),
        );
        field.grid.set(3, 16, Cell::Garbage);
        field.grid.set(5, 16, Cell::Garbage);
        field.grid.set(3, 18, Cell::Garbage);
        assert!(!field.is_t_spin());

        field.last_move_was_rotation = true;
        assert!(field.is_t_spin());

        field.try_move_down().unwrap();
        assert!(!field.is_t_spin());
    }

    #[test]
    fn test_rotation_sets_t_spin_flag() {
        let mut field = field_with_falling(
            Piece::new(PieceKind::T).at(PiecePosition::new(3, 17)),
        );
        field.grid.set(3, 17, Cell::Garbage);
        field.grid.set(5, 17, Cell::Garbage);
        field.grid.set(3, 19, Cell::Garbage);
        field.try_rotate_right().unwrap();
        assert!(field.is_t_spin());
        let (report, _) = field.complete_piece_drop(Duration::ZERO);
        assert!(report.t_spin);
    }

    #[test]
    fn test_bomb_lock_registers_hazard() {
        let mut field = field_with_falling(Piece::bomb());
        let (report, _) = field.hard_drop_and_complete(Duration::from_secs(5));
        let id = report.bomb_placed.unwrap();
        let bomb = field.hazards().bombs().next().unwrap();
        assert_eq!(bomb.id(), id);
        assert_eq!(bomb.expires_at(), Duration::from_secs(15));
        for &(x, y) in bomb.cells() {
            assert_eq!(field.grid().get(x, y), Cell::Bomb);
        }
        assert_eq!(field.bomb_countdown(Duration::from_millis(5001)), Some(10));
        assert_eq!(field.bomb_countdown(Duration::from_millis(14_001)), Some(1));
    }

    #[test]
    fn test_bomb_defused_by_clearing_one_of_its_rows() {
        let mut field = field_with_falling(
            Piece::bomb().at(PiecePosition::new(0, 0)),
        );
        fill_row_except(&mut field, BOTTOM, &[0, 1]);
        let (report, _) = field.hard_drop_and_complete(Duration::ZERO);
        assert_eq!(report.lines(), 1);
        assert_eq!(report.bombs_defused, vec![report.bomb_placed.unwrap()]);
        assert!(field.hazards().is_empty());
        assert!(field.grid().rows().flatten().all(|c| c.is_empty()));
    }

    #[test]
    fn test_bomb_detonation_leaves_holes() {
        let mut field = field_with_falling(
            Piece::bomb().at(PiecePosition::new(4, 0)),
        );
        field.grid.set(4, BOTTOM, Cell::Garbage);
        field.grid.set(5, BOTTOM, Cell::Garbage);
        field.hard_drop_and_complete(Duration::ZERO);
        field.grid.set(4, BOTTOM - 3, Cell::Standard(PieceKind::L));
        let heights = field.grid().column_heights();

        assert!(field.detonate_expired(FUSE / 2).is_empty());
        assert_eq!(field.detonate_expired(FUSE).len(), 1);
        assert_eq!(field.grid().column_heights(), heights);
        assert!(field.grid().get(4, BOTTOM - 1).is_empty());
        assert!(field.grid().get(4, BOTTOM - 2).is_empty());
        assert_eq!(field.grid().get(4, BOTTOM - 3), Cell::Standard(PieceKind::L));
    }

    #[test]
    fn test_buster_removes_majority_color_and_compacts() {
        // Buster disguised as O lands on top of three Z cells and one I cell.
        let mut field = field_with_falling(
            Piece::buster(PieceKind::O).at(PiecePosition::new(4, 0)),
        );
        field.grid.set(4, BOTTOM, Cell::Standard(PieceKind::Z));
        field.grid.set(5, BOTTOM, Cell::Standard(PieceKind::Z));
        field.grid.set(6, BOTTOM - 1, Cell::Standard(PieceKind::Z));
        field.grid.set(3, BOTTOM - 2, Cell::Standard(PieceKind::I));
        // A far-away Z cell with an I cell stacked on top.
        field.grid.set(10, BOTTOM, Cell::Standard(PieceKind::Z));
        field.grid.set(10, BOTTOM - 1, Cell::Standard(PieceKind::I));
        field.grid.set(6, BOTTOM, Cell::Garbage);

        assert_eq!(field.buster_target_preview(), Some(CellColor::Red));
        let (report, _) = field.hard_drop_and_complete(Duration::ZERO);
        let buster = report.buster.unwrap();
        assert_eq!(buster.target, CellColor::Red);
        assert_eq!(buster.removed, 4);

        assert!(
            field
                .grid()
                .rows()
                .flatten()
                .all(|c| c.color() != Some(CellColor::Red))
        );
        // The buster itself leaves nothing behind.
        assert!(field.grid().rows().flatten().all(|&c| c != Cell::BusterPending));
        // Every column is contiguous from the floor.
        for x in 0..Grid::WIDTH {
            let height = field.grid().column_heights()[x];
            for y in Grid::HEIGHT - height..Grid::HEIGHT {
                assert!(field.grid().get(x, y).is_filled(), "hole at ({x}, {y})");
            }
        }
        assert_eq!(field.grid().get(10, BOTTOM), Cell::Standard(PieceKind::I));
        assert_eq!(field.grid().get(3, BOTTOM), Cell::Standard(PieceKind::I));
    }

    #[test]
    fn test_buster_gravity_completes_five_rows() {
        let mut field = field_with_falling(
            Piece::buster(PieceKind::O).at(PiecePosition::new(2, 0)),
        );
        for y in BOTTOM - 4..=BOTTOM {
            fill_row_except(&mut field, y, &[0]);
        }
        // Column 0 overhangs a red column; removing the red drops it into
        // the five open cells below.
        for y in BOTTOM - 9..=BOTTOM - 5 {
            field.grid.set(0, y, Cell::Standard(PieceKind::J));
            field.grid.set(1, y, Cell::Standard(PieceKind::Z));
        }

        let (report, result) = field.hard_drop_and_complete(Duration::ZERO);
        assert!(result.is_ok());
        assert_eq!(
            report.buster,
            Some(BusterOutcome {
                target: CellColor::Red,
                removed: 5,
            })
        );
        assert_eq!(report.lines(), 5);
        assert_eq!(
            report.cleared_rows.as_slice(),
            &[BOTTOM - 4, BOTTOM - 3, BOTTOM - 2, BOTTOM - 1, BOTTOM]
        );
        assert!(field.grid().rows().flatten().all(|c| c.is_empty()));
    }

    #[test]
    fn test_bomb_follows_buster_gravity_then_defuses() {
        let mut field = field_with_falling(
            Piece::bomb().at(PiecePosition::new(0, 0)),
        );
        fill_row_except(&mut field, BOTTOM, &[0, 1, 11]);
        field.grid.set(0, BOTTOM, Cell::Standard(PieceKind::Z));
        field.grid.set(1, BOTTOM, Cell::Standard(PieceKind::Z));
        let (report, _) = field.hard_drop_and_complete(Duration::ZERO);
        let bomb = report.bomb_placed.unwrap();
        assert_eq!(report.lines(), 0);
        assert_eq!(field.grid().get(0, BOTTOM - 1), Cell::Bomb);

        // Red cells beside the buster landing spot, garbage stacked above.
        field.grid.set(11, BOTTOM - 1, Cell::Standard(PieceKind::Z));
        field.grid.set(11, BOTTOM - 2, Cell::Standard(PieceKind::Z));
        field.grid.set(11, BOTTOM - 3, Cell::Garbage);
        field
            .set_falling_piece(Piece::buster(PieceKind::O).at(PiecePosition::new(9, 0)))
            .unwrap();

        let (report, result) = field.hard_drop_and_complete(Duration::ZERO);
        assert!(result.is_ok());
        assert_eq!(
            report.buster,
            Some(BusterOutcome {
                target: CellColor::Red,
                removed: 4,
            })
        );
        assert_eq!(report.cleared_rows.as_slice(), &[BOTTOM]);
        assert_eq!(report.bombs_defused, vec![bomb]);
        assert!(field.hazards().is_empty());
        assert!(field.grid().rows().flatten().all(|c| c.is_empty()));
    }

    #[test]
    fn test_buster_without_neighbors_has_no_effect() {
        let mut field = field_with_falling(Piece::buster(PieceKind::T));
        field.grid.set(0, BOTTOM, Cell::Garbage);
        let (report, _) = field.hard_drop_and_complete(Duration::ZERO);
        assert_eq!(report.buster, None);
        assert_eq!(field.grid().rows().flatten().filter(|c| c.is_filled()).count(), 1);
    }

    #[test]
    fn test_hold_once_per_spawn() {
        let mut field = field();
        let first = field.falling_piece().kind();
        let next = field.next_pieces().next().unwrap();

        field.try_hold().unwrap();
        assert_eq!(field.held_piece(), Some(first));
        assert_eq!(field.falling_piece().kind(), next);
        assert!(matches!(field.try_hold(), Err(HoldError::HoldAlreadyUsed)));

        field.hard_drop_and_complete(Duration::ZERO);
        assert!(field.can_hold());
        field.try_hold().unwrap();
        assert_eq!(field.falling_piece().kind(), first);
        assert_eq!(
            field.falling_piece().position(),
            PiecePosition::SPAWN_POSITION
        );
    }

    #[test]
    fn test_spawn_collision_tops_out() {
        let mut field = field();
        for y in 0..Grid::HEIGHT {
            fill_row_except(&mut field, y, &[0]);
        }
        let (_, result) = field.complete_piece_drop(Duration::ZERO);
        assert!(result.is_err());
        assert!(field.is_topped_out());
        assert!(!field.can_hold());

        field.reset().unwrap();
        assert!(!field.is_topped_out());
        assert!(field.grid().rows().flatten().all(|c| c.is_empty()));
    }

    #[test]
    fn test_garbage_lifts_falling_piece() {
        let mut field = field_with_falling(
            Piece::new(PieceKind::O).at(PiecePosition::new(0, 17)),
        );
        field.insert_garbage(2).unwrap();
        assert_eq!(field.falling_piece().position().y(), 16);
        assert!(!field.grid().is_colliding(&field.falling_piece()));
        let garbage_rows = field
            .grid()
            .rows()
            .filter(|row| row.contains(&Cell::Garbage))
            .count();
        assert_eq!(garbage_rows, 2);
    }

    #[test]
    fn test_garbage_moves_bombs_up() {
        let mut field = field_with_falling(Piece::bomb());
        field.hard_drop_and_complete(Duration::ZERO);
        field.insert_garbage(1).unwrap();
        for &(x, y) in field.hazards().bombs().next().unwrap().cells() {
            assert!(y < BOTTOM);
            assert_eq!(field.grid().get(x, y), Cell::Bomb);
        }
    }
}
