//! Greedy placement bot driving a session through player inputs.

use std::{iter, time::Duration};

use blockduel_engine::{
    BattleSession, EffectsSink, Grid, NetworkSink, Piece, PowerUp, SpawnKind,
};

const CLEARED_LINES_WEIGHT: f32 = 0.76;
const AGGREGATE_HEIGHT_WEIGHT: f32 = 0.51;
const HOLES_WEIGHT: f32 = 0.36;
const BUMPINESS_WEIGHT: f32 = 0.18;

/// Stack height at which the bot saves up for a color buster instead of
/// sending bombs.
const BUSTER_HEIGHT: usize = 12;
/// Pending garbage that makes the bot raise a shield.
const SHIELD_PENDING: u32 = 4;

/// Inputs for one turn: clockwise turns from spawn, then a horizontal target.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TurnPlan {
    rotations: usize,
    target_x: i32,
    landing: Piece,
    score: f32,
}

impl TurnPlan {
    #[must_use]
    pub(crate) fn landing(&self) -> Piece {
        self.landing
    }
}

/// Board features after a placement and its line clear.
#[derive(Debug, Clone, Copy)]
struct PlacementAnalysis {
    cleared_lines: usize,
    aggregate_height: usize,
    holes: usize,
    bumpiness: usize,
}

impl PlacementAnalysis {
    fn from_grid(grid: &Grid, landing: &Piece) -> Self {
        let mut after = grid.clone();
        after.fill_piece(landing);
        let cleared_lines = after.clear_lines().len();
        let heights = after.column_heights();
        Self {
            cleared_lines,
            aggregate_height: heights.iter().sum(),
            holes: after.count_holes(),
            bumpiness: heights.windows(2).map(|w| w[0].abs_diff(w[1])).sum(),
        }
    }

    #[expect(clippy::cast_precision_loss)]
    fn score(&self) -> f32 {
        CLEARED_LINES_WEIGHT * self.cleared_lines as f32
            - AGGREGATE_HEIGHT_WEIGHT * self.aggregate_height as f32
            - HOLES_WEIGHT * self.holes as f32
            - BUMPINESS_WEIGHT * self.bumpiness as f32
    }
}

/// Picks the best-scoring landing of `piece` over every reachable rotation
/// and column.
#[must_use]
pub(crate) fn plan_turn(grid: &Grid, piece: Piece) -> Option<TurnPlan> {
    let mut best: Option<TurnPlan> = None;
    for (rotations, rotated) in piece.super_rotations(grid).into_iter().enumerate() {
        let placements = iter::once(rotated)
            .chain(iter::successors(left(rotated, grid), |p| left(*p, grid)))
            .chain(iter::successors(right(rotated, grid), |p| right(*p, grid)));
        for placement in placements {
            let landing = placement.simulate_drop_position(grid);
            let score = PlacementAnalysis::from_grid(grid, &landing).score();
            if best.is_none_or(|b| score > b.score) {
                best = Some(TurnPlan {
                    rotations,
                    target_x: placement.position().x(),
                    landing,
                    score,
                });
            }
        }
    }
    best
}

fn left(piece: Piece, grid: &Grid) -> Option<Piece> {
    piece.left().filter(|moved| !grid.is_colliding(moved))
}

fn right(piece: Piece, grid: &Grid) -> Option<Piece> {
    piece.right().filter(|moved| !grid.is_colliding(moved))
}

/// Plays one turn every `turn_interval` of match time.
#[derive(Debug, Clone)]
pub(crate) struct PlacementBot {
    turn_interval: Duration,
    next_turn_at: Duration,
}

impl PlacementBot {
    pub(crate) fn new(turn_interval: Duration) -> Self {
        Self {
            turn_interval,
            next_turn_at: turn_interval,
        }
    }

    /// Buys a power-up if one is worth it, then places the falling piece if a
    /// turn is due. Returns the power-up bought.
    pub(crate) fn act<E, N>(
        &mut self,
        session: &mut BattleSession<E, N>,
        now: Duration,
    ) -> Option<PowerUp>
    where
        E: EffectsSink,
        N: NetworkSink,
    {
        if !session.state().is_playing() || now < self.next_turn_at {
            return None;
        }
        self.next_turn_at = now + self.turn_interval;

        let bought = choose_power_up(session)
            .filter(|&power_up| session.use_power_up(power_up).is_ok());

        let field = session.field();
        let falling = field.falling_piece();
        if falling.kind() == SpawnKind::Buster {
            log::debug!(
                "{} drops buster onto {:?}",
                session.player(),
                session.buster_target_preview()
            );
        }
        let Some(plan) = plan_turn(field.grid(), falling) else {
            return bought;
        };
        for _ in 0..plan.rotations {
            if session.try_rotate_right().is_err() {
                break;
            }
        }
        loop {
            let x = session.field().falling_piece().position().x();
            let moved = match x.cmp(&plan.target_x) {
                std::cmp::Ordering::Less => session.try_move_right(),
                std::cmp::Ordering::Greater => session.try_move_left(),
                std::cmp::Ordering::Equal => break,
            };
            if moved.is_err() {
                break;
            }
        }
        if session.field().simulate_drop_position() != plan.landing() {
            log::trace!("{} could not reach planned landing", session.player());
        }
        if let Err(e) = session.hard_drop(now) {
            log::debug!("{} hard drop refused: {e}", session.player());
        }
        bought
    }
}

fn choose_power_up<E, N>(session: &BattleSession<E, N>) -> Option<PowerUp>
where
    E: EffectsSink,
    N: NetworkSink,
{
    let ledger = session.power_ups();
    let max_height = session
        .field()
        .grid()
        .column_heights()
        .into_iter()
        .max()
        .unwrap_or(0);
    if session.garbage().pending() >= SHIELD_PENDING && ledger.can_afford(PowerUp::Shield) {
        return Some(PowerUp::Shield);
    }
    if max_height >= BUSTER_HEIGHT {
        return ledger
            .can_afford(PowerUp::ColorBuster)
            .then_some(PowerUp::ColorBuster);
    }
    ledger.can_afford(PowerUp::Bomb).then_some(PowerUp::Bomb)
}

#[cfg(test)]
mod tests {
    use blockduel_engine::{Cell, PieceKind};

    use super::*;

    #[test]
    fn test_plan_prefers_line_clear() {
        let mut grid = Grid::EMPTY;
        for x in 4..Grid::WIDTH {
            grid.set(x, Grid::HEIGHT - 1, Cell::Garbage);
        }
        let plan = plan_turn(&grid, Piece::new(PieceKind::I)).unwrap();
        let mut cells: Vec<_> = plan.landing().occupied_positions().collect();
        cells.sort_unstable();
        assert_eq!(cells, vec![(0, 19), (1, 19), (2, 19), (3, 19)]);
    }

    #[test]
    fn test_plan_avoids_holes() {
        let mut grid = Grid::EMPTY;
        grid.set(0, Grid::HEIGHT - 1, Cell::Garbage);
        let plan = plan_turn(&grid, Piece::new(PieceKind::O)).unwrap();
        assert!(plan.landing().occupied_positions().all(|(x, _)| x > 0));
    }
}
