//! Boundary between a board and the outside world.
//!
//! A [`BattleSession`](crate::BattleSession) never talks to a renderer, an
//! audio engine or a transport directly. It emits [`EffectEvent`]s into an
//! [`EffectsSink`] and [`NetworkMessage`]s into a [`NetworkSink`], both handed
//! to it at construction. The opponent's board is a [`MirrorBoard`] that only
//! ever changes by accepting validated snapshots.

use serde::{Deserialize, Serialize};

use crate::core::{
    grid::{Cell, Grid, SnapshotError},
    piece::{CellColor, PieceDescriptor, SpawnKind},
};

use super::{hazards::BombId, power_up::PowerUp};

/// Identifies a player within a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[serde(transparent)]
#[display("player {_0}")]
pub struct PlayerId(pub u32);

/// Why a match ended for a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchEnd {
    /// This board could not spawn a piece.
    ToppedOut,
    /// The opponent topped out.
    OpponentToppedOut,
    /// The time limit ran out.
    TimeUp,
}

/// Fire-and-forget cue for visual and audio effects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EffectEvent {
    LineClear {
        lines: usize,
        t_spin: bool,
        back_to_back: bool,
        combo: u32,
    },
    AttackSent {
        lines: u32,
    },
    GarbageQueued {
        pending: u32,
    },
    GarbageLanded {
        rows: u32,
    },
    ShieldRaised,
    ShieldBlocked {
        lines: u32,
    },
    PowerUpUsed {
        power_up: PowerUp,
    },
    BombIncoming,
    BombPlaced {
        id: BombId,
        fuse_ms: u64,
    },
    BombDefused {
        id: BombId,
    },
    BombDetonated {
        id: BombId,
    },
    BusterResolved {
        color: CellColor,
        removed: usize,
    },
    DangerChanged {
        in_danger: bool,
    },
    ToppedOut,
    KnockoutReset,
    Paused,
    Resumed,
    MatchEnded {
        reason: MatchEnd,
    },
}

impl EffectEvent {
    /// Celebration tier of a line clear: 1, 2, 3, or 4 for four and more.
    #[must_use]
    pub fn clear_tier(&self) -> Option<usize> {
        match self {
            EffectEvent::LineClear { lines, .. } => Some((*lines).clamp(1, 4)),
            _ => None,
        }
    }
}

/// State of a board as replicated to the opponent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub grid: Vec<Vec<Cell>>,
    pub pending_garbage: u32,
    pub next: Vec<SpawnKind>,
    pub held: Option<SpawnKind>,
    /// Falling piece; absent once the board is over.
    pub active: Option<PieceDescriptor>,
    pub danger: bool,
    pub game_over: bool,
    pub score: u32,
    pub knockouts: u32,
}

/// Message for the transport to deliver to the other side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NetworkMessage {
    Snapshot(BoardSnapshot),
    Attack { to: PlayerId, lines: u32 },
    Bomb { to: PlayerId },
    GameOver { from: PlayerId },
}

/// Pause state crossing the boundary, with who may lift it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PauseSignal {
    pub paused: bool,
    /// Whether the receiving side may resume on its own.
    pub can_unpause: bool,
}

pub trait EffectsSink {
    fn emit(&mut self, event: EffectEvent);
}

pub trait NetworkSink {
    fn send(&mut self, message: NetworkMessage);
}

/// Sink that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EffectsSink for NullSink {
    fn emit(&mut self, _event: EffectEvent) {}
}

impl NetworkSink for NullSink {
    fn send(&mut self, _message: NetworkMessage) {}
}

impl EffectsSink for Vec<EffectEvent> {
    fn emit(&mut self, event: EffectEvent) {
        self.push(event);
    }
}

impl NetworkSink for Vec<NetworkMessage> {
    fn send(&mut self, message: NetworkMessage) {
        self.push(message);
    }
}

impl<T> EffectsSink for &mut T
where
    T: EffectsSink + ?Sized,
{
    fn emit(&mut self, event: EffectEvent) {
        (**self).emit(event);
    }
}

impl<T> NetworkSink for &mut T
where
    T: NetworkSink + ?Sized,
{
    fn send(&mut self, message: NetworkMessage) {
        (**self).send(message);
    }
}

/// Read-only copy of the opponent's board.
///
/// Nothing is simulated here; state only changes through snapshots that pass
/// shape validation. A rejected snapshot leaves the previous state in place.
#[derive(Debug, Clone, Default)]
pub struct MirrorBoard {
    grid: Grid,
    last: Option<BoardSnapshot>,
}

impl MirrorBoard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Last accepted full snapshot, if any.
    #[must_use]
    pub fn last_snapshot(&self) -> Option<&BoardSnapshot> {
        self.last.as_ref()
    }

    /// Replaces the mirrored grid.
    ///
    /// Malformed grids are expected from stale or partial network data; the
    /// caller may ignore the error.
    pub fn apply_snapshot(&mut self, rows: &[Vec<Cell>]) -> Result<(), SnapshotError> {
        let grid = Grid::try_from_rows(rows).inspect_err(|e| {
            log::debug!("rejected snapshot grid: {e}");
        })?;
        self.grid = grid;
        Ok(())
    }

    /// Replaces grid and board metadata from a full snapshot.
    pub fn apply_remote(&mut self, snapshot: &BoardSnapshot) -> Result<(), SnapshotError> {
        self.apply_snapshot(&snapshot.grid)?;
        self.last = Some(snapshot.clone());
        Ok(())
    }

    /// Grid with the remote falling piece drawn in, for display.
    #[must_use]
    pub fn grid_with_active(&self) -> Grid {
        let mut grid = self.grid.clone();
        let Some(active) = self.last.as_ref().and_then(|s| s.active) else {
            return grid;
        };
        grid.fill_piece(&active.to_piece());
        grid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Piece, PieceKind, PiecePosition};

    fn snapshot_with(grid: Vec<Vec<Cell>>) -> BoardSnapshot {
        BoardSnapshot {
            grid,
            pending_garbage: 0,
            next: vec![SpawnKind::Standard(PieceKind::I)],
            held: None,
            active: None,
            danger: false,
            game_over: false,
            score: 0,
            knockouts: 0,
        }
    }

    #[test]
    fn test_malformed_snapshots_are_ignored() {
        let mut mirror = MirrorBoard::new();
        let mut good = Grid::EMPTY;
        good.set(0, Grid::HEIGHT - 1, Cell::Garbage);
        mirror.apply_snapshot(&good.to_rows()).unwrap();

        assert_eq!(mirror.apply_snapshot(&[]), Err(SnapshotError::Empty));
        let mut ragged = Grid::EMPTY.to_rows();
        ragged[0].push(Cell::Empty);
        assert!(mirror.apply_snapshot(&ragged).is_err());
        assert!(
            mirror
                .apply_snapshot(&[vec![Cell::Empty; 3], vec![Cell::Empty; 3]])
                .is_err()
        );

        assert_eq!(mirror.grid(), &good);
    }

    #[test]
    fn test_remote_snapshot_keeps_metadata() {
        let mut mirror = MirrorBoard::new();
        let snapshot = snapshot_with(Grid::EMPTY.to_rows());
        mirror.apply_remote(&snapshot).unwrap();
        assert_eq!(mirror.last_snapshot(), Some(&snapshot));

        let broken = snapshot_with(vec![]);
        assert!(mirror.apply_remote(&broken).is_err());
        assert_eq!(mirror.last_snapshot(), Some(&snapshot));
    }

    #[test]
    fn test_grid_with_active_draws_piece() {
        let mut mirror = MirrorBoard::new();
        let mut snapshot = snapshot_with(Grid::EMPTY.to_rows());
        let piece = Piece::new(PieceKind::O).at(PiecePosition::new(0, 0));
        snapshot.active = Some(piece.descriptor());
        mirror.apply_remote(&snapshot).unwrap();
        let grid = mirror.grid_with_active();
        assert_eq!(grid.get(0, 0), Cell::Standard(PieceKind::O));
        assert_eq!(grid.get(1, 1), Cell::Standard(PieceKind::O));
        assert!(mirror.grid().get(0, 0).is_empty());
    }

    #[test]
    fn test_grid_with_active_draws_buster_disguise() {
        let mut mirror = MirrorBoard::new();
        let mut snapshot = snapshot_with(Grid::EMPTY.to_rows());
        let piece = Piece::buster(PieceKind::I).at(PiecePosition::new(0, 5));
        snapshot.active = Some(piece.descriptor());
        let json = serde_json::to_string(&snapshot).unwrap();
        mirror
            .apply_remote(&serde_json::from_str(&json).unwrap())
            .unwrap();

        let grid = mirror.grid_with_active();
        let drawn: Vec<_> = (0..Grid::HEIGHT)
            .flat_map(|y| (0..Grid::WIDTH).map(move |x| (x, y)))
            .filter(|&(x, y)| grid.get(x, y).is_filled())
            .collect();
        let expected: Vec<_> = piece
            .occupied_positions()
            .map(|(x, y)| (usize::try_from(x).unwrap(), usize::try_from(y).unwrap()))
            .collect();
        assert_eq!(drawn.len(), 4);
        for cell in expected {
            assert!(drawn.contains(&cell));
        }
    }

    #[test]
    fn test_message_json_shape() {
        let message = NetworkMessage::Attack {
            to: PlayerId(2),
            lines: 3,
        };
        let json = serde_json::to_string(&message).unwrap();
        assert_eq!(json, r#"{"type":"attack","to":2,"lines":3}"#);
        let back: NetworkMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, message);

        let snapshot = NetworkMessage::Snapshot(snapshot_with(Grid::EMPTY.to_rows()));
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.starts_with(r#"{"type":"snapshot","grid":[[".","#));
        assert_eq!(serde_json::from_str::<NetworkMessage>(&json).unwrap(), snapshot);
    }

    #[test]
    fn test_clear_tier() {
        let event = |lines| EffectEvent::LineClear {
            lines,
            t_spin: false,
            back_to_back: false,
            combo: 1,
        };
        assert_eq!(event(2).clear_tier(), Some(2));
        assert_eq!(event(4).clear_tier(), Some(4));
        assert_eq!(EffectEvent::ShieldRaised.clear_tier(), None);
    }

    #[test]
    fn test_sinks() {
        fn pause_cue<S: EffectsSink>(mut sink: S) {
            sink.emit(EffectEvent::Paused);
        }

        let mut events = Vec::new();
        pause_cue(&mut events);
        events.emit(EffectEvent::Resumed);
        assert_eq!(events, vec![EffectEvent::Paused, EffectEvent::Resumed]);
        NullSink.send(NetworkMessage::Bomb { to: PlayerId(1) });
    }
}
