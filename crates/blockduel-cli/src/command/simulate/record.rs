use blockduel_engine::{
    BattleConfig, EffectEvent, GameStats, Grid, MatchEnd, PieceSeed, PlayerId, PowerUp,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result of a simulated match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct SimulationRecord {
    /// Timestamp when the simulation finished (ISO 8601 format)
    pub simulated_at: DateTime<Utc>,
    /// Seed shared by both piece queues
    pub seed: PieceSeed,
    pub config: BattleConfig,
    /// Match time simulated until both boards stopped or time ran out
    pub match_time_ms: u64,
    pub players: Vec<PlayerRecord>,
}

/// Final state of one board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct PlayerRecord {
    pub player: PlayerId,
    /// `None` when the simulation stopped before the match ended
    pub match_end: Option<MatchEnd>,
    pub stats: GameStats,
    pub currency: u32,
    pub pending_garbage: u32,
    pub power_ups_used: Vec<PowerUp>,
    pub effects_emitted: usize,
    /// Whether the opponent's mirror of this board matches the real grid
    pub mirror_in_sync: bool,
    /// Grid rows, top first, one character per cell
    pub final_grid: Vec<String>,
}

/// One line of the effect log.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct EffectLogLine<'a> {
    pub at_ms: u64,
    pub player: PlayerId,
    #[serde(flatten)]
    pub effect: &'a EffectEvent,
}

pub(crate) fn grid_lines(grid: &Grid) -> Vec<String> {
    grid.rows()
        .map(|row| row.iter().map(|cell| cell.as_char()).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effect_log_line_is_flat() {
        let effect = EffectEvent::AttackSent { lines: 3 };
        let line = EffectLogLine {
            at_ms: 1200,
            player: PlayerId(2),
            effect: &effect,
        };
        assert_eq!(
            serde_json::to_string(&line).unwrap(),
            r#"{"at_ms":1200,"player":2,"event":"attack_sent","lines":3}"#
        );
    }

    #[test]
    fn test_grid_lines() {
        let mut grid = Grid::EMPTY;
        grid.set(0, Grid::HEIGHT - 1, blockduel_engine::Cell::Garbage);
        let lines = grid_lines(&grid);
        assert_eq!(lines.len(), Grid::HEIGHT);
        assert_eq!(lines[0], ".".repeat(Grid::WIDTH));
        assert!(lines[Grid::HEIGHT - 1].starts_with('G'));
    }
}
