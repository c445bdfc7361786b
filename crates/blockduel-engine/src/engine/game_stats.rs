use serde::{Deserialize, Serialize};

/// Score values for line clears, indexed by lines cleared at once.
const SCORE_TABLE: [u32; 5] = [0, 100, 300, 500, 800];

/// Points for every piece that lands, cleared lines or not.
const LANDING_SCORE: u32 = 25;

/// Per-board match statistics.
///
/// # Scoring
///
/// - +25 for every landed piece
/// - +100 / 300 / 500 / 800 for 1 / 2 / 3 / 4 lines cleared at once
///
/// T-spins, combos and back-to-back streaks add attack, not score.
///
/// # Example
///
/// ```
/// use blockduel_engine::GameStats;
///
/// let mut stats = GameStats::new();
/// stats.complete_piece_drop(4);
///
/// assert_eq!(stats.score(), 825);
/// assert_eq!(stats.total_cleared_lines(), 4);
/// assert_eq!(stats.line_cleared_counter()[4], 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStats {
    score: u32,
    completed_pieces: u32,
    total_cleared_lines: u32,
    line_cleared_counter: [u32; 5],
    lines_sent: u32,
    knockouts: u32,
    bombs_defused: u32,
    bombs_detonated: u32,
}

impl GameStats {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            score: 0,
            completed_pieces: 0,
            total_cleared_lines: 0,
            line_cleared_counter: [0; 5],
            lines_sent: 0,
            knockouts: 0,
            bombs_defused: 0,
            bombs_detonated: 0,
        }
    }

    #[must_use]
    pub const fn score(&self) -> u32 {
        self.score
    }

    /// Pieces locked so far, including busters.
    #[must_use]
    pub const fn completed_pieces(&self) -> u32 {
        self.completed_pieces
    }

    #[must_use]
    pub const fn total_cleared_lines(&self) -> u32 {
        self.total_cleared_lines
    }

    /// Histogram of locks by lines cleared; index 0 counts locks without a clear.
    #[must_use]
    pub const fn line_cleared_counter(&self) -> &[u32; 5] {
        &self.line_cleared_counter
    }

    /// Attack lines sent to the opponent after countering.
    #[must_use]
    pub const fn lines_sent(&self) -> u32 {
        self.lines_sent
    }

    /// Opponent top-outs credited to this board.
    #[must_use]
    pub const fn knockouts(&self) -> u32 {
        self.knockouts
    }

    #[must_use]
    pub const fn bombs_defused(&self) -> u32 {
        self.bombs_defused
    }

    #[must_use]
    pub const fn bombs_detonated(&self) -> u32 {
        self.bombs_detonated
    }

    /// Updates statistics after a piece lands.
    pub fn complete_piece_drop(&mut self, cleared_lines: usize) {
        let index = cleared_lines.min(SCORE_TABLE.len() - 1);
        self.completed_pieces += 1;
        self.total_cleared_lines += u32::try_from(cleared_lines).unwrap_or(u32::MAX);
        self.line_cleared_counter[index] += 1;
        self.score += LANDING_SCORE + SCORE_TABLE[index];
    }

    pub fn record_attack(&mut self, lines: u32) {
        self.lines_sent += lines;
    }

    pub fn record_knockout(&mut self) {
        self.knockouts += 1;
    }

    pub fn record_bombs(&mut self, defused: usize, detonated: usize) {
        self.bombs_defused += u32::try_from(defused).unwrap_or(u32::MAX);
        self.bombs_detonated += u32::try_from(detonated).unwrap_or(u32::MAX);
    }
}
