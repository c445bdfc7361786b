//! Battle logic and state management.
//!
//! This module orchestrates the core data structures into a two-player match:
//!
//! - [`GameField`] - One board: grid, falling piece, queue, hold and bombs
//! - [`BattleSession`] - A board in a match: timers, garbage, power-ups, pause
//! - [`GarbageLedger`] - Pending incoming garbage and its drip
//! - [`AttackCalculator`] - Combo and back-to-back aware attack values
//! - [`PowerUpLedger`] - Currency and shield state
//! - [`PieceQueue`] - 7-bag piece generation with front insertions
//! - [`MirrorBoard`] - Read-only replica of the opponent's board
//!
//! # Match Flow
//!
//! 1. Create a [`BattleSession`] per board with its sinks
//! 2. Feed player inputs and call [`BattleSession::advance`] with the current time
//! 3. Route [`NetworkMessage`]s from one session to the other
//! 4. Repeat until a session reports a [`MatchEnd`]
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//!
//! use blockduel_engine::{
//!     BattleConfig, BattleSession, NetworkMessage, NullSink, PieceSeed, PlayerId,
//! };
//!
//! let mut session = BattleSession::new(
//!     PlayerId(1),
//!     PlayerId(2),
//!     BattleConfig::default(),
//!     PieceSeed::from_bytes([1; 16]),
//!     Duration::ZERO,
//!     NullSink,
//!     Vec::<NetworkMessage>::new(),
//! );
//!
//! session.try_move_left().ok();
//! session.hard_drop(Duration::ZERO).unwrap();
//! session.advance(Duration::from_secs(1));
//!
//! // Every lock replicates the board.
//! assert!(!session.network().is_empty());
//! ```

pub use self::{
    attack::*, battle_session::*, config::*, drop_clock::*, game_field::*, game_stats::*,
    garbage::*, hazards::*, piece_queue::*, power_up::*, sync::*,
};

mod attack;
mod battle_session;
mod config;
mod drop_clock;
mod game_field;
mod game_stats;
mod garbage;
mod hazards;
mod piece_queue;
mod power_up;
mod sync;
