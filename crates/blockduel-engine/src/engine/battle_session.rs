use std::time::Duration;

use crate::{
    ActionError, HoldError, PauseError, PieceCollisionError,
    core::piece::{CellColor, PieceKind, SpawnKind},
};

use super::{
    attack::AttackCalculator,
    config::BattleConfig,
    drop_clock::DropClock,
    game_field::{GameField, LockReport},
    game_stats::GameStats,
    garbage::{Delivery, GarbageLedger},
    piece_queue::PieceSeed,
    power_up::{PowerUp, PowerUpLedger},
    sync::{
        BoardSnapshot, EffectEvent, EffectsSink, MatchEnd, NetworkMessage, NetworkSink,
        PauseSignal, PlayerId,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum SessionState {
    Playing,
    Paused,
    GameOver,
}

/// One player's board inside a match.
///
/// The session owns every timer of the board. Time only moves when the host
/// calls [`Self::advance`] (or an input method) with the current match time;
/// pausing freezes the drop clock, the garbage drip and all bomb fuses.
///
/// Everything the outside world needs to hear about goes through the two
/// sinks: effect cues into `E`, messages for the opponent into `N`.
#[derive(Debug, Clone)]
pub struct BattleSession<E, N> {
    player: PlayerId,
    opponent: PlayerId,
    config: BattleConfig,
    field: GameField,
    garbage: GarbageLedger,
    power_ups: PowerUpLedger,
    attack: AttackCalculator,
    clock: DropClock,
    stats: GameStats,
    state: SessionState,
    paused_at: Option<Duration>,
    can_unpause: bool,
    in_danger: bool,
    match_end: Option<MatchEnd>,
    effects: E,
    network: N,
}

impl<E, N> BattleSession<E, N>
where
    E: EffectsSink,
    N: NetworkSink,
{
    #[must_use]
    pub fn new(
        player: PlayerId,
        opponent: PlayerId,
        config: BattleConfig,
        seed: PieceSeed,
        now: Duration,
        effects: E,
        network: N,
    ) -> Self {
        Self {
            player,
            opponent,
            field: GameField::with_seed(seed, config.bomb_fuse()),
            garbage: GarbageLedger::new(config.drip_interval(), config.drip_rate),
            power_ups: PowerUpLedger::new(config.costs),
            attack: AttackCalculator::new(),
            clock: DropClock::new(config.gravity, config.max_catch_up_steps, now),
            stats: GameStats::new(),
            state: SessionState::Playing,
            paused_at: None,
            can_unpause: true,
            in_danger: false,
            match_end: None,
            config,
            effects,
            network,
        }
    }

    #[must_use]
    pub fn player(&self) -> PlayerId {
        self.player
    }

    #[must_use]
    pub fn opponent(&self) -> PlayerId {
        self.opponent
    }

    #[must_use]
    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    #[must_use]
    pub fn field(&self) -> &GameField {
        &self.field
    }

    #[must_use]
    pub fn stats(&self) -> &GameStats {
        &self.stats
    }

    #[must_use]
    pub fn garbage(&self) -> &GarbageLedger {
        &self.garbage
    }

    #[must_use]
    pub fn power_ups(&self) -> &PowerUpLedger {
        &self.power_ups
    }

    #[must_use]
    pub fn attack(&self) -> &AttackCalculator {
        &self.attack
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Why the match ended, once it has.
    #[must_use]
    pub fn match_end(&self) -> Option<MatchEnd> {
        self.match_end
    }

    #[must_use]
    pub fn is_in_danger(&self) -> bool {
        self.in_danger
    }

    /// Whether this side may lift the current pause.
    #[must_use]
    pub fn can_unpause(&self) -> bool {
        self.can_unpause
    }

    #[must_use]
    pub fn effects(&self) -> &E {
        &self.effects
    }

    pub fn effects_mut(&mut self) -> &mut E {
        &mut self.effects
    }

    #[must_use]
    pub fn network(&self) -> &N {
        &self.network
    }

    pub fn network_mut(&mut self) -> &mut N {
        &mut self.network
    }

    /// Current gravity level.
    #[must_use]
    pub fn level(&self, now: Duration) -> u32 {
        self.clock.level(self.frozen(now))
    }

    /// Play time left before the time limit, if there is one.
    #[must_use]
    pub fn time_left(&self, now: Duration) -> Option<Duration> {
        let limit = self.config.time_limit()?;
        Some(limit.saturating_sub(self.clock.played(self.frozen(now))))
    }

    #[must_use]
    pub fn bomb_countdown(&self, now: Duration) -> Option<u64> {
        self.field.bomb_countdown(self.frozen(now))
    }

    #[must_use]
    pub fn buster_target_preview(&self) -> Option<CellColor> {
        self.field.buster_target_preview()
    }

    fn frozen(&self, now: Duration) -> Duration {
        self.paused_at.unwrap_or(now)
    }

    /// Board state as the opponent should see it.
    #[must_use]
    pub fn snapshot(&self) -> BoardSnapshot {
        let game_over = self.state.is_game_over();
        let active = (!game_over && !self.field.is_topped_out())
            .then(|| self.field.falling_piece().descriptor());
        BoardSnapshot {
            grid: self.field.grid().to_rows(),
            pending_garbage: self.garbage.pending(),
            next: self
                .field
                .next_pieces()
                .take(self.config.preview_len)
                .collect(),
            held: self.field.held_piece(),
            active,
            danger: self.in_danger,
            game_over,
            score: self.stats.score(),
            knockouts: self.stats.knockouts(),
        }
    }

    /// Sends the current snapshot to the opponent.
    pub fn publish_snapshot(&mut self) {
        let in_danger = self.field.grid().is_in_danger();
        if in_danger != self.in_danger {
            self.in_danger = in_danger;
            self.effects.emit(EffectEvent::DangerChanged { in_danger });
        }
        let snapshot = self.snapshot();
        self.network.send(NetworkMessage::Snapshot(snapshot));
    }

    /// Runs every timer up to `now`: time limit, bomb fuses, the garbage drip
    /// and gravity, in that order.
    pub fn advance(&mut self, now: Duration) {
        if !self.state.is_playing() {
            return;
        }
        if let Some(limit) = self.config.time_limit() {
            if self.clock.played(now) >= limit {
                self.end_match(MatchEnd::TimeUp);
                return;
            }
        }

        self.detonate_bombs(now);
        self.land_garbage(now);

        let steps = self.clock.due_steps(now);
        for _ in 0..steps {
            if !self.state.is_playing() {
                break;
            }
            if self.field.try_move_down().is_err() {
                self.lock(now, false);
            }
        }
    }

    fn detonate_bombs(&mut self, now: Duration) {
        let detonated = self.field.detonate_expired(now);
        if detonated.is_empty() {
            return;
        }
        for id in &detonated {
            log::debug!("{}: bomb {id:?} detonated", self.player);
            self.garbage.add_penalty(self.config.bomb_penalty_lines, now);
            self.effects.emit(EffectEvent::BombDetonated { id: *id });
        }
        self.stats.record_bombs(0, detonated.len());
        self.effects.emit(EffectEvent::GarbageQueued {
            pending: self.garbage.pending(),
        });
        self.publish_snapshot();
    }

    fn land_garbage(&mut self, now: Duration) {
        let rows = self.garbage.advance(now);
        if rows == 0 {
            return;
        }
        self.effects.emit(EffectEvent::GarbageLanded { rows });
        match self
            .field
            .insert_garbage(usize::try_from(rows).unwrap_or(usize::MAX))
        {
            Ok(()) => self.publish_snapshot(),
            Err(PieceCollisionError) => self.top_out(now),
        }
    }

    fn lock(&mut self, now: Duration, hard: bool) -> LockReport {
        let (report, spawned) = if hard {
            self.field.hard_drop_and_complete(now)
        } else {
            self.field.complete_piece_drop(now)
        };
        self.resolve_lock(&report);
        match spawned {
            Ok(()) => self.publish_snapshot(),
            Err(PieceCollisionError) => self.top_out(now),
        }
        report
    }

    /// Counter, attack, currency, in that order.
    fn resolve_lock(&mut self, report: &LockReport) {
        let lines = report.lines();
        self.stats.complete_piece_drop(lines);

        if let Some(id) = report.bomb_placed {
            self.effects.emit(EffectEvent::BombPlaced {
                id,
                fuse_ms: self.config.bomb_fuse_ms,
            });
        }
        for &id in &report.bombs_defused {
            self.effects.emit(EffectEvent::BombDefused { id });
        }
        self.stats.record_bombs(report.bombs_defused.len(), 0);
        if let Some(buster) = report.buster {
            self.effects.emit(EffectEvent::BusterResolved {
                color: buster.target,
                removed: buster.removed,
            });
        }

        let cleared = u32::try_from(lines).unwrap_or(u32::MAX);
        let remaining = self.garbage.counter(cleared);
        let attack = self.attack.on_lock(cleared, report.t_spin);
        self.power_ups.credit(cleared);
        if lines == 0 {
            return;
        }

        self.effects.emit(EffectEvent::LineClear {
            lines,
            t_spin: report.t_spin,
            back_to_back: attack.back_to_back,
            combo: attack.combo,
        });
        let outgoing = self
            .config
            .counter_scaling
            .apply(attack.lines, remaining, cleared);
        log::debug!(
            "{}: cleared {lines}, attack {} scaled to {outgoing}, {} pending",
            self.player,
            attack.lines,
            self.garbage.pending()
        );
        if outgoing > 0 {
            self.network.send(NetworkMessage::Attack {
                to: self.opponent,
                lines: outgoing,
            });
            self.effects.emit(EffectEvent::AttackSent { lines: outgoing });
            self.stats.record_attack(outgoing);
        }
    }

    fn top_out(&mut self, now: Duration) {
        log::info!("{} topped out", self.player);
        self.effects.emit(EffectEvent::ToppedOut);
        self.network
            .send(NetworkMessage::GameOver { from: self.player });
        if self.config.knockout_reset {
            self.reset_after_knockout(now);
        } else {
            self.end_match(MatchEnd::ToppedOut);
        }
    }

    fn reset_after_knockout(&mut self, now: Duration) {
        self.garbage.clear();
        self.power_ups.reset();
        self.attack.reset();
        self.clock.rebaseline(now);
        if self.field.reset().is_err() {
            self.end_match(MatchEnd::ToppedOut);
            return;
        }
        self.effects.emit(EffectEvent::KnockoutReset);
        self.publish_snapshot();
    }

    fn end_match(&mut self, reason: MatchEnd) {
        if self.state.is_game_over() {
            return;
        }
        log::info!("{}: match ended ({reason:?})", self.player);
        self.state = SessionState::GameOver;
        self.match_end = Some(reason);
        self.paused_at = None;
        self.garbage.clear();
        self.field.disarm_bombs();
        self.effects.emit(EffectEvent::MatchEnded { reason });
        self.publish_snapshot();
    }

    fn ensure_playing(&self) -> Result<(), ActionError> {
        if self.state.is_playing() {
            Ok(())
        } else {
            Err(ActionError::NotPlaying)
        }
    }

    pub fn try_move_left(&mut self) -> Result<(), ActionError> {
        self.ensure_playing()?;
        self.field.try_move_left()?;
        Ok(())
    }

    pub fn try_move_right(&mut self) -> Result<(), ActionError> {
        self.ensure_playing()?;
        self.field.try_move_right()?;
        Ok(())
    }

    pub fn try_rotate_right(&mut self) -> Result<(), ActionError> {
        self.ensure_playing()?;
        self.field.try_rotate_right()?;
        Ok(())
    }

    pub fn try_rotate_left(&mut self) -> Result<(), ActionError> {
        self.ensure_playing()?;
        self.field.try_rotate_left()?;
        Ok(())
    }

    /// Moves the piece one row down, or locks it if it already rests on the
    /// stack.
    pub fn soft_drop(&mut self, now: Duration) -> Result<Option<LockReport>, ActionError> {
        self.ensure_playing()?;
        if self.field.try_move_down().is_ok() {
            return Ok(None);
        }
        Ok(Some(self.lock(now, false)))
    }

    pub fn hard_drop(&mut self, now: Duration) -> Result<LockReport, ActionError> {
        self.ensure_playing()?;
        Ok(self.lock(now, true))
    }

    /// Holds the falling piece. A held piece that cannot spawn tops the board
    /// out.
    pub fn try_hold(&mut self, now: Duration) -> Result<(), ActionError> {
        self.ensure_playing()?;
        match self.field.try_hold() {
            Ok(()) => {
                self.publish_snapshot();
                Ok(())
            }
            Err(HoldError::PieceCollision(e)) => {
                self.top_out(now);
                Err(e.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Buys and applies a power-up.
    pub fn use_power_up(&mut self, power_up: PowerUp) -> Result<(), ActionError> {
        self.ensure_playing()?;
        self.power_ups.spend(power_up)?;
        log::debug!("{} used {power_up}", self.player);
        self.effects.emit(EffectEvent::PowerUpUsed { power_up });
        match power_up {
            PowerUp::Shield => self.effects.emit(EffectEvent::ShieldRaised),
            PowerUp::Rush => {
                for _ in 0..self.config.rush_pieces {
                    self.field.insert_front(SpawnKind::Standard(PieceKind::I));
                }
            }
            PowerUp::Bomb => self
                .network
                .send(NetworkMessage::Bomb { to: self.opponent }),
            PowerUp::ColorBuster => self.field.insert_front(SpawnKind::Buster),
        }
        self.publish_snapshot();
        Ok(())
    }

    /// Takes attack lines from the opponent.
    ///
    /// While paused the lines count as received at the moment of the pause.
    /// Returns `None` once the match is over.
    pub fn on_attack_received(&mut self, lines: u32, now: Duration) -> Option<Delivery> {
        if self.state.is_game_over() || lines == 0 {
            return None;
        }
        let delivery = self
            .garbage
            .receive(lines, self.frozen(now), &mut self.power_ups);
        match delivery {
            Delivery::Blocked => {
                log::debug!("{}: shield blocked {lines} lines", self.player);
                self.effects.emit(EffectEvent::ShieldBlocked { lines });
            }
            Delivery::Queued { pending } => {
                self.effects.emit(EffectEvent::GarbageQueued { pending });
            }
        }
        self.publish_snapshot();
        Some(delivery)
    }

    /// Puts an incoming bomb at the front of the queue.
    pub fn on_bomb_received(&mut self) {
        if self.state.is_game_over() {
            return;
        }
        self.field.insert_front(SpawnKind::Bomb);
        self.effects.emit(EffectEvent::BombIncoming);
        self.publish_snapshot();
    }

    pub fn on_opponent_topped_out(&mut self) {
        if self.state.is_game_over() {
            return;
        }
        self.stats.record_knockout();
        log::info!(
            "{}: {} topped out, {} knockouts",
            self.player,
            self.opponent,
            self.stats.knockouts()
        );
        if self.config.knockout_reset {
            self.publish_snapshot();
        } else {
            self.end_match(MatchEnd::OpponentToppedOut);
        }
    }

    /// Applies a message from the opponent's session. Messages meant for
    /// someone else, and snapshots, are ignored.
    pub fn handle_message(&mut self, message: &NetworkMessage, now: Duration) {
        match *message {
            NetworkMessage::Attack { to, lines } if to == self.player => {
                self.on_attack_received(lines, now);
            }
            NetworkMessage::Bomb { to } if to == self.player => self.on_bomb_received(),
            NetworkMessage::GameOver { from } if from != self.player => {
                self.on_opponent_topped_out();
            }
            _ => {}
        }
    }

    /// Pauses locally. The returned signal is for the opponent, who may not
    /// lift this pause.
    pub fn pause(&mut self, now: Duration) -> Option<PauseSignal> {
        if !self.state.is_playing() {
            return None;
        }
        self.enter_pause(now, true);
        Some(PauseSignal {
            paused: true,
            can_unpause: false,
        })
    }

    /// Resumes a pause this side started.
    pub fn resume(&mut self, now: Duration) -> Result<Option<PauseSignal>, PauseError> {
        if !self.state.is_paused() {
            return Ok(None);
        }
        if !self.can_unpause {
            return Err(PauseError::NotPermitted);
        }
        self.leave_pause(now);
        Ok(Some(PauseSignal {
            paused: false,
            can_unpause: false,
        }))
    }

    pub fn toggle_pause(&mut self, now: Duration) -> Result<Option<PauseSignal>, PauseError> {
        match self.state {
            SessionState::Playing => Ok(self.pause(now)),
            SessionState::Paused => self.resume(now),
            SessionState::GameOver => Ok(None), // No change from game over
        }
    }

    /// Follows a pause signal from the other side.
    pub fn apply_pause(&mut self, signal: PauseSignal, now: Duration) {
        match (signal.paused, self.state) {
            (true, SessionState::Playing) => self.enter_pause(now, signal.can_unpause),
            (false, SessionState::Paused) => self.leave_pause(now),
            _ => {}
        }
    }

    fn enter_pause(&mut self, now: Duration, can_unpause: bool) {
        log::info!("{}: paused", self.player);
        self.state = SessionState::Paused;
        self.paused_at = Some(now);
        self.can_unpause = can_unpause;
        self.effects.emit(EffectEvent::Paused);
    }

    fn leave_pause(&mut self, now: Duration) {
        let paused = self
            .paused_at
            .take()
            .map_or(Duration::ZERO, |at| now.saturating_sub(at));
        log::info!("{}: resumed after {paused:?}", self.player);
        self.clock.resume(paused, now);
        self.garbage.postpone(paused);
        self.field.postpone_fuses(paused);
        self.state = SessionState::Playing;
        self.can_unpause = true;
        self.effects.emit(EffectEvent::Resumed);
    }

    /// Starts a new match on the same session and sinks.
    pub fn restart(&mut self, seed: PieceSeed, now: Duration) {
        log::info!("{}: restarting", self.player);
        self.field = GameField::with_seed(seed, self.config.bomb_fuse());
        self.garbage = GarbageLedger::new(self.config.drip_interval(), self.config.drip_rate);
        self.power_ups = PowerUpLedger::new(self.config.costs);
        self.attack.reset();
        self.clock = DropClock::new(
            self.config.gravity,
            self.config.max_catch_up_steps,
            now,
        );
        self.stats = GameStats::new();
        self.state = SessionState::Playing;
        self.paused_at = None;
        self.can_unpause = true;
        self.match_end = None;
        self.publish_snapshot();
    }
}
