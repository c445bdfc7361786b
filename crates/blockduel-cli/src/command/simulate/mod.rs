use std::{io::Write as _, mem, path::PathBuf, time::Duration};

use blockduel_engine::{
    BattleConfig, BattleSession, EffectEvent, MirrorBoard, NetworkMessage, PieceSeed, PlayerId,
    PowerUp,
};
use rand::Rng as _;

use crate::util::{self, Output};

use self::{
    bot::PlacementBot,
    record::{EffectLogLine, PlayerRecord, SimulationRecord},
};

mod bot;
mod record;

type LoopbackSession = BattleSession<Vec<EffectEvent>, Vec<NetworkMessage>>;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct SimulateArg {
    /// Battle config JSON file; missing fields use defaults
    #[arg(long)]
    config: Option<PathBuf>,
    /// Piece seed shared by both boards, as 32 hex digits
    #[arg(long, value_parser = parse_seed)]
    seed: Option<PieceSeed>,
    /// Longest match time to simulate, in seconds
    #[arg(long, default_value_t = 180)]
    duration_secs: u64,
    /// Simulation tick, in milliseconds
    #[arg(long, default_value_t = 50)]
    step_ms: u64,
    /// Time each bot takes per placement, in milliseconds
    #[arg(long, default_value_t = 600)]
    think_ms: u64,
    /// Match time at which player 1 pauses, in seconds
    #[arg(long)]
    pause_at_secs: Option<u64>,
    /// How long the pause lasts, in seconds
    #[arg(long, default_value_t = 5)]
    pause_for_secs: u64,
    /// Write every effect cue to this file as JSON lines
    #[arg(long)]
    effects: Option<PathBuf>,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

fn parse_seed(s: &str) -> Result<PieceSeed, serde_json::Error> {
    serde_json::from_value(serde_json::Value::String(s.to_owned()))
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// A board, its bot, and its copy of the opponent.
struct Seat {
    session: LoopbackSession,
    opponent_mirror: MirrorBoard,
    bot: PlacementBot,
    power_ups_used: Vec<PowerUp>,
    effects_emitted: usize,
}

impl Seat {
    fn new(
        player: PlayerId,
        opponent: PlayerId,
        config: &BattleConfig,
        seed: PieceSeed,
        think: Duration,
    ) -> Self {
        Self {
            session: BattleSession::new(
                player,
                opponent,
                config.clone(),
                seed,
                Duration::ZERO,
                Vec::new(),
                Vec::new(),
            ),
            opponent_mirror: MirrorBoard::new(),
            bot: PlacementBot::new(think),
            power_ups_used: Vec::new(),
            effects_emitted: 0,
        }
    }

    fn tick(&mut self, now: Duration) {
        if let Some(power_up) = self.bot.act(&mut self.session, now) {
            self.power_ups_used.push(power_up);
        }
        self.session.advance(now);
    }

    fn drain_effects(&mut self, now: Duration, out: Option<&mut Output>) -> anyhow::Result<()> {
        let effects = mem::take(self.session.effects_mut());
        self.effects_emitted += effects.len();
        if let Some(out) = out {
            for effect in &effects {
                out.write_json_line(&EffectLogLine {
                    at_ms: millis(now),
                    player: self.session.player(),
                    effect,
                })?;
            }
        }
        Ok(())
    }

    fn record(&self, opponent_mirror: &MirrorBoard) -> PlayerRecord {
        let grid = self.session.field().grid();
        PlayerRecord {
            player: self.session.player(),
            match_end: self.session.match_end(),
            stats: self.session.stats().clone(),
            currency: self.session.power_ups().currency(),
            pending_garbage: self.session.garbage().pending(),
            power_ups_used: self.power_ups_used.clone(),
            effects_emitted: self.effects_emitted,
            mirror_in_sync: opponent_mirror.grid() == grid,
            final_grid: record::grid_lines(grid),
        }
    }
}

/// Delivers every outgoing message to the other seat.
fn route(seats: &mut [Seat; 2], now: Duration) {
    for from in 0..2 {
        let messages = mem::take(seats[from].session.network_mut());
        let to = &mut seats[1 - from];
        for message in &messages {
            if let NetworkMessage::Snapshot(snapshot) = message {
                if let Err(e) = to.opponent_mirror.apply_remote(snapshot) {
                    log::warn!("{}: dropped snapshot: {e}", to.session.player());
                }
                continue;
            }
            log::debug!("{} <- {message:?}", to.session.player());
            to.session.handle_message(message, now);
        }
    }
}

fn pause_tick(seats: &mut [Seat; 2], now: Duration, window: Option<(Duration, Duration)>) {
    let Some((start, end)) = window else {
        return;
    };
    let [host, guest] = seats;
    if now >= start && now < end {
        if let Some(signal) = host.session.pause(now) {
            guest.session.apply_pause(signal, now);
        }
    } else if now >= end && host.session.state().is_paused() {
        match host.session.resume(now) {
            Ok(Some(signal)) => guest.session.apply_pause(signal, now),
            Ok(None) => {}
            Err(e) => log::warn!("{}: {e}", host.session.player()),
        }
    }
}

/// Timing of a simulated match.
#[derive(Debug, Clone, Copy)]
struct MatchPlan {
    step: Duration,
    think: Duration,
    limit: Duration,
    /// Player 1 pauses the match over `start..end`.
    pause_window: Option<(Duration, Duration)>,
}

impl MatchPlan {
    fn from_arg(arg: &SimulateArg) -> Self {
        Self {
            step: Duration::from_millis(arg.step_ms.max(1)),
            think: Duration::from_millis(arg.think_ms),
            limit: Duration::from_secs(arg.duration_secs),
            pause_window: arg.pause_at_secs.map(|at| {
                let start = Duration::from_secs(at);
                (start, start + Duration::from_secs(arg.pause_for_secs))
            }),
        }
    }
}

pub(crate) fn run(arg: &SimulateArg) -> anyhow::Result<()> {
    let config = match &arg.config {
        Some(path) => util::read_config_file(path)?,
        None => BattleConfig::default(),
    };
    let seed = arg.seed.unwrap_or_else(|| rand::rng().random());
    let mut effect_log = arg.effects.clone().map(Output::create).transpose()?;

    let record = simulate_match(config, seed, MatchPlan::from_arg(arg), effect_log.as_mut())?;
    Output::save_json(&record, arg.output.clone())
}

/// Plays a bot-vs-bot match over a loopback transport.
fn simulate_match(
    config: BattleConfig,
    seed: PieceSeed,
    plan: MatchPlan,
    mut effect_log: Option<&mut Output>,
) -> anyhow::Result<SimulationRecord> {
    let (p1, p2) = (PlayerId(1), PlayerId(2));
    let mut seats = [
        Seat::new(p1, p2, &config, seed, plan.think),
        Seat::new(p2, p1, &config, seed, plan.think),
    ];
    for seat in &mut seats {
        seat.session.publish_snapshot();
    }
    route(&mut seats, Duration::ZERO);
    log::info!("simulating up to {:?}", plan.limit);

    let mut now = Duration::ZERO;
    while now < plan.limit && seats.iter().all(|s| !s.session.state().is_game_over()) {
        now += plan.step;
        pause_tick(&mut seats, now, plan.pause_window);
        for seat in &mut seats {
            seat.tick(now);
        }
        route(&mut seats, now);
        for seat in &mut seats {
            seat.drain_effects(now, effect_log.as_deref_mut())?;
        }
    }
    // Messages sent while reacting to the last delivery.
    route(&mut seats, now);
    for seat in &mut seats {
        seat.drain_effects(now, effect_log.as_deref_mut())?;
    }
    if let Some(out) = effect_log {
        out.flush()?;
    }

    for seat in &seats {
        log::info!(
            "{}: {:?}, score {}, sent {} lines",
            seat.session.player(),
            seat.session.match_end(),
            seat.session.stats().score(),
            seat.session.stats().lines_sent()
        );
    }
    Ok(SimulationRecord {
        simulated_at: chrono::Utc::now(),
        seed,
        config,
        match_time_ms: millis(now),
        players: vec![
            seats[0].record(&seats[1].opponent_mirror),
            seats[1].record(&seats[0].opponent_mirror),
        ],
    })
}
