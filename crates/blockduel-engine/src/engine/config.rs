use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Every tunable constant of a match.
///
/// Missing fields fall back to their defaults when deserializing, so a config
/// file only needs to name what it changes.
///
/// # Example
///
/// ```
/// use blockduel_engine::BattleConfig;
///
/// let config: BattleConfig = serde_json::from_str(r#"{ "drip_rate": 1 }"#).unwrap();
/// assert_eq!(config.drip_rate, 1);
/// assert_eq!(config.costs.shield, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleConfig {
    /// Interval between garbage drip deliveries.
    pub drip_interval_ms: u64,
    /// Lines delivered per drip.
    pub drip_rate: u32,
    pub bomb_fuse_ms: u64,
    /// Pending garbage added to the owner when a bomb detonates.
    pub bomb_penalty_lines: u32,
    pub costs: PowerUpCosts,
    /// I pieces inserted by the rush power-up.
    pub rush_pieces: u32,
    pub gravity: GravityConfig,
    /// Cap on drop steps applied in a single advance.
    pub max_catch_up_steps: u32,
    pub counter_scaling: CounterScaling,
    /// Match length; `None` plays until a top-out.
    pub time_limit_ms: Option<u64>,
    /// Knockout mode: a topped-out board is wiped and keeps playing instead of
    /// ending the match.
    pub knockout_reset: bool,
    /// Upcoming entries reported in snapshots.
    pub preview_len: usize,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            drip_interval_ms: 2000,
            drip_rate: 2,
            bomb_fuse_ms: 10_000,
            bomb_penalty_lines: 2,
            costs: PowerUpCosts::default(),
            rush_pieces: 3,
            gravity: GravityConfig::default(),
            max_catch_up_steps: 10,
            counter_scaling: CounterScaling::default(),
            time_limit_ms: None,
            knockout_reset: false,
            preview_len: 3,
        }
    }
}

impl BattleConfig {
    #[must_use]
    pub fn drip_interval(&self) -> Duration {
        Duration::from_millis(self.drip_interval_ms)
    }

    #[must_use]
    pub fn bomb_fuse(&self) -> Duration {
        Duration::from_millis(self.bomb_fuse_ms)
    }

    #[must_use]
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_ms.map(Duration::from_millis)
    }
}

/// Currency cost of each power-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerUpCosts {
    pub shield: u32,
    pub rush: u32,
    pub bomb: u32,
    pub color_buster: u32,
}

impl Default for PowerUpCosts {
    fn default() -> Self {
        Self {
            shield: 3,
            rush: 6,
            bomb: 9,
            color_buster: 17,
        }
    }
}

/// Drop interval curve: starts at `initial_ms` and shortens by `step_ms` per
/// level, never below `floor_ms`. A level lasts `level_duration_ms` of play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GravityConfig {
    pub initial_ms: u64,
    pub step_ms: u64,
    pub floor_ms: u64,
    pub level_duration_ms: u64,
}

impl Default for GravityConfig {
    fn default() -> Self {
        Self {
            initial_ms: 1200,
            step_ms: 50,
            floor_ms: 180,
            level_duration_ms: 15_000,
        }
    }
}

impl GravityConfig {
    /// 1-based level reached after `played` time.
    #[must_use]
    pub fn level(&self, played: Duration) -> u32 {
        let level_ms = u128::from(self.level_duration_ms.max(1));
        u32::try_from(played.as_millis() / level_ms)
            .unwrap_or(u32::MAX)
            .saturating_add(1)
    }

    /// Drop interval at the given level.
    #[must_use]
    pub fn interval(&self, level: u32) -> Duration {
        let reduction = self.step_ms.saturating_mul(u64::from(level.saturating_sub(1)));
        let ms = self
            .initial_ms
            .saturating_sub(reduction)
            .max(self.floor_ms)
            .max(1);
        Duration::from_millis(ms)
    }
}

/// How countering shrinks the outgoing attack of a lock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterScaling {
    /// `floor(attack * uncountered / cleared)`.
    #[default]
    Proportional,
    /// `attack - countered`, saturating at zero.
    Subtractive,
}

impl CounterScaling {
    /// Applies the scaling to `attack` for a lock that cleared `cleared` lines,
    /// `remaining` of which were not spent on countering.
    #[must_use]
    pub fn apply(self, attack: u32, remaining: u32, cleared: u32) -> u32 {
        if cleared == 0 || remaining >= cleared {
            return attack;
        }
        match self {
            CounterScaling::Proportional => {
                let scaled = u64::from(attack) * u64::from(remaining) / u64::from(cleared);
                u32::try_from(scaled).unwrap_or(attack)
            }
            CounterScaling::Subtractive => attack.saturating_sub(cleared - remaining),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gravity_curve() {
        let gravity = GravityConfig::default();
        assert_eq!(gravity.level(Duration::ZERO), 1);
        assert_eq!(gravity.level(Duration::from_millis(14_999)), 1);
        assert_eq!(gravity.level(Duration::from_secs(15)), 2);
        assert_eq!(gravity.interval(1), Duration::from_millis(1200));
        assert_eq!(gravity.interval(2), Duration::from_millis(1150));
        assert_eq!(gravity.interval(21), Duration::from_millis(200));
        assert_eq!(gravity.interval(22), Duration::from_millis(180));
        assert_eq!(gravity.interval(500), Duration::from_millis(180));
    }

    #[test]
    fn test_counter_scaling() {
        let proportional = CounterScaling::Proportional;
        assert_eq!(proportional.apply(4, 4, 4), 4);
        assert_eq!(proportional.apply(3, 2, 4), 1);
        assert_eq!(proportional.apply(5, 0, 3), 0);

        let subtractive = CounterScaling::Subtractive;
        assert_eq!(subtractive.apply(3, 2, 4), 1);
        assert_eq!(subtractive.apply(5, 1, 4), 2);
        assert_eq!(subtractive.apply(1, 0, 4), 0);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: BattleConfig =
            serde_json::from_str(r#"{ "costs": { "rush": 4 }, "time_limit_ms": 120000 }"#)
                .unwrap();
        assert_eq!(config.costs.rush, 4);
        assert_eq!(config.costs.color_buster, 17);
        assert_eq!(config.time_limit(), Some(Duration::from_secs(120)));
        assert_eq!(config.drip_interval(), Duration::from_secs(2));
        assert_eq!(config.counter_scaling, CounterScaling::Proportional);
    }
}
