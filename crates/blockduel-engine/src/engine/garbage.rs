use std::time::Duration;

use super::power_up::PowerUpLedger;

/// Result of an incoming attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum Delivery {
    /// The shield absorbed the whole attack.
    Blocked,
    /// The lines were added to the pending counter.
    Queued { pending: u32 },
}

/// Pending incoming garbage and the drip that lands it.
///
/// While lines are pending, the drip delivers up to `rate` lines every
/// `interval`. The first delivery happens one interval after the drip starts.
#[derive(Debug, Clone)]
pub struct GarbageLedger {
    interval: Duration,
    rate: u32,
    pending: u32,
    next_drip_at: Option<Duration>,
}

impl GarbageLedger {
    #[must_use]
    pub fn new(interval: Duration, rate: u32) -> Self {
        Self {
            interval,
            rate: rate.max(1),
            pending: 0,
            next_drip_at: None,
        }
    }

    #[must_use]
    pub fn pending(&self) -> u32 {
        self.pending
    }

    /// When the next drip lands, if one is scheduled.
    #[must_use]
    pub fn next_drip_at(&self) -> Option<Duration> {
        self.next_drip_at
    }

    /// Takes an attack from the opponent; an active shield drops it entirely.
    pub fn receive(&mut self, lines: u32, now: Duration, shield: &mut PowerUpLedger) -> Delivery {
        if shield.consume_shield() {
            return Delivery::Blocked;
        }
        self.add(lines, now);
        Delivery::Queued {
            pending: self.pending,
        }
    }

    /// Adds lines that no shield can block, such as a bomb penalty.
    pub fn add_penalty(&mut self, lines: u32, now: Duration) {
        self.add(lines, now);
    }

    fn add(&mut self, lines: u32, now: Duration) {
        if lines == 0 {
            return;
        }
        self.pending = self.pending.saturating_add(lines);
        if self.next_drip_at.is_none() {
            self.next_drip_at = Some(now + self.interval);
        }
    }

    /// Spends freshly cleared lines on pending garbage and returns how many
    /// were left over.
    pub fn counter(&mut self, cleared: u32) -> u32 {
        let countered = self.pending.min(cleared);
        self.pending -= countered;
        if self.pending == 0 {
            self.next_drip_at = None;
        }
        cleared - countered
    }

    /// Runs every drip due by `now` and returns the number of garbage rows to
    /// insert into the grid.
    pub fn advance(&mut self, now: Duration) -> u32 {
        let mut delivered = 0;
        while let Some(at) = self.next_drip_at {
            if at > now {
                break;
            }
            let lines = self.rate.min(self.pending);
            self.pending -= lines;
            delivered += lines;
            self.next_drip_at = (self.pending > 0).then_some(at + self.interval);
        }
        if delivered > 0 {
            log::trace!("garbage drip delivered {delivered} lines, {} pending", self.pending);
        }
        delivered
    }

    /// Pushes the next drip back, e.g. after a pause.
    pub fn postpone(&mut self, by: Duration) {
        if let Some(at) = &mut self.next_drip_at {
            *at += by;
        }
    }

    /// Drops all pending lines and stops the drip.
    pub fn clear(&mut self) {
        self.pending = 0;
        self.next_drip_at = None;
    }
}
