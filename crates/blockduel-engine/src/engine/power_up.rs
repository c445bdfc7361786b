use serde::{Deserialize, Serialize};

use super::config::PowerUpCosts;

/// Abilities bought with cleared-line currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum PowerUp {
    /// Blocks the next incoming garbage delivery.
    #[display("shield")]
    Shield,
    /// Puts I pieces at the front of the own queue.
    #[display("rush")]
    Rush,
    /// Sends a bomb to the opponent's queue.
    #[display("bomb")]
    Bomb,
    /// Puts a color buster at the front of the own queue.
    #[display("color buster")]
    ColorBuster,
}

impl PowerUp {
    #[must_use]
    pub fn cost(self, costs: &PowerUpCosts) -> u32 {
        match self {
            PowerUp::Shield => costs.shield,
            PowerUp::Rush => costs.rush,
            PowerUp::Bomb => costs.bomb,
            PowerUp::ColorBuster => costs.color_buster,
        }
    }
}

/// Why a power-up purchase was refused. Refusals leave the ledger untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum PowerUpDenied {
    #[display("not enough currency: costs {cost}, have {available}")]
    InsufficientCurrency { cost: u32, available: u32 },
    #[display("shield is already active")]
    ShieldAlreadyActive,
}

/// Currency balance and shield state of one board.
#[derive(Debug, Clone, Default)]
pub struct PowerUpLedger {
    costs: PowerUpCosts,
    currency: u32,
    shield_active: bool,
}

impl PowerUpLedger {
    #[must_use]
    pub fn new(costs: PowerUpCosts) -> Self {
        Self {
            costs,
            currency: 0,
            shield_active: false,
        }
    }

    #[must_use]
    pub fn currency(&self) -> u32 {
        self.currency
    }

    #[must_use]
    pub fn is_shield_active(&self) -> bool {
        self.shield_active
    }

    /// Adds cleared lines to the balance.
    pub fn credit(&mut self, lines: u32) {
        self.currency = self.currency.saturating_add(lines);
    }

    /// Whether [`Self::spend`] would currently succeed.
    #[must_use]
    pub fn can_afford(&self, power_up: PowerUp) -> bool {
        self.check(power_up).is_ok()
    }

    fn check(&self, power_up: PowerUp) -> Result<u32, PowerUpDenied> {
        let cost = power_up.cost(&self.costs);
        if self.currency < cost {
            return Err(PowerUpDenied::InsufficientCurrency {
                cost,
                available: self.currency,
            });
        }
        if power_up == PowerUp::Shield && self.shield_active {
            return Err(PowerUpDenied::ShieldAlreadyActive);
        }
        Ok(cost)
    }

    /// Deducts the cost of `power_up`.
    ///
    /// Raising the shield happens here; the queue and network side effects of
    /// the other power-ups are applied by the caller.
    pub fn spend(&mut self, power_up: PowerUp) -> Result<(), PowerUpDenied> {
        let cost = self.check(power_up)?;
        self.currency -= cost;
        if power_up == PowerUp::Shield {
            self.shield_active = true;
        }
        Ok(())
    }

    /// Lowers the shield if it is up, reporting whether it was.
    pub fn consume_shield(&mut self) -> bool {
        std::mem::take(&mut self.shield_active)
    }

    /// Back to zero currency and no shield.
    pub fn reset(&mut self) {
        self.currency = 0;
        self.shield_active = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger_with(currency: u32) -> PowerUpLedger {
        let mut ledger = PowerUpLedger::new(PowerUpCosts::default());
        ledger.credit(currency);
        ledger
    }

    #[test]
    fn test_shield_denied_when_short() {
        let mut ledger = ledger_with(2);
        assert_eq!(
            ledger.spend(PowerUp::Shield),
            Err(PowerUpDenied::InsufficientCurrency {
                cost: 3,
                available: 2,
            })
        );
        assert_eq!(ledger.currency(), 2);
        assert!(!ledger.is_shield_active());
    }

    #[test]
    fn test_shield_purchase_and_consumption() {
        let mut ledger = ledger_with(7);
        ledger.spend(PowerUp::Shield).unwrap();
        assert_eq!(ledger.currency(), 4);
        assert!(ledger.is_shield_active());

        assert_eq!(
            ledger.spend(PowerUp::Shield),
            Err(PowerUpDenied::ShieldAlreadyActive)
        );
        assert_eq!(ledger.currency(), 4);

        assert!(ledger.consume_shield());
        assert!(!ledger.consume_shield());
        ledger.spend(PowerUp::Shield).unwrap();
        assert_eq!(ledger.currency(), 1);
    }

    #[test]
    fn test_costs() {
        let mut ledger = ledger_with(6 + 9 + 17);
        ledger.spend(PowerUp::Rush).unwrap();
        ledger.spend(PowerUp::Bomb).unwrap();
        assert!(ledger.can_afford(PowerUp::ColorBuster));
        ledger.spend(PowerUp::ColorBuster).unwrap();
        assert_eq!(ledger.currency(), 0);
        assert!(!ledger.can_afford(PowerUp::Shield));
    }

    #[test]
    fn test_reset() {
        let mut ledger = ledger_with(5);
        ledger.spend(PowerUp::Shield).unwrap();
        ledger.reset();
        assert_eq!(ledger.currency(), 0);
        assert!(!ledger.is_shield_active());
    }
}
