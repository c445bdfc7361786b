use serde::Serialize;

/// Combo and back-to-back state turning line clears into attack lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttackCalculator {
    combo: u32,
    back_to_back: bool,
}

/// Attack computed for one lock, before countering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Attack {
    pub lines: u32,
    /// Combo length after this lock.
    pub combo: u32,
    /// Whether the back-to-back bonus was granted.
    pub back_to_back: bool,
}

impl AttackCalculator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn combo(&self) -> u32 {
        self.combo
    }

    #[must_use]
    pub fn is_back_to_back(&self) -> bool {
        self.back_to_back
    }

    /// Records a lock and returns its attack.
    ///
    /// - No lines: combo resets, attack 0.
    /// - A single without T-spin: attack 0, back-to-back untouched.
    /// - Otherwise `lines - 1`, +2 for a T-spin, +`combo / 3`, and +1 when a
    ///   four-line or T-spin clear follows another one.
    pub fn on_lock(&mut self, lines: u32, t_spin: bool) -> Attack {
        if lines == 0 {
            self.combo = 0;
            return Attack::default();
        }
        self.combo += 1;
        let mut attack = Attack {
            lines: 0,
            combo: self.combo,
            back_to_back: false,
        };
        if lines < 2 && !t_spin {
            return attack;
        }

        attack.lines = lines - 1;
        if t_spin {
            attack.lines += 2;
        }
        attack.lines += self.combo / 3;

        if lines >= 4 || t_spin {
            if self.back_to_back {
                attack.lines += 1;
                attack.back_to_back = true;
            }
            self.back_to_back = true;
        } else {
            self.back_to_back = false;
        }
        attack
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_tetris_is_three() {
        let mut calc = AttackCalculator::new();
        let attack = calc.on_lock(4, false);
        assert_eq!(attack.lines, 3);
        assert!(!attack.back_to_back);
        assert!(calc.is_back_to_back());
    }

    #[test]
    fn test_back_to_back_tetris_is_four() {
        let mut calc = AttackCalculator::new();
        calc.on_lock(4, false);
        calc.on_lock(0, false);
        let attack = calc.on_lock(4, false);
        assert_eq!(attack.lines, 4);
        assert!(attack.back_to_back);
    }

    #[test]
    fn test_single_never_attacks_and_keeps_back_to_back() {
        let mut calc = AttackCalculator::new();
        calc.on_lock(4, false);
        assert_eq!(calc.on_lock(1, false).lines, 0);
        assert!(calc.is_back_to_back());
        assert_eq!(calc.combo(), 2);
    }

    #[test]
    fn test_double_breaks_back_to_back() {
        let mut calc = AttackCalculator::new();
        calc.on_lock(4, false);
        calc.on_lock(0, false);
        assert_eq!(calc.on_lock(2, false).lines, 1);
        assert!(!calc.is_back_to_back());
    }

    #[test]
    fn test_t_spin_bonus() {
        let mut calc = AttackCalculator::new();
        // T-spin single: 0 + 2
        assert_eq!(calc.on_lock(1, true).lines, 2);
        calc.on_lock(0, false);
        // T-spin double after a T-spin: 1 + 2 + back-to-back
        assert_eq!(calc.on_lock(2, true).lines, 4);
    }

    #[test]
    fn test_combo_bonus_every_three() {
        let mut calc = AttackCalculator::new();
        let attacks: Vec<_> = (0..6).map(|_| calc.on_lock(2, false).lines).collect();
        assert_eq!(attacks, vec![1, 1, 2, 2, 2, 3]);
        calc.on_lock(0, false);
        assert_eq!(calc.combo(), 0);
    }
}
