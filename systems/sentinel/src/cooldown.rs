//! Countdown gating successive attacks.

use std::time::Duration;

/// Per-sentinel attack cooldown.
///
/// The countdown is independent of the sentinel's behavioural state: it keeps
/// running through alert and relax cycles and is only restarted by an attack.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AttackCooldown {
    remaining: Duration,
}

impl AttackCooldown {
    /// Creates a cooldown that is immediately ready.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            remaining: Duration::ZERO,
        }
    }

    /// Reports whether an attack may be fired.
    #[must_use]
    pub fn ready(&self) -> bool {
        self.remaining.is_zero()
    }

    /// Time left until the next attack may be fired.
    #[must_use]
    pub const fn remaining(&self) -> Duration {
        self.remaining
    }

    /// Counts the cooldown down by one tick.
    pub fn tick(&mut self, dt: Duration) {
        self.remaining = self.remaining.saturating_sub(dt);
    }

    /// Restarts the countdown after an attack.
    pub fn start(&mut self, duration: Duration) {
        self.remaining = duration;
    }
}
