/*
 * Copyright 2025 Barista Chat Contributors
 *
 * Licensed under either of
 *
 * * Apache License, Version 2.0
 *   (http://www.apache.org/licenses/LICENSE-2.0)
 * * MIT license
 *   (http://opensource.org/licenses/MIT)
 *
 * at your option.
 *
 * Unless you explicitly state otherwise, any contribution intentionally
 * submitted for inclusion in the work by you, as defined in the Apache-2.0
 * license, shall be dual licensed as above, without any additional terms or
 * conditions.
 */

//! Exponential backoff policy and the per-client reconnect bookkeeping.

use rand::Rng;
use std::time::Duration;

/// Default delay before the first reconnect attempt.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);

/// Default number of reconnect attempts before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectPolicy {
    /// Delay before attempt 1; attempt `k` waits `base_delay * 2^(k-1)`.
    pub base_delay: Duration,
    pub max_attempts: u32,
    /// Optional ceiling applied after the exponential step.
    pub max_delay: Option<Duration>,
    /// Fraction of the delay (0.0..=1.0) randomly subtracted from each wait.
    pub jitter: f64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base_delay: DEFAULT_BASE_DELAY,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            max_delay: None,
            jitter: 0.0,
        }
    }
}

impl ReconnectPolicy {
    /// Un-jittered delay for the 1-based `attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let factor = 1u32.checked_shl(exponent).unwrap_or(u32::MAX);
        let delay = self.base_delay.saturating_mul(factor);
        match self.max_delay {
            Some(ceiling) => delay.min(ceiling),
            None => delay,
        }
    }

    /// Delay for `attempt` with jitter applied.
    pub fn jittered_delay_for<R: Rng>(&self, attempt: u32, rng: &mut R) -> Duration {
        let delay = self.delay_for(attempt);
        let jitter = self.jitter.clamp(0.0, 1.0);
        if jitter == 0.0 {
            return delay;
        }
        let cut = rng.gen_range(0.0..=jitter);
        delay.mul_f64(1.0 - cut)
    }
}

/// Attempt counter plus the "a cycle is pending" guard.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct ReconnectState {
    pub attempts: u32,
    pub scheduled: bool,
}

impl ReconnectState {
    /// Claim the right to run a cycle. Fails when one is already pending or the
    /// budget is spent.
    pub fn try_schedule(&mut self, policy: &ReconnectPolicy) -> bool {
        if self.scheduled || self.attempts >= policy.max_attempts {
            return false;
        }
        self.scheduled = true;
        true
    }

    /// Count the next attempt and return its 1-based number.
    pub fn next_attempt(&mut self) -> u32 {
        self.attempts += 1;
        self.attempts
    }

    pub fn exhausted(&self, policy: &ReconnectPolicy) -> bool {
        self.attempts >= policy.max_attempts
    }

    pub fn reset(&mut self) {
        self.attempts = 0;
        self.scheduled = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_exponential_steps() {
        let policy = ReconnectPolicy {
            base_delay: Duration::from_millis(250),
            ..Default::default()
        };
        assert_eq!(policy.delay_for(1), Duration::from_millis(250));
        assert_eq!(policy.delay_for(2), Duration::from_millis(500));
        assert_eq!(policy.delay_for(3), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(5), Duration::from_millis(4000));
    }

    #[test]
    fn test_ceiling_caps_delay() {
        let policy = ReconnectPolicy {
            max_delay: Some(Duration::from_secs(3)),
            ..Default::default()
        };
        assert_eq!(policy.delay_for(2), Duration::from_secs(2));
        assert_eq!(policy.delay_for(3), Duration::from_secs(3));
        assert_eq!(policy.delay_for(10), Duration::from_secs(3));
    }

    #[test]
    fn test_huge_attempt_saturates() {
        let policy = ReconnectPolicy::default();
        assert!(policy.delay_for(200) >= policy.delay_for(32));
    }

    #[test]
    fn test_jitter_stays_within_bounds() {
        let policy = ReconnectPolicy {
            jitter: 0.5,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(7);
        for attempt in 1..=5 {
            let full = policy.delay_for(attempt);
            for _ in 0..50 {
                let d = policy.jittered_delay_for(attempt, &mut rng);
                assert!(d <= full);
                assert!(d >= full.mul_f64(0.5));
            }
        }
    }

    #[test]
    fn test_zero_jitter_is_exact() {
        let policy = ReconnectPolicy::default();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(policy.jittered_delay_for(3, &mut rng), Duration::from_secs(4));
    }

    #[test]
    fn test_state_single_pending_cycle() {
        let policy = ReconnectPolicy {
            max_attempts: 2,
            ..Default::default()
        };
        let mut state = ReconnectState::default();
        assert!(state.try_schedule(&policy));
        assert!(!state.try_schedule(&policy), "second cycle must be refused");
        assert_eq!(state.next_attempt(), 1);
        assert_eq!(state.next_attempt(), 2);
        assert!(state.exhausted(&policy));
        state.reset();
        assert_eq!(state, ReconnectState::default());
        state.attempts = 2;
        assert!(!state.try_schedule(&policy), "spent budget refuses scheduling");
    }
}
