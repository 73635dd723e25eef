//! Reroute retry policy.

use std::time::Duration;
use tokio::time::Instant;

/// How long and how often the redirector searches for a replacement
/// server once the link is lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPolicy {
    /// Explicitly configured: exactly `rounds` rounds through the full
    /// endpoint list at a fixed interval. No overall time budget.
    Fixed { rounds: u32, interval: Duration },
    /// Nothing configured: unlimited rounds inside a wall-clock budget,
    /// sleeping longer after each round.
    Adaptive,
}

impl RetryPolicy {
    /// First inter-round delay of the adaptive schedule.
    pub const BASE_DELAY: Duration = Duration::from_secs(30);
    /// Adaptive delay growth per round: 3/2.
    pub const GROWTH_NUMER: u32 = 3;
    pub const GROWTH_DENOM: u32 = 2;
    /// Wall-clock budget of the adaptive schedule, measured from the
    /// first connection attempt.
    pub const TOTAL_BUDGET: Duration = Duration::from_secs(600);
    /// Rounds granted when only the interval was configured.
    pub const DEFAULT_ROUNDS: u32 = 3;

    /// Build the effective policy from the configured values.
    ///
    /// `-1` is the "not set" sentinel for both values. Cross-defaults:
    /// an interval with no round count gets [`Self::DEFAULT_ROUNDS`]; a
    /// round count with no interval retries immediately.
    pub fn from_config(max_retries: Option<i32>, retry_interval_secs: Option<i32>) -> Self {
        let rounds = max_retries.filter(|value| *value >= 0);
        let interval = retry_interval_secs.filter(|value| *value >= 0);

        match (rounds, interval) {
            (None, None) => RetryPolicy::Adaptive,
            (Some(rounds), None) => RetryPolicy::Fixed {
                rounds: rounds as u32,
                interval: Duration::ZERO,
            },
            (None, Some(interval)) => RetryPolicy::Fixed {
                rounds: Self::DEFAULT_ROUNDS,
                interval: Duration::from_secs(interval as u64),
            },
            (Some(rounds), Some(interval)) => RetryPolicy::Fixed {
                rounds: rounds as u32,
                interval: Duration::from_secs(interval as u64),
            },
        }
    }
}

/// Tracks rounds and computes inter-round delays for one search.
#[derive(Debug)]
pub(crate) struct Schedule {
    policy: RetryPolicy,
    started: Instant,
    completed_rounds: u32,
    next_delay: Duration,
}

impl Schedule {
    pub(crate) fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            started: Instant::now(),
            completed_rounds: 0,
            next_delay: RetryPolicy::BASE_DELAY,
        }
    }

    /// Called after a round failed. `spent` is the time the round spent
    /// probing endpoints; it is subtracted from the delay so rounds stay
    /// roughly periodic. Returns the sleep before the next round, or
    /// `None` when the search is exhausted.
    pub(crate) fn backoff(&mut self, spent: Duration) -> Option<Duration> {
        self.completed_rounds += 1;

        match self.policy {
            RetryPolicy::Fixed { rounds, interval } => {
                if self.completed_rounds >= rounds {
                    return None;
                }
                Some(interval.saturating_sub(spent))
            }
            RetryPolicy::Adaptive => {
                let elapsed = self.started.elapsed();
                if elapsed >= RetryPolicy::TOTAL_BUDGET {
                    return None;
                }
                // Shrink the last delay to fit the budget exactly.
                let remaining = RetryPolicy::TOTAL_BUDGET - elapsed;
                let delay = self.next_delay.min(remaining);
                self.next_delay =
                    self.next_delay * RetryPolicy::GROWTH_NUMER / RetryPolicy::GROWTH_DENOM;
                Some(delay.saturating_sub(spent))
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_cross_defaults() {
        // Interval set, count unset: count defaults to 3.
        assert_eq!(
            RetryPolicy::from_config(None, Some(5)),
            RetryPolicy::Fixed {
                rounds: 3,
                interval: Duration::from_secs(5)
            }
        );
        assert_eq!(
            RetryPolicy::from_config(Some(-1), Some(5)),
            RetryPolicy::Fixed {
                rounds: 3,
                interval: Duration::from_secs(5)
            }
        );

        // Count set, interval unset: immediate retry.
        assert_eq!(
            RetryPolicy::from_config(Some(7), None),
            RetryPolicy::Fixed {
                rounds: 7,
                interval: Duration::ZERO
            }
        );
        assert_eq!(
            RetryPolicy::from_config(Some(7), Some(-1)),
            RetryPolicy::Fixed {
                rounds: 7,
                interval: Duration::ZERO
            }
        );

        // Neither set: adaptive.
        assert_eq!(RetryPolicy::from_config(None, None), RetryPolicy::Adaptive);
        assert_eq!(
            RetryPolicy::from_config(Some(-1), Some(-1)),
            RetryPolicy::Adaptive
        );

        // Both set: used as configured.
        assert_eq!(
            RetryPolicy::from_config(Some(2), Some(9)),
            RetryPolicy::Fixed {
                rounds: 2,
                interval: Duration::from_secs(9)
            }
        );
    }

    #[tokio::test]
    async fn test_fixed_schedule_bounds_rounds() {
        let mut schedule = Schedule::new(RetryPolicy::Fixed {
            rounds: 3,
            interval: Duration::from_secs(4),
        });

        assert_eq!(
            schedule.backoff(Duration::from_secs(1)),
            Some(Duration::from_secs(3))
        );
        assert_eq!(schedule.backoff(Duration::ZERO), Some(Duration::from_secs(4)));
        // Third round completed: exhausted, no sleep before a round that
        // will never run.
        assert_eq!(schedule.backoff(Duration::ZERO), None);
    }

    #[tokio::test]
    async fn test_fixed_schedule_probe_time_longer_than_interval() {
        let mut schedule = Schedule::new(RetryPolicy::Fixed {
            rounds: 2,
            interval: Duration::from_secs(2),
        });

        // Probing took longer than the interval: retry immediately.
        assert_eq!(schedule.backoff(Duration::from_secs(10)), Some(Duration::ZERO));
    }

    #[tokio::test(start_paused = true)]
    async fn test_adaptive_schedule_grows_and_clips() {
        let mut schedule = Schedule::new(RetryPolicy::Adaptive);

        assert_eq!(schedule.backoff(Duration::ZERO), Some(Duration::from_secs(30)));
        assert_eq!(schedule.backoff(Duration::ZERO), Some(Duration::from_secs(45)));
        assert_eq!(
            schedule.backoff(Duration::ZERO),
            Some(Duration::from_millis(67_500))
        );

        // Move the clock to 30s before the budget: the next delay is
        // clipped to fit exactly.
        tokio::time::advance(RetryPolicy::TOTAL_BUDGET - Duration::from_secs(30)).await;
        assert_eq!(schedule.backoff(Duration::ZERO), Some(Duration::from_secs(30)));

        // Budget exhausted.
        tokio::time::advance(Duration::from_secs(30)).await;
        assert_eq!(schedule.backoff(Duration::ZERO), None);
    }
}
