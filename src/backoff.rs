//! Backoff between failed getUpdates polls.
//! Inference calls are never retried; this only paces the poll loop.

use std::time::Duration;
use log::debug;

const MAX_EXPONENT: u32 = 31;

/// Exponential delay schedule for a failing poll loop
#[derive(Debug, Clone)]
pub struct PollBackoff
{   pub backoff_multiplier: f32
  , pub initial_backoff: Duration
  , pub max_backoff: Duration
  , pub failures: u32
}

impl PollBackoff
{   pub fn new(
      backoff_multiplier: f32
    , initial_backoff_ms: u64
    , max_backoff_ms: u64
    ) -> Self
    {   PollBackoff
        {   backoff_multiplier
          , initial_backoff: Duration::from_millis(initial_backoff_ms)
          , max_backoff: Duration::from_millis(max_backoff_ms)
          , failures: 0
        }
    }

    /// Delay for the given failure number (0-based), capped.
    /// The exponent stops growing past 31 so the cast cannot wrap.
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration
    {   let multiplier
          = self.backoff_multiplier.powi(attempt.min(MAX_EXPONENT) as i32);
        let millis = self.initial_backoff.as_millis() as f32 * multiplier;
        let max = self.max_backoff.as_millis() as f32;
        Duration::from_millis(millis.min(max) as u64)
    }

    /// Record a failure and return how long to wait
    pub fn next_delay(&mut self) -> Duration
    {   let delay = self.backoff_for_attempt(self.failures);
        self.failures = self.failures.saturating_add(1);
        debug!("Poll failure {}, backing off {:?}", self.failures, delay);
        delay
    }

    pub fn reset(&mut self)
    {   if self.failures > 0
        {   debug!("Resetting poll backoff");
        }
        self.failures = 0;
    }
}

impl Default for PollBackoff
{   fn default() -> Self
    {   PollBackoff::new(2.0, 100, 30_000)
    }
}

#[cfg(test)]
mod tests
{   use super::*;

    #[test]
    fn doubles_then_caps()
    {   let mut backoff = PollBackoff::default();
        assert_eq!(backoff.next_delay(), Duration::from_millis(100));
        assert_eq!(backoff.next_delay(), Duration::from_millis(200));
        assert_eq!(backoff.next_delay(), Duration::from_millis(400));
        assert_eq!(
          backoff.backoff_for_attempt(20)
        , Duration::from_secs(30)
        );
    }

    #[test]
    fn huge_failure_counts_stay_capped()
    {   let backoff = PollBackoff::default();
        for attempt in [31, 32, i32::MAX as u32 + 1, u32::MAX]
        {   assert_eq!(
              backoff.backoff_for_attempt(attempt)
            , Duration::from_secs(30)
            );
        }
    }

    #[test]
    fn reset_starts_over()
    {   let mut backoff = PollBackoff::default();
        backoff.next_delay();
        backoff.next_delay();
        backoff.reset();
        assert_eq!(backoff.next_delay(), Duration::from_millis(100));
    }
}
