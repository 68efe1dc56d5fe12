// retry.rs

use std::time::Duration;

use anyhow::bail;
use embedded_hal::delay::DelayNs;
use log::*;

/// Fixed-interval retry without backoff. With `max_attempts: None` the loop
/// never gives up; the only way out is success or a reset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub interval: Duration,
    pub max_attempts: Option<u32>,
}

impl RetryPolicy {
    pub fn forever(interval: Duration) -> Self {
        Self {
            interval,
            max_attempts: None,
        }
    }

    pub fn limited(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts: Some(max_attempts),
        }
    }

    fn interval_ms(&self) -> u32 {
        u32::try_from(self.interval.as_millis()).unwrap_or(u32::MAX)
    }

    /// Runs `op` until it succeeds, sleeping `interval` after every failure.
    /// `op` gets the 1-based attempt number.
    pub fn run<D, T, F>(&self, delay: &mut D, what: &str, mut op: F) -> anyhow::Result<T>
    where
        D: DelayNs,
        F: FnMut(u32) -> anyhow::Result<T>,
    {
        let mut attempt: u32 = 0;
        loop {
            attempt = attempt.saturating_add(1);
            let e = match op(attempt) {
                Ok(v) => return Ok(v),
                Err(e) => e,
            };

            if let Some(max) = self.max_attempts {
                if attempt >= max {
                    bail!("{what}: giving up after {attempt} attempts: {e:#}");
                }
            }

            debug!("{what}: attempt #{attempt} failed: {e:#}");
            delay.delay_ms(self.interval_ms());
        }
    }
}


// EOF
