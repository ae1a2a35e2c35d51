//! Bounded blocking waits over asynchronous UI state.
//!
//! The target application is a client-rendered single-page app with no
//! reliable "ready" event, so every transition is bounded by a named polling
//! wait. Timeout and poll interval are explicit configuration, not implicit
//! constants.

use crate::error::{Result, RipError};
use std::thread;
use std::time::{Duration, Instant};

/// Default interval between probe evaluations.
pub const DEFAULT_POLL: Duration = Duration::from_millis(250);

/// A bounded polling wait.
#[derive(Debug, Clone, Copy)]
pub struct Wait {
    /// Hard ceiling on how long the calling thread blocks
    pub timeout: Duration,

    /// Interval between probe evaluations
    pub poll: Duration,
}

impl Wait {
    /// A wait with the default poll interval.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout, poll: DEFAULT_POLL }
    }

    /// Block until `probe` yields a value, or fail with a timeout naming
    /// `condition`.
    ///
    /// `Ok(None)` from the probe means "not ready yet" and schedules another
    /// poll. `Err` from the probe is terminal and propagates unchanged, so
    /// probes that want retry-on-error semantics must absorb their own errors.
    pub fn until<T, F>(&self, condition: &str, mut probe: F) -> Result<T>
    where
        F: FnMut() -> Result<Option<T>>,
    {
        let deadline = Instant::now() + self.timeout;
        loop {
            if let Some(value) = probe()? {
                return Ok(value);
            }
            if Instant::now() >= deadline {
                return Err(RipError::Timeout {
                    condition: condition.to_string(),
                    waited: self.timeout,
                });
            }
            thread::sleep(self.poll);
        }
    }
}
