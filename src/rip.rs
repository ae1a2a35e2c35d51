//! The page-ripping state machine.
//!
//! Iterates over the document's item range, invoking the site adapter and the
//! extractor for each index, persisting one output file per item, and bounding
//! transient failures with a run-wide retry counter. Terminal states:
//! [`RipOutcome::Done`] (all items ripped) or [`RipOutcome::Aborted`] (retry
//! ceiling crossed, or a fatal error class). Partial output stays on disk on
//! abort so progress can be inspected or resumed by hand.

use crate::browser::Session;
use crate::error::{Result, RipError};
use crate::extract::ContentExtractor;
use crate::output;
use crate::site::{Credentials, SiteAdapter};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::Path;

/// States of one ripping run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RipState {
    /// Session created, not yet authenticated
    Init,
    /// Authentication and navigation succeeded, item count established
    Ready,
    /// Main loop in progress
    Ripping,
    /// All items ripped
    Done,
    /// Retry ceiling exceeded or fatal error before reaching the end
    Aborted,
}

/// Bound on run-wide consecutive failures.
///
/// The counter resets on any success and is NOT per-item: a string of failures
/// crossing the ceiling aborts the run wherever it happens.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub ceiling: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { ceiling: 10 }
    }
}

/// Terminal result of a ripping run.
#[derive(Debug)]
pub enum RipOutcome {
    /// Every item was ripped successfully.
    Done { items: usize },

    /// The run stopped early. Output for `ripped` items remains on disk.
    Aborted {
        /// Items persisted before the abort (indices `0..ripped`)
        ripped: usize,
        /// Consecutive failures at the time of the abort
        retries: u32,
        /// The failure that ended the run
        last_error: RipError,
    },
}

/// Drive the per-item cycle over indices `0..total`.
///
/// `cycle` performs one select/wait/extract/persist cycle for an index. On a
/// transient failure the index does not advance and the run-wide retry counter
/// grows; crossing `policy.ceiling` aborts. Non-transient failures abort
/// immediately: retrying a configuration or credential error cannot succeed.
/// `on_ripped` observes each completed index, in order.
pub fn drive<C, P>(total: usize, policy: RetryPolicy, mut cycle: C, mut on_ripped: P) -> RipOutcome
where
    C: FnMut(usize) -> Result<()>,
    P: FnMut(usize),
{
    let mut index = 0;
    let mut retries = 0u32;

    while index < total {
        match cycle(index) {
            Ok(()) => {
                on_ripped(index);
                index += 1;
                retries = 0;
            }
            Err(error) if error.is_transient() => {
                retries += 1;
                log::warn!("item {index} failed ({error}); retry {retries}/{}", policy.ceiling);
                if retries > policy.ceiling {
                    return RipOutcome::Aborted { ripped: index, retries, last_error: error };
                }
            }
            Err(error) => {
                log::error!("item {index} failed with a non-retryable error: {error}");
                return RipOutcome::Aborted { ripped: index, retries, last_error: error };
            }
        }
    }

    RipOutcome::Done { items: total }
}

/// Rips a document's pages to a working directory.
///
/// Owns the session exclusively for the duration of a run and closes it
/// exactly once, on loop termination — success, exhaustion, or fatal error.
pub struct Ripper<S: SiteAdapter> {
    session: Session,
    site: S,
    credentials: Credentials,
    extractor: ContentExtractor,
    policy: RetryPolicy,
}

impl<S: SiteAdapter> Ripper<S> {
    pub fn new(session: Session, site: S, credentials: Credentials) -> Self {
        Self {
            session,
            site,
            credentials,
            extractor: ContentExtractor::new(),
            policy: RetryPolicy::default(),
        }
    }

    /// Override the default retry ceiling.
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Run to a terminal state, persisting one HTML file per ripped item under
    /// `directory`.
    ///
    /// Setup failures (login, navigation, counting) propagate as errors; once
    /// the loop starts, the terminal state is reported through the returned
    /// [`RipOutcome`] instead. The session is closed on every path out.
    pub fn run(self, directory: &Path) -> Result<RipOutcome> {
        let result = self.run_inner(directory);
        self.session.close();
        result
    }

    fn run_inner(&self, directory: &Path) -> Result<RipOutcome> {
        log::debug!("state: {:?}", RipState::Init);

        self.site.login(&self.session, &self.credentials)?;
        self.site.open_document(&self.session)?;
        self.site.prepare(&self.session)?;
        let total = self.site.item_count(&self.session)?;
        log::info!("state: {:?} ({total} items)", RipState::Ready);

        log::debug!("state: {:?}", RipState::Ripping);
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::with_template("Ripping [{bar:40}] {pos}/{len} ({eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        let outcome =
            drive(total, self.policy, |index| self.rip_one(index, directory), |_| bar.inc(1));

        match &outcome {
            RipOutcome::Done { items } => {
                bar.finish();
                log::info!("state: {:?} ({items} items)", RipState::Done);
            }
            RipOutcome::Aborted { ripped, retries, last_error } => {
                bar.abandon();
                log::error!(
                    "state: {:?} after {ripped} items, {retries} retries; last failure: {last_error}",
                    RipState::Aborted,
                );
            }
        }

        Ok(outcome)
    }

    /// One select/wait/extract/persist cycle.
    ///
    /// A failed cycle writes nothing for its index.
    fn rip_one(&self, index: usize, directory: &Path) -> Result<()> {
        let title = self.site.select_item(&self.session, index)?;
        self.site.content_ready(&self.session)?;

        let markup = self.extractor.extract(&self.session, self.site.reading_frame())?;

        let path = directory.join(output::page_filename(index, &title));
        fs::write(&path, markup)?;
        log::debug!("ripped item {index} -> {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn transient() -> RipError {
        RipError::Timeout {
            condition: "epub container visible".to_string(),
            waited: Duration::from_secs(10),
        }
    }

    fn fatal() -> RipError {
        RipError::CredentialsRejected("user".to_string())
    }

    /// Cycle that fails `failures` times in a row (run-wide), succeeding
    /// otherwise.
    fn flaky(mut failures: u32) -> impl FnMut(usize) -> Result<()> {
        move |_| {
            if failures > 0 {
                failures -= 1;
                Err(transient())
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_all_items_ripped_in_order() {
        let mut seen = Vec::new();
        let outcome = drive(3, RetryPolicy::default(), |_| Ok(()), |i| seen.push(i));

        assert!(matches!(outcome, RipOutcome::Done { items: 3 }));
        assert_eq!(seen, [0, 1, 2]);
    }

    #[test]
    fn test_zero_items_is_done() {
        let outcome = drive(0, RetryPolicy::default(), |_| panic!("no cycle expected"), |_| ());
        assert!(matches!(outcome, RipOutcome::Done { items: 0 }));
    }

    #[test]
    fn test_failure_does_not_advance_index() {
        let mut calls = Vec::new();
        let mut failed_once = false;
        let outcome = drive(
            2,
            RetryPolicy::default(),
            |i| {
                calls.push(i);
                if i == 1 && !failed_once {
                    failed_once = true;
                    Err(transient())
                } else {
                    Ok(())
                }
            },
            |_| (),
        );

        assert!(matches!(outcome, RipOutcome::Done { items: 2 }));
        assert_eq!(calls, [0, 1, 1]);
    }

    #[test]
    fn test_ceiling_failures_then_success_completes() {
        // exactly 10 consecutive failures stay inside the ceiling
        let outcome = drive(1, RetryPolicy::default(), flaky(10), |_| ());
        assert!(matches!(outcome, RipOutcome::Done { items: 1 }));
    }

    #[test]
    fn test_ceiling_crossed_aborts() {
        let outcome = drive(1, RetryPolicy::default(), flaky(11), |_| ());
        match outcome {
            RipOutcome::Aborted { ripped, retries, last_error } => {
                assert_eq!(ripped, 0);
                assert_eq!(retries, 11);
                assert!(last_error.is_transient());
            }
            other => panic!("expected Aborted, got {other:?}"),
        }
    }

    #[test]
    fn test_counter_resets_on_success() {
        // 6 failures on item 0, then 6 on item 1: never crosses the ceiling
        // because the success in between resets the run-wide counter.
        let mut item0_failures = 6;
        let mut item1_failures = 6;
        let outcome = drive(
            2,
            RetryPolicy::default(),
            |i| match i {
                0 if item0_failures > 0 => {
                    item0_failures -= 1;
                    Err(transient())
                }
                1 if item1_failures > 0 => {
                    item1_failures -= 1;
                    Err(transient())
                }
                _ => Ok(()),
            },
            |_| (),
        );

        assert!(matches!(outcome, RipOutcome::Done { items: 2 }));
    }

    #[test]
    fn test_counter_is_run_wide_not_per_item() {
        // Without an intervening success the counter keeps growing across
        // whatever item the loop is stuck on.
        let outcome = drive(5, RetryPolicy { ceiling: 3 }, flaky(u32::MAX), |_| ());
        match outcome {
            RipOutcome::Aborted { ripped, retries, .. } => {
                assert_eq!(ripped, 0);
                assert_eq!(retries, 4);
            }
            other => panic!("expected Aborted, got {other:?}"),
        }
    }

    #[test]
    fn test_abort_preserves_ripped_prefix_count() {
        let outcome = drive(
            5,
            RetryPolicy { ceiling: 2 },
            |i| if i < 3 { Ok(()) } else { Err(transient()) },
            |_| (),
        );
        match outcome {
            RipOutcome::Aborted { ripped, retries, .. } => {
                assert_eq!(ripped, 3);
                assert_eq!(retries, 3);
            }
            other => panic!("expected Aborted, got {other:?}"),
        }
    }

    #[test]
    fn test_fatal_error_aborts_without_retry() {
        let mut calls = 0;
        let outcome = drive(
            3,
            RetryPolicy::default(),
            |_| {
                calls += 1;
                Err(fatal())
            },
            |_| (),
        );

        assert_eq!(calls, 1);
        match outcome {
            RipOutcome::Aborted { ripped, retries, last_error } => {
                assert_eq!(ripped, 0);
                assert_eq!(retries, 0);
                assert!(matches!(last_error, RipError::CredentialsRejected(_)));
            }
            other => panic!("expected Aborted, got {other:?}"),
        }
    }

    #[test]
    fn test_progress_reported_once_per_item() {
        let mut reported = 0;
        let outcome = drive(
            4,
            RetryPolicy::default(),
            {
                let mut first_try = true;
                move |_| {
                    // every item fails once before succeeding
                    if first_try {
                        first_try = false;
                        Err(transient())
                    } else {
                        first_try = true;
                        Ok(())
                    }
                }
            },
            |_| reported += 1,
        );

        assert!(matches!(outcome, RipOutcome::Done { items: 4 }));
        assert_eq!(reported, 4);
    }
}
