//! Retry bookkeeping for buffer-limit violations.
//!
//! One [`RetryState`] exists per in-flight output path, owned exclusively by
//! the [`RetryLedger`]. Entries are created on first submission and removed
//! on any terminal outcome, so a finished path can be submitted again while
//! an in-flight path cannot.

use std::path::{Path, PathBuf};

use dashmap::DashMap;

use bandcast_core::{Error, MAX_QUALITY, MAX_RETRY};
use bandcast_probe::StreamBufferReport;

/// Mutable per-path retry bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryState {
    /// Retries consumed so far.
    pub retry_count: u32,
    /// Quantizer for the next (or current) attempt.
    pub current_quality: u32,
}

impl RetryState {
    fn new(quality: u32) -> Self {
        Self {
            retry_count: 0,
            current_quality: quality,
        }
    }

    /// Consume one retry: bump the counter, then degrade quality by
    /// `min(5 + 2 * retry_count, MAX_QUALITY - current_quality)`.
    /// Returns the quality for the next attempt.
    fn advance(&mut self) -> u32 {
        self.retry_count += 1;
        let increment = (5 + 2 * self.retry_count).min(MAX_QUALITY - self.current_quality);
        self.current_quality += increment;
        self.current_quality
    }

    /// True once either bound is reached; the next violation is terminal.
    fn exhausted(&self) -> bool {
        self.retry_count >= MAX_RETRY || self.current_quality >= MAX_QUALITY
    }
}

/// Outcome of evaluating one inspection report.
#[derive(Debug)]
pub enum Verdict {
    /// The file fits the device budget; state discarded.
    Accept,
    /// Over budget with budget remaining; re-encode at the given quality.
    Retry { quality: u32 },
    /// Over budget with the budget exhausted; state discarded.
    Reject(Error),
}

/// Concurrent store of retry state, keyed by output path.
///
/// Distinct keys may be driven from different tasks; the same key has
/// at-most-one writer because [`RetryLedger::begin`] rejects a second
/// submission while the first is in flight.
pub struct RetryLedger {
    entries: DashMap<PathBuf, RetryState>,
    buffer_limit: u32,
}

enum Decision {
    Accept,
    Retry(u32),
    Reject { measured: u32, retries: u32, quality: u32 },
}

impl RetryLedger {
    /// Create a ledger enforcing the given per-stream buffer budget.
    pub fn new(buffer_limit: u32) -> Self {
        Self {
            entries: DashMap::new(),
            buffer_limit,
        }
    }

    /// Register a fresh attempt for `output`.
    ///
    /// # Errors
    ///
    /// Returns a validation error if a conversion for this path is already
    /// in flight; output-path reuse is a caller contract violation.
    pub fn begin(&self, output: &Path, quality: u32) -> bandcast_core::Result<()> {
        use dashmap::mapref::entry::Entry;

        match self.entries.entry(output.to_path_buf()) {
            Entry::Occupied(_) => Err(Error::validation(format!(
                "conversion already in flight for {}",
                output.display()
            ))),
            Entry::Vacant(slot) => {
                slot.insert(RetryState::new(quality));
                Ok(())
            }
        }
    }

    /// Evaluate an inspection report against the device budget.
    pub fn evaluate(&self, output: &Path, report: &StreamBufferReport) -> Verdict {
        // Decide while holding the entry, release, then remove terminals.
        let decision = {
            let Some(mut entry) = self.entries.get_mut(output) else {
                return Verdict::Reject(Error::Internal(format!(
                    "no retry state for {}",
                    output.display()
                )));
            };

            match report.max_buffer_size {
                Some(measured) if measured >= self.buffer_limit => {
                    if entry.exhausted() {
                        Decision::Reject {
                            measured,
                            retries: entry.retry_count,
                            quality: entry.current_quality,
                        }
                    } else {
                        Decision::Retry(entry.advance())
                    }
                }
                // "Not found" is acceptable: the scan is a conservative
                // upper estimate, and silence means nothing to act on.
                _ => Decision::Accept,
            }
        };

        match decision {
            Decision::Accept => {
                self.entries.remove(output);
                Verdict::Accept
            }
            Decision::Retry(quality) => Verdict::Retry { quality },
            Decision::Reject {
                measured,
                retries,
                quality,
            } => {
                self.entries.remove(output);
                Verdict::Reject(Error::BufferLimit {
                    measured,
                    limit: self.buffer_limit,
                    retries,
                    quality,
                })
            }
        }
    }

    /// Discard state for a path whose attempt failed outside the budget
    /// check (engine failure, I/O failure). Never consumes a retry.
    pub fn abort(&self, output: &Path) {
        self.entries.remove(output);
    }

    /// Number of paths currently in flight.
    pub fn in_flight(&self) -> usize {
        self.entries.len()
    }

    /// Peek at the state for a path (tests and diagnostics).
    pub fn state(&self, output: &Path) -> Option<RetryState> {
        self.entries.get(output).map(|e| *e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bandcast_core::BUFFER_SIZE_LIMIT;

    fn over_limit(measured: u32) -> StreamBufferReport {
        StreamBufferReport {
            found_headers: 1,
            max_buffer_size: Some(measured),
        }
    }

    #[test]
    fn quality_sequence_matches_budget() {
        let ledger = RetryLedger::new(BUFFER_SIZE_LIMIT);
        let out = Path::new("/tmp/a.avi");
        ledger.begin(out, 10).unwrap();

        let mut qualities = vec![10];
        loop {
            match ledger.evaluate(out, &over_limit(22_000)) {
                Verdict::Retry { quality } => qualities.push(quality),
                Verdict::Reject(err) => {
                    assert_eq!(
                        err.to_string(),
                        "buffer size 22000 exceeds limit 20480 after 3 retries (quality 31)"
                    );
                    break;
                }
                Verdict::Accept => panic!("unexpected accept"),
            }
        }

        assert_eq!(qualities, vec![10, 17, 26, 31]);
        assert_eq!(ledger.in_flight(), 0);
    }

    #[test]
    fn not_found_is_accepted_without_consuming_budget() {
        let ledger = RetryLedger::new(BUFFER_SIZE_LIMIT);
        let out = Path::new("/tmp/b.avi");
        ledger.begin(out, 10).unwrap();

        let report = StreamBufferReport {
            found_headers: 0,
            max_buffer_size: None,
        };
        assert!(matches!(ledger.evaluate(out, &report), Verdict::Accept));
        assert_eq!(ledger.in_flight(), 0);
    }

    #[test]
    fn under_limit_is_accepted() {
        let ledger = RetryLedger::new(BUFFER_SIZE_LIMIT);
        let out = Path::new("/tmp/c.avi");
        ledger.begin(out, 10).unwrap();

        assert!(matches!(
            ledger.evaluate(out, &over_limit(BUFFER_SIZE_LIMIT - 1)),
            Verdict::Accept
        ));
    }

    #[test]
    fn exactly_at_limit_violates() {
        let ledger = RetryLedger::new(BUFFER_SIZE_LIMIT);
        let out = Path::new("/tmp/d.avi");
        ledger.begin(out, 10).unwrap();

        assert!(matches!(
            ledger.evaluate(out, &over_limit(BUFFER_SIZE_LIMIT)),
            Verdict::Retry { quality: 17 }
        ));
    }

    #[test]
    fn quality_ceiling_terminates_before_retry_budget() {
        let ledger = RetryLedger::new(BUFFER_SIZE_LIMIT);
        let out = Path::new("/tmp/e.avi");
        ledger.begin(out, 28).unwrap();

        // 28 -> min(7, 3) -> 31, then the ceiling makes the next hit terminal.
        match ledger.evaluate(out, &over_limit(30_000)) {
            Verdict::Retry { quality } => assert_eq!(quality, 31),
            other => panic!("expected retry, got {other:?}"),
        }
        match ledger.evaluate(out, &over_limit(30_000)) {
            Verdict::Reject(err) => {
                let msg = err.to_string();
                assert!(msg.contains("after 1 retries"), "got: {msg}");
                assert!(msg.contains("quality 31"), "got: {msg}");
            }
            other => panic!("expected reject, got {other:?}"),
        }
    }

    #[test]
    fn starting_at_ceiling_rejects_immediately() {
        let ledger = RetryLedger::new(BUFFER_SIZE_LIMIT);
        let out = Path::new("/tmp/f.avi");
        ledger.begin(out, 31).unwrap();

        match ledger.evaluate(out, &over_limit(21_000)) {
            Verdict::Reject(err) => {
                assert!(err.to_string().contains("after 0 retries"));
            }
            other => panic!("expected reject, got {other:?}"),
        }
    }

    #[test]
    fn double_begin_is_a_contract_violation() {
        let ledger = RetryLedger::new(BUFFER_SIZE_LIMIT);
        let out = Path::new("/tmp/g.avi");
        ledger.begin(out, 10).unwrap();
        let err = ledger.begin(out, 10).unwrap_err();
        assert!(err.to_string().contains("already in flight"));
        // Distinct paths are unaffected.
        ledger.begin(Path::new("/tmp/h.avi"), 10).unwrap();
        assert_eq!(ledger.in_flight(), 2);
    }

    #[test]
    fn abort_frees_the_path_without_touching_others() {
        let ledger = RetryLedger::new(BUFFER_SIZE_LIMIT);
        let a = Path::new("/tmp/i.avi");
        let b = Path::new("/tmp/j.avi");
        ledger.begin(a, 10).unwrap();
        ledger.begin(b, 10).unwrap();

        ledger.abort(a);
        assert!(ledger.state(a).is_none());
        assert!(ledger.state(b).is_some());
        // The freed path can be resubmitted.
        ledger.begin(a, 12).unwrap();
    }
}
