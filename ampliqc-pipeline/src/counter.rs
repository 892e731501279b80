//! Decrement-and-signal-once counter.
//!
//! One pattern, two instantiations: each row coordinator counts its three
//! check slots, and each notes-save batch counts its edits. The contract in
//! both cases is that the boundary crossing is reported exactly once.

/// Counts outstanding units of work.
///
/// `arrive()` records one unit finishing and reports `true` exactly once,
/// on the arrival that empties the counter. `fail()` records one unit
/// failing and reports `true` for the first failure only. Failures do not
/// decrement, so a batch with any failure never reports completion.
///
/// Callers own the one-signal-per-unit discipline; the counter saturates
/// at zero rather than defending against double-reported work.
#[derive(Debug)]
pub struct SignalCounter {
    remaining: usize,
    first_error_sent: bool,
}

impl SignalCounter {
    pub fn new(expected: usize) -> Self {
        Self {
            remaining: expected,
            first_error_sent: false,
        }
    }

    /// Record one unit arriving.
    ///
    /// Returns `true` on the arrival that brings the count to zero, and
    /// never again after that.
    pub fn arrive(&mut self) -> bool {
        if self.remaining == 0 {
            tracing::warn!("Arrival on an already-empty counter, ignoring");
            return false;
        }
        self.remaining -= 1;
        self.remaining == 0
    }

    /// Record one unit failing.
    ///
    /// Returns `true` for the first failure only; later failures are
    /// logged and suppressed.
    pub fn fail(&mut self) -> bool {
        if self.first_error_sent {
            tracing::debug!("Suppressing duplicate batch failure");
            return false;
        }
        self.first_error_sent = true;
        true
    }

    pub fn remaining(&self) -> usize {
        self.remaining
    }

    pub fn is_complete(&self) -> bool {
        self.remaining == 0
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signals_exactly_once_at_zero() {
        let mut counter = SignalCounter::new(3);

        assert!(!counter.arrive());
        assert_eq!(counter.remaining(), 2);
        assert!(!counter.arrive());
        assert!(counter.arrive());
        assert!(counter.is_complete());
    }

    #[test]
    fn test_extra_arrivals_do_not_retrigger() {
        let mut counter = SignalCounter::new(2);
        counter.arrive();
        assert!(counter.arrive());

        assert!(!counter.arrive());
        assert!(!counter.arrive());
        assert_eq!(counter.remaining(), 0);
    }

    #[test]
    fn test_first_failure_only_is_surfaced() {
        let mut counter = SignalCounter::new(3);

        assert!(counter.fail());
        assert!(!counter.fail());
        assert!(!counter.fail());
    }

    #[test]
    fn test_failure_blocks_completion() {
        let mut counter = SignalCounter::new(3);

        counter.fail();
        assert!(!counter.arrive());
        assert!(!counter.arrive());
        // Only two of three units arrived; the failed one never does
        assert!(!counter.is_complete());
        assert_eq!(counter.remaining(), 1);
    }

    #[test]
    fn test_zero_sized_counter_is_born_complete() {
        let counter = SignalCounter::new(0);
        assert!(counter.is_complete());
    }

    #[test]
    fn test_single_unit() {
        let mut counter = SignalCounter::new(1);
        assert!(counter.arrive());
        assert!(counter.is_complete());
    }
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Exactly one completion signal, fired on the Nth arrival.
        #[test]
        fn prop_completion_fires_on_nth_arrival(n in 1usize..50) {
            let mut counter = SignalCounter::new(n);
            let mut signals = 0;
            for i in 1..=n {
                if counter.arrive() {
                    signals += 1;
                    prop_assert_eq!(i, n);
                }
            }
            prop_assert_eq!(signals, 1);
            prop_assert!(counter.is_complete());
        }

        /// Any interleaving of failures surfaces exactly one.
        #[test]
        fn prop_one_failure_surfaced(n in 1usize..20, failures in 1usize..20) {
            let mut counter = SignalCounter::new(n);
            let mut surfaced = 0;
            for _ in 0..failures {
                if counter.fail() {
                    surfaced += 1;
                }
            }
            prop_assert_eq!(surfaced, 1);
        }

        /// Remaining never underflows regardless of excess arrivals.
        #[test]
        fn prop_remaining_saturates(n in 0usize..10, arrivals in 0usize..30) {
            let mut counter = SignalCounter::new(n);
            for _ in 0..arrivals {
                counter.arrive();
            }
            prop_assert_eq!(counter.remaining(), n.saturating_sub(arrivals));
        }
    }
}
