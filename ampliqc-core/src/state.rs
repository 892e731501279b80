//! Per-slot verification states and their transition rules.
//!
//! Every row of a design batch carries three verification slots: one
//! specificity state per primer side and one amplification state for the
//! pair. Each slot starts `Pending` and moves exactly once to a terminal
//! state; a terminal slot is never overwritten (a second arrival is
//! discarded and logged by the coordinator, not here).
//!
//! # State Transition Diagram
//!
//! ```text
//! SpecificityState:    Pending ──┬─→ Unique    (terminal)
//!                                ├─→ NoMatch   (terminal)
//!                                ├─→ Multiple  (terminal)
//!                                └─→ Failed    (terminal)
//!
//! AmplificationState:  Pending ──┬─→ Checked     (terminal)
//!                                ├─→ Unavailable (terminal)
//!                                └─→ Failed      (terminal)
//! ```

use crate::{AmplificationResult, Hit, PairId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of one primer's specificity check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum SpecificityState {
    /// Check not yet resolved
    #[default]
    Pending,
    /// Exactly one genomic match; location carries the strand marker,
    /// e.g. "3:100-120+"
    Unique { location: String },
    /// No genomic match at all
    NoMatch,
    /// Two or more matches, in the order the search returned them
    Multiple { hits: Vec<Hit> },
    /// The check itself failed; never retried
    Failed { reason: String },
}

impl SpecificityState {
    /// Classify a search result by match count.
    /// Callers guard against empty input sequences before searching at all.
    pub fn from_hits(hits: Vec<Hit>) -> Self {
        match hits.len() {
            0 => SpecificityState::NoMatch,
            1 => SpecificityState::Unique {
                location: hits[0].location_label(),
            },
            _ => SpecificityState::Multiple { hits },
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, SpecificityState::Pending)
    }

    /// Short state name for logs and events.
    pub fn kind(&self) -> &'static str {
        match self {
            SpecificityState::Pending => "Pending",
            SpecificityState::Unique { .. } => "Unique",
            SpecificityState::NoMatch => "NoMatch",
            SpecificityState::Multiple { .. } => "Multiple",
            SpecificityState::Failed { .. } => "Failed",
        }
    }
}

impl fmt::Display for SpecificityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind())
    }
}

/// Outcome of a pair's in-silico amplification check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum AmplificationState {
    /// Check not yet resolved
    #[default]
    Pending,
    /// The tool ran; the result itself may still carry warning or error
    /// diagnostics
    Checked { result: AmplificationResult },
    /// The tool is not installed for this genome; no call was made
    Unavailable,
    /// The check itself failed; never retried
    Failed { reason: String },
}

impl AmplificationState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, AmplificationState::Pending)
    }

    /// Short state name for logs and events.
    pub fn kind(&self) -> &'static str {
        match self {
            AmplificationState::Pending => "Pending",
            AmplificationState::Checked { .. } => "Checked",
            AmplificationState::Unavailable => "Unavailable",
            AmplificationState::Failed { .. } => "Failed",
        }
    }
}

impl fmt::Display for AmplificationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind())
    }
}

/// Point-in-time copy of one row's verification slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowSnapshot {
    pub pair_id: PairId,
    pub forward: SpecificityState,
    pub reverse: SpecificityState,
    pub product: AmplificationState,
    /// True once all three slots are terminal
    pub resolved: bool,
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Strand;

    #[test]
    fn test_from_hits_zero_is_no_match() {
        assert_eq!(SpecificityState::from_hits(Vec::new()), SpecificityState::NoMatch);
    }

    #[test]
    fn test_from_hits_one_is_unique_with_location() {
        let hits = vec![Hit::new("3", 100, 120, Strand::Forward)];
        assert_eq!(
            SpecificityState::from_hits(hits),
            SpecificityState::Unique {
                location: "3:100-120+".to_string()
            }
        );
    }

    #[test]
    fn test_from_hits_many_keeps_service_order() {
        let hits = vec![
            Hit::new("7", 50, 70, Strand::Reverse),
            Hit::new("3", 100, 120, Strand::Forward),
        ];
        match SpecificityState::from_hits(hits.clone()) {
            SpecificityState::Multiple { hits: kept } => {
                assert_eq!(kept, hits);
                assert_eq!(kept[0].location_label(), "7:50-70-");
            }
            other => panic!("expected Multiple, got {}", other),
        }
    }

    #[test]
    fn test_terminality() {
        assert!(!SpecificityState::Pending.is_terminal());
        assert!(SpecificityState::NoMatch.is_terminal());
        assert!(SpecificityState::Failed {
            reason: "timeout".to_string()
        }
        .is_terminal());

        assert!(!AmplificationState::Pending.is_terminal());
        assert!(AmplificationState::Unavailable.is_terminal());
        assert!(AmplificationState::Checked {
            result: AmplificationResult::default()
        }
        .is_terminal());
    }
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use crate::Strand;
    use proptest::prelude::*;

    fn arb_strand() -> impl Strategy<Value = Strand> {
        prop_oneof![Just(Strand::Forward), Just(Strand::Reverse)]
    }

    fn arb_hit() -> impl Strategy<Value = Hit> {
        ("[1-9XY]", 0u64..1_000_000, 1u64..200, arb_strand()).prop_map(
            |(chromosome, start, len, strand)| Hit::new(chromosome, start, start + len, strand),
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_classification_matches_hit_count(hits in proptest::collection::vec(arb_hit(), 0..6)) {
            let n = hits.len();
            let state = SpecificityState::from_hits(hits);
            prop_assert!(state.is_terminal());
            match n {
                0 => prop_assert_eq!(state, SpecificityState::NoMatch),
                // matches! is hoisted out because prop_assert! stringifies its
                // condition into a format string, where `{ .. }` fails to parse
                1 => {
                    let is_unique = matches!(state, SpecificityState::Unique { .. });
                    prop_assert!(is_unique);
                }
                _ => {
                    let is_multiple = matches!(state, SpecificityState::Multiple { .. });
                    prop_assert!(is_multiple);
                }
            }
        }

        #[test]
        fn prop_unique_location_ends_with_marker(hit in arb_hit()) {
            let marker = hit.strand.marker();
            match SpecificityState::from_hits(vec![hit]) {
                SpecificityState::Unique { location } => {
                    prop_assert!(location.ends_with(marker));
                    prop_assert!(location.contains(':'));
                    prop_assert!(location.contains('-'));
                }
                other => prop_assert!(false, "expected Unique, got {}", other),
            }
        }
    }
}
