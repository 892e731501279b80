//! Pipeline event types
//!
//! Everything the presentation layer can observe happens through these
//! events. Merges never block on delivery; a slow consumer loses events
//! rather than stalling verification.

use crate::{
    AmplificationState, GenomeId, PairId, PrimerSide, SessionToken, SpecificityState,
};
use serde::{Deserialize, Serialize};

/// Events emitted by a pipeline session as verification progresses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PipelineEvent {
    // ========================================================================
    // SESSION LIFECYCLE
    // ========================================================================
    /// A design run returned candidates and a new session took over.
    SessionStarted {
        token: SessionToken,
        genome: GenomeId,
        row_count: usize,
        /// Whether the amplification tool is installed for this genome
        pcr_available: bool,
    },

    // ========================================================================
    // ROW VERIFICATION
    // ========================================================================
    /// One primer's specificity slot reached a terminal state.
    SpecificityUpdated {
        token: SessionToken,
        pair_id: PairId,
        side: PrimerSide,
        state: SpecificityState,
    },

    /// A pair's amplification slot reached a terminal state.
    AmplificationUpdated {
        token: SessionToken,
        pair_id: PairId,
        state: AmplificationState,
    },

    /// All three of a row's slots are terminal.
    RowResolved { token: SessionToken, pair_id: PairId },

    /// Every row of the batch is resolved.
    BatchResolved { token: SessionToken },

    // ========================================================================
    // NOTES SAVES
    // ========================================================================
    /// Every notes-save of one batch completed successfully.
    NotesBatchCompleted { token: SessionToken },

    /// First failure of a notes-save batch. Emitted at most once per batch;
    /// later failures are logged only.
    NotesBatchError { token: SessionToken, message: String },
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serde_tagging() {
        let event = PipelineEvent::RowResolved {
            token: SessionToken::now_v7(),
            pair_id: PairId::now_v7(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"RowResolved\""));

        let back: PipelineEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_specificity_event_carries_state() {
        let event = PipelineEvent::SpecificityUpdated {
            token: SessionToken::now_v7(),
            pair_id: PairId::now_v7(),
            side: PrimerSide::Forward,
            state: SpecificityState::Unique {
                location: "3:100-120+".to_string(),
            },
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("3:100-120+"));
    }
}
