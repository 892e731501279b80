//! Per-row verification coordinator.
//!
//! Each candidate primer pair gets one coordinator tracking three slots:
//! forward specificity, reverse specificity, and the pair-level
//! amplification check. Slots start `Pending` and accept exactly one
//! terminal state each; the row is resolved once all three have landed,
//! in whatever order they arrive.

use crate::counter::SignalCounter;
use ampliqc_core::{
    AmplificationState, PairId, PrimerPair, PrimerSide, RowSnapshot, SpecificityState,
};

/// What a merge did to the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Terminal state recorded. `row_resolved` is true if this was the
    /// last outstanding slot.
    Merged { row_resolved: bool },
    /// Arrival ignored: the slot was already terminal, or the state was
    /// not terminal to begin with.
    Ignored,
}

impl MergeOutcome {
    pub fn was_merged(&self) -> bool {
        matches!(self, MergeOutcome::Merged { .. })
    }
}

/// Coordinates the three concurrent checks of one primer pair row.
#[derive(Debug)]
pub struct RowCoordinator {
    pair: PrimerPair,
    forward: SpecificityState,
    reverse: SpecificityState,
    product: AmplificationState,
    slots: SignalCounter,
}

impl RowCoordinator {
    pub fn new(pair: PrimerPair) -> Self {
        Self {
            pair,
            forward: SpecificityState::Pending,
            reverse: SpecificityState::Pending,
            product: AmplificationState::Pending,
            slots: SignalCounter::new(3),
        }
    }

    pub fn pair(&self) -> &PrimerPair {
        &self.pair
    }

    pub fn pair_id(&self) -> PairId {
        self.pair.pair_id
    }

    /// Merge a terminal specificity state into one side's slot.
    ///
    /// Terminal states are never overwritten; a second arrival for the
    /// same slot is logged and ignored.
    pub fn merge_specificity(
        &mut self,
        side: PrimerSide,
        state: SpecificityState,
    ) -> MergeOutcome {
        if !state.is_terminal() {
            tracing::warn!(
                pair_id = %self.pair.pair_id,
                ?side,
                "Refusing to merge non-terminal specificity state"
            );
            return MergeOutcome::Ignored;
        }
        let slot = match side {
            PrimerSide::Forward => &mut self.forward,
            PrimerSide::Reverse => &mut self.reverse,
        };
        if slot.is_terminal() {
            tracing::warn!(
                pair_id = %self.pair.pair_id,
                ?side,
                "Duplicate terminal arrival for specificity slot, keeping first result"
            );
            return MergeOutcome::Ignored;
        }
        *slot = state;
        MergeOutcome::Merged {
            row_resolved: self.slots.arrive(),
        }
    }

    /// Merge a terminal amplification state into the pair-level slot.
    pub fn merge_amplification(&mut self, state: AmplificationState) -> MergeOutcome {
        if !state.is_terminal() {
            tracing::warn!(
                pair_id = %self.pair.pair_id,
                "Refusing to merge non-terminal amplification state"
            );
            return MergeOutcome::Ignored;
        }
        if self.product.is_terminal() {
            tracing::warn!(
                pair_id = %self.pair.pair_id,
                "Duplicate terminal arrival for amplification slot, keeping first result"
            );
            return MergeOutcome::Ignored;
        }
        self.product = state;
        MergeOutcome::Merged {
            row_resolved: self.slots.arrive(),
        }
    }

    /// True once all three slots hold terminal states.
    pub fn is_resolved(&self) -> bool {
        self.slots.is_complete()
    }

    pub fn snapshot(&self) -> RowSnapshot {
        RowSnapshot {
            pair_id: self.pair.pair_id,
            forward: self.forward.clone(),
            reverse: self.reverse.clone(),
            product: self.product.clone(),
            resolved: self.is_resolved(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
