//! Session lifecycle: design runs, row verification fan-out, notes saves.
//!
//! A `Pipeline` outlives many sessions. Each design run produces one
//! `PipelineSession` owning that run's rows wholesale; starting a new run
//! supersedes the previous session, and every result arrival checks the
//! session token before merging so late results from a superseded run are
//! discarded rather than mixed into the current batch.

use crate::amplification::run_amplification;
use crate::counter::SignalCounter;
use crate::row::{MergeOutcome, RowCoordinator};
use crate::specificity::run_specificity;
use ampliqc_client::{RetryingRequest, Services};
use ampliqc_core::{
    AmplificationState, AmpliqcResult, DesignTarget, GenomeId, PairId, PipelineConfig,
    PipelineEvent, PrimerPair, PrimerSide, RecordId, RowSnapshot, SessionError, SessionToken,
    SpecificityState,
};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex, RwLock};

/// Events are advisory. A full or closed receiver drops them with a log
/// line rather than stalling check tasks.
fn emit(events: &mpsc::Sender<PipelineEvent>, event: PipelineEvent) {
    if let Err(e) = events.try_send(event) {
        tracing::warn!(error = %e, "Dropping pipeline event");
    }
}

// ============================================================================
// PIPELINE
// ============================================================================

/// Front door of the verification pipeline.
///
/// Owns the backend services, the event channel, and the record of which
/// session token is current.
pub struct Pipeline {
    services: Services,
    config: PipelineConfig,
    events: mpsc::Sender<PipelineEvent>,
    active: Arc<RwLock<Option<SessionToken>>>,
}

impl Pipeline {
    /// Create a pipeline and the receiving end of its event stream.
    pub fn new(
        services: Services,
        config: PipelineConfig,
    ) -> (Self, mpsc::Receiver<PipelineEvent>) {
        let (events, receiver) = mpsc::channel(config.event_capacity);
        (
            Self {
                services,
                config,
                events,
                active: Arc::new(RwLock::new(None)),
            },
            receiver,
        )
    }

    /// Run the design step under the gateway-timeout retry policy.
    ///
    /// This is the only retried call in the pipeline; verification checks
    /// surface their timeouts as terminal row states instead.
    pub async fn run_design(&self, target: &DesignTarget) -> AmpliqcResult<Vec<PrimerPair>> {
        let retry = RetryingRequest::gateway_timeouts(self.config.design_max_attempts);
        let designer = &self.services.designer;
        retry
            .execute(|attempt| async move {
                tracing::debug!(attempt, gene = %target.gene, "Issuing design request");
                designer.design(target).await
            })
            .await
    }

    /// Design and start verification in one step.
    ///
    /// Only a design failure, after its retries, aborts the start; from the
    /// session onward everything degrades row by row.
    pub async fn start_from_design(
        &self,
        target: &DesignTarget,
    ) -> AmpliqcResult<Arc<PipelineSession>> {
        let pairs = self.run_design(target).await?;
        Ok(self.start_session(target.genome.clone(), pairs).await)
    }

    /// Start a verification session over one design run's candidate rows.
    ///
    /// Any previous session is superseded immediately; its in-flight
    /// results fail the token check on arrival.
    pub async fn start_session(
        &self,
        genome: GenomeId,
        pairs: Vec<PrimerPair>,
    ) -> Arc<PipelineSession> {
        let token = SessionToken::now_v7();
        {
            let mut active = self.active.write().await;
            if let Some(previous) = active.replace(token) {
                tracing::info!(superseded = %previous, token = %token, "Superseding previous session");
            }
        }

        // Probed once; every amplification check in this session gates on it
        let pcr_available = match self.services.pcr.is_installed(&genome).await {
            Ok(flag) => flag,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    genome = %genome,
                    "Availability probe failed, treating amplification tool as unavailable"
                );
                false
            }
        };

        let row_count = pairs.len();
        let mut rows = HashMap::with_capacity(row_count);
        let mut checks = Vec::with_capacity(row_count);
        for pair in pairs {
            checks.push((
                pair.pair_id,
                pair.forward.sequence.clone(),
                pair.reverse.sequence.clone(),
            ));
            rows.insert(pair.pair_id, RowCoordinator::new(pair));
        }

        let session = Arc::new(PipelineSession {
            token,
            genome: genome.clone(),
            pcr_available,
            rows: RwLock::new(rows),
            batch: Mutex::new(SignalCounter::new(row_count)),
            services: self.services.clone(),
            events: self.events.clone(),
            active: Arc::clone(&self.active),
        });

        tracing::info!(token = %token, genome = %genome, row_count, pcr_available, "Verification session started");
        emit(
            &self.events,
            PipelineEvent::SessionStarted {
                token,
                genome,
                row_count,
                pcr_available,
            },
        );

        if row_count == 0 {
            emit(&self.events, PipelineEvent::BatchResolved { token });
            return session;
        }

        for (pair_id, forward, reverse) in checks {
            session.spawn_row_checks(pair_id, forward, reverse);
        }
        session
    }

    /// Token of the session currently accepting results, if any.
    pub async fn active_token(&self) -> Option<SessionToken> {
        *self.active.read().await
    }
}

// ============================================================================
// SESSION
// ============================================================================

/// One pending notes edit for a saved primer record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteEdit {
    pub record: RecordId,
    pub notes: String,
}

impl NoteEdit {
    pub fn new(record: RecordId, notes: impl Into<String>) -> Self {
        Self {
            record,
            notes: notes.into(),
        }
    }
}

/// One design run's verification state.
///
/// Owns every row coordinator for the run. All mutation flows through the
/// session's merge operations, which check the session token first, so a
/// superseded session can never write into the current one.
pub struct PipelineSession {
    token: SessionToken,
    genome: GenomeId,
    pcr_available: bool,
    rows: RwLock<HashMap<PairId, RowCoordinator>>,
    batch: Mutex<SignalCounter>,
    services: Services,
    events: mpsc::Sender<PipelineEvent>,
    active: Arc<RwLock<Option<SessionToken>>>,
}

// `services` holds non-Debug trait objects, so the derive is unavailable
impl fmt::Debug for PipelineSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineSession")
            .field("token", &self.token)
            .field("genome", &self.genome)
            .field("pcr_available", &self.pcr_available)
            .finish_non_exhaustive()
    }
}

impl PipelineSession {
    pub fn token(&self) -> SessionToken {
        self.token
    }

    pub fn genome(&self) -> &GenomeId {
        &self.genome
    }

    /// Whether the amplification tool answered this session's probe.
    pub fn pcr_available(&self) -> bool {
        self.pcr_available
    }

    /// Snapshot one row's verification state.
    pub async fn row_state(&self, pair_id: PairId) -> Option<RowSnapshot> {
        self.rows
            .read()
            .await
            .get(&pair_id)
            .map(RowCoordinator::snapshot)
    }

    /// Snapshots of every row, in creation order.
    pub async fn batch_state(&self) -> Vec<RowSnapshot> {
        let rows = self.rows.read().await;
        let mut snapshots: Vec<RowSnapshot> =
            rows.values().map(RowCoordinator::snapshot).collect();
        snapshots.sort_by_key(|snap| snap.pair_id);
        snapshots
    }

    /// True iff every row's coordinator is resolved. Vacuously true for an
    /// empty batch.
    pub async fn is_batch_fully_resolved(&self) -> bool {
        self.rows
            .read()
            .await
            .values()
            .all(RowCoordinator::is_resolved)
    }

    /// Persist edited notes for saved records, one concurrent call per edit.
    ///
    /// The batch outcome arrives on the event stream: one
    /// `NotesBatchCompleted` when every edit lands, or one `NotesBatchError`
    /// for the first failure with later failures logged only. A superseded
    /// session refuses the batch outright.
    pub async fn save_notes(self: &Arc<Self>, edits: Vec<NoteEdit>) -> AmpliqcResult<()> {
        if self.is_superseded().await {
            return Err(SessionError::Superseded { token: self.token }.into());
        }
        if edits.is_empty() {
            emit(
                &self.events,
                PipelineEvent::NotesBatchCompleted { token: self.token },
            );
            return Ok(());
        }

        let tracker = Arc::new(Mutex::new(SignalCounter::new(edits.len())));
        for edit in edits {
            let session = Arc::clone(self);
            let tracker = Arc::clone(&tracker);
            tokio::spawn(async move {
                let result = session
                    .services
                    .notes
                    .update_notes(&edit.record, &edit.notes, &session.genome)
                    .await;
                session
                    .record_note_outcome(&tracker, &edit.record, result)
                    .await;
            });
        }
        Ok(())
    }

    fn spawn_row_checks(self: &Arc<Self>, pair_id: PairId, forward: String, reverse: String) {
        let sides = [
            (PrimerSide::Forward, forward.clone()),
            (PrimerSide::Reverse, reverse.clone()),
        ];
        for (side, sequence) in sides {
            if sequence.is_empty() {
                tracing::warn!(%pair_id, ?side, "Empty primer sequence, specificity slot stays pending");
                continue;
            }
            let session = Arc::clone(self);
            tokio::spawn(async move {
                let state =
                    run_specificity(session.services.search.as_ref(), &sequence, &session.genome)
                        .await;
                session.merge_specificity(pair_id, side, state).await;
            });
        }

        if forward.is_empty() || reverse.is_empty() {
            tracing::warn!(%pair_id, "Incomplete pair, skipping amplification check");
            return;
        }
        let session = Arc::clone(self);
        tokio::spawn(async move {
            let state = run_amplification(
                session.services.pcr.as_ref(),
                session.pcr_available,
                &forward,
                &reverse,
                &session.genome,
            )
            .await;
            session.merge_amplification(pair_id, state).await;
        });
    }

    async fn is_superseded(&self) -> bool {
        *self.active.read().await != Some(self.token)
    }

    async fn merge_specificity(&self, pair_id: PairId, side: PrimerSide, state: SpecificityState) {
        if self.is_superseded().await {
            tracing::debug!(token = %self.token, %pair_id, "Discarding stale specificity result");
            return;
        }
        let outcome = {
            let mut rows = self.rows.write().await;
            match rows.get_mut(&pair_id) {
                Some(row) => row.merge_specificity(side, state.clone()),
                None => {
                    tracing::warn!(%pair_id, "Specificity result for unknown pair");
                    return;
                }
            }
        };
        if let MergeOutcome::Merged { row_resolved } = outcome {
            emit(
                &self.events,
                PipelineEvent::SpecificityUpdated {
                    token: self.token,
                    pair_id,
                    side,
                    state,
                },
            );
            if row_resolved {
                self.record_row_resolved(pair_id).await;
            }
        }
    }

    async fn merge_amplification(&self, pair_id: PairId, state: AmplificationState) {
        if self.is_superseded().await {
            tracing::debug!(token = %self.token, %pair_id, "Discarding stale amplification result");
            return;
        }
        let outcome = {
            let mut rows = self.rows.write().await;
            match rows.get_mut(&pair_id) {
                Some(row) => row.merge_amplification(state.clone()),
                None => {
                    tracing::warn!(%pair_id, "Amplification result for unknown pair");
                    return;
                }
            }
        };
        if let MergeOutcome::Merged { row_resolved } = outcome {
            emit(
                &self.events,
                PipelineEvent::AmplificationUpdated {
                    token: self.token,
                    pair_id,
                    state,
                },
            );
            if row_resolved {
                self.record_row_resolved(pair_id).await;
            }
        }
    }

    async fn record_row_resolved(&self, pair_id: PairId) {
        emit(
            &self.events,
            PipelineEvent::RowResolved {
                token: self.token,
                pair_id,
            },
        );
        let batch_resolved = self.batch.lock().await.arrive();
        if batch_resolved {
            tracing::info!(token = %self.token, "Verification batch fully resolved");
            emit(&self.events, PipelineEvent::BatchResolved { token: self.token });
        }
    }

    async fn record_note_outcome(
        &self,
        tracker: &Mutex<SignalCounter>,
        record: &RecordId,
        result: AmpliqcResult<()>,
    ) {
        if self.is_superseded().await {
            tracing::debug!(token = %self.token, %record, "Discarding notes result for superseded session");
            return;
        }
        match result {
            Ok(()) => {
                let completed = tracker.lock().await.arrive();
                if completed {
                    tracing::info!(token = %self.token, "Notes batch completed");
                    emit(
                        &self.events,
                        PipelineEvent::NotesBatchCompleted { token: self.token },
                    );
                }
            }
            Err(e) => {
                tracing::error!(error = %e, %record, "Notes save failed");
                if tracker.lock().await.fail() {
                    emit(
                        &self.events,
                        PipelineEvent::NotesBatchError {
                            token: self.token,
                            message: e.to_string(),
                        },
                    );
                }
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_full_event_channel_drops_instead_of_blocking() {
        let (tx, mut rx) = mpsc::channel(1);
        let token = SessionToken::now_v7();

        emit(&tx, PipelineEvent::BatchResolved { token });
        // Channel is full; this one is dropped, not queued
        emit(&tx, PipelineEvent::BatchResolved { token });

        assert_eq!(rx.recv().await, Some(PipelineEvent::BatchResolved { token }));
        assert!(rx.try_recv().is_err());
    }
}
