//! AMPLIQC Test Utilities
//!
//! Centralized test infrastructure for the AMPLIQC workspace:
//! - Scripted mocks for the four backend services
//! - Arrival-order gates for exercising concurrent check interleavings
//! - Proptest generators for entity types
//! - Test fixtures for common scenarios

// Re-export the service bundle and core types for convenience
pub use ampliqc_client::Services;
pub use ampliqc_core::{
    AmplificationResult, AmplificationState, AmpliqcError, AmpliqcResult, Hit, PairGroup, PairId,
    PipelineEvent, Primer, PrimerPair, PrimerSide, SessionToken, SpecificityState, Strand,
};

use ampliqc_client::{GenomeSearch, InSilicoPcr, PrimerDesigner, PrimerNotesStore};
use ampliqc_core::{DesignTarget, GenomeId, RecordId, ServiceError, TransportError};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

// ============================================================================
// ARRIVAL-ORDER GATE
// ============================================================================

/// Holds a mock's scripted response until the test opens the gate.
///
/// Lets a test pin the arrival order of concurrent checks: register a gate
/// per scripted key, start the session, then open the gates in the order
/// under test. Each `open()` releases one held response; opening before the
/// mock reaches the gate is safe, the permit is stored.
#[derive(Debug, Clone, Default)]
pub struct Gate {
    notify: Arc<Notify>,
}

impl Gate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Release one response held behind this gate.
    pub fn open(&self) {
        self.notify.notify_one();
    }

    async fn pass(&self) {
        self.notify.notified().await;
    }
}

// ============================================================================
// MOCK SERVICES
// ============================================================================

/// Scripted primer design service.
///
/// Responses are consumed front to back, one per call, so retry behavior
/// can be scripted attempt by attempt. A drained script answers with an
/// empty candidate list.
#[derive(Debug, Default)]
pub struct MockDesigner {
    script: Mutex<VecDeque<AmpliqcResult<Vec<PrimerPair>>>>,
    calls: AtomicUsize,
}

impl MockDesigner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the next response.
    pub fn with_response(self, response: AmpliqcResult<Vec<PrimerPair>>) -> Self {
        self.script.lock().unwrap().push_back(response);
        self
    }

    /// Queue `count` gateway timeouts before whatever comes next.
    pub fn with_timeouts(self, count: usize) -> Self {
        {
            let mut script = self.script.lock().unwrap();
            for _ in 0..count {
                script.push_back(Err(TransportError::GatewayTimeout {
                    endpoint: "/primer-design/design".to_string(),
                }
                .into()));
            }
        }
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PrimerDesigner for MockDesigner {
    async fn design(&self, _target: &DesignTarget) -> AmpliqcResult<Vec<PrimerPair>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// Scripted genome specificity search, keyed by exact sequence.
///
/// Unscripted sequences answer with zero hits.
#[derive(Debug, Default)]
pub struct MockSearch {
    responses: Mutex<HashMap<String, AmpliqcResult<Vec<Hit>>>>,
    gates: Mutex<HashMap<String, Gate>>,
    calls: AtomicUsize,
}

impl MockSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hits(self, sequence: &str, hits: Vec<Hit>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(sequence.to_string(), Ok(hits));
        self
    }

    pub fn with_error(self, sequence: &str, error: AmpliqcError) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(sequence.to_string(), Err(error));
        self
    }

    /// Hold this sequence's response behind `gate`.
    pub fn gated(self, sequence: &str, gate: Gate) -> Self {
        self.gates.lock().unwrap().insert(sequence.to_string(), gate);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenomeSearch for MockSearch {
    async fn search(&self, sequence: &str, _genome: &GenomeId) -> AmpliqcResult<Vec<Hit>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gates.lock().unwrap().get(sequence).cloned();
        if let Some(gate) = gate {
            gate.pass().await;
        }
        self.responses
            .lock()
            .unwrap()
            .get(sequence)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// Scripted in-silico PCR tool.
///
/// The probe answer is fixed at construction; run responses are keyed by
/// forward sequence. Unscripted runs answer with an empty result.
#[derive(Debug)]
pub struct MockPcr {
    probe: AmpliqcResult<bool>,
    results: Mutex<HashMap<String, AmpliqcResult<AmplificationResult>>>,
    gates: Mutex<HashMap<String, Gate>>,
    probe_calls: AtomicUsize,
    run_calls: AtomicUsize,
}

impl MockPcr {
    /// Probe answering `installed`.
    pub fn installed(installed: bool) -> Self {
        Self::with_probe(Ok(installed))
    }

    /// Probe that fails with `error`.
    pub fn probe_error(error: AmpliqcError) -> Self {
        Self::with_probe(Err(error))
    }

    fn with_probe(probe: AmpliqcResult<bool>) -> Self {
        Self {
            probe,
            results: Mutex::default(),
            gates: Mutex::default(),
            probe_calls: AtomicUsize::new(0),
            run_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_result(self, forward: &str, result: AmplificationResult) -> Self {
        self.results
            .lock()
            .unwrap()
            .insert(forward.to_string(), Ok(result));
        self
    }

    pub fn with_error(self, forward: &str, error: AmpliqcError) -> Self {
        self.results
            .lock()
            .unwrap()
            .insert(forward.to_string(), Err(error));
        self
    }

    /// Hold this forward sequence's run response behind `gate`.
    pub fn gated(self, forward: &str, gate: Gate) -> Self {
        self.gates.lock().unwrap().insert(forward.to_string(), gate);
        self
    }

    pub fn probe_calls(&self) -> usize {
        self.probe_calls.load(Ordering::SeqCst)
    }

    pub fn run_calls(&self) -> usize {
        self.run_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InSilicoPcr for MockPcr {
    async fn is_installed(&self, _genome: &GenomeId) -> AmpliqcResult<bool> {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);
        self.probe.clone()
    }

    async fn simulate(
        &self,
        forward: &str,
        _reverse: &str,
        _genome: &GenomeId,
    ) -> AmpliqcResult<AmplificationResult> {
        self.run_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gates.lock().unwrap().get(forward).cloned();
        if let Some(gate) = gate {
            gate.pass().await;
        }
        self.results
            .lock()
            .unwrap()
            .get(forward)
            .cloned()
            .unwrap_or_else(|| Ok(AmplificationResult::default()))
    }
}

/// Scripted notes store.
///
/// Records registered as failing answer with a rejection; everything else
/// succeeds and is recorded in completion order.
#[derive(Debug, Default)]
pub struct MockNotesStore {
    failing: Mutex<HashSet<String>>,
    saved: Mutex<Vec<(RecordId, String)>>,
    calls: AtomicUsize,
}

impl MockNotesStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make saves for this record fail.
    pub fn with_failing(self, record: &str) -> Self {
        self.failing.lock().unwrap().insert(record.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Successfully saved `(record, notes)` pairs.
    pub fn saved(&self) -> Vec<(RecordId, String)> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait]
impl PrimerNotesStore for MockNotesStore {
    async fn update_notes(
        &self,
        record: &RecordId,
        notes: &str,
        _genome: &GenomeId,
    ) -> AmpliqcResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.lock().unwrap().contains(record.as_str()) {
            return Err(ServiceError::Rejected {
                endpoint: "/primer-design/notes".to_string(),
                status: 200,
                message: "Row Does Not Exist".to_string(),
            }
            .into());
        }
        self.saved
            .lock()
            .unwrap()
            .push((record.clone(), notes.to_string()));
        Ok(())
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for AMPLIQC entity types.

    use super::*;
    use proptest::prelude::*;

    /// Generate a primer-length DNA sequence.
    pub fn arb_dna_sequence() -> impl Strategy<Value = String> {
        proptest::collection::vec(
            prop_oneof![Just('A'), Just('C'), Just('G'), Just('T')],
            18..=30,
        )
        .prop_map(|bases| bases.into_iter().collect())
    }

    /// Generate a strand.
    pub fn arb_strand() -> impl Strategy<Value = Strand> {
        prop_oneof![Just(Strand::Forward), Just(Strand::Reverse)]
    }

    /// Generate a pair group.
    pub fn arb_pair_group() -> impl Strategy<Value = PairGroup> {
        prop_oneof![Just(PairGroup::WildType), Just(PairGroup::Edited)]
    }

    /// Generate a hit on a small chromosome set.
    pub fn arb_hit() -> impl Strategy<Value = Hit> {
        (
            "[1-9]|1[0-9]|X|Y",
            1u64..200_000_000,
            18u64..=30,
            arb_strand(),
        )
            .prop_map(|(chromosome, start, len, strand)| {
                Hit::new(chromosome, start, start + len, strand)
            })
    }

    /// Generate between `min` and `max` hits.
    pub fn arb_hits(min: usize, max: usize) -> impl Strategy<Value = Vec<Hit>> {
        proptest::collection::vec(arb_hit(), min..=max)
    }

    /// Generate a full candidate pair.
    pub fn arb_primer_pair() -> impl Strategy<Value = PrimerPair> {
        (
            arb_pair_group(),
            1u32..=10,
            arb_dna_sequence(),
            arb_dna_sequence(),
        )
            .prop_map(|(group, rank, forward, reverse)| {
                PrimerPair::new(group, rank, Primer::new(forward), Primer::new(reverse))
            })
    }

    /// Generate a terminal specificity state.
    pub fn arb_terminal_specificity() -> impl Strategy<Value = SpecificityState> {
        prop_oneof![
            Just(SpecificityState::NoMatch),
            arb_hit().prop_map(|hit| SpecificityState::Unique {
                location: hit.location_label(),
            }),
            arb_hits(2, 6).prop_map(|hits| SpecificityState::Multiple { hits }),
            Just(SpecificityState::Failed {
                reason: "injected failure".to_string(),
            }),
        ]
    }

    /// Generate a terminal amplification state.
    pub fn arb_terminal_amplification() -> impl Strategy<Value = AmplificationState> {
        prop_oneof![
            (0usize..=2, 0usize..=3).prop_map(|(amplicons, sites)| {
                AmplificationState::Checked {
                    result: super::fixtures::amplification_result(amplicons, sites),
                }
            }),
            Just(AmplificationState::Unavailable),
            Just(AmplificationState::Failed {
                reason: "injected failure".to_string(),
            }),
        ]
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built fixtures for common testing scenarios.

    use super::*;
    use ampliqc_core::{Amplicon, BindingSite};

    /// A candidate pair with the given sequences.
    pub fn pair(group: PairGroup, rank: u32, forward: &str, reverse: &str) -> PrimerPair {
        PrimerPair::new(group, rank, Primer::new(forward), Primer::new(reverse))
    }

    /// One hit.
    pub fn hit(chromosome: &str, start: u64, end: u64, strand: Strand) -> Hit {
        Hit::new(chromosome, start, end, strand)
    }

    /// Unique-match response: one hit at 3:100-120 on the plus strand.
    pub fn unique_hit() -> Vec<Hit> {
        vec![hit("3", 100, 120, Strand::Forward)]
    }

    /// One predicted binding site for `side` at `position`.
    pub fn binding_site(side: PrimerSide, position: u64) -> BindingSite {
        BindingSite {
            side,
            chromosome: "2".to_string(),
            position,
            end: position + 20,
            strand: match side {
                PrimerSide::Forward => Strand::Forward,
                PrimerSide::Reverse => Strand::Reverse,
            },
            sequence: "ACGTACGTACGTACGTACGT".to_string(),
            tm: 58.75,
        }
    }

    /// An amplification result with `amplicons` products and
    /// `sites_per_side` binding sites on each side.
    pub fn amplification_result(amplicons: usize, sites_per_side: usize) -> AmplificationResult {
        let amplicons = (0..amplicons)
            .map(|i| Amplicon {
                id: i as u32,
                chromosome: "2".to_string(),
                start: 5_000 + (i as u64) * 1_000,
                end: 5_480 + (i as u64) * 1_000,
                forward_seq: "ACGTACGTACGTACGTACGT".to_string(),
                reverse_seq: "TGCATGCATGCATGCATGCA".to_string(),
                forward_tm: 59.31,
                reverse_tm: 60.02,
            })
            .collect();

        let mut binding_sites = Vec::new();
        for side in [PrimerSide::Forward, PrimerSide::Reverse] {
            for i in 0..sites_per_side {
                binding_sites.push(binding_site(side, 5_000 + (i as u64) * 40));
            }
        }

        AmplificationResult {
            amplicons,
            binding_sites,
            messages: Vec::new(),
        }
    }

    /// Clean single-product result: one amplicon, one site per side.
    pub fn clean_single_product() -> AmplificationResult {
        amplification_result(1, 1)
    }
}

// ============================================================================
// EVENT STREAM HELPERS
// ============================================================================

pub mod events {
    //! Helpers for draining the pipeline event stream in tests.

    use ampliqc_core::PipelineEvent;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    /// How long event waits may block before the test fails.
    pub const EVENT_WAIT: Duration = Duration::from_secs(5);

    /// Receive the next event or panic.
    pub async fn next_event(rx: &mut mpsc::Receiver<PipelineEvent>) -> PipelineEvent {
        timeout(EVENT_WAIT, rx.recv())
            .await
            .expect("timed out waiting for pipeline event")
            .expect("event channel closed")
    }

    /// Drain events until `stop` matches, returning everything received
    /// including the matching event. Panics on timeout.
    pub async fn drain_until(
        rx: &mut mpsc::Receiver<PipelineEvent>,
        stop: impl Fn(&PipelineEvent) -> bool,
    ) -> Vec<PipelineEvent> {
        let mut received = Vec::new();
        loop {
            let event = next_event(rx).await;
            let done = stop(&event);
            received.push(event);
            if done {
                return received;
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
