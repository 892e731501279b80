//! AMPLIQC Client - Backend Service Boundary
//!
//! Provider-agnostic traits for the four backend services the verification
//! pipeline consumes: primer design, genome specificity search, in-silico
//! PCR, and the notes store. The pipeline only ever talks to these traits;
//! `BackendClient` implements all of them over HTTP, and the test utilities
//! provide scripted in-memory implementations.

use ampliqc_core::{AmplificationResult, AmpliqcResult, DesignTarget, GenomeId, Hit, PrimerPair,
    RecordId};
use async_trait::async_trait;
use std::sync::Arc;

mod http;
mod retry;
mod wire;

pub use http::BackendClient;
pub use retry::RetryingRequest;

// ============================================================================
// SERVICE TRAITS
// ============================================================================

/// Trait for the primer design step.
/// Implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait PrimerDesigner: Send + Sync {
    /// Run a design for one gene against one genome.
    ///
    /// # Arguments
    /// * `target` - Gene and genome the design runs against
    ///
    /// # Returns
    /// * `Ok(Vec<PrimerPair>)` - Candidate pairs in design order
    /// * `Err(AmpliqcError::Transport)` - Gateway timeouts; the caller's
    ///   retry policy decides whether to re-issue
    async fn design(&self, target: &DesignTarget) -> AmpliqcResult<Vec<PrimerPair>>;
}

/// Trait for the genome specificity search.
/// Implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait GenomeSearch: Send + Sync {
    /// Search one primer sequence against a genome.
    ///
    /// # Arguments
    /// * `sequence` - Nucleotide sequence, never empty
    /// * `genome` - Genome to search against
    ///
    /// # Returns
    /// * `Ok(Vec<Hit>)` - Matches in service order, possibly empty
    /// * `Err(_)` - Transport or service failure; the check records it as a
    ///   terminal `Failed` state and never retries
    async fn search(&self, sequence: &str, genome: &GenomeId) -> AmpliqcResult<Vec<Hit>>;
}

/// Trait for the in-silico PCR tool.
/// Implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait InSilicoPcr: Send + Sync {
    /// Probe whether the tool is installed for a genome.
    /// Called once per session; the session gates every `simulate` on it.
    async fn is_installed(&self, genome: &GenomeId) -> AmpliqcResult<bool>;

    /// Predict amplification products for one ordered primer pair.
    ///
    /// # Arguments
    /// * `forward` - Forward primer sequence
    /// * `reverse` - Reverse primer sequence
    /// * `genome` - Genome to amplify against
    ///
    /// # Returns
    /// * `Ok(AmplificationResult)` - Products, binding sites and diagnostics;
    ///   zero amplicons is a success, not an error
    /// * `Err(AmpliqcError::Service(ServiceError::ToolUnavailable))` - The
    ///   tool disappeared after the probe
    async fn simulate(
        &self,
        forward: &str,
        reverse: &str,
        genome: &GenomeId,
    ) -> AmpliqcResult<AmplificationResult>;
}

/// Trait for the primer record notes store.
#[async_trait]
pub trait PrimerNotesStore: Send + Sync {
    /// Persist new notes text for one saved primer record.
    async fn update_notes(
        &self,
        record: &RecordId,
        notes: &str,
        genome: &GenomeId,
    ) -> AmpliqcResult<()>;
}

// ============================================================================
// SERVICE AGGREGATION
// ============================================================================

/// All four backend services bundled for the pipeline.
#[derive(Clone)]
pub struct Services {
    pub designer: Arc<dyn PrimerDesigner>,
    pub search: Arc<dyn GenomeSearch>,
    pub pcr: Arc<dyn InSilicoPcr>,
    pub notes: Arc<dyn PrimerNotesStore>,
}

impl Services {
    pub fn new(
        designer: Arc<dyn PrimerDesigner>,
        search: Arc<dyn GenomeSearch>,
        pcr: Arc<dyn InSilicoPcr>,
        notes: Arc<dyn PrimerNotesStore>,
    ) -> Self {
        Self {
            designer,
            search,
            pcr,
            notes,
        }
    }

    /// Bundle every service from one HTTP backend client.
    pub fn backed_by(client: BackendClient) -> Self {
        let client = Arc::new(client);
        Self {
            designer: client.clone(),
            search: client.clone(),
            pcr: client.clone(),
            notes: client,
        }
    }
}
