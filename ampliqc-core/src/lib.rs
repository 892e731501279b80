//! AMPLIQC Core - Entity Types
//!
//! Pure data structures for the primer verification pipeline, plus the
//! classification rules intrinsic to them (hit counting, amplification
//! tiers, binding-site partitioning). All other crates depend on this.
//! No I/O and no async code lives here.

mod config;
mod entities;
mod enums;
mod error;
mod event;
mod identity;
mod state;

pub use config::{
    PipelineConfig, DEFAULT_BASE_URL, DEFAULT_DESIGN_MAX_ATTEMPTS, DEFAULT_EVENT_CAPACITY,
    DEFAULT_REQUEST_TIMEOUT_MS,
};
pub use entities::{
    Amplicon, AmplificationResult, BindingSite, BindingSitePartition, DesignTarget,
    DiagnosticMessage, Hit, Primer, PrimerPair, BINDING_SITE_DISPLAY_LIMIT,
    BINDING_SITE_WARNING_MAX,
};
pub use enums::{
    CheckSlot, PairGroup, PairGroupParseError, PrimerSide, ProductCall, Severity, Strand,
    StrandParseError,
};
pub use error::{
    AmpliqcError, AmpliqcResult, ConfigError, ServiceError, SessionError, TransportError,
};
pub use event::PipelineEvent;
pub use identity::{new_pair_id, new_session_token, GeneId, GenomeId, PairId, RecordId,
    SessionToken, Timestamp};
pub use state::{AmplificationState, RowSnapshot, SpecificityState};
