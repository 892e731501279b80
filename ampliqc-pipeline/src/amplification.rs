//! In-silico amplification check for one ordered primer pair.

use ampliqc_client::InSilicoPcr;
use ampliqc_core::{AmplificationState, AmpliqcError, GenomeId, ServiceError};

/// Run one amplification check to a terminal state.
///
/// The availability flag comes from the session's once-per-session probe;
/// when the tool is unavailable, the check short-circuits to `Unavailable`
/// without issuing the call. A `ToolUnavailable` answer from the backend
/// (the probe can go stale) routes to `Unavailable` too, it is a capability
/// gap rather than a failure. Everything else lands as `Checked` or
/// `Failed`.
pub(crate) async fn run_amplification(
    pcr: &dyn InSilicoPcr,
    available: bool,
    forward: &str,
    reverse: &str,
    genome: &GenomeId,
) -> AmplificationState {
    if !available {
        return AmplificationState::Unavailable;
    }
    match pcr.simulate(forward, reverse, genome).await {
        Ok(result) => AmplificationState::Checked { result },
        Err(AmpliqcError::Service(ServiceError::ToolUnavailable { .. })) => {
            tracing::warn!(genome = %genome, "Amplification tool reported unavailable after a positive probe");
            AmplificationState::Unavailable
        }
        Err(e) => {
            tracing::error!(error = %e, genome = %genome, "Amplification check failed");
            AmplificationState::Failed {
                reason: e.to_string(),
            }
        }
    }
}
