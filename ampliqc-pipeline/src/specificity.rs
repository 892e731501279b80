//! Specificity check: one primer sequence against one genome.

use ampliqc_client::GenomeSearch;
use ampliqc_core::{GenomeId, SpecificityState};

/// Run one specificity check to a terminal state.
///
/// Classification is purely by hit count: zero is `NoMatch`, one is
/// `Unique`, more is `Multiple` in service order. Any error lands as
/// `Failed`; there is no retry at this layer. Sequences must be non-empty,
/// the session skips empty ones before ever spawning a check.
pub(crate) async fn run_specificity(
    search: &dyn GenomeSearch,
    sequence: &str,
    genome: &GenomeId,
) -> SpecificityState {
    match search.search(sequence, genome).await {
        Ok(hits) => SpecificityState::from_hits(hits),
        Err(e) => {
            tracing::error!(error = %e, genome = %genome, "Specificity search failed");
            SpecificityState::Failed {
                reason: e.to_string(),
            }
        }
    }
}
