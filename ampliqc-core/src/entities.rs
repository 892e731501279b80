//! Core entity structures

use crate::{GenomeId, PairGroup, PairId, PrimerSide, ProductCall, Severity, Strand, Timestamp};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Binding-site count above which a single-product pair is flagged for
/// excessive off-target binding. Strictly greater than: exactly this many
/// sites is still clean.
pub const BINDING_SITE_WARNING_MAX: usize = 25;

/// Maximum binding sites rendered per primer side in result tables;
/// the remainder is elided with a note.
pub const BINDING_SITE_DISPLAY_LIMIT: usize = 15;

/// One primer of a pair, with optional design metrics riding along
/// for display. The metrics play no role in verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Primer {
    pub sequence: String,
    /// Melting temperature reported by the design step
    pub tm: Option<f64>,
    /// GC percentage reported by the design step
    pub gc_percent: Option<f64>,
}

impl Primer {
    pub fn new(sequence: impl Into<String>) -> Self {
        Self {
            sequence: sequence.into(),
            tm: None,
            gc_percent: None,
        }
    }

    pub fn with_metrics(mut self, tm: f64, gc_percent: f64) -> Self {
        self.tm = Some(tm);
        self.gc_percent = Some(gc_percent);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}

/// Candidate primer pair - one row of a design batch.
/// Created when a design run returns candidates; the whole batch is
/// discarded wholesale when a new run starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimerPair {
    pub pair_id: PairId,
    pub group: PairGroup,
    /// Order index within the group, starting at 1
    pub rank: u32,
    pub forward: Primer,
    pub reverse: Primer,
    /// Expected product size in base pairs, from the design step
    pub product_size: Option<u32>,
    pub created_at: Timestamp,
}

impl PrimerPair {
    pub fn new(group: PairGroup, rank: u32, forward: Primer, reverse: Primer) -> Self {
        Self {
            pair_id: PairId::now_v7(),
            group,
            rank,
            forward,
            reverse,
            product_size: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_product_size(mut self, product_size: u32) -> Self {
        self.product_size = Some(product_size);
        self
    }

    pub fn primer(&self, side: PrimerSide) -> &Primer {
        match side {
            PrimerSide::Forward => &self.forward,
            PrimerSide::Reverse => &self.reverse,
        }
    }

    /// Short display label, e.g. "WT-3" for the third wild-type pair.
    pub fn label(&self) -> String {
        format!("{}-{}", self.group, self.rank)
    }
}

/// One genomic location matched by a specificity search.
/// Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    pub chromosome: String,
    pub start: u64,
    pub end: u64,
    pub strand: Strand,
    /// Aligned genomic sequence, when the service reports it
    pub match_seq: Option<String>,
    /// Expectation value of the alignment
    pub e_value: Option<f64>,
}

impl Hit {
    pub fn new(chromosome: impl Into<String>, start: u64, end: u64, strand: Strand) -> Self {
        Self {
            chromosome: chromosome.into(),
            start,
            end,
            strand,
            match_seq: None,
            e_value: None,
        }
    }

    pub fn with_alignment(mut self, match_seq: impl Into<String>, e_value: f64) -> Self {
        self.match_seq = Some(match_seq.into());
        self.e_value = Some(e_value);
        self
    }

    /// Location string with trailing strand marker, e.g. "3:100-120+".
    pub fn location_label(&self) -> String {
        format!(
            "{}:{}-{}{}",
            self.chromosome,
            self.start,
            self.end,
            self.strand.marker()
        )
    }
}

/// A predicted PCR product spanning the two primer binding sites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Amplicon {
    pub id: u32,
    pub chromosome: String,
    pub start: u64,
    pub end: u64,
    pub forward_seq: String,
    pub reverse_seq: String,
    pub forward_tm: f64,
    pub reverse_tm: f64,
}

impl Amplicon {
    pub fn length(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }
}

/// A genomic location where one primer is predicted to anneal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindingSite {
    /// Which primer of the pair anneals here
    pub side: PrimerSide,
    pub chromosome: String,
    pub position: u64,
    pub end: u64,
    pub strand: Strand,
    /// Matched genomic sequence at the site
    pub sequence: String,
    pub tm: f64,
}

/// A diagnostic emitted by the amplification tool alongside its result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticMessage {
    pub severity: Severity,
    pub text: String,
}

impl DiagnosticMessage {
    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            text: text.into(),
        }
    }
}

/// Everything the amplification tool reported for one primer pair.
/// Produced once per pair; immutable after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AmplificationResult {
    pub amplicons: Vec<Amplicon>,
    pub binding_sites: Vec<BindingSite>,
    pub messages: Vec<DiagnosticMessage>,
}

impl AmplificationResult {
    pub fn amplicon_count(&self) -> usize {
        self.amplicons.len()
    }

    /// Classify by amplicon count. A single product is clean only while the
    /// total binding-site count stays at or below `BINDING_SITE_WARNING_MAX`.
    pub fn call(&self) -> ProductCall {
        match self.amplicons.len() {
            0 => ProductCall::NoProduct,
            1 if self.binding_sites.len() > BINDING_SITE_WARNING_MAX => {
                ProductCall::ExcessiveBinding
            }
            1 => ProductCall::SingleClean,
            _ => ProductCall::MultipleProducts,
        }
    }

    /// Binding sites of one primer side, in service order.
    pub fn sites_for(&self, side: PrimerSide) -> impl Iterator<Item = &BindingSite> {
        self.binding_sites.iter().filter(move |s| s.side == side)
    }

    /// Display partition for one primer side, truncated to
    /// `BINDING_SITE_DISPLAY_LIMIT` entries.
    pub fn display_partition(&self, side: PrimerSide) -> BindingSitePartition<'_> {
        let all: Vec<&BindingSite> = self.sites_for(side).collect();
        let total = all.len();
        let shown: Vec<&BindingSite> =
            all.into_iter().take(BINDING_SITE_DISPLAY_LIMIT).collect();
        BindingSitePartition { side, shown, total }
    }
}

/// Truncated per-side view of binding sites for result tables.
#[derive(Debug, Clone)]
pub struct BindingSitePartition<'a> {
    pub side: PrimerSide,
    pub shown: Vec<&'a BindingSite>,
    pub total: usize,
}

impl BindingSitePartition<'_> {
    pub fn elided(&self) -> usize {
        self.total - self.shown.len()
    }

    /// Elision note when sites were truncated, e.g.
    /// "(15 of 20 Binding Sites Listed)". None when everything is shown.
    pub fn elision_note(&self) -> Option<String> {
        if self.total > self.shown.len() {
            Some(format!(
                "({} of {} Binding Sites Listed)",
                self.shown.len(),
                self.total
            ))
        } else {
            None
        }
    }
}

/// Which genome the verification calls of a session run against.
/// Bundled with the gene because the two always travel together
/// from the design form into every downstream call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesignTarget {
    pub gene: crate::GeneId,
    pub genome: GenomeId,
}

impl DesignTarget {
    pub fn new(gene: crate::GeneId, genome: GenomeId) -> Self {
        Self { gene, genome }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn site(side: PrimerSide) -> BindingSite {
        BindingSite {
            side,
            chromosome: "2".to_string(),
            position: 5000,
            end: 5020,
            strand: Strand::Forward,
            sequence: "ACGTACGTACGTACGTACGT".to_string(),
            tm: 59.31,
        }
    }

    fn amplicon(id: u32) -> Amplicon {
        Amplicon {
            id,
            chromosome: "2".to_string(),
            start: 5000,
            end: 5480,
            forward_seq: "ACGTACGTACGTACGTACGT".to_string(),
            reverse_seq: "TGCATGCATGCATGCATGCA".to_string(),
            forward_tm: 59.31,
            reverse_tm: 60.02,
        }
    }

    fn result(amplicons: usize, sites: usize) -> AmplificationResult {
        AmplificationResult {
            amplicons: (0..amplicons as u32).map(amplicon).collect(),
            binding_sites: (0..sites)
                .map(|i| {
                    site(if i % 2 == 0 {
                        PrimerSide::Forward
                    } else {
                        PrimerSide::Reverse
                    })
                })
                .collect(),
            messages: Vec::new(),
        }
    }

    #[test]
    fn test_hit_location_label() {
        let hit = Hit::new("3", 100, 120, Strand::Forward);
        assert_eq!(hit.location_label(), "3:100-120+");

        let hit = Hit::new("X", 9000, 9020, Strand::Reverse);
        assert_eq!(hit.location_label(), "X:9000-9020-");
    }

    #[test]
    fn test_call_no_product() {
        assert_eq!(result(0, 0).call(), ProductCall::NoProduct);
    }

    #[test]
    fn test_call_single_clean() {
        assert_eq!(result(1, 2).call(), ProductCall::SingleClean);
    }

    #[test]
    fn test_call_warning_boundary_is_strict() {
        // 25 sites is still clean, 26 and up warns
        assert_eq!(result(1, 25).call(), ProductCall::SingleClean);
        assert_eq!(result(1, 26).call(), ProductCall::ExcessiveBinding);
        assert_eq!(result(1, 30).call(), ProductCall::ExcessiveBinding);
    }

    #[test]
    fn test_call_multiple_products() {
        assert_eq!(result(2, 4).call(), ProductCall::MultipleProducts);
        assert_eq!(result(3, 40).call(), ProductCall::MultipleProducts);
    }

    #[test]
    fn test_display_partition_truncates_to_limit() {
        let result = AmplificationResult {
            amplicons: vec![amplicon(0)],
            binding_sites: (0..20).map(|_| site(PrimerSide::Forward)).collect(),
            messages: Vec::new(),
        };

        let partition = result.display_partition(PrimerSide::Forward);
        assert_eq!(partition.shown.len(), 15);
        assert_eq!(partition.total, 20);
        assert_eq!(partition.elided(), 5);
        assert_eq!(
            partition.elision_note().as_deref(),
            Some("(15 of 20 Binding Sites Listed)")
        );

        // The other side is empty and has no note
        let reverse = result.display_partition(PrimerSide::Reverse);
        assert_eq!(reverse.shown.len(), 0);
        assert_eq!(reverse.elision_note(), None);
    }

    #[test]
    fn test_display_partition_under_limit_has_no_note() {
        let result = AmplificationResult {
            amplicons: vec![amplicon(0)],
            binding_sites: (0..15).map(|_| site(PrimerSide::Reverse)).collect(),
            messages: Vec::new(),
        };

        let partition = result.display_partition(PrimerSide::Reverse);
        assert_eq!(partition.shown.len(), 15);
        assert_eq!(partition.elided(), 0);
        assert_eq!(partition.elision_note(), None);
    }

    #[test]
    fn test_partition_sides_are_independent() {
        let mut sites: Vec<BindingSite> = (0..18).map(|_| site(PrimerSide::Forward)).collect();
        sites.extend((0..3).map(|_| site(PrimerSide::Reverse)));
        let result = AmplificationResult {
            amplicons: vec![amplicon(0)],
            binding_sites: sites,
            messages: Vec::new(),
        };

        let forward = result.display_partition(PrimerSide::Forward);
        let reverse = result.display_partition(PrimerSide::Reverse);
        assert_eq!(forward.shown.len(), 15);
        assert_eq!(forward.total, 18);
        assert_eq!(reverse.shown.len(), 3);
        assert_eq!(reverse.total, 3);
    }

    #[test]
    fn test_pair_label() {
        let pair = PrimerPair::new(
            PairGroup::WildType,
            3,
            Primer::new("ACGTACGTACGTACGTACGT"),
            Primer::new("TGCATGCATGCATGCATGCA"),
        );
        assert_eq!(pair.label(), "WT-3");
    }

    #[test]
    fn test_amplicon_length() {
        assert_eq!(amplicon(0).length(), 480);
    }
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_side() -> impl Strategy<Value = PrimerSide> {
        prop_oneof![Just(PrimerSide::Forward), Just(PrimerSide::Reverse)]
    }

    fn arb_result(max_amplicons: usize, max_sites: usize) -> impl Strategy<Value = AmplificationResult> {
        (
            0..=max_amplicons,
            proptest::collection::vec(arb_side(), 0..=max_sites),
        )
            .prop_map(|(amplicons, sides)| AmplificationResult {
                amplicons: (0..amplicons as u32)
                    .map(|id| Amplicon {
                        id,
                        chromosome: "1".to_string(),
                        start: 0,
                        end: 100,
                        forward_seq: String::new(),
                        reverse_seq: String::new(),
                        forward_tm: 60.0,
                        reverse_tm: 60.0,
                    })
                    .collect(),
                binding_sites: sides
                    .into_iter()
                    .map(|side| BindingSite {
                        side,
                        chromosome: "1".to_string(),
                        position: 0,
                        end: 20,
                        strand: Strand::Forward,
                        sequence: String::new(),
                        tm: 60.0,
                    })
                    .collect(),
                messages: Vec::new(),
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_partition_never_exceeds_limit(result in arb_result(3, 60), side in arb_side()) {
            let partition = result.display_partition(side);
            prop_assert!(partition.shown.len() <= BINDING_SITE_DISPLAY_LIMIT);
            prop_assert_eq!(partition.shown.len() + partition.elided(), partition.total);
        }

        #[test]
        fn prop_partition_note_iff_elided(result in arb_result(3, 60), side in arb_side()) {
            let partition = result.display_partition(side);
            prop_assert_eq!(partition.elision_note().is_some(), partition.elided() > 0);
        }

        #[test]
        fn prop_call_matches_counts(result in arb_result(4, 40)) {
            let call = result.call();
            match (result.amplicons.len(), result.binding_sites.len()) {
                (0, _) => prop_assert_eq!(call, ProductCall::NoProduct),
                (1, sites) if sites > BINDING_SITE_WARNING_MAX => {
                    prop_assert_eq!(call, ProductCall::ExcessiveBinding)
                }
                (1, _) => prop_assert_eq!(call, ProductCall::SingleClean),
                _ => prop_assert_eq!(call, ProductCall::MultipleProducts),
            }
        }
    }
}
