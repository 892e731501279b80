//! Serde adapters for the backend wire formats.
//!
//! The backend keeps the quirks of the tools it fronts: the specificity
//! search returns hits as an object keyed by stringified index, and the
//! in-silico PCR tool names everything left/right relative to the gene
//! direction rather than forward/reverse. Normalization to core entities
//! happens here so nothing downstream ever sees a wire shape.

use ampliqc_core::{
    Amplicon, AmplificationResult, AmpliqcError, AmpliqcResult, BindingSite, DiagnosticMessage,
    Hit, PairGroup, Primer, PrimerPair, PrimerSide, ServiceError, Severity, Strand,
};
use serde::Deserialize;
use std::collections::HashMap;

pub(crate) fn invalid_response(endpoint: &str, reason: impl Into<String>) -> AmpliqcError {
    ServiceError::InvalidResponse {
        endpoint: endpoint.to_string(),
        reason: reason.into(),
    }
    .into()
}

// ============================================================================
// DESIGN STEP
// ============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct WireCandidate {
    pub group: String,
    pub rank: u32,
    pub forward: WirePrimer,
    pub reverse: WirePrimer,
    #[serde(default)]
    pub product_size: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WirePrimer {
    pub seq: String,
    #[serde(default)]
    pub tm: Option<f64>,
    #[serde(default)]
    pub gc: Option<f64>,
}

impl WirePrimer {
    fn into_primer(self) -> Primer {
        let mut primer = Primer::new(self.seq);
        primer.tm = self.tm;
        primer.gc_percent = self.gc;
        primer
    }
}

impl WireCandidate {
    fn into_pair(self, endpoint: &str) -> AmpliqcResult<PrimerPair> {
        let group = PairGroup::from_db_str(&self.group)
            .map_err(|e| invalid_response(endpoint, e.to_string()))?;
        let mut pair = PrimerPair::new(
            group,
            self.rank,
            self.forward.into_primer(),
            self.reverse.into_primer(),
        );
        pair.product_size = self.product_size;
        Ok(pair)
    }
}

pub(crate) fn pairs_from_candidates(
    endpoint: &str,
    candidates: Vec<WireCandidate>,
) -> AmpliqcResult<Vec<PrimerPair>> {
    candidates
        .into_iter()
        .map(|candidate| candidate.into_pair(endpoint))
        .collect()
}

// ============================================================================
// SPECIFICITY SEARCH
// ============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct WireHit {
    pub chromosome: String,
    pub start: u64,
    pub end: u64,
    pub strand: String,
    #[serde(default)]
    pub matchseq: Option<String>,
    #[serde(default)]
    pub evalue: Option<f64>,
}

impl WireHit {
    fn into_hit(self, endpoint: &str) -> AmpliqcResult<Hit> {
        let strand = Strand::from_service_str(&self.strand)
            .map_err(|e| invalid_response(endpoint, e.to_string()))?;
        let mut hit = Hit::new(self.chromosome, self.start, self.end, strand);
        hit.match_seq = self.matchseq;
        hit.e_value = self.evalue;
        Ok(hit)
    }
}

/// The search service keys hits by stringified index. Keys are ordered
/// numerically, not lexically, so hit 10 sorts after hit 2.
pub(crate) fn hits_from_map(
    endpoint: &str,
    map: HashMap<String, WireHit>,
) -> AmpliqcResult<Vec<Hit>> {
    let mut indexed: Vec<(usize, WireHit)> = Vec::with_capacity(map.len());
    for (key, hit) in map {
        let index: usize = key
            .parse()
            .map_err(|_| invalid_response(endpoint, format!("non-numeric hit index {:?}", key)))?;
        indexed.push((index, hit));
    }
    indexed.sort_by_key(|(index, _)| *index);
    indexed
        .into_iter()
        .map(|(_, wire)| wire.into_hit(endpoint))
        .collect()
}

// ============================================================================
// IN-SILICO PCR
// ============================================================================

const LEFT_PRIMER: &str = "leftPrimer";
const RIGHT_PRIMER: &str = "rightPrimer";

#[derive(Debug, Deserialize)]
pub(crate) struct WirePcrReport {
    #[serde(default)]
    pub errors: Vec<WireDiagnostic>,
    #[serde(default)]
    pub data: Option<WirePcrData>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireDiagnostic {
    pub title: String,
    /// "warning" or "error"; absent means error
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct WirePcrData {
    #[serde(default)]
    pub amplicons: Vec<WireAmplicon>,
    /// The tool calls binding sites "primers"
    #[serde(rename = "primers", default)]
    pub binding_sites: Vec<WireBindingSite>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireAmplicon {
    #[serde(rename = "Id")]
    pub id: u32,
    #[serde(rename = "Chrom")]
    pub chrom: String,
    #[serde(rename = "ForPos")]
    pub for_pos: u64,
    #[serde(rename = "RevEnd")]
    pub rev_end: u64,
    /// Which pair primer the tool's "For" side is; "rightPrimer" here
    /// means the assignments below are swapped
    #[serde(rename = "ForName")]
    pub for_name: String,
    #[serde(rename = "ForSeq")]
    pub for_seq: String,
    #[serde(rename = "ForTm")]
    pub for_tm: f64,
    #[serde(rename = "RevSeq")]
    pub rev_seq: String,
    #[serde(rename = "RevTm")]
    pub rev_tm: f64,
}

impl WireAmplicon {
    fn into_amplicon(self) -> Amplicon {
        let swapped = self.for_name != LEFT_PRIMER;
        if swapped && self.for_name != RIGHT_PRIMER {
            tracing::warn!(
                name = %self.for_name,
                "Unrecognized amplicon primer name, assuming swapped orientation"
            );
        }
        let (forward_seq, reverse_seq, forward_tm, reverse_tm) = if swapped {
            (self.rev_seq, self.for_seq, self.rev_tm, self.for_tm)
        } else {
            (self.for_seq, self.rev_seq, self.for_tm, self.rev_tm)
        };
        Amplicon {
            id: self.id,
            chromosome: self.chrom,
            start: self.for_pos,
            end: self.rev_end,
            forward_seq,
            reverse_seq,
            forward_tm,
            reverse_tm,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireBindingSite {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Chrom")]
    pub chrom: String,
    #[serde(rename = "Pos")]
    pub pos: u64,
    #[serde(rename = "End")]
    pub end: u64,
    #[serde(rename = "Ori")]
    pub ori: String,
    /// Matched genomic sequence at the site
    #[serde(rename = "Genome")]
    pub genome_seq: String,
    #[serde(rename = "Tm")]
    pub tm: f64,
}

impl WireBindingSite {
    /// None when the site names a primer we do not know; the tool can emit
    /// internal probe entries that belong to neither pair primer.
    fn into_site(self, endpoint: &str) -> AmpliqcResult<Option<BindingSite>> {
        let side = match self.name.as_str() {
            LEFT_PRIMER => PrimerSide::Forward,
            RIGHT_PRIMER => PrimerSide::Reverse,
            other => {
                tracing::warn!(name = %other, "Skipping binding site with unrecognized primer name");
                return Ok(None);
            }
        };
        let strand = Strand::from_service_str(&self.ori)
            .map_err(|e| invalid_response(endpoint, e.to_string()))?;
        Ok(Some(BindingSite {
            side,
            chromosome: self.chrom,
            position: self.pos,
            end: self.end,
            strand,
            sequence: self.genome_seq,
            tm: self.tm,
        }))
    }
}

impl WirePcrReport {
    pub(crate) fn into_result(self, endpoint: &str) -> AmpliqcResult<AmplificationResult> {
        let messages = self
            .errors
            .into_iter()
            .map(|diagnostic| DiagnosticMessage {
                severity: match diagnostic.kind.as_deref() {
                    Some("warning") => Severity::Warning,
                    _ => Severity::Error,
                },
                text: diagnostic.title,
            })
            .collect();

        let data = self.data.unwrap_or_default();
        let amplicons = data
            .amplicons
            .into_iter()
            .map(WireAmplicon::into_amplicon)
            .collect();

        let mut binding_sites = Vec::new();
        for site in data.binding_sites {
            if let Some(site) = site.into_site(endpoint)? {
                binding_sites.push(site);
            }
        }

        Ok(AmplificationResult {
            amplicons,
            binding_sites,
            messages,
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const ENDPOINT: &str = "test";

    #[test]
    fn test_hits_ordered_by_numeric_key() {
        let json = r#"{
            "10": {"chromosome": "K", "start": 1, "end": 21, "strand": "plus"},
            "0":  {"chromosome": "A", "start": 1, "end": 21, "strand": "plus"},
            "2":  {"chromosome": "C", "start": 1, "end": 21, "strand": "minus"},
            "1":  {"chromosome": "B", "start": 1, "end": 21, "strand": "plus"}
        }"#;
        let map: HashMap<String, WireHit> = serde_json::from_str(json).unwrap();
        let hits = hits_from_map(ENDPOINT, map).unwrap();

        let order: Vec<&str> = hits.iter().map(|h| h.chromosome.as_str()).collect();
        assert_eq!(order, vec!["A", "B", "C", "K"]);
        assert_eq!(hits[2].strand, Strand::Reverse);
    }

    #[test]
    fn test_hit_optional_fields() {
        let json = r#"{
            "0": {"chromosome": "3", "start": 100, "end": 120, "strand": "plus",
                  "matchseq": "ACGTACGTACGTACGTACGT", "evalue": 0.0004}
        }"#;
        let map: HashMap<String, WireHit> = serde_json::from_str(json).unwrap();
        let hits = hits_from_map(ENDPOINT, map).unwrap();

        assert_eq!(hits[0].location_label(), "3:100-120+");
        assert_eq!(hits[0].match_seq.as_deref(), Some("ACGTACGTACGTACGTACGT"));
        assert_eq!(hits[0].e_value, Some(0.0004));
    }

    #[test]
    fn test_non_numeric_hit_index_is_invalid() {
        let json = r#"{"first": {"chromosome": "3", "start": 1, "end": 21, "strand": "plus"}}"#;
        let map: HashMap<String, WireHit> = serde_json::from_str(json).unwrap();
        assert!(matches!(
            hits_from_map(ENDPOINT, map),
            Err(AmpliqcError::Service(ServiceError::InvalidResponse { .. }))
        ));
    }

    #[test]
    fn test_unknown_strand_is_invalid() {
        let json = r#"{"0": {"chromosome": "3", "start": 1, "end": 21, "strand": "bottom"}}"#;
        let map: HashMap<String, WireHit> = serde_json::from_str(json).unwrap();
        assert!(hits_from_map(ENDPOINT, map).is_err());
    }

    #[test]
    fn test_pcr_report_normalization() {
        let json = r#"{
            "errors": [
                {"title": "High self-dimer potential", "type": "warning"},
                {"title": "Primer too short"}
            ],
            "data": {
                "amplicons": [{
                    "Id": 0, "Seq": "ACGT", "Chrom": "2", "ForPos": 5000, "RevEnd": 5480,
                    "ForName": "leftPrimer", "ForSeq": "ACGTACGTACGTACGTACGT", "ForTm": 59.31,
                    "RevName": "rightPrimer", "RevSeq": "TGCATGCATGCATGCATGCA", "RevTm": 60.02
                }],
                "primers": [
                    {"Name": "leftPrimer", "Chrom": "2", "Pos": 5000, "End": 5020,
                     "Ori": "forward", "Seq": "ACGT", "Genome": "ACGTACGTACGTACGTACGT", "Tm": 59.31},
                    {"Name": "rightPrimer", "Chrom": "2", "Pos": 5460, "End": 5480,
                     "Ori": "reverse", "Seq": "TGCA", "Genome": "TGCATGCATGCATGCATGCA", "Tm": 60.02}
                ]
            }
        }"#;
        let report: WirePcrReport = serde_json::from_str(json).unwrap();
        let result = report.into_result(ENDPOINT).unwrap();

        assert_eq!(result.amplicon_count(), 1);
        assert_eq!(result.amplicons[0].length(), 480);
        assert_eq!(result.amplicons[0].forward_tm, 59.31);
        assert_eq!(result.amplicons[0].reverse_tm, 60.02);

        assert_eq!(result.binding_sites.len(), 2);
        assert_eq!(result.binding_sites[0].side, PrimerSide::Forward);
        assert_eq!(result.binding_sites[1].side, PrimerSide::Reverse);
        assert_eq!(result.binding_sites[1].strand, Strand::Reverse);

        assert_eq!(result.messages.len(), 2);
        assert_eq!(result.messages[0].severity, Severity::Warning);
        // Missing type means error
        assert_eq!(result.messages[1].severity, Severity::Error);
    }

    #[test]
    fn test_pcr_report_swapped_orientation() {
        // The tool named the gene-downstream primer "For"; forward/reverse
        // assignments must swap.
        let json = r#"{
            "errors": [],
            "data": {
                "amplicons": [{
                    "Id": 3, "Chrom": "7", "ForPos": 100, "RevEnd": 400,
                    "ForName": "rightPrimer", "ForSeq": "TGCATGCATGCATGCATGCA", "ForTm": 60.02,
                    "RevSeq": "ACGTACGTACGTACGTACGT", "RevTm": 59.31
                }],
                "primers": []
            }
        }"#;
        let report: WirePcrReport = serde_json::from_str(json).unwrap();
        let result = report.into_result(ENDPOINT).unwrap();

        assert_eq!(result.amplicons[0].forward_seq, "ACGTACGTACGTACGTACGT");
        assert_eq!(result.amplicons[0].forward_tm, 59.31);
        assert_eq!(result.amplicons[0].reverse_seq, "TGCATGCATGCATGCATGCA");
        assert_eq!(result.amplicons[0].reverse_tm, 60.02);
    }

    #[test]
    fn test_pcr_report_skips_unknown_site_names() {
        let json = r#"{
            "errors": [],
            "data": {
                "amplicons": [],
                "primers": [
                    {"Name": "probe", "Chrom": "2", "Pos": 1, "End": 21,
                     "Ori": "forward", "Genome": "ACGT", "Tm": 50.0},
                    {"Name": "leftPrimer", "Chrom": "2", "Pos": 1, "End": 21,
                     "Ori": "forward", "Genome": "ACGT", "Tm": 50.0}
                ]
            }
        }"#;
        let report: WirePcrReport = serde_json::from_str(json).unwrap();
        let result = report.into_result(ENDPOINT).unwrap();

        assert_eq!(result.binding_sites.len(), 1);
        assert_eq!(result.binding_sites[0].side, PrimerSide::Forward);
    }

    #[test]
    fn test_pcr_report_without_data_is_empty_result() {
        let json = r#"{"errors": [{"title": "No amplification predicted", "type": "warning"}]}"#;
        let report: WirePcrReport = serde_json::from_str(json).unwrap();
        let result = report.into_result(ENDPOINT).unwrap();

        assert_eq!(result.amplicon_count(), 0);
        assert!(result.binding_sites.is_empty());
        assert_eq!(result.messages.len(), 1);
    }

    #[test]
    fn test_candidates_into_pairs() {
        let json = r#"[
            {"group": "WT", "rank": 1,
             "forward": {"seq": "ACGTACGTACGTACGTACGT", "tm": 59.3, "gc": 50.0},
             "reverse": {"seq": "TGCATGCATGCATGCATGCA", "tm": 60.0, "gc": 45.0},
             "product_size": 480},
            {"group": "EM", "rank": 1,
             "forward": {"seq": "AAAATTTTCCCCGGGGACGT"},
             "reverse": {"seq": "TTTTAAAAGGGGCCCCTGCA"}}
        ]"#;
        let candidates: Vec<WireCandidate> = serde_json::from_str(json).unwrap();
        let pairs = pairs_from_candidates(ENDPOINT, candidates).unwrap();

        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].group, PairGroup::WildType);
        assert_eq!(pairs[0].label(), "WT-1");
        assert_eq!(pairs[0].forward.tm, Some(59.3));
        assert_eq!(pairs[0].product_size, Some(480));
        assert_eq!(pairs[1].group, PairGroup::Edited);
        assert_eq!(pairs[1].forward.tm, None);
        assert_eq!(pairs[1].product_size, None);
    }

    #[test]
    fn test_unknown_group_is_invalid() {
        let json = r#"[{"group": "XX", "rank": 1,
            "forward": {"seq": "ACGT"}, "reverse": {"seq": "TGCA"}}]"#;
        let candidates: Vec<WireCandidate> = serde_json::from_str(json).unwrap();
        assert!(pairs_from_candidates(ENDPOINT, candidates).is_err());
    }
}
