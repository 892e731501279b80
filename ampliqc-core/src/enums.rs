//! Enum types for AMPLIQC entities

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// DESIGN-BATCH ENUMS
// ============================================================================

/// Which allele a candidate pair was designed against.
/// The design step proposes pairs for both the unedited and the edited
/// sequence; rank orders pairs within one group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PairGroup {
    /// Designed against the unedited (wild-type) allele
    WildType,
    /// Designed against the edited allele
    Edited,
}

impl PairGroup {
    /// Convert to the short label used in row identifiers and stored records.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            PairGroup::WildType => "WT",
            PairGroup::Edited => "EM",
        }
    }

    /// Parse from the stored label.
    pub fn from_db_str(s: &str) -> Result<Self, PairGroupParseError> {
        match s.to_uppercase().as_str() {
            "WT" | "WILDTYPE" | "WILD_TYPE" | "WILD-TYPE" => Ok(PairGroup::WildType),
            "EM" | "EDITED" => Ok(PairGroup::Edited),
            _ => Err(PairGroupParseError(s.to_string())),
        }
    }
}

impl fmt::Display for PairGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for PairGroup {
    type Err = PairGroupParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

/// Error when parsing an invalid pair group label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairGroupParseError(pub String);

impl fmt::Display for PairGroupParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid pair group: {}", self.0)
    }
}

impl std::error::Error for PairGroupParseError {}

/// Which primer of a pair is being referred to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimerSide {
    Forward,
    Reverse,
}

impl PrimerSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrimerSide::Forward => "forward",
            PrimerSide::Reverse => "reverse",
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            PrimerSide::Forward => PrimerSide::Reverse,
            PrimerSide::Reverse => PrimerSide::Forward,
        }
    }
}

impl fmt::Display for PrimerSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One of the three verification slots of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CheckSlot {
    /// Specificity check of the forward primer
    Forward,
    /// Specificity check of the reverse primer
    Reverse,
    /// In-silico amplification check of the pair
    Product,
}

impl CheckSlot {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckSlot::Forward => "forward",
            CheckSlot::Reverse => "reverse",
            CheckSlot::Product => "product",
        }
    }
}

impl fmt::Display for CheckSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// GENOMIC ENUMS
// ============================================================================

/// Genomic strand orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strand {
    Forward,
    Reverse,
}

impl Strand {
    /// Single-character marker appended to location strings.
    pub fn marker(&self) -> &'static str {
        match self {
            Strand::Forward => "+",
            Strand::Reverse => "-",
        }
    }

    /// Parse the strand words used by the search and PCR services
    /// ("plus"/"minus" and "forward"/"reverse" respectively).
    pub fn from_service_str(s: &str) -> Result<Self, StrandParseError> {
        match s.to_lowercase().as_str() {
            "plus" | "forward" | "+" => Ok(Strand::Forward),
            "minus" | "reverse" | "-" => Ok(Strand::Reverse),
            _ => Err(StrandParseError(s.to_string())),
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.marker())
    }
}

impl FromStr for Strand {
    type Err = StrandParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_service_str(s)
    }
}

/// Error when parsing an invalid strand string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrandParseError(pub String);

impl fmt::Display for StrandParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid strand: {}", self.0)
    }
}

impl std::error::Error for StrandParseError {}

// ============================================================================
// QA ENUMS
// ============================================================================

/// Severity of a diagnostic message returned by the amplification tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classification of an amplification result by predicted product count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductCall {
    /// No predicted product (success, the pair simply does not amplify)
    NoProduct,
    /// Exactly one product with an acceptable binding-site count
    SingleClean,
    /// Exactly one product but excessive off-target binding
    ExcessiveBinding,
    /// Two or more products, amplification is ambiguous
    MultipleProducts,
}

impl ProductCall {
    /// Severity tier attached to the call, if any.
    pub fn severity(&self) -> Option<Severity> {
        match self {
            ProductCall::NoProduct | ProductCall::SingleClean => None,
            ProductCall::ExcessiveBinding => Some(Severity::Warning),
            ProductCall::MultipleProducts => Some(Severity::Error),
        }
    }

    /// Human-readable description of the call.
    pub fn label(&self) -> &'static str {
        match self {
            ProductCall::NoProduct => "no predicted product",
            ProductCall::SingleClean => "clean, single product",
            ProductCall::ExcessiveBinding => "single product but excessive off-target binding",
            ProductCall::MultipleProducts => "ambiguous, multiple products",
        }
    }
}

impl fmt::Display for ProductCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// =============================================================================
// TESTS
// =============================================================================
