//! Verification pipeline for candidate primer pairs.
//!
//! A design run produces a batch of candidate pairs; each pair then gets
//! three concurrent checks whose results stream back in arbitrary order:
//!
//! ```text
//! Pipeline::start_from_design
//!   ├─ design request (retried on gateway timeouts)
//!   └─ PipelineSession
//!        ├─ RowCoordinator per pair
//!        │    ├─ forward specificity ──┐
//!        │    ├─ reverse specificity ──┼─ merge ─> RowResolved
//!        │    └─ amplification ────────┘
//!        └─ BatchResolved once every row is terminal
//! ```
//!
//! Starting a new session supersedes the previous one; late results from a
//! superseded session fail the token check and are discarded. Progress
//! surfaces on a bounded event stream, and the pipeline never waits for its
//! consumers.

mod amplification;
mod counter;
mod row;
mod session;
mod specificity;

pub use counter::SignalCounter;
pub use row::{MergeOutcome, RowCoordinator};
pub use session::{NoteEdit, Pipeline, PipelineSession};
