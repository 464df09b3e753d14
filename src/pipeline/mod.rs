//! Batch synthesis pipeline.
//!
//! Records are partitioned into fixed-size batches. Each `(voice profile,
//! batch)` job synthesizes its items through the shared cache and writes one
//! combined track. Jobs run concurrently; item failures are reported and
//! tallied without stopping the run.

pub mod batch;
pub mod driver;
pub mod error;

pub use batch::{
    Batch, BatchAssembler, BatchOutcome, EmptyBatchPolicy, batch_index_for, partition,
};
pub use driver::{Pipeline, RunSummary};
pub use error::{CollectingReporter, ErrorReporter, LogReporter};
