//! Research Orchestration Pipeline
//!
//! Drives a [`crate::types::ResearchJob`] from `Queued` to a terminal status
//! through a fixed sequence of stages, each mapped to a fixed share of job
//! progress. Stages invoke collaborators, record outcomes with the evolution
//! engine and accumulate typed outputs into the company dossier, which is
//! fused and upserted once after the final stage.
//!
//! # Architecture
//!
//! - [`cancel::CancelToken`] - cooperative cancellation threaded through
//!   every collaborator call
//! - [`sequencer::ResearchSequencer`] - per-job stage execution
//! - [`runner::ResearchRunner`] - bounded, supervised worker pool the
//!   submission surface hands jobs to

/// Cooperative cancellation token.
pub mod cancel;
/// Bounded worker pool with a supervised completion channel.
pub mod runner;
/// Stage sequencing for a single research job.
pub mod sequencer;

pub use cancel::CancelToken;
pub use runner::{JobOutcome, ResearchRunner};
pub use sequencer::ResearchSequencer;
