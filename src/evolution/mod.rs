//! Adaptive Source-Reliability Engine
//!
//! Observes collaborator invocation outcomes, maintains a per-source
//! reliability profile with asymptotically smoothed success rates, and
//! derives system-level insights (top and problem sources, processing time,
//! completeness trend) from the append-only event log.
//!
//! Logging is fire-and-forget from the pipeline's point of view: a failed
//! write here degrades adaptation quality but never a research job.

/// Reliability bookkeeping and insight derivation.
pub mod engine;

pub use engine::{EvolutionEngine, EvolutionInsights, QualityTrend};
