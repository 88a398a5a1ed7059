//! # Dossier Server
//!
//! A business intelligence research orchestration server. Companies are
//! registered, research jobs are queued against them, and a bounded worker
//! pool drives each job through a fixed four-stage pipeline (website, social,
//! news, business analysis). Stage outputs are fused into a single company
//! dossier with completeness, confidence and gap scoring, while an evolution
//! engine tracks per-source reliability and derives system-level insights
//! from the append-only event log.
//!
//! ## Overview
//!
//! Dossier can be used in two ways:
//!
//! 1. **As a standalone server** - Run the `dossier-server` binary
//! 2. **As a library** - Drive the pipeline from your own Rust project
//!
//! ### Library Example
//!
//! ```rust,ignore
//! use dossier::{
//!     collaborators::CollaboratorSet,
//!     db::StoreProvider,
//!     evolution::EvolutionEngine,
//!     pipeline::{ResearchRunner, ResearchSequencer},
//! };
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> dossier::Result<()> {
//!     let store = StoreProvider::Memory.create_store().await?;
//!     let evolution = Arc::new(EvolutionEngine::new(store.clone()));
//!     let sequencer = Arc::new(ResearchSequencer::new(
//!         store.clone(),
//!         CollaboratorSet::builtin(Duration::from_secs(15))?,
//!         evolution,
//!         vec!["linkedin".into(), "x".into()],
//!     ));
//!     let _runner = ResearchRunner::new(sequencer, store, 4);
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`api`] - REST API handlers and routes
//! - [`collaborators`] - Per-stage research collaborator contracts and the
//!   built-in implementations
//! - [`db`] - Record store abstraction over libsql
//! - [`evolution`] - Source-reliability tracking and insights
//! - [`fusion`] - Dossier scoring (completeness, confidence, gaps)
//! - [`pipeline`] - Stage sequencing, cancellation and the worker pool
//! - [`types`] - Common types and error handling

/// HTTP API handlers and routes.
pub mod api;
/// Research collaborator contracts and built-in implementations.
pub mod collaborators;
/// Record store abstraction (in-memory, local SQLite, remote Turso).
pub mod db;
/// Adaptive source-reliability engine.
pub mod evolution;
/// Dossier fusion and scoring.
pub mod fusion;
/// Research orchestration pipeline.
pub mod pipeline;
/// Core types (records, stage outputs, errors).
pub mod types;
/// Configuration utilities.
pub mod utils;

// Re-export commonly used types
pub use collaborators::CollaboratorSet;
pub use db::{RecordStore, StoreProvider};
pub use evolution::{EvolutionEngine, EvolutionInsights, QualityTrend};
pub use pipeline::{CancelToken, ResearchRunner, ResearchSequencer};
pub use types::{AppError, Result};
pub use utils::Config;

use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Environment-driven configuration
    pub config: Arc<Config>,
    /// Record store backing companies, jobs, dossiers and events
    pub store: Arc<dyn RecordStore>,
    /// Source-reliability engine
    pub evolution: Arc<EvolutionEngine>,
    /// Bounded research worker pool
    pub runner: Arc<ResearchRunner>,
}
