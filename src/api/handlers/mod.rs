//! API request handlers.
//!
//! This module contains all HTTP request handlers organized by resource.

/// Company registration and lookup handlers.
pub mod companies;
/// Evolution engine query handlers (performance, insights, events).
pub mod evolution;
/// Research job submission, status, cancellation and dossier handlers.
pub mod research;
