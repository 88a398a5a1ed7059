//! HTTP API surface.
//!
//! Thin axum handlers over the shared [`crate::AppState`]; all orchestration
//! lives in the pipeline and evolution modules. Route construction is in
//! [`routes`], handlers are grouped by resource under [`handlers`].

/// Request handlers grouped by resource.
pub mod handlers;
/// Router construction and the OpenAPI document.
pub mod routes;

pub use routes::create_router;
