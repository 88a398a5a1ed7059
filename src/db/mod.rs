//! Record store
//!
//! Persistence for companies, research jobs, dossiers, source-reliability
//! rows and the append-only evolution event log.
//!
//! The [`traits::RecordStore`] trait abstracts over backends; the shipped
//! implementation is [`store::LibsqlStore`] (in-memory SQLite, local file,
//! or remote Turso).

/// Libsql-backed record store.
pub mod store;
/// Record store trait and provider selection.
pub mod traits;

pub use store::LibsqlStore;
pub use traits::{RecordStore, StoreProvider};
