//! Record store abstraction
//!
//! The `RecordStore` trait defines every persistence operation the pipeline
//! and the evolution engine need. Implementations can use different backends;
//! the default is libsql (in-memory SQLite, local file, or remote Turso).

use crate::types::{
    Company, CompanyDossier, CompanyStatus, EvolutionEvent, EvolutionEventType, ResearchJob,
    Result, SourceReliability,
};
use async_trait::async_trait;
use uuid::Uuid;

/// Store backend configuration.
#[derive(Debug, Clone, Default)]
pub enum StoreProvider {
    /// In-memory SQLite database (ephemeral, lost on restart).
    #[default]
    Memory,
    /// File-based SQLite database.
    Local {
        /// Path to the SQLite database file.
        path: String,
    },
    /// Remote Turso database.
    Remote {
        /// The Turso database URL (e.g., `libsql://your-db.turso.io`).
        url: String,
        /// Authentication token for the database.
        auth_token: String,
    },
}

impl StoreProvider {
    /// Create a record store from this provider configuration.
    pub async fn create_store(&self) -> Result<std::sync::Arc<dyn RecordStore>> {
        let store = match self {
            StoreProvider::Memory => super::store::LibsqlStore::new_memory().await?,
            StoreProvider::Local { path } => super::store::LibsqlStore::new_local(path).await?,
            StoreProvider::Remote { url, auth_token } => {
                super::store::LibsqlStore::new_remote(url.clone(), auth_token.clone()).await?
            }
        };
        Ok(std::sync::Arc::new(store))
    }

    /// Read the provider from environment variables, defaulting to memory.
    pub fn from_env() -> Self {
        if let (Ok(url), Ok(token)) = (
            std::env::var("TURSO_DATABASE_URL"),
            std::env::var("TURSO_AUTH_TOKEN"),
        ) {
            if !url.is_empty() && !token.is_empty() {
                return StoreProvider::Remote {
                    url,
                    auth_token: token,
                };
            }
        }

        if let Ok(path) = std::env::var("DATABASE_PATH") {
            if !path.is_empty() && path != ":memory:" {
                return StoreProvider::Local { path };
            }
        }

        StoreProvider::Memory
    }
}

/// All persistence operations used by the pipeline, the evolution engine and
/// the API layer.
#[async_trait]
pub trait RecordStore: Send + Sync {
    // ============== Company Operations ==============

    async fn create_company(&self, company: &Company) -> Result<()>;

    async fn get_company(&self, id: Uuid) -> Result<Option<Company>>;

    async fn list_companies(&self) -> Result<Vec<Company>>;

    /// Update the mirrored coarse status of a company.
    async fn update_company_status(&self, id: Uuid, status: CompanyStatus) -> Result<()>;

    // ============== Job Operations ==============

    async fn create_job(&self, job: &ResearchJob) -> Result<()>;

    async fn get_job(&self, id: Uuid) -> Result<Option<ResearchJob>>;

    /// Persist the full mutable state of a job (status, progress, stages,
    /// timestamps, error message).
    async fn update_job(&self, job: &ResearchJob) -> Result<()>;

    // ============== Dossier Operations ==============

    /// Idempotent upsert keyed by company id; repeated completions for the
    /// same company are last-write-wins, never duplicated.
    async fn upsert_dossier(&self, dossier: &CompanyDossier) -> Result<()>;

    async fn get_dossier(&self, company_id: Uuid) -> Result<Option<CompanyDossier>>;

    // ============== Reliability Operations ==============

    async fn get_reliability(&self, source_name: &str) -> Result<Option<SourceReliability>>;

    async fn upsert_reliability(&self, row: &SourceReliability) -> Result<()>;

    async fn list_reliability(&self) -> Result<Vec<SourceReliability>>;

    // ============== Event Operations ==============

    /// Append-only; events are never mutated or deleted.
    async fn append_event(&self, event: &EvolutionEvent) -> Result<()>;

    /// Most recent events first.
    async fn recent_events(&self, limit: usize) -> Result<Vec<EvolutionEvent>>;

    /// Most recent events of one type, most recent first.
    async fn recent_events_of_type(
        &self,
        event_type: EvolutionEventType,
        limit: usize,
    ) -> Result<Vec<EvolutionEvent>>;

    async fn event_count(&self) -> Result<u64>;
}
