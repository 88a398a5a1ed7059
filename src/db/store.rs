use crate::types::{
    AppError, Company, CompanyDossier, CompanyStatus, EvolutionEvent, EvolutionEventType,
    JobStatus, ResearchJob, Result, SourceReliability,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Builder, Connection, Database};
use uuid::Uuid;

use super::traits::RecordStore;

/// Libsql-backed record store (in-memory SQLite, local file, or remote
/// Turso).
///
/// A single connection is opened at construction and cloned per operation.
/// Every connection to a `:memory:` database is its own private database,
/// so reconnecting per operation would lose the schema.
pub struct LibsqlStore {
    _db: Database,
    conn: Connection,
}

impl LibsqlStore {
    /// In-memory database, fresh schema. Used by tests and as the default
    /// development backend.
    pub async fn new_memory() -> Result<Self> {
        Self::new_local(":memory:").await
    }

    /// File-backed local SQLite database.
    pub async fn new_local(path: &str) -> Result<Self> {
        let db = Builder::new_local(path)
            .build()
            .await
            .map_err(|e| AppError::Database(format!("Failed to open local database: {}", e)))?;

        Self::with_database(db).await
    }

    /// Remote Turso database.
    pub async fn new_remote(url: String, auth_token: String) -> Result<Self> {
        let db = Builder::new_remote(url, auth_token)
            .build()
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Turso: {}", e)))?;

        Self::with_database(db).await
    }

    async fn with_database(db: Database) -> Result<Self> {
        let conn = db
            .connect()
            .map_err(|e| AppError::Database(format!("Failed to get connection: {}", e)))?;

        let store = Self { _db: db, conn };
        store.initialize_schema().await?;

        Ok(store)
    }

    pub fn connection(&self) -> Result<Connection> {
        Ok(self.conn.clone())
    }

    async fn initialize_schema(&self) -> Result<()> {
        let conn = self.connection()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS companies (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                website TEXT,
                phone TEXT,
                address TEXT,
                status TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )",
            (),
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to create companies table: {}", e)))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS research_jobs (
                id TEXT PRIMARY KEY,
                company_id TEXT NOT NULL,
                status TEXT NOT NULL,
                priority INTEGER NOT NULL,
                progress INTEGER NOT NULL,
                stages TEXT NOT NULL,
                started_at INTEGER,
                completed_at INTEGER,
                error_message TEXT,
                created_at INTEGER NOT NULL,
                FOREIGN KEY (company_id) REFERENCES companies(id)
            )",
            (),
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to create research_jobs table: {}", e)))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS dossiers (
                company_id TEXT PRIMARY KEY,
                payload TEXT NOT NULL,
                researched_at INTEGER NOT NULL,
                FOREIGN KEY (company_id) REFERENCES companies(id)
            )",
            (),
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to create dossiers table: {}", e)))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS source_reliability (
                source_name TEXT PRIMARY KEY,
                enabled INTEGER NOT NULL,
                priority INTEGER NOT NULL,
                success_rate REAL NOT NULL,
                avg_duration_ms INTEGER NOT NULL,
                avg_quality_score REAL NOT NULL,
                requests_per_minute INTEGER NOT NULL,
                delay_between_ms INTEGER NOT NULL,
                daily_limit INTEGER NOT NULL,
                current_daily_usage INTEGER NOT NULL,
                last_used INTEGER
            )",
            (),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to create source_reliability table: {}", e))
        })?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS evolution_events (
                id TEXT PRIMARY KEY,
                event_type TEXT NOT NULL,
                source_name TEXT,
                company_id TEXT,
                duration_ms INTEGER,
                quality_score REAL,
                completeness_score REAL,
                error_code TEXT,
                error_message TEXT,
                retry_count INTEGER,
                fallback_used INTEGER,
                created_at INTEGER NOT NULL
            )",
            (),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to create evolution_events table: {}", e))
        })?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_evolution_events_type_time
             ON evolution_events(event_type, created_at DESC)",
            (),
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to create events index: {}", e)))?;

        Ok(())
    }

    fn decode_company(row: &libsql::Row) -> Result<Company> {
        let id: String = row.get(0).map_err(|e| AppError::Database(e.to_string()))?;
        let status: String = row.get(5).map_err(|e| AppError::Database(e.to_string()))?;

        Ok(Company {
            id: Uuid::parse_str(&id)
                .map_err(|e| AppError::Database(format!("Invalid company id: {}", e)))?,
            name: row.get(1).map_err(|e| AppError::Database(e.to_string()))?,
            website: row.get(2).map_err(|e| AppError::Database(e.to_string()))?,
            phone: row.get(3).map_err(|e| AppError::Database(e.to_string()))?,
            address: row.get(4).map_err(|e| AppError::Database(e.to_string()))?,
            status: CompanyStatus::parse(&status)
                .ok_or_else(|| AppError::Database(format!("Unknown company status: {}", status)))?,
            created_at: decode_timestamp(
                row.get::<i64>(6).map_err(|e| AppError::Database(e.to_string()))?,
            )?,
            updated_at: decode_timestamp(
                row.get::<i64>(7).map_err(|e| AppError::Database(e.to_string()))?,
            )?,
        })
    }

    fn decode_job(row: &libsql::Row) -> Result<ResearchJob> {
        let id: String = row.get(0).map_err(|e| AppError::Database(e.to_string()))?;
        let company_id: String = row.get(1).map_err(|e| AppError::Database(e.to_string()))?;
        let status: String = row.get(2).map_err(|e| AppError::Database(e.to_string()))?;
        let stages: String = row.get(5).map_err(|e| AppError::Database(e.to_string()))?;

        Ok(ResearchJob {
            id: Uuid::parse_str(&id)
                .map_err(|e| AppError::Database(format!("Invalid job id: {}", e)))?,
            company_id: Uuid::parse_str(&company_id)
                .map_err(|e| AppError::Database(format!("Invalid company id: {}", e)))?,
            status: JobStatus::parse(&status)
                .ok_or_else(|| AppError::Database(format!("Unknown job status: {}", status)))?,
            priority: row.get::<i64>(3).map_err(|e| AppError::Database(e.to_string()))? as u8,
            progress: row.get::<i64>(4).map_err(|e| AppError::Database(e.to_string()))? as u8,
            stages: serde_json::from_str(&stages)
                .map_err(|e| AppError::Database(format!("Invalid stage map: {}", e)))?,
            started_at: row
                .get::<Option<i64>>(6)
                .map_err(|e| AppError::Database(e.to_string()))?
                .map(decode_timestamp)
                .transpose()?,
            completed_at: row
                .get::<Option<i64>>(7)
                .map_err(|e| AppError::Database(e.to_string()))?
                .map(decode_timestamp)
                .transpose()?,
            error_message: row.get(8).map_err(|e| AppError::Database(e.to_string()))?,
            created_at: decode_timestamp(
                row.get::<i64>(9).map_err(|e| AppError::Database(e.to_string()))?,
            )?,
        })
    }

    fn decode_reliability(row: &libsql::Row) -> Result<SourceReliability> {
        Ok(SourceReliability {
            source_name: row.get(0).map_err(|e| AppError::Database(e.to_string()))?,
            enabled: row.get::<i64>(1).map_err(|e| AppError::Database(e.to_string()))? != 0,
            priority: row.get::<i64>(2).map_err(|e| AppError::Database(e.to_string()))? as u8,
            success_rate: row.get(3).map_err(|e| AppError::Database(e.to_string()))?,
            avg_duration_ms: row.get(4).map_err(|e| AppError::Database(e.to_string()))?,
            avg_quality_score: row.get(5).map_err(|e| AppError::Database(e.to_string()))?,
            requests_per_minute: row
                .get::<i64>(6)
                .map_err(|e| AppError::Database(e.to_string()))? as u32,
            delay_between_ms: row
                .get::<i64>(7)
                .map_err(|e| AppError::Database(e.to_string()))? as u32,
            daily_limit: row.get::<i64>(8).map_err(|e| AppError::Database(e.to_string()))? as u32,
            current_daily_usage: row
                .get::<i64>(9)
                .map_err(|e| AppError::Database(e.to_string()))? as u32,
            last_used: row
                .get::<Option<i64>>(10)
                .map_err(|e| AppError::Database(e.to_string()))?
                .map(decode_timestamp)
                .transpose()?,
        })
    }

    fn decode_event(row: &libsql::Row) -> Result<EvolutionEvent> {
        let id: String = row.get(0).map_err(|e| AppError::Database(e.to_string()))?;
        let event_type: String = row.get(1).map_err(|e| AppError::Database(e.to_string()))?;
        let company_id: Option<String> =
            row.get(3).map_err(|e| AppError::Database(e.to_string()))?;

        Ok(EvolutionEvent {
            id: Uuid::parse_str(&id)
                .map_err(|e| AppError::Database(format!("Invalid event id: {}", e)))?,
            event_type: EvolutionEventType::parse(&event_type).ok_or_else(|| {
                AppError::Database(format!("Unknown event type: {}", event_type))
            })?,
            source_name: row.get(2).map_err(|e| AppError::Database(e.to_string()))?,
            company_id: company_id
                .map(|c| {
                    Uuid::parse_str(&c)
                        .map_err(|e| AppError::Database(format!("Invalid company id: {}", e)))
                })
                .transpose()?,
            duration_ms: row.get(4).map_err(|e| AppError::Database(e.to_string()))?,
            quality_score: row.get(5).map_err(|e| AppError::Database(e.to_string()))?,
            completeness_score: row.get(6).map_err(|e| AppError::Database(e.to_string()))?,
            error_code: row.get(7).map_err(|e| AppError::Database(e.to_string()))?,
            error_message: row.get(8).map_err(|e| AppError::Database(e.to_string()))?,
            retry_count: row
                .get::<Option<i64>>(9)
                .map_err(|e| AppError::Database(e.to_string()))?
                .map(|r| r as u32),
            fallback_used: row
                .get::<Option<i64>>(10)
                .map_err(|e| AppError::Database(e.to_string()))?
                .map(|f| f != 0),
            created_at: decode_timestamp(
                row.get::<i64>(11).map_err(|e| AppError::Database(e.to_string()))?,
            )?,
        })
    }
}

fn decode_timestamp(millis: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| AppError::Database(format!("Invalid timestamp: {}", millis)))
}

#[async_trait]
impl RecordStore for LibsqlStore {
    // Company operations

    async fn create_company(&self, company: &Company) -> Result<()> {
        let conn = self.connection()?;

        conn.execute(
            "INSERT INTO companies (id, name, website, phone, address, status, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            (
                company.id.to_string(),
                company.name.as_str(),
                company.website.as_deref(),
                company.phone.as_deref(),
                company.address.as_deref(),
                company.status.as_str(),
                company.created_at.timestamp_millis(),
                company.updated_at.timestamp_millis(),
            ),
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to create company: {}", e)))?;

        Ok(())
    }

    async fn get_company(&self, id: Uuid) -> Result<Option<Company>> {
        let conn = self.connection()?;

        let mut rows = conn
            .query(
                "SELECT id, name, website, phone, address, status, created_at, updated_at
                 FROM companies WHERE id = ?",
                [id.to_string()],
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to query company: {}", e)))?;

        if let Some(row) = rows
            .next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            Ok(Some(Self::decode_company(&row)?))
        } else {
            Ok(None)
        }
    }

    async fn list_companies(&self) -> Result<Vec<Company>> {
        let conn = self.connection()?;

        let mut rows = conn
            .query(
                "SELECT id, name, website, phone, address, status, created_at, updated_at
                 FROM companies ORDER BY created_at DESC",
                (),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to list companies: {}", e)))?;

        let mut companies = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            companies.push(Self::decode_company(&row)?);
        }

        Ok(companies)
    }

    async fn update_company_status(&self, id: Uuid, status: CompanyStatus) -> Result<()> {
        let conn = self.connection()?;

        let affected = conn
            .execute(
                "UPDATE companies SET status = ?, updated_at = ? WHERE id = ?",
                (
                    status.as_str(),
                    Utc::now().timestamp_millis(),
                    id.to_string(),
                ),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to update company status: {}", e)))?;

        if affected == 0 {
            return Err(AppError::NotFound(format!("Company not found: {}", id)));
        }

        Ok(())
    }

    // Job operations

    async fn create_job(&self, job: &ResearchJob) -> Result<()> {
        let conn = self.connection()?;
        let stages = serde_json::to_string(&job.stages)
            .map_err(|e| AppError::Database(format!("Failed to encode stage map: {}", e)))?;

        conn.execute(
            "INSERT INTO research_jobs
             (id, company_id, status, priority, progress, stages, started_at, completed_at, error_message, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            (
                job.id.to_string(),
                job.company_id.to_string(),
                job.status.as_str(),
                i64::from(job.priority),
                i64::from(job.progress),
                stages,
                job.started_at.map(|t| t.timestamp_millis()),
                job.completed_at.map(|t| t.timestamp_millis()),
                job.error_message.as_deref(),
                job.created_at.timestamp_millis(),
            ),
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to create job: {}", e)))?;

        Ok(())
    }

    async fn get_job(&self, id: Uuid) -> Result<Option<ResearchJob>> {
        let conn = self.connection()?;

        let mut rows = conn
            .query(
                "SELECT id, company_id, status, priority, progress, stages, started_at, completed_at, error_message, created_at
                 FROM research_jobs WHERE id = ?",
                [id.to_string()],
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to query job: {}", e)))?;

        if let Some(row) = rows
            .next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            Ok(Some(Self::decode_job(&row)?))
        } else {
            Ok(None)
        }
    }

    async fn update_job(&self, job: &ResearchJob) -> Result<()> {
        let conn = self.connection()?;
        let stages = serde_json::to_string(&job.stages)
            .map_err(|e| AppError::Database(format!("Failed to encode stage map: {}", e)))?;

        let affected = conn
            .execute(
                "UPDATE research_jobs
                 SET status = ?, progress = ?, stages = ?, started_at = ?, completed_at = ?, error_message = ?
                 WHERE id = ?",
                (
                    job.status.as_str(),
                    i64::from(job.progress),
                    stages,
                    job.started_at.map(|t| t.timestamp_millis()),
                    job.completed_at.map(|t| t.timestamp_millis()),
                    job.error_message.as_deref(),
                    job.id.to_string(),
                ),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to update job: {}", e)))?;

        if affected == 0 {
            return Err(AppError::NotFound(format!("Job not found: {}", job.id)));
        }

        Ok(())
    }

    // Dossier operations

    async fn upsert_dossier(&self, dossier: &CompanyDossier) -> Result<()> {
        let conn = self.connection()?;
        let payload = serde_json::to_string(dossier)
            .map_err(|e| AppError::Database(format!("Failed to encode dossier: {}", e)))?;

        conn.execute(
            "INSERT OR REPLACE INTO dossiers (company_id, payload, researched_at)
             VALUES (?, ?, ?)",
            (
                dossier.company_id.to_string(),
                payload,
                dossier.researched_at.timestamp_millis(),
            ),
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to upsert dossier: {}", e)))?;

        Ok(())
    }

    async fn get_dossier(&self, company_id: Uuid) -> Result<Option<CompanyDossier>> {
        let conn = self.connection()?;

        let mut rows = conn
            .query(
                "SELECT payload FROM dossiers WHERE company_id = ?",
                [company_id.to_string()],
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to query dossier: {}", e)))?;

        if let Some(row) = rows
            .next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            let payload: String = row.get(0).map_err(|e| AppError::Database(e.to_string()))?;
            let dossier = serde_json::from_str(&payload)
                .map_err(|e| AppError::Database(format!("Invalid dossier payload: {}", e)))?;
            Ok(Some(dossier))
        } else {
            Ok(None)
        }
    }

    // Reliability operations

    async fn get_reliability(&self, source_name: &str) -> Result<Option<SourceReliability>> {
        let conn = self.connection()?;

        let mut rows = conn
            .query(
                "SELECT source_name, enabled, priority, success_rate, avg_duration_ms, avg_quality_score,
                        requests_per_minute, delay_between_ms, daily_limit, current_daily_usage, last_used
                 FROM source_reliability WHERE source_name = ?",
                [source_name],
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to query reliability: {}", e)))?;

        if let Some(row) = rows
            .next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            Ok(Some(Self::decode_reliability(&row)?))
        } else {
            Ok(None)
        }
    }

    async fn upsert_reliability(&self, reliability: &SourceReliability) -> Result<()> {
        let conn = self.connection()?;

        conn.execute(
            "INSERT OR REPLACE INTO source_reliability
             (source_name, enabled, priority, success_rate, avg_duration_ms, avg_quality_score,
              requests_per_minute, delay_between_ms, daily_limit, current_daily_usage, last_used)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            (
                reliability.source_name.as_str(),
                i64::from(reliability.enabled),
                i64::from(reliability.priority),
                reliability.success_rate,
                reliability.avg_duration_ms,
                reliability.avg_quality_score,
                i64::from(reliability.requests_per_minute),
                i64::from(reliability.delay_between_ms),
                i64::from(reliability.daily_limit),
                i64::from(reliability.current_daily_usage),
                reliability.last_used.map(|t| t.timestamp_millis()),
            ),
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to upsert reliability: {}", e)))?;

        Ok(())
    }

    async fn list_reliability(&self) -> Result<Vec<SourceReliability>> {
        let conn = self.connection()?;

        let mut rows = conn
            .query(
                "SELECT source_name, enabled, priority, success_rate, avg_duration_ms, avg_quality_score,
                        requests_per_minute, delay_between_ms, daily_limit, current_daily_usage, last_used
                 FROM source_reliability ORDER BY success_rate DESC",
                (),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to list reliability: {}", e)))?;

        let mut sources = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            sources.push(Self::decode_reliability(&row)?);
        }

        Ok(sources)
    }

    // Event operations

    async fn append_event(&self, event: &EvolutionEvent) -> Result<()> {
        let conn = self.connection()?;

        conn.execute(
            "INSERT INTO evolution_events
             (id, event_type, source_name, company_id, duration_ms, quality_score, completeness_score,
              error_code, error_message, retry_count, fallback_used, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            (
                event.id.to_string(),
                event.event_type.as_str(),
                event.source_name.as_deref(),
                event.company_id.map(|c| c.to_string()),
                event.duration_ms,
                event.quality_score,
                event.completeness_score,
                event.error_code.as_deref(),
                event.error_message.as_deref(),
                event.retry_count.map(i64::from),
                event.fallback_used.map(i64::from),
                event.created_at.timestamp_millis(),
            ),
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to append event: {}", e)))?;

        Ok(())
    }

    async fn recent_events(&self, limit: usize) -> Result<Vec<EvolutionEvent>> {
        let conn = self.connection()?;

        let mut rows = conn
            .query(
                "SELECT id, event_type, source_name, company_id, duration_ms, quality_score, completeness_score,
                        error_code, error_message, retry_count, fallback_used, created_at
                 FROM evolution_events ORDER BY created_at DESC, rowid DESC LIMIT ?",
                [limit as i64],
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to query events: {}", e)))?;

        let mut events = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            events.push(Self::decode_event(&row)?);
        }

        Ok(events)
    }

    async fn recent_events_of_type(
        &self,
        event_type: EvolutionEventType,
        limit: usize,
    ) -> Result<Vec<EvolutionEvent>> {
        let conn = self.connection()?;

        let mut rows = conn
            .query(
                "SELECT id, event_type, source_name, company_id, duration_ms, quality_score, completeness_score,
                        error_code, error_message, retry_count, fallback_used, created_at
                 FROM evolution_events WHERE event_type = ?
                 ORDER BY created_at DESC, rowid DESC LIMIT ?",
                (event_type.as_str(), limit as i64),
            )
            .await
            .map_err(|e| AppError::Database(format!("Failed to query events: {}", e)))?;

        let mut events = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            events.push(Self::decode_event(&row)?);
        }

        Ok(events)
    }

    async fn event_count(&self) -> Result<u64> {
        let conn = self.connection()?;

        let mut rows = conn
            .query("SELECT COUNT(*) FROM evolution_events", ())
            .await
            .map_err(|e| AppError::Database(format!("Failed to count events: {}", e)))?;

        let row = rows
            .next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| AppError::Database("COUNT returned no rows".to_string()))?;

        let count: i64 = row.get(0).map_err(|e| AppError::Database(e.to_string()))?;
        Ok(count as u64)
    }
}
