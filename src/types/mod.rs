use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;
use uuid::Uuid;

// ============= Job Types =============

/// Lifecycle status of a research job.
///
/// Transitions are forward-only (`Pending → Queued → Running → Completed/Failed`)
/// with `Cancelled` reachable from any non-terminal status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "queued" => Some(Self::Queued),
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Whether a cancel request is valid from this status.
    pub fn is_cancellable(self) -> bool {
        matches!(self, Self::Pending | Self::Queued | Self::Running)
    }

    /// Whether moving to `next` is a legal status transition.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        match (self, next) {
            (Self::Pending, Self::Queued | Self::Running | Self::Cancelled) => true,
            (Self::Queued, Self::Running | Self::Cancelled) => true,
            (Self::Running, Self::Completed | Self::Failed | Self::Cancelled) => true,
            _ => false,
        }
    }
}

/// One step of the fixed research sequence.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "snake_case")]
pub enum ResearchStage {
    Website,
    Social,
    News,
    BusinessAnalysis,
}

impl ResearchStage {
    /// Stages in execution order.
    pub const ALL: [ResearchStage; 4] = [
        Self::Website,
        Self::Social,
        Self::News,
        Self::BusinessAnalysis,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Website => "website",
            Self::Social => "social",
            Self::News => "news",
            Self::BusinessAnalysis => "business_analysis",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "website" => Some(Self::Website),
            "social" => Some(Self::Social),
            "news" => Some(Self::News),
            "business_analysis" => Some(Self::BusinessAnalysis),
            _ => None,
        }
    }

    /// Job progress reached once this stage's collaborator call returns.
    pub fn progress_cutoff(self) -> u8 {
        match self {
            Self::Website => 25,
            Self::Social => 50,
            Self::News => 75,
            Self::BusinessAnalysis => 100,
        }
    }
}

/// Per-stage status within a job.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Skipped,
}

impl StageStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            "skipped" => Some(Self::Skipped),
            _ => None,
        }
    }
}

/// One research attempt for one company.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResearchJob {
    pub id: Uuid,
    pub company_id: Uuid,
    pub status: JobStatus,
    /// Priority 0-10, higher runs sooner when the pool is saturated.
    pub priority: u8,
    /// Overall progress 0-100, monotonically non-decreasing while running.
    pub progress: u8,
    pub stages: BTreeMap<ResearchStage, StageStatus>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ResearchJob {
    /// Create a freshly queued job with every stage pending.
    pub fn queued(company_id: Uuid, priority: u8) -> Self {
        let stages = ResearchStage::ALL
            .iter()
            .map(|s| (*s, StageStatus::Pending))
            .collect();

        Self {
            id: Uuid::new_v4(),
            company_id,
            status: JobStatus::Queued,
            priority: priority.min(10),
            progress: 0,
            stages,
            started_at: None,
            completed_at: None,
            error_message: None,
            created_at: Utc::now(),
        }
    }
}

// ============= Company Types =============

/// Coarse company status mirrored in lockstep with its job's lifecycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CompanyStatus {
    Pending,
    Queued,
    Researching,
    Completed,
    Failed,
}

impl CompanyStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Queued => "queued",
            Self::Researching => "researching",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "queued" => Some(Self::Queued),
            "researching" => Some(Self::Researching),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// The business entity under research. Identity and attributes are supplied
/// by the record store and read-only to the pipeline; only the mirrored
/// status is written back.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub status: CompanyStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ============= Stage Output Types =============

/// Output of the website stage.
///
/// Degraded results carry their failure reasons in `errors`; the stage still
/// counts as completed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct WebsiteIntel {
    pub url: Option<String>,
    pub live: bool,
    pub title: Option<String>,
    pub emails: Vec<String>,
    pub phones: Vec<String>,
    pub has_ssl: bool,
    /// 0-100 quality indicator for this output.
    pub confidence: u8,
    pub errors: Vec<String>,
}

impl WebsiteIntel {
    /// At least one contact email or phone was found on the website.
    pub fn has_contact(&self) -> bool {
        !self.emails.is_empty() || !self.phones.is_empty()
    }
}

/// One discovered social profile.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SocialProfile {
    pub platform: String,
    pub url: String,
    /// 0-100, adjusted by the optional verification pass.
    pub confidence: u8,
    /// None when no verifier ran.
    pub verified: Option<bool>,
}

/// Output of the social-presence stage (joined fan-out over platforms).
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct SocialIntel {
    pub profiles: Vec<SocialProfile>,
    /// 0-100, supplied by the social collaborator.
    pub presence_score: u8,
    pub errors: Vec<String>,
}

impl SocialIntel {
    /// Number of distinct platforms with a found profile.
    pub fn platform_count(&self) -> usize {
        let mut platforms: Vec<&str> = self.profiles.iter().map(|p| p.platform.as_str()).collect();
        platforms.sort_unstable();
        platforms.dedup();
        platforms.len()
    }

    pub fn has_linkedin(&self) -> bool {
        self.profiles
            .iter()
            .any(|p| p.platform.eq_ignore_ascii_case("linkedin"))
    }

    /// Mean per-profile confidence; 0.0 when no profiles were found.
    pub fn mean_confidence(&self) -> f64 {
        let sum: u32 = self.profiles.iter().map(|p| u32::from(p.confidence)).sum();
        // Substitute 1 for an empty profile list to guard the division.
        sum as f64 / self.profiles.len().max(1) as f64
    }
}

/// One press or news mention.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewsMention {
    pub title: String,
    pub url: Option<String>,
    pub snippet: Option<String>,
}

/// Output of the news/reputation stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct NewsIntel {
    pub mentions: Vec<NewsMention>,
    /// 0-100 reputation estimate for the mentions found.
    pub reputation_score: u8,
    pub confidence: u8,
    pub errors: Vec<String>,
}

/// Output of the business-analysis stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct BusinessIntel {
    pub opportunities: Vec<String>,
    pub digital_maturity_score: u8,
    pub opportunity_score: u8,
    pub confidence: u8,
    pub errors: Vec<String>,
}

// ============= Dossier Types =============

/// The fused intelligence record, one current instance per company.
///
/// Constructed fresh at the start of a job, filled in as stages complete and
/// upserted exactly once after the final stage.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CompanyDossier {
    pub company_id: Uuid,
    pub company_name: String,
    pub website: Option<WebsiteIntel>,
    pub social: Option<SocialIntel>,
    pub news: Option<NewsIntel>,
    pub business: Option<BusinessIntel>,
    pub digital_maturity_score: u8,
    pub social_presence_score: u8,
    pub reputation_score: u8,
    pub opportunity_score: u8,
    /// Weighted coverage over six fixed criteria, 0-100.
    pub completeness_score: u8,
    /// Blended reliability estimate. Not clamped to 100 by construction.
    pub confidence_score: i64,
    pub gaps: Vec<String>,
    pub researched_at: DateTime<Utc>,
}

impl CompanyDossier {
    /// Empty dossier for a company, before any stage has run.
    pub fn empty(company_id: Uuid, company_name: &str) -> Self {
        Self {
            company_id,
            company_name: company_name.to_string(),
            website: None,
            social: None,
            news: None,
            business: None,
            digital_maturity_score: 0,
            social_presence_score: 0,
            reputation_score: 0,
            opportunity_score: 0,
            completeness_score: 0,
            confidence_score: 0,
            gaps: Vec::new(),
            researched_at: Utc::now(),
        }
    }
}

// ============= Reliability Types =============

/// Smoothed per-source reliability row, lazily created on the first event
/// logged for a source and updated on every subsequent one.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SourceReliability {
    pub source_name: String,
    /// Recomputed to `success_rate > 20` after every update.
    pub enabled: bool,
    pub priority: u8,
    /// 0-100, asymptotically smoothed.
    pub success_rate: f64,
    pub avg_duration_ms: i64,
    pub avg_quality_score: f64,
    pub requests_per_minute: u32,
    pub delay_between_ms: u32,
    pub daily_limit: u32,
    pub current_daily_usage: u32,
    pub last_used: Option<DateTime<Utc>>,
}

impl SourceReliability {
    /// Fresh row with default rate limits, seeded from the first event.
    pub fn seed(source_name: &str, success_rate: f64) -> Self {
        Self {
            source_name: source_name.to_string(),
            enabled: success_rate > 20.0,
            priority: 5,
            success_rate,
            avg_duration_ms: 0,
            avg_quality_score: 0.0,
            requests_per_minute: 10,
            delay_between_ms: 6000,
            daily_limit: 500,
            current_daily_usage: 0,
            last_used: None,
        }
    }
}

// ============= Evolution Event Types =============

/// Kind of an evolution event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EvolutionEventType {
    SourceSuccess,
    SourceFailure,
    ResearchComplete,
    AdaptationApplied,
}

impl EvolutionEventType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SourceSuccess => "source_success",
            Self::SourceFailure => "source_failure",
            Self::ResearchComplete => "research_complete",
            Self::AdaptationApplied => "adaptation_applied",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "source_success" => Some(Self::SourceSuccess),
            "source_failure" => Some(Self::SourceFailure),
            "research_complete" => Some(Self::ResearchComplete),
            "adaptation_applied" => Some(Self::AdaptationApplied),
            _ => None,
        }
    }
}

/// Immutable audit record of one collaborator invocation outcome or one
/// research completion. Never mutated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EvolutionEvent {
    pub id: Uuid,
    pub event_type: EvolutionEventType,
    pub source_name: Option<String>,
    pub company_id: Option<Uuid>,
    pub duration_ms: Option<i64>,
    pub quality_score: Option<f64>,
    pub completeness_score: Option<f64>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
    pub retry_count: Option<u32>,
    pub fallback_used: Option<bool>,
    pub created_at: DateTime<Utc>,
}

// ============= API Request/Response Types =============

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateCompanyRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ResearchRequest {
    pub company_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ResearchSubmitted {
    pub job_id: Uuid,
    pub company_id: Uuid,
    pub status: JobStatus,
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Collaborator error: {0}")]
    Collaborator(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid status transition: {0}")]
    InvalidTransition(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::Database(msg) => (axum::http::StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::Collaborator(msg) => (axum::http::StatusCode::BAD_GATEWAY, msg),
            AppError::NotFound(msg) => (axum::http::StatusCode::NOT_FOUND, msg),
            AppError::InvalidInput(msg) => (axum::http::StatusCode::BAD_REQUEST, msg),
            AppError::InvalidTransition(msg) => (axum::http::StatusCode::CONFLICT, msg),
            AppError::Internal(msg) => (axum::http::StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
