use crate::AppState;
use axum::{
    Json, Router,
    routing::{get, post},
};
use utoipa::OpenApi;

/// OpenAPI document covering every route and schema.
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::handlers::companies::create_company,
        crate::api::handlers::companies::list_companies,
        crate::api::handlers::companies::get_company,
        crate::api::handlers::research::submit_research,
        crate::api::handlers::research::get_job,
        crate::api::handlers::research::cancel_job,
        crate::api::handlers::research::get_dossier,
        crate::api::handlers::evolution::source_performance,
        crate::api::handlers::evolution::best_sources,
        crate::api::handlers::evolution::insights,
        crate::api::handlers::evolution::recent_events,
    ),
    components(schemas(
        crate::types::Company,
        crate::types::CompanyStatus,
        crate::types::CreateCompanyRequest,
        crate::types::ResearchRequest,
        crate::types::ResearchSubmitted,
        crate::types::ResearchJob,
        crate::types::JobStatus,
        crate::types::ResearchStage,
        crate::types::StageStatus,
        crate::types::CompanyDossier,
        crate::types::WebsiteIntel,
        crate::types::SocialProfile,
        crate::types::SocialIntel,
        crate::types::NewsMention,
        crate::types::NewsIntel,
        crate::types::BusinessIntel,
        crate::types::SourceReliability,
        crate::types::EvolutionEvent,
        crate::types::EvolutionEventType,
        crate::evolution::EvolutionInsights,
        crate::evolution::QualityTrend,
    )),
    tags(
        (name = "companies", description = "Company registration and lookup"),
        (name = "research", description = "Research job lifecycle and dossiers"),
        (name = "evolution", description = "Source reliability and insights"),
    ),
    info(
        title = "Dossier Server API",
        description = "Business intelligence research orchestration"
    )
)]
pub struct ApiDoc;

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route(
            "/api/companies",
            get(crate::api::handlers::companies::list_companies)
                .post(crate::api::handlers::companies::create_company),
        )
        .route(
            "/api/companies/{id}",
            get(crate::api::handlers::companies::get_company),
        )
        .route(
            "/api/companies/{id}/dossier",
            get(crate::api::handlers::research::get_dossier),
        )
        .route(
            "/api/research",
            post(crate::api::handlers::research::submit_research),
        )
        .route(
            "/api/research/{job_id}",
            get(crate::api::handlers::research::get_job),
        )
        .route(
            "/api/research/{job_id}/cancel",
            post(crate::api::handlers::research::cancel_job),
        )
        .route(
            "/api/evolution/performance",
            get(crate::api::handlers::evolution::source_performance),
        )
        .route(
            "/api/evolution/best",
            get(crate::api::handlers::evolution::best_sources),
        )
        .route(
            "/api/evolution/insights",
            get(crate::api::handlers::evolution::insights),
        )
        .route(
            "/api/evolution/events/recent",
            get(crate::api::handlers::evolution::recent_events),
        )
}
