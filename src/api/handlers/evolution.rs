use crate::{
    AppState,
    evolution::EvolutionInsights,
    types::{EvolutionEvent, Result, SourceReliability},
};
use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use utoipa::IntoParams;

const DEFAULT_EVENT_LIMIT: usize = 50;
const MAX_EVENT_LIMIT: usize = 500;

#[derive(Debug, Deserialize, IntoParams)]
pub struct BestSourcesQuery {
    /// Minimum success rate, defaults to 70.
    pub min_success_rate: Option<f64>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct RecentEventsQuery {
    /// Number of events to return, defaults to 50, capped at 500.
    pub limit: Option<usize>,
}

/// Reliability profile of every known source
#[utoipa::path(
    get,
    path = "/api/evolution/performance",
    responses(
        (status = 200, description = "Sources ordered by success rate", body = [SourceReliability])
    ),
    tag = "evolution"
)]
pub async fn source_performance(
    State(state): State<AppState>,
) -> Result<Json<Vec<SourceReliability>>> {
    let rows = state.evolution.source_performance().await?;
    Ok(Json(rows))
}

/// Best currently enabled sources
#[utoipa::path(
    get,
    path = "/api/evolution/best",
    params(BestSourcesQuery),
    responses(
        (status = 200, description = "Up to five best sources", body = [SourceReliability])
    ),
    tag = "evolution"
)]
pub async fn best_sources(
    State(state): State<AppState>,
    Query(query): Query<BestSourcesQuery>,
) -> Result<Json<Vec<SourceReliability>>> {
    let rows = state
        .evolution
        .best_sources(query.min_success_rate.unwrap_or(70.0))
        .await?;
    Ok(Json(rows))
}

/// System-level insight snapshot
#[utoipa::path(
    get,
    path = "/api/evolution/insights",
    responses(
        (status = 200, description = "Current insights", body = EvolutionInsights)
    ),
    tag = "evolution"
)]
pub async fn insights(State(state): State<AppState>) -> Result<Json<EvolutionInsights>> {
    let insights = state.evolution.analyze_insights().await?;
    Ok(Json(insights))
}

/// Recent evolution events, most recent first
#[utoipa::path(
    get,
    path = "/api/evolution/events/recent",
    params(RecentEventsQuery),
    responses(
        (status = 200, description = "Recent events", body = [EvolutionEvent])
    ),
    tag = "evolution"
)]
pub async fn recent_events(
    State(state): State<AppState>,
    Query(query): Query<RecentEventsQuery>,
) -> Result<Json<Vec<EvolutionEvent>>> {
    let limit = query.limit.unwrap_or(DEFAULT_EVENT_LIMIT).min(MAX_EVENT_LIMIT);
    let events = state.store.recent_events(limit).await?;
    Ok(Json(events))
}
