use crate::{
    AppState,
    types::{
        AppError, CompanyDossier, CompanyStatus, ResearchJob, ResearchRequest, ResearchSubmitted,
        Result,
    },
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

const DEFAULT_PRIORITY: u8 = 5;

/// Submit a company for research
///
/// Creates a queued job and hands it to the runner. Returns immediately with
/// 202; poll the job endpoint for progress.
#[utoipa::path(
    post,
    path = "/api/research",
    request_body = ResearchRequest,
    responses(
        (status = 202, description = "Research queued", body = ResearchSubmitted),
        (status = 404, description = "Company not found"),
        (status = 409, description = "Company already has active research")
    ),
    tag = "research"
)]
pub async fn submit_research(
    State(state): State<AppState>,
    Json(payload): Json<ResearchRequest>,
) -> Result<(StatusCode, Json<ResearchSubmitted>)> {
    let company = state
        .store
        .get_company(payload.company_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Company not found: {}", payload.company_id)))?;

    // One active job per company.
    if matches!(
        company.status,
        CompanyStatus::Queued | CompanyStatus::Researching
    ) {
        return Err(AppError::InvalidTransition(format!(
            "Company {} already has research in status '{}'",
            company.id,
            company.status.as_str()
        )));
    }

    let job = ResearchJob::queued(company.id, payload.priority.unwrap_or(DEFAULT_PRIORITY));
    state.store.create_job(&job).await?;
    state
        .store
        .update_company_status(company.id, CompanyStatus::Queued)
        .await?;

    state.runner.submit(job.id);

    tracing::info!(job_id = %job.id, company_id = %company.id, "Research queued");

    Ok((
        StatusCode::ACCEPTED,
        Json(ResearchSubmitted {
            job_id: job.id,
            company_id: company.id,
            status: job.status,
        }),
    ))
}

/// Get a research job with per-stage progress
#[utoipa::path(
    get,
    path = "/api/research/{job_id}",
    params(("job_id" = Uuid, Path, description = "Job id")),
    responses(
        (status = 200, description = "Job found", body = ResearchJob),
        (status = 404, description = "Job not found")
    ),
    tag = "research"
)]
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<ResearchJob>> {
    let job = state
        .store
        .get_job(job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job not found: {}", job_id)))?;
    Ok(Json(job))
}

/// Cancel a queued or running research job
///
/// The company reverts to pending and can be resubmitted.
#[utoipa::path(
    post,
    path = "/api/research/{job_id}/cancel",
    params(("job_id" = Uuid, Path, description = "Job id")),
    responses(
        (status = 200, description = "Job cancelled", body = ResearchJob),
        (status = 404, description = "Job not found"),
        (status = 409, description = "Job is not cancellable")
    ),
    tag = "research"
)]
pub async fn cancel_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<ResearchJob>> {
    let job = state.runner.cancel(job_id).await?;
    Ok(Json(job))
}

/// Get the fused dossier for a company
#[utoipa::path(
    get,
    path = "/api/companies/{id}/dossier",
    params(("id" = Uuid, Path, description = "Company id")),
    responses(
        (status = 200, description = "Dossier found", body = CompanyDossier),
        (status = 404, description = "No dossier for this company yet")
    ),
    tag = "research"
)]
pub async fn get_dossier(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CompanyDossier>> {
    let dossier = state
        .store
        .get_dossier(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No dossier for company: {}", id)))?;
    Ok(Json(dossier))
}
