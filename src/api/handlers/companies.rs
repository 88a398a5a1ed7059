use crate::{
    AppState,
    types::{AppError, Company, CompanyStatus, CreateCompanyRequest, Result},
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use uuid::Uuid;

/// Register a company for research
#[utoipa::path(
    post,
    path = "/api/companies",
    request_body = CreateCompanyRequest,
    responses(
        (status = 201, description = "Company registered", body = Company),
        (status = 400, description = "Invalid input")
    ),
    tag = "companies"
)]
pub async fn create_company(
    State(state): State<AppState>,
    Json(payload): Json<CreateCompanyRequest>,
) -> Result<(StatusCode, Json<Company>)> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::InvalidInput(
            "Company name must not be empty".to_string(),
        ));
    }

    let now = Utc::now();
    let company = Company {
        id: Uuid::new_v4(),
        name: name.to_string(),
        website: payload.website,
        phone: payload.phone,
        address: payload.address,
        status: CompanyStatus::Pending,
        created_at: now,
        updated_at: now,
    };

    state.store.create_company(&company).await?;

    tracing::info!(company_id = %company.id, name = %company.name, "Company registered");

    Ok((StatusCode::CREATED, Json(company)))
}

/// List all registered companies
#[utoipa::path(
    get,
    path = "/api/companies",
    responses(
        (status = 200, description = "All registered companies", body = [Company])
    ),
    tag = "companies"
)]
pub async fn list_companies(State(state): State<AppState>) -> Result<Json<Vec<Company>>> {
    let companies = state.store.list_companies().await?;
    Ok(Json(companies))
}

/// Get one company by id
#[utoipa::path(
    get,
    path = "/api/companies/{id}",
    params(("id" = Uuid, Path, description = "Company id")),
    responses(
        (status = 200, description = "Company found", body = Company),
        (status = 404, description = "Company not found")
    ),
    tag = "companies"
)]
pub async fn get_company(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Company>> {
    let company = state
        .store
        .get_company(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Company not found: {}", id)))?;
    Ok(Json(company))
}
