use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use validator::Validate;

use crate::{
    dto::deduction_dto::{DeductionPayload, DeductionResponse},
    error::Result,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/deductions",
    request_body = DeductionPayload,
    responses(
        (status = 201, description = "Rule created", body = DeductionResponse),
        (status = 400, description = "Blank name or non-positive percentage"),
        (status = 409, description = "Rule name already exists")
    )
)]
#[axum::debug_handler]
pub async fn create_deduction(
    State(state): State<AppState>,
    Json(payload): Json<DeductionPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let rule = state.deduction_service.create(payload).await?;
    Ok((StatusCode::CREATED, Json(DeductionResponse::from(rule))))
}

#[utoipa::path(
    get,
    path = "/api/deductions",
    responses((status = 200, description = "Rules ordered by name", body = [DeductionResponse]))
)]
#[axum::debug_handler]
pub async fn list_deductions(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let rules = state.deduction_service.list_all().await?;
    let body: Vec<DeductionResponse> = rules.into_iter().map(Into::into).collect();
    Ok(Json(body))
}

#[utoipa::path(
    get,
    path = "/api/deductions/{name}",
    params(("name" = String, Path, description = "Rule name")),
    responses(
        (status = 200, description = "Rule", body = DeductionResponse),
        (status = 404, description = "Rule not found")
    )
)]
#[axum::debug_handler]
pub async fn get_deduction(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse> {
    let rule = state.deduction_service.get(&name).await?;
    Ok(Json(DeductionResponse::from(rule)))
}

#[utoipa::path(
    put,
    path = "/api/deductions/{name}",
    params(("name" = String, Path, description = "Current rule name")),
    request_body = DeductionPayload,
    responses(
        (status = 200, description = "Rule updated", body = DeductionResponse),
        (status = 404, description = "Rule not found"),
        (status = 409, description = "New name belongs to another rule")
    )
)]
#[axum::debug_handler]
pub async fn update_deduction(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(payload): Json<DeductionPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let rule = state.deduction_service.update(&name, payload).await?;
    Ok(Json(DeductionResponse::from(rule)))
}

#[utoipa::path(
    delete,
    path = "/api/deductions/{name}",
    params(("name" = String, Path, description = "Rule name")),
    responses(
        (status = 204, description = "Rule deleted"),
        (status = 404, description = "Rule not found")
    )
)]
#[axum::debug_handler]
pub async fn delete_deduction(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse> {
    state.deduction_service.delete(&name).await?;
    Ok(StatusCode::NO_CONTENT)
}
