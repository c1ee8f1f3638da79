use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use validator::Validate;

use crate::{
    dto::employment_dto::{CreateEmploymentPayload, EmploymentResponse, UpdateEmploymentPayload},
    error::Result,
    middleware::auth::ensure_self_or_manager,
    utils::token::Claims,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/employments",
    request_body = CreateEmploymentPayload,
    responses(
        (status = 201, description = "Employment started; any previous active one is deactivated", body = EmploymentResponse),
        (status = 400, description = "Invalid salary, department or position"),
        (status = 404, description = "Employee not found")
    )
)]
#[axum::debug_handler]
pub async fn create_employment(
    State(state): State<AppState>,
    Json(payload): Json<CreateEmploymentPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let inserted = state.employment_service.create(payload).await?;
    Ok((StatusCode::CREATED, Json(EmploymentResponse::from(inserted))))
}

#[utoipa::path(
    get,
    path = "/api/employments/active",
    responses((status = 200, description = "All active employments", body = [EmploymentResponse]))
)]
#[axum::debug_handler]
pub async fn list_active_employments(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let employments = state.employment_service.list_active().await?;
    let body: Vec<EmploymentResponse> = employments.into_iter().map(Into::into).collect();
    Ok(Json(body))
}

#[utoipa::path(
    get,
    path = "/api/employments/employee/{code}",
    params(("code" = String, Path, description = "Employee code")),
    responses(
        (status = 200, description = "Employment history in creation order", body = [EmploymentResponse]),
        (status = 403, description = "Another employee's records")
    )
)]
#[axum::debug_handler]
pub async fn list_employee_employments(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse> {
    ensure_self_or_manager(&claims, &code)?;
    let employments = state.employment_service.list_by_employee(&code).await?;
    let body: Vec<EmploymentResponse> = employments.into_iter().map(Into::into).collect();
    Ok(Json(body))
}

#[utoipa::path(
    get,
    path = "/api/employments/employee/{code}/active",
    params(("code" = String, Path, description = "Employee code")),
    responses(
        (status = 200, description = "Active employment", body = EmploymentResponse),
        (status = 403, description = "Another employee's records"),
        (status = 404, description = "No active employment")
    )
)]
#[axum::debug_handler]
pub async fn get_active_employment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse> {
    ensure_self_or_manager(&claims, &code)?;
    let employment = state.employment_service.get_active(&code).await?;
    Ok(Json(EmploymentResponse::from(employment)))
}

#[utoipa::path(
    put,
    path = "/api/employments/{code}",
    params(("code" = String, Path, description = "Employment code")),
    request_body = UpdateEmploymentPayload,
    responses(
        (status = 200, description = "Employment updated", body = EmploymentResponse),
        (status = 400, description = "Invalid salary"),
        (status = 404, description = "Employment not found")
    )
)]
#[axum::debug_handler]
pub async fn update_employment(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(payload): Json<UpdateEmploymentPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let employment = state.employment_service.update(&code, payload).await?;
    Ok(Json(EmploymentResponse::from(employment)))
}

#[utoipa::path(
    post,
    path = "/api/employments/{code}/deactivate",
    params(("code" = String, Path, description = "Employment code")),
    responses(
        (status = 200, description = "Employment is inactive", body = EmploymentResponse),
        (status = 404, description = "Employment not found")
    )
)]
#[axum::debug_handler]
pub async fn deactivate_employment(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse> {
    let employment = state.employment_service.deactivate(&code).await?;
    Ok(Json(EmploymentResponse::from(employment)))
}
