use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use validator::Validate;

use crate::{
    dto::employee_dto::{CreateEmployeePayload, EmployeeResponse, UpdateEmployeePayload},
    error::Result,
    middleware::auth::{ensure_admin, ensure_self_or_manager},
    utils::token::Claims,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/employees",
    request_body = CreateEmployeePayload,
    responses(
        (status = 201, description = "Employee registered", body = EmployeeResponse),
        (status = 400, description = "Invalid payload"),
        (status = 403, description = "Caller may not assign roles"),
        (status = 409, description = "Email already registered")
    )
)]
#[axum::debug_handler]
pub async fn create_employee(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateEmployeePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    if !payload.roles.is_empty() {
        ensure_admin(&claims, "assign roles")?;
    }
    let employee = state.employee_service.create(payload).await?;
    Ok((StatusCode::CREATED, Json(EmployeeResponse::from(employee))))
}

#[utoipa::path(
    get,
    path = "/api/employees",
    responses((status = 200, description = "All employees ordered by code", body = [EmployeeResponse]))
)]
#[axum::debug_handler]
pub async fn list_employees(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let employees = state.employee_service.list_all().await?;
    let body: Vec<EmployeeResponse> = employees.into_iter().map(Into::into).collect();
    Ok(Json(body))
}

#[utoipa::path(
    get,
    path = "/api/employees/{code}",
    params(("code" = String, Path, description = "Employee code")),
    responses(
        (status = 200, description = "Employee", body = EmployeeResponse),
        (status = 403, description = "Another employee's profile"),
        (status = 404, description = "Employee not found")
    )
)]
#[axum::debug_handler]
pub async fn get_employee(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse> {
    ensure_self_or_manager(&claims, &code)?;
    let employee = state.employee_service.get_by_code(&code).await?;
    Ok(Json(EmployeeResponse::from(employee)))
}

#[utoipa::path(
    put,
    path = "/api/employees/{code}",
    params(("code" = String, Path, description = "Employee code")),
    request_body = UpdateEmployeePayload,
    responses(
        (status = 200, description = "Employee updated", body = EmployeeResponse),
        (status = 403, description = "Caller may not change roles"),
        (status = 404, description = "Employee not found")
    )
)]
#[axum::debug_handler]
pub async fn update_employee(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(code): Path<String>,
    Json(payload): Json<UpdateEmployeePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    if payload.roles.as_ref().is_some_and(|roles| !roles.is_empty()) {
        ensure_admin(&claims, "change roles")?;
    }
    let employee = state.employee_service.update(&code, payload).await?;
    Ok(Json(EmployeeResponse::from(employee)))
}

#[utoipa::path(
    delete,
    path = "/api/employees/{code}",
    params(("code" = String, Path, description = "Employee code")),
    responses(
        (status = 204, description = "Employee deleted"),
        (status = 404, description = "Employee not found"),
        (status = 409, description = "Employee has employment or payroll history")
    )
)]
#[axum::debug_handler]
pub async fn delete_employee(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse> {
    state.employee_service.delete(&code).await?;
    Ok(StatusCode::NO_CONTENT)
}
