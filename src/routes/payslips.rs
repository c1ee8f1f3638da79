use axum::{
    extract::{Extension, Path, Query, State},
    http::header,
    response::{IntoResponse, Json},
};
use validator::Validate;

use crate::{
    dto::payslip_dto::{ApprovalResponse, PayrollRunResponse, PayslipResponse, PeriodPayload},
    error::Result,
    middleware::auth::ensure_self_or_manager,
    utils::token::Claims,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/payslips/process",
    request_body = PeriodPayload,
    responses(
        (status = 200, description = "Run finished; per-employee failures are listed", body = PayrollRunResponse),
        (status = 400, description = "Invalid period or missing deduction rule")
    )
)]
#[axum::debug_handler]
pub async fn process_payslips(
    State(state): State<AppState>,
    Json(payload): Json<PeriodPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let run = state
        .payslip_service
        .process_payslips(payload.month, payload.year)
        .await?;
    Ok(Json(PayrollRunResponse::from(run)))
}

#[utoipa::path(
    post,
    path = "/api/payslips/approve",
    request_body = PeriodPayload,
    responses(
        (status = 200, description = "Payslips moved from PENDING to PAID", body = ApprovalResponse),
        (status = 400, description = "Invalid period")
    )
)]
#[axum::debug_handler]
pub async fn approve_payslips(
    State(state): State<AppState>,
    Json(payload): Json<PeriodPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let approved = state
        .payslip_service
        .approve_payslips(payload.month, payload.year)
        .await?;
    Ok(Json(ApprovalResponse {
        month: payload.month,
        year: payload.year,
        approved: approved.into_iter().map(Into::into).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/payslips/employee/{code}",
    params(("code" = String, Path, description = "Employee code")),
    responses(
        (status = 200, description = "Employee payslips", body = [PayslipResponse]),
        (status = 403, description = "Another employee's records")
    )
)]
#[axum::debug_handler]
pub async fn list_employee_payslips(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse> {
    ensure_self_or_manager(&claims, &code)?;
    let payslips = state.payslip_service.get_by_employee(&code).await?;
    let body: Vec<PayslipResponse> = payslips.into_iter().map(Into::into).collect();
    Ok(Json(body))
}

#[utoipa::path(
    get,
    path = "/api/payslips/period",
    params(
        ("month" = i32, Query, description = "Month 1-12"),
        ("year" = i32, Query, description = "Year")
    ),
    responses(
        (status = 200, description = "Payslips of the period", body = [PayslipResponse]),
        (status = 400, description = "Invalid period")
    )
)]
#[axum::debug_handler]
pub async fn list_period_payslips(
    State(state): State<AppState>,
    Query(period): Query<PeriodPayload>,
) -> Result<impl IntoResponse> {
    period.validate()?;
    let payslips = state
        .payslip_service
        .get_by_period(period.month, period.year)
        .await?;
    let body: Vec<PayslipResponse> = payslips.into_iter().map(Into::into).collect();
    Ok(Json(body))
}

#[utoipa::path(
    get,
    path = "/api/payslips/{id}/pdf",
    params(("id" = String, Path, description = "Payslip id")),
    responses(
        (status = 200, description = "Rendered payslip document"),
        (status = 403, description = "Another employee's records"),
        (status = 404, description = "Payslip not found")
    )
)]
#[axum::debug_handler]
pub async fn download_payslip(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let payslip = state.payslip_service.get(&id).await?;
    ensure_self_or_manager(&claims, &payslip.employee_code)?;
    let doc = state.payslip_service.render_payslip(&id).await?;
    let disposition = format!("attachment; filename=\"{}\"", doc.file_name);
    Ok((
        [
            (header::CONTENT_TYPE, doc.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        doc.bytes,
    ))
}
