use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use validator::Validate;

use crate::{
    dto::{
        message_dto::{CreateMessagePayload, MessageResponse},
        payslip_dto::PeriodPayload,
    },
    error::Result,
    middleware::auth::ensure_self_or_manager,
    utils::token::Claims,
    AppState,
};

fn to_responses(messages: Vec<crate::models::message::Message>) -> Vec<MessageResponse> {
    messages.into_iter().map(Into::into).collect()
}

#[utoipa::path(
    post,
    path = "/api/messages/draft",
    request_body = PeriodPayload,
    responses((status = 200, description = "Newly drafted salary notices", body = [MessageResponse]))
)]
#[axum::debug_handler]
pub async fn draft_messages(
    State(state): State<AppState>,
    Json(payload): Json<PeriodPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let drafted = state
        .message_service
        .draft_messages_for_paid_payslips(payload.month, payload.year)
        .await?;
    Ok(Json(to_responses(drafted)))
}

#[utoipa::path(
    post,
    path = "/api/messages/deliver",
    responses((status = 200, description = "Delivery sweep report", body = DeliveryReport))
)]
#[axum::debug_handler]
pub async fn deliver_messages(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let report = state.notification_service.deliver_pending().await?;
    Ok(Json(report))
}

#[utoipa::path(
    post,
    path = "/api/messages",
    request_body = CreateMessagePayload,
    responses(
        (status = 201, description = "Message created", body = MessageResponse),
        (status = 404, description = "Payslip not found"),
        (status = 409, description = "Message already exists for the period")
    )
)]
#[axum::debug_handler]
pub async fn create_message(
    State(state): State<AppState>,
    Json(payload): Json<CreateMessagePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let message = state.message_service.create_for_payslip(payload).await?;
    Ok((StatusCode::CREATED, Json(MessageResponse::from(message))))
}

#[utoipa::path(
    get,
    path = "/api/messages/employee/{code}",
    params(("code" = String, Path, description = "Employee code")),
    responses(
        (status = 200, description = "Employee messages", body = [MessageResponse]),
        (status = 403, description = "Another employee's records")
    )
)]
#[axum::debug_handler]
pub async fn list_employee_messages(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse> {
    ensure_self_or_manager(&claims, &code)?;
    let messages = state.message_service.list_by_employee(&code).await?;
    Ok(Json(to_responses(messages)))
}

#[utoipa::path(
    get,
    path = "/api/messages/period",
    params(
        ("month" = i32, Query, description = "Month 1-12"),
        ("year" = i32, Query, description = "Year")
    ),
    responses((status = 200, description = "Messages of the period", body = [MessageResponse]))
)]
#[axum::debug_handler]
pub async fn list_period_messages(
    State(state): State<AppState>,
    Query(period): Query<PeriodPayload>,
) -> Result<impl IntoResponse> {
    period.validate()?;
    let messages = state
        .message_service
        .list_by_period(period.month, period.year)
        .await?;
    Ok(Json(to_responses(messages)))
}

#[utoipa::path(
    get,
    path = "/api/messages/unsent",
    responses((status = 200, description = "Messages awaiting delivery", body = [MessageResponse]))
)]
#[axum::debug_handler]
pub async fn list_unsent_messages(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let messages = state.message_service.list_unsent().await?;
    Ok(Json(to_responses(messages)))
}

#[utoipa::path(
    post,
    path = "/api/messages/{id}/sent",
    params(("id" = String, Path, description = "Message id")),
    responses(
        (status = 200, description = "Message marked sent", body = MessageResponse),
        (status = 404, description = "Message not found")
    )
)]
#[axum::debug_handler]
pub async fn mark_message_sent(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let message = state.message_service.mark_sent(&id).await?;
    Ok(Json(MessageResponse::from(message)))
}
