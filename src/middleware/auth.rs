use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

use crate::error::{Error, Result};
use crate::utils::token::Claims;
use crate::AppState;

fn reject(status: StatusCode, code: &str) -> Response {
    (status, Json(json!({ "error": code }))).into_response()
}

fn bearer_claims(state: &AppState, req: &Request) -> std::result::Result<Claims, Response> {
    let Some(auth_header) = req.headers().get(axum::http::header::AUTHORIZATION) else {
        return Err(reject(StatusCode::UNAUTHORIZED, "missing_authorization"));
    };
    let Ok(auth_str) = auth_header.to_str() else {
        return Err(reject(StatusCode::UNAUTHORIZED, "bad_authorization"));
    };
    let Some(token) = auth_str.strip_prefix("Bearer ") else {
        return Err(reject(StatusCode::UNAUTHORIZED, "unsupported_scheme"));
    };
    state
        .jwt
        .verify(token)
        .map_err(|_| reject(StatusCode::UNAUTHORIZED, "invalid_token"))
}

pub async fn require_bearer_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    match bearer_claims(&state, &req) {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Err(resp) => resp,
    }
}

async fn authorize(
    state: &AppState,
    mut req: Request,
    next: Next,
    allowed: fn(&Claims) -> bool,
) -> Response {
    let claims = match bearer_claims(state, &req) {
        Ok(claims) => claims,
        Err(resp) => return resp,
    };
    if !allowed(&claims) {
        tracing::warn!(
            subject = %claims.sub,
            role = %claims.role.as_deref().unwrap_or_default(),
            path = %req.uri().path(),
            "Forbidden operation"
        );
        return reject(StatusCode::FORBIDDEN, "forbidden");
    }
    req.extensions_mut().insert(claims);
    next.run(req).await
}

/// Bearer auth plus a role check for routes that change payroll data or
/// list records across employees.
pub async fn require_manager_or_admin(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    authorize(&state, req, next, Claims::is_manager).await
}

pub async fn require_admin(State(state): State<AppState>, req: Request, next: Next) -> Response {
    authorize(&state, req, next, Claims::is_admin).await
}

/// Employees may read their own records; managers may read anyone's.
pub fn ensure_self_or_manager(claims: &Claims, employee_code: &str) -> Result<()> {
    if claims.is_manager() || claims.sub == employee_code {
        return Ok(());
    }
    tracing::warn!(subject = %claims.sub, employee = %employee_code, "Forbidden record access");
    Err(Error::Forbidden(format!(
        "Records of employee {} are not visible to {}",
        employee_code, claims.sub
    )))
}

pub fn ensure_admin(claims: &Claims, action: &str) -> Result<()> {
    if claims.is_admin() {
        return Ok(());
    }
    tracing::warn!(subject = %claims.sub, action = %action, "Forbidden admin operation");
    Err(Error::Forbidden(format!("Only admins may {}", action)))
}
