pub mod auth;
pub mod deductions;
pub mod employees;
pub mod employments;
pub mod health;
pub mod messages;
pub mod payslips;

use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::auth::{require_admin, require_bearer_auth, require_manager_or_admin};
use crate::AppState;

/// Full HTTP surface. Every `/api` route except login needs a bearer token.
/// Routes that change data or list records across employees also need a
/// manager or admin role. Per-employee reads are limited to the employee
/// themselves or a manager inside the handlers.
pub fn app(state: AppState) -> Router {
    let manager = from_fn_with_state(state.clone(), require_manager_or_admin);
    let admin = from_fn_with_state(state.clone(), require_admin);

    let api = Router::new()
        .route(
            "/api/employees",
            get(employees::list_employees)
                .post(employees::create_employee)
                .route_layer(manager.clone()),
        )
        .route(
            "/api/employees/:code",
            get(employees::get_employee)
                .merge(put(employees::update_employee).route_layer(manager.clone()))
                .merge(delete(employees::delete_employee).route_layer(admin)),
        )
        .route(
            "/api/deductions",
            get(deductions::list_deductions)
                .merge(post(deductions::create_deduction).route_layer(manager.clone())),
        )
        .route(
            "/api/deductions/:name",
            get(deductions::get_deduction).merge(
                put(deductions::update_deduction)
                    .delete(deductions::delete_deduction)
                    .route_layer(manager.clone()),
            ),
        )
        .route(
            "/api/employments",
            post(employments::create_employment).route_layer(manager.clone()),
        )
        .route(
            "/api/employments/active",
            get(employments::list_active_employments).route_layer(manager.clone()),
        )
        .route(
            "/api/employments/employee/:code",
            get(employments::list_employee_employments),
        )
        .route(
            "/api/employments/employee/:code/active",
            get(employments::get_active_employment),
        )
        .route(
            "/api/employments/:code",
            put(employments::update_employment).route_layer(manager.clone()),
        )
        .route(
            "/api/employments/:code/deactivate",
            post(employments::deactivate_employment).route_layer(manager.clone()),
        )
        .route(
            "/api/payslips/process",
            post(payslips::process_payslips).route_layer(manager.clone()),
        )
        .route(
            "/api/payslips/approve",
            post(payslips::approve_payslips).route_layer(manager.clone()),
        )
        .route(
            "/api/payslips/employee/:code",
            get(payslips::list_employee_payslips),
        )
        .route(
            "/api/payslips/period",
            get(payslips::list_period_payslips).route_layer(manager.clone()),
        )
        .route("/api/payslips/:id/pdf", get(payslips::download_payslip))
        .route(
            "/api/messages",
            post(messages::create_message).route_layer(manager.clone()),
        )
        .route(
            "/api/messages/draft",
            post(messages::draft_messages).route_layer(manager.clone()),
        )
        .route(
            "/api/messages/deliver",
            post(messages::deliver_messages).route_layer(manager.clone()),
        )
        .route(
            "/api/messages/employee/:code",
            get(messages::list_employee_messages),
        )
        .route(
            "/api/messages/period",
            get(messages::list_period_messages).route_layer(manager.clone()),
        )
        .route(
            "/api/messages/unsent",
            get(messages::list_unsent_messages).route_layer(manager.clone()),
        )
        .route(
            "/api/messages/:id/sent",
            post(messages::mark_message_sent).route_layer(manager),
        )
        .route_layer(from_fn_with_state(state.clone(), require_bearer_auth));

    Router::new()
        .route("/health", get(health::health))
        .route("/api/auth/login", post(auth::login))
        .merge(api)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
