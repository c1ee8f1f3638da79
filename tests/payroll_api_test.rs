use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use chrono::NaiveDate;
use payroll_backend::{
    database::{MemoryStore, PayrollStore},
    models::employee::NewEmployee,
    routes,
    utils::{crypto::hash_password, token::JwtSettings},
    AppSettings, AppState,
};
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;

const SECRET: &str = "test_secret_key";

fn settings() -> AppSettings {
    AppSettings {
        jwt_secret: SECRET.to_string(),
        jwt_expiration_minutes: 30,
        organization_name: "Rwanda Government".to_string(),
        mail_relay_url: None,
        mail_from: "payroll@example.com".to_string(),
        mail_timeout_secs: 5,
    }
}

async fn seeded_app() -> Router {
    let store: Arc<dyn PayrollStore> = Arc::new(MemoryStore::new());
    store
        .insert_employee(NewEmployee {
            code: "EMP-ADMIN".to_string(),
            first_name: "Grace".to_string(),
            last_name: "Ingabire".to_string(),
            email: "admin@example.com".to_string(),
            password_hash: hash_password("admin-pass").expect("hash"),
            mobile: "+250788000100".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1980, 1, 1).expect("date"),
            roles: vec!["ROLE_ADMIN".to_string()],
        })
        .await
        .expect("seed admin");
    routes::app(AppState::new(store, settings()).expect("app state"))
}

async fn call(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<JsonValue>,
) -> (StatusCode, JsonValue) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let req = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    };
    let resp = app.clone().oneshot(req).await.expect("response");
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.expect("body");
    let value = serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null);
    (status, value)
}

async fn login(app: &Router, email: &str, password: &str) -> (String, JsonValue) {
    let (status, body) = call(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"email": email, "password": password})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);
    let token = body["token"].as_str().expect("token").to_string();
    (token, body["role"].clone())
}

async fn admin_token(app: &Router) -> String {
    let (token, role) = login(app, "admin@example.com", "admin-pass").await;
    assert_eq!(role, "ROLE_ADMIN");
    token
}

async fn hire(app: &Router, token: &str, employee_code: &str, salary: &str) {
    let (status, body) = call(
        app,
        "POST",
        "/api/employments",
        Some(token),
        Some(json!({
            "employee_code": employee_code,
            "department": "Finance",
            "position": "Accountant",
            "base_salary": salary,
            "joining_date": "2023-01-01"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "employment: {}", body);
}

fn profile(roles: Option<&[&str]>) -> JsonValue {
    let mut body = json!({
        "first_name": "Aline",
        "last_name": "Uwase",
        "mobile": "+250788123456",
        "date_of_birth": "1990-04-12"
    });
    if let Some(roles) = roles {
        body["roles"] = json!(roles);
    }
    body
}

async fn seed_rules(app: &Router, token: &str) {
    for (name, pct) in [
        ("Housing", 10),
        ("Transport", 5),
        ("Employee Tax", 15),
        ("Pension", 6),
        ("Medical Insurance", 3),
        ("Others", 2),
    ] {
        let (status, body) = call(
            app,
            "POST",
            "/api/deductions",
            Some(token),
            Some(json!({"name": name, "percentage": pct.to_string()})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "rule {}: {}", name, body);
    }
}

async fn register_employee(app: &Router, token: &str, email: &str) -> String {
    let (status, body) = call(
        app,
        "POST",
        "/api/employees",
        Some(token),
        Some(json!({
            "first_name": "Aline",
            "last_name": "Uwase",
            "email": email,
            "password": "secret-pass",
            "mobile": "+250788123456",
            "date_of_birth": "1990-04-12"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "employee: {}", body);
    assert_eq!(body["status"], "ACTIVE");
    assert_eq!(body["roles"], json!(["ROLE_EMPLOYEE"]));
    assert!(body.get("password_hash").is_none());
    body["code"].as_str().expect("code").to_string()
}

#[tokio::test]
async fn health_is_public() {
    let app = seeded_app().await;
    let (status, body) = call(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["store"], "memory");
}

#[tokio::test]
async fn api_requires_bearer_token() {
    let app = seeded_app().await;

    let (status, body) = call(&app, "GET", "/api/employees", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "missing_authorization");

    let (status, body) = call(&app, "GET", "/api/employees", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "invalid_token");

    let (status, _) = call(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"email": "admin@example.com", "password": "wrong-pass"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn employees_cannot_run_payroll() {
    let app = seeded_app().await;
    let token = JwtSettings::new(SECRET, 5)
        .issue("EMP-X", "x@example.com", Some("ROLE_EMPLOYEE"))
        .expect("token");

    let (status, _) = call(&app, "GET", "/api/deductions", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(
        &app,
        "POST",
        "/api/payslips/process",
        Some(&token),
        Some(json!({"month": 6, "year": 2024})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    let (status, _) = call(
        &app,
        "POST",
        "/api/deductions",
        Some(&token),
        Some(json!({"name": "Housing", "percentage": "10"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn only_admins_grant_roles() {
    let app = seeded_app().await;
    let admin = admin_token(&app).await;
    let code = register_employee(&app, &admin, "aline@example.com").await;
    let (employee, role) = login(&app, "aline@example.com", "secret-pass").await;
    assert_eq!(role, "ROLE_EMPLOYEE");
    let uri = format!("/api/employees/{}", code);

    let (status, _) = call(
        &app,
        "PUT",
        &uri,
        Some(&employee),
        Some(profile(Some(&["ROLE_ADMIN"]))),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(
        &app,
        "POST",
        "/api/employees",
        Some(&employee),
        Some(json!({
            "first_name": "Shadow",
            "last_name": "Admin",
            "email": "shadow@example.com",
            "password": "secret-pass",
            "roles": ["ROLE_ADMIN"],
            "mobile": "+250788123499",
            "date_of_birth": "1990-04-12"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(&app, "DELETE", &uri, Some(&employee), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, manager) = call(
        &app,
        "POST",
        "/api/employees",
        Some(&admin),
        Some(json!({
            "first_name": "Marie",
            "last_name": "Mukamana",
            "email": "marie@example.com",
            "password": "manager-pass",
            "roles": ["ROLE_MANAGER"],
            "mobile": "+250788123458",
            "date_of_birth": "1985-02-02"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", manager);
    let (manager, role) = login(&app, "marie@example.com", "manager-pass").await;
    assert_eq!(role, "ROLE_MANAGER");

    let (status, _) = call(
        &app,
        "PUT",
        &uri,
        Some(&manager),
        Some(profile(Some(&["ROLE_MANAGER"]))),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, updated) = call(&app, "PUT", &uri, Some(&manager), Some(profile(None))).await;
    assert_eq!(status, StatusCode::OK, "{}", updated);
    assert_eq!(updated["roles"], json!(["ROLE_EMPLOYEE"]));

    let (status, _) = call(&app, "DELETE", &uri, Some(&manager), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, updated) = call(
        &app,
        "PUT",
        &uri,
        Some(&admin),
        Some(profile(Some(&["ROLE_MANAGER"]))),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", updated);
    assert_eq!(updated["roles"], json!(["ROLE_MANAGER"]));
}

#[tokio::test]
async fn employees_only_read_their_own_records() {
    let app = seeded_app().await;
    let admin = admin_token(&app).await;
    seed_rules(&app, &admin).await;
    let own = register_employee(&app, &admin, "aline@example.com").await;
    let colleague = register_employee(&app, &admin, "eric@example.com").await;
    hire(&app, &admin, &own, "400000").await;
    hire(&app, &admin, &colleague, "900000").await;
    let (status, run) = call(
        &app,
        "POST",
        "/api/payslips/process",
        Some(&admin),
        Some(json!({"month": 6, "year": 2024})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", run);
    let colleague_payslip = run["created"]
        .as_array()
        .expect("created")
        .iter()
        .find(|p| p["employee_code"] == colleague.as_str())
        .and_then(|p| p["id"].as_str())
        .expect("colleague payslip")
        .to_string();

    let (token, _) = login(&app, "aline@example.com", "secret-pass").await;

    let (status, mine) = call(
        &app,
        "GET",
        &format!("/api/payslips/employee/{}", own),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine.as_array().map(Vec::len), Some(1));

    let (status, me) = call(&app, "GET", &format!("/api/employees/{}", own), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "aline@example.com");

    for uri in [
        format!("/api/payslips/employee/{}", colleague),
        format!("/api/payslips/{}/pdf", colleague_payslip),
        format!("/api/employments/employee/{}", colleague),
        format!("/api/employments/employee/{}/active", colleague),
        format!("/api/messages/employee/{}", colleague),
        format!("/api/employees/{}", colleague),
        "/api/employees".to_string(),
        "/api/employments/active".to_string(),
        "/api/payslips/period?month=6&year=2024".to_string(),
        "/api/messages/period?month=6&year=2024".to_string(),
        "/api/messages/unsent".to_string(),
    ] {
        let (status, _) = call(&app, "GET", &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{}", uri);
    }

    let (status, colleague_slips) = call(
        &app,
        "GET",
        &format!("/api/payslips/employee/{}", colleague),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(colleague_slips[0]["gross_salary"], "1035000.00");
}

#[tokio::test]
async fn payroll_month_end_to_end() {
    let app = seeded_app().await;
    let token = admin_token(&app).await;
    seed_rules(&app, &token).await;

    let (status, _) = call(
        &app,
        "POST",
        "/api/deductions",
        Some(&token),
        Some(json!({"name": "Housing", "percentage": "12"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let code = register_employee(&app, &token, "aline@example.com").await;

    let (status, _) = call(
        &app,
        "POST",
        "/api/employees",
        Some(&token),
        Some(json!({
            "first_name": "Other",
            "last_name": "Person",
            "email": "ALINE@example.com",
            "password": "secret-pass",
            "mobile": "+250788123457",
            "date_of_birth": "1991-04-12"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, first) = call(
        &app,
        "POST",
        "/api/employments",
        Some(&token),
        Some(json!({
            "employee_code": code,
            "department": "Finance",
            "position": "Accountant",
            "base_salary": "500000",
            "joining_date": "2023-01-01"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", first);

    let (status, second) = call(
        &app,
        "POST",
        "/api/employments",
        Some(&token),
        Some(json!({
            "employee_code": code,
            "department": "Finance",
            "position": "Senior Accountant",
            "base_salary": "1000000",
            "joining_date": "2024-01-01"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", second);
    assert_eq!(second["status"], "ACTIVE");
    assert_eq!(second["superseded"], json!([first["code"]]));

    let (_, active) = call(
        &app,
        "GET",
        &format!("/api/employments/employee/{}/active", code),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(active["code"], second["code"]);

    let (status, run) = call(
        &app,
        "POST",
        "/api/payslips/process",
        Some(&token),
        Some(json!({"month": 6, "year": 2024})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", run);
    let created = run["created"].as_array().expect("created");
    assert_eq!(created.len(), 1);
    assert_eq!(created[0]["status"], "PENDING");
    assert_eq!(created[0]["gross_salary"], "1150000.00");
    assert_eq!(created[0]["net_salary"], "890000.00");
    let payslip_id = created[0]["id"].as_str().expect("id").to_string();

    let (_, rerun) = call(
        &app,
        "POST",
        "/api/payslips/process",
        Some(&token),
        Some(json!({"month": 6, "year": 2024})),
    )
    .await;
    assert_eq!(rerun["created"], json!([]));
    assert_eq!(rerun["failures"][0]["employee_code"], code.as_str());
    assert_eq!(rerun["failures"][0]["kind"], "conflict");

    let (status, _) = call(
        &app,
        "POST",
        "/api/payslips/process",
        Some(&token),
        Some(json!({"month": 13, "year": 2024})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, approved) = call(
        &app,
        "POST",
        "/api/payslips/approve",
        Some(&token),
        Some(json!({"month": 6, "year": 2024})),
    )
    .await;
    assert_eq!(approved["approved"].as_array().map(Vec::len), Some(1));
    let (status, again) = call(
        &app,
        "POST",
        "/api/payslips/approve",
        Some(&token),
        Some(json!({"month": 6, "year": 2024})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again["approved"], json!([]));

    let (_, period) = call(
        &app,
        "GET",
        "/api/payslips/period?month=6&year=2024",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(period[0]["status"], "PAID");

    let (_, drafted) = call(
        &app,
        "POST",
        "/api/messages/draft",
        Some(&token),
        Some(json!({"month": 6, "year": 2024})),
    )
    .await;
    let body = drafted[0]["body"].as_str().expect("message body");
    assert!(body.starts_with("Dear Aline, your salary for 6/2024 from Rwanda Government"));
    assert!(body.contains("890000.00"));

    let (_, unsent) = call(&app, "GET", "/api/messages/unsent", Some(&token), None).await;
    assert_eq!(unsent.as_array().map(Vec::len), Some(1));

    let (_, report) = call(&app, "POST", "/api/messages/deliver", Some(&token), None).await;
    assert_eq!(report, json!({"attempted": 1, "delivered": 1, "failed": 0}));

    let (_, unsent) = call(&app, "GET", "/api/messages/unsent", Some(&token), None).await;
    assert_eq!(unsent, json!([]));

    let req = Request::builder()
        .uri(format!("/api/payslips/{}/pdf", payslip_id))
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .expect("request");
    let resp = app.clone().oneshot(req).await.expect("response");
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .expect("header")
        .contains(&code));

    let (status, _) = call(
        &app,
        "DELETE",
        &format!("/api/employees/{}", code),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}
