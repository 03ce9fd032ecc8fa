//! HTTP-level tests: the full router over in-memory services.

mod common;

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

use common::{MemoryUnitOfWork, RecordingMailer};
use green_campus::api::{create_router, AppState};
use green_campus::config::Config;
use green_campus::domain::{EnergyCategory, PricingEngine, SensorPayload, UserRole};
use green_campus::services::{
    AuthService, Authenticator, EnergyAnalytics, EnergyService, InventoryManager, RewardsManager,
    Services,
};

struct TestApp {
    router: Router,
    auth: Arc<dyn AuthService>,
    energy: Arc<dyn EnergyService>,
}

impl TestApp {
    fn new() -> Self {
        let uow = Arc::new(MemoryUnitOfWork::default());
        let mailer = Arc::new(RecordingMailer::default());

        let auth: Arc<dyn AuthService> = Arc::new(Authenticator::new(
            uow.clone(),
            mailer.clone(),
            Config::for_testing(),
        ));
        let energy: Arc<dyn EnergyService> = Arc::new(EnergyAnalytics::new(uow.clone()));
        let services = Services::new(
            auth.clone(),
            Arc::new(InventoryManager::new(uow.clone(), PricingEngine::default())),
            Arc::new(RewardsManager::new(uow, mailer)),
            energy.clone(),
        );

        Self {
            router: create_router(AppState::from_container(&services)),
            auth,
            energy,
        }
    }

    /// Sign up, verify and log in; returns the bearer token.
    async fn token_for(&self, email: &str, role: UserRole) -> String {
        let user = self
            .auth
            .signup(email.into(), "long-enough-1".into(), role)
            .await
            .unwrap();
        let code = user.otp.as_ref().unwrap().code().to_string();
        self.auth.verify_email(email, &code).await.unwrap();
        self.auth
            .login(email.into(), "long-enough-1".into())
            .await
            .unwrap()
            .access_token
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::String(
            String::from_utf8_lossy(&bytes).into_owned(),
        ));
        (status, body)
    }
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

fn post_json(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn root_and_health_need_no_infrastructure() {
    let app = TestApp::new();

    let (status, body) = app.send(get("/", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("Green Campus API".into()));

    let (status, body) = app.send(get("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["services"]["database"]["status"], "not configured");
    assert_eq!(body["services"]["redis"]["status"], "not configured");
}

#[tokio::test]
async fn unknown_routes_return_the_json_error() {
    let app = TestApp::new();
    let (status, body) = app.send(get("/no/such/page", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn protected_routes_require_a_bearer_token() {
    let app = TestApp::new();

    let (status, body) = app.send(get("/account", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let (status, _) = app.send(get("/rewards", Some("not-a-jwt"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn inventory_is_vendor_only() {
    let app = TestApp::new();
    let student = app.token_for("student@campus.ac.uk", UserRole::Normal).await;
    let vendor = app.token_for("cafe@campus.ac.uk", UserRole::Vendor).await;

    let (status, _) = app.send(get("/products", Some(&student))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.send(get("/products", Some(&vendor))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let tomorrow = (Utc::now() + Duration::days(2)).date_naive();
    let (status, body) = app
        .send(post_json(
            "/products",
            Some(&vendor),
            json!({
                "name": "Sourdough",
                "category": "bakery",
                "expiry_date": tomorrow,
                "units": 3,
                "marked_price": "4.00",
                "location": "Student Union"
            }),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "Sourdough");

    let (status, body) = app.send(get("/offers/bakery", Some(&student))).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
}

#[tokio::test]
async fn signup_creates_an_unverified_account() {
    let app = TestApp::new();
    let request = json!({"email": "new@campus.ac.uk", "password": "long-enough-1"});

    let (status, body) = app.send(post_json("/auth/signup", None, request.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["email"], "new@campus.ac.uk");
    assert!(body.get("password_hash").is_none());

    let (status, body) = app.send(post_json("/auth/signup", None, request)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");

    let (status, body) = app
        .send(post_json(
            "/auth/login",
            None,
            json!({"email": "new@campus.ac.uk", "password": "long-enough-1"}),
        ))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "EMAIL_NOT_VERIFIED");
}

#[tokio::test]
async fn malformed_signup_is_a_validation_error() {
    let app = TestApp::new();
    let (status, body) = app
        .send(post_json("/auth/signup", None, json!({"email": "nope", "password": "x"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn energy_chart_returns_traces_per_building() {
    let app = TestApp::new();
    let token = app.token_for("viewer@campus.ac.uk", UserRole::Normal).await;

    let payload = SensorPayload {
        timestamp: Utc::now() - Duration::hours(2),
        building: "Engineering".into(),
        building_code: "ENG".into(),
        zone: "North".into(),
        value: 512.25,
    };
    app.energy
        .ingest(vec![
            (EnergyCategory::Electricity, payload.clone()),
            (EnergyCategory::Gas, payload),
        ])
        .await
        .unwrap();

    let (status, body) = app
        .send(post_json(
            "/get_energy_data",
            Some(&token),
            json!({"buildings": ["Engineering"], "energy_type": "both"}),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    let traces = body["traces"].as_array().unwrap();
    assert_eq!(traces.len(), 2);
    assert_eq!(traces[0]["name"], "Engineering - Electricity");
    assert_eq!(traces[0]["type"], "scatter");

    let (status, body) = app
        .send(post_json(
            "/get_co2_energy_data",
            Some(&token),
            json!({"buildings": ["Unknown Hall"]}),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"traces": []}));
}
