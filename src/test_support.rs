//! Shared fixtures for HTTP-level tests.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use time::{Duration, OffsetDateTime};
use tower::ServiceExt;

use crate::{
    app::build_app,
    auth::password::hash_password,
    db::{memory::MemoryStore, Store},
    drafting::{
        dto::{DraftRequest, DraftedMealPlan},
        DraftError, PlanDrafter,
    },
    plans::items::Meal,
    state::AppState,
    users::repo_types::{NewUser, User},
};

pub const TEST_ADMIN_CODE: &str = "coach-code";

/// Drafter that replies with a fixed plan, or fails when built with `failing()`.
pub struct ScriptedDrafter {
    reply: Option<DraftedMealPlan>,
    calls: AtomicUsize,
}

impl ScriptedDrafter {
    pub fn succeeding() -> Self {
        Self {
            reply: Some(DraftedMealPlan {
                title: "High protein day".into(),
                description: "Two big meals".into(),
                meals: vec![Meal {
                    name: "Chicken bowl".into(),
                    time: "12:00".into(),
                    calories: 650,
                    protein: 55.0,
                    carbs: 60.0,
                    fats: 18.0,
                    ingredients: "Chicken, rice, greens".into(),
                }],
                reasoning: "Protein split over the day".into(),
            }),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_title(title: &str) -> Self {
        let mut drafter = Self::succeeding();
        if let Some(plan) = drafter.reply.as_mut() {
            plan.title = title.into();
        }
        drafter
    }

    pub fn failing() -> Self {
        Self { reply: None, calls: AtomicUsize::new(0) }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PlanDrafter for ScriptedDrafter {
    async fn draft(&self, _req: &DraftRequest) -> Result<DraftedMealPlan, DraftError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Some(plan) => Ok(plan.clone()),
            None => Err(DraftError::Status { status: 503, body: "overloaded".into() }),
        }
    }
}

pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub state: AppState,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_drafter(Arc::new(ScriptedDrafter::failing()))
    }

    pub fn with_drafter(drafter: Arc<dyn PlanDrafter>) -> Self {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::fake(store.clone() as Arc<dyn Store>, drafter);
        Self { store, state }
    }

    pub fn router(&self) -> Router {
        build_app(self.state.clone())
    }

    pub async fn seed_user(&self, email: &str, password: &str, is_admin: bool) -> User {
        self.store
            .create_user(&NewUser {
                email: email.into(),
                password_hash: hash_password(password).unwrap(),
                full_name: String::new(),
                is_admin,
            })
            .await
            .unwrap()
    }

    pub fn token_for(&self, email: &str) -> String {
        self.state.jwt.issue(email).unwrap()
    }

    pub fn expired_token_for(&self, email: &str) -> String {
        let issued = OffsetDateTime::now_utc() - Duration::hours(2);
        self.state.jwt.issue_at(email, issued).unwrap()
    }
}

pub fn json_request(method: &str, path: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(v) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub fn form_request(path: &str, fields: &[(&str, &str)]) -> Request<Body> {
    let body = fields
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

/// Runs one request and returns the status with the JSON body (`Null` when empty).
pub async fn send(router: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let res = router.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}
