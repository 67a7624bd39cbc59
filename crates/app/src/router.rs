use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Router,
};
use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;

use laborlink_storage::Database;

use crate::assignment::AssignmentService;
use crate::{jobs, laborers, telemetry};

#[derive(Clone)]
pub struct AppState {
    metrics: PrometheusHandle,
    storage: Database,
    assignment: AssignmentService,
    clock: Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>,
}

impl AppState {
    pub fn new(metrics: PrometheusHandle, storage: Database) -> Self {
        let clock: Arc<dyn Fn() -> DateTime<Utc> + Send + Sync> = Arc::new(Utc::now);
        let assignment = AssignmentService::new(storage.clone(), clock.clone());
        Self {
            metrics,
            storage,
            assignment,
            clock,
        }
    }

    pub fn metrics(&self) -> &PrometheusHandle {
        &self.metrics
    }

    pub fn storage(&self) -> &Database {
        &self.storage
    }

    pub fn assignment(&self) -> &AssignmentService {
        &self.assignment
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .route("/api/laborers/register", post(laborers::register))
        .route("/api/laborers", get(laborers::list))
        .route("/api/laborers/skill/:skill", get(laborers::list_by_skill))
        .route(
            "/api/laborers/:id",
            get(laborers::get)
                .put(laborers::update)
                .delete(laborers::remove),
        )
        .route("/api/jobs/create", post(jobs::create))
        .route("/api/jobs", get(jobs::list))
        .route("/api/jobs/skill/:skill", get(jobs::list_by_skill))
        .route(
            "/api/jobs/:id",
            get(jobs::get).put(jobs::update).delete(jobs::remove),
        )
        .route("/api/jobs/:id/assign", patch(jobs::assign))
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let body = telemetry::render_metrics(state.metrics());
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/plain; version=0.0.4")
        .body(Body::from(body))
        .unwrap()
}
