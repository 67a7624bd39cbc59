use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use metrics::counter;
use serde::Serialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use laborlink_core::types::{AssignmentRequest, Job, JobPatch, JobStatus, NewJob};
use laborlink_core::validate;
use laborlink_storage::JobStoreError;

use crate::assignment::AssignError;
use crate::problem::ProblemResponse;
use crate::router::AppState;

fn store_problem(err: JobStoreError) -> ProblemResponse {
    match err {
        JobStoreError::NotFound => {
            ProblemResponse::new(StatusCode::NOT_FOUND, "job_not_found", "job not found")
        }
        JobStoreError::Database(err) => ProblemResponse::internal(err),
    }
}

fn assign_problem(err: AssignError) -> ProblemResponse {
    match err {
        AssignError::JobNotFound => {
            ProblemResponse::new(StatusCode::NOT_FOUND, "job_not_found", "job not found")
        }
        AssignError::UnknownLaborers(numbers) => ProblemResponse::new(
            StatusCode::BAD_REQUEST,
            "unknown_laborers",
            format!("laborers not found for phone numbers: {numbers:?}"),
        )
        .with_invalid_numbers(numbers),
        AssignError::Unavailable(numbers) => ProblemResponse::new(
            StatusCode::BAD_REQUEST,
            "laborers_unavailable",
            format!("laborers are not available: {numbers:?}"),
        )
        .with_invalid_numbers(numbers),
        AssignError::Laborer(err) => ProblemResponse::internal(err),
        AssignError::Job(err) => ProblemResponse::internal(err),
        AssignError::Database(err) => ProblemResponse::internal(err),
    }
}

/// Response body of a successful assignment, mirroring the shape the
/// frontend consumes: a message, the updated job, and the numbers this
/// request assigned.
#[derive(Debug, Serialize)]
pub struct AssignResponse {
    pub message: String,
    pub job: Job,
    pub assigned_laborers: Vec<String>,
}

pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<NewJob>, JsonRejection>,
) -> Result<impl IntoResponse, ProblemResponse> {
    let Json(payload) = payload.map_err(ProblemResponse::bad_json)?;
    validate::new_job(&payload)?;

    let job = Job {
        job_id: Uuid::new_v4().to_string(),
        title: payload.title,
        description: payload.description,
        skill_required: payload.skill_required,
        location: payload.location,
        date: payload.date,
        time: payload.time,
        contact_number: payload.contact_number,
        status: JobStatus::Open,
        assigned_laborers: Vec::new(),
        created_at: state.now(),
    };

    state
        .storage()
        .jobs()
        .insert(&job)
        .await
        .map_err(store_problem)?;

    counter!("jobs_created_total").increment(1);
    info!(stage = "jobs", job_id = %job.job_id, skill = %job.skill_required, "job created");

    Ok((StatusCode::CREATED, Json(job)))
}

pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, ProblemResponse> {
    let jobs = state.storage().jobs().list().await.map_err(store_problem)?;
    Ok(Json(jobs))
}

pub async fn list_by_skill(
    State(state): State<AppState>,
    Path(skill): Path<String>,
) -> Result<impl IntoResponse, ProblemResponse> {
    let jobs = state
        .storage()
        .jobs()
        .list_by_skill(&skill)
        .await
        .map_err(store_problem)?;
    Ok(Json(jobs))
}

pub async fn get(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<impl IntoResponse, ProblemResponse> {
    let job = state
        .storage()
        .jobs()
        .fetch(&job_id)
        .await
        .map_err(store_problem)?;
    Ok(Json(job))
}

pub async fn update(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    payload: Result<Json<JobPatch>, JsonRejection>,
) -> Result<impl IntoResponse, ProblemResponse> {
    let Json(patch) = payload.map_err(ProblemResponse::bad_json)?;
    validate::job_patch(&patch)?;

    // No transition guard: any status value supplied here is applied,
    // including moves out of completed/cancelled.
    let job = state
        .storage()
        .jobs()
        .update(&job_id, &patch)
        .await
        .map_err(store_problem)?;
    Ok(Json(job))
}

pub async fn remove(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<impl IntoResponse, ProblemResponse> {
    state
        .assignment()
        .delete_job(&job_id)
        .await
        .map_err(assign_problem)?;

    Ok(Json(json!({ "message": "Job deleted successfully" })))
}

pub async fn assign(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    payload: Result<Json<AssignmentRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ProblemResponse> {
    let Json(request) = payload.map_err(ProblemResponse::bad_json)?;
    validate::assignment(&request)?;

    let outcome = state
        .assignment()
        .assign(&job_id, &request.phone_numbers)
        .await
        .map_err(assign_problem)?;

    let response = AssignResponse {
        message: format!(
            "Successfully assigned {} laborers to job",
            outcome.assigned.len()
        ),
        job: outcome.job,
        assigned_laborers: outcome.assigned,
    };
    Ok(Json(response))
}
