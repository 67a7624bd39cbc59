use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use metrics::counter;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use laborlink_core::types::{Laborer, LaborerPatch, NewLaborer};
use laborlink_core::validate;
use laborlink_storage::LaborerStoreError;

use crate::problem::ProblemResponse;
use crate::router::AppState;

fn store_problem(err: LaborerStoreError) -> ProblemResponse {
    match err {
        LaborerStoreError::DuplicatePhone => ProblemResponse::new(
            StatusCode::CONFLICT,
            "duplicate_phone",
            "a laborer with this phone number already exists",
        ),
        LaborerStoreError::NotFound => {
            ProblemResponse::new(StatusCode::NOT_FOUND, "laborer_not_found", "laborer not found")
        }
        LaborerStoreError::Database(err) => ProblemResponse::internal(err),
    }
}

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<NewLaborer>, JsonRejection>,
) -> Result<impl IntoResponse, ProblemResponse> {
    let Json(payload) = payload.map_err(ProblemResponse::bad_json)?;
    validate::new_laborer(&payload)?;

    let laborer = Laborer {
        id: Uuid::new_v4().to_string(),
        name: payload.name,
        phone: payload.phone,
        skill: payload.skill,
        location: payload.location,
        language: payload.language,
        available: true,
        registered_at: state.now(),
    };

    state
        .storage()
        .laborers()
        .insert(&laborer)
        .await
        .map_err(store_problem)?;

    counter!("laborers_registered_total").increment(1);
    info!(stage = "laborers", id = %laborer.id, skill = %laborer.skill, "laborer registered");

    Ok((StatusCode::CREATED, Json(laborer)))
}

pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, ProblemResponse> {
    let laborers = state
        .storage()
        .laborers()
        .list()
        .await
        .map_err(store_problem)?;
    Ok(Json(laborers))
}

pub async fn list_by_skill(
    State(state): State<AppState>,
    Path(skill): Path<String>,
) -> Result<impl IntoResponse, ProblemResponse> {
    let laborers = state
        .storage()
        .laborers()
        .list_by_skill(&skill)
        .await
        .map_err(store_problem)?;
    Ok(Json(laborers))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ProblemResponse> {
    let laborer = state
        .storage()
        .laborers()
        .fetch(&id)
        .await
        .map_err(store_problem)?;
    Ok(Json(laborer))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<LaborerPatch>, JsonRejection>,
) -> Result<impl IntoResponse, ProblemResponse> {
    let Json(patch) = payload.map_err(ProblemResponse::bad_json)?;
    validate::laborer_patch(&patch)?;

    let laborer = state
        .storage()
        .laborers()
        .update(&id, &patch)
        .await
        .map_err(store_problem)?;
    Ok(Json(laborer))
}

pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ProblemResponse> {
    // Deletion is unconditional: jobs referencing this phone keep their
    // assignment rows. Known consistency gap inherited from the source
    // system.
    state
        .storage()
        .laborers()
        .delete(&id)
        .await
        .map_err(store_problem)?;

    info!(stage = "laborers", id = %id, "laborer deleted");
    Ok(Json(json!({ "message": "Laborer deleted successfully" })))
}
