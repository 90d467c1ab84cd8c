use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{error, info, instrument};

use crate::{
    auth::{
        authorize::{authorize, require_user},
        identity::Identity,
        middleware::CurrentIdentity,
    },
    error::{AppError, Result},
    state::AppState,
    workouts::{
        dto::{
            CreateWorkoutRequest, Pagination, UpdateWorkoutRequest, WorkoutListResponse,
            WorkoutResponse,
        },
        repo_types::WorkoutEntry,
    },
};

pub fn workout_routes() -> Router<AppState> {
    Router::new()
        .route("/workouts", get(list_workouts).post(create_workout))
        .route(
            "/workouts/:id",
            get(get_workout).put(update_workout).delete(delete_workout),
        )
}

fn validate_entries(entries: &[WorkoutEntry]) -> Result<()> {
    for entry in entries {
        if entry.exercise_name.trim().is_empty() {
            return Err(AppError::Validation("exercise_name is required".into()));
        }
        if entry.reps.is_some() == entry.duration_seconds.is_some() {
            return Err(AppError::Validation(
                "each entry needs exactly one of reps or duration_seconds".into(),
            ));
        }
    }
    Ok(())
}

/// Check that the caller may mutate workout `id`.
///
/// Order matters: anonymous callers are turned away first, a missing workout
/// is reported next, and only then is the persisted owner compared.
async fn ensure_owner(state: &AppState, identity: &Identity, id: i64) -> Result<()> {
    require_user(identity)?;
    let owner_id = state
        .workouts
        .get_owner_id(id)
        .await?
        .ok_or(AppError::NotFound("workout"))?;
    authorize(identity, owner_id).into_result()?;
    Ok(())
}

#[instrument(skip(state, identity))]
pub async fn list_workouts(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    Query(p): Query<Pagination>,
) -> Result<Json<WorkoutListResponse>> {
    let user = require_user(&identity)?;
    let (limit, offset) = p.clamped();
    let workouts = state
        .workouts
        .list_by_user(user.id, limit, offset)
        .await
        .map_err(|e| {
            error!(error = %e, user_id = user.id, "list_workouts failed");
            AppError::Internal(e)
        })?;
    Ok(Json(WorkoutListResponse { workouts }))
}

#[instrument(skip(state, _identity))]
pub async fn get_workout(
    State(state): State<AppState>,
    CurrentIdentity(_identity): CurrentIdentity,
    Path(id): Path<i64>,
) -> Result<Json<WorkoutResponse>> {
    let workout = state
        .workouts
        .get_workout_by_id(id)
        .await?
        .ok_or(AppError::NotFound("workout"))?;
    Ok(Json(WorkoutResponse { workout }))
}

#[instrument(skip(state, identity, payload))]
pub async fn create_workout(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    Json(payload): Json<CreateWorkoutRequest>,
) -> Result<(StatusCode, Json<WorkoutResponse>)> {
    let user = require_user(&identity)?;
    if payload.title.trim().is_empty() {
        return Err(AppError::Validation("title is required".into()));
    }
    validate_entries(&payload.entries)?;

    let workout = state
        .workouts
        .create_workout(user.id, &payload.into())
        .await
        .map_err(|e| {
            error!(error = %e, user_id = user.id, "create_workout failed");
            AppError::Internal(e)
        })?;

    info!(workout_id = workout.id, user_id = user.id, "workout created");
    Ok((StatusCode::CREATED, Json(WorkoutResponse { workout })))
}

#[instrument(skip(state, identity, payload))]
pub async fn update_workout(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateWorkoutRequest>,
) -> Result<Json<WorkoutResponse>> {
    ensure_owner(&state, &identity, id).await?;

    let mut workout = state
        .workouts
        .get_workout_by_id(id)
        .await?
        .ok_or(AppError::NotFound("workout"))?;

    payload.apply(&mut workout);
    if workout.title.trim().is_empty() {
        return Err(AppError::Validation("title is required".into()));
    }
    validate_entries(&workout.entries)?;

    let workout = state
        .workouts
        .update_workout(&workout)
        .await
        .map_err(|e| {
            error!(error = %e, workout_id = id, "update_workout failed");
            AppError::Internal(e)
        })?
        .ok_or(AppError::NotFound("workout"))?;

    info!(workout_id = id, "workout updated");
    Ok(Json(WorkoutResponse { workout }))
}

#[instrument(skip(state, identity))]
pub async fn delete_workout(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    ensure_owner(&state, &identity, id).await?;

    let deleted = state.workouts.delete_workout(id).await.map_err(|e| {
        error!(error = %e, workout_id = id, "delete_workout failed");
        AppError::Internal(e)
    })?;
    if !deleted {
        return Err(AppError::NotFound("workout"));
    }

    info!(workout_id = id, "workout deleted");
    Ok(StatusCode::NO_CONTENT)
}
