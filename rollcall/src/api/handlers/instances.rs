use std::collections::HashSet;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;

use crate::api::models::instances::{
    AttendanceRequest, AttendanceResponse, CancelInstanceResponse, GenerateRequest,
    GenerateResponse, InstanceCreateRequest, InstanceResponse, UpcomingInstanceResponse,
};
use crate::api::models::reservations::ReservationResponse;
use crate::auth::Identity;
use crate::errors::Error;
use crate::services::{InstanceScheduler, ReservationEngine};
use crate::types::{InstanceId, Role};
use crate::AppState;

// POST /api/v1/instances - schedule a single dated class (instructor only)
#[utoipa::path(
    post,
    path = "/api/v1/instances",
    tag = "instances",
    responses(
        (status = 201, description = "Instance scheduled", body = InstanceResponse),
        (status = 400, description = "Unknown template or invalid room"),
        (status = 403, description = "Instructor role required"),
        (status = 409, description = "Weekday mismatch, duplicate date or room conflict"),
    )
)]
pub async fn create(
    State(state): State<AppState>,
    identity: Identity,
    Json(request): Json<InstanceCreateRequest>,
) -> Result<(StatusCode, Json<InstanceResponse>), Error> {
    identity.require(Role::Instructor)?;
    let scheduler = InstanceScheduler::new(state.db.clone(), state.policy);
    let instance = scheduler
        .create_instance(request.template_id, request.class_date, request.room)
        .await?;
    Ok((StatusCode::CREATED, Json(instance.into())))
}

// POST /api/v1/instances/generate - bulk generation for the calling instructor
#[utoipa::path(
    post,
    path = "/api/v1/instances/generate",
    tag = "instances",
    responses(
        (status = 200, description = "Count of instances created", body = GenerateResponse),
        (status = 403, description = "Instructor role required"),
        (status = 422, description = "No active templates for this instructor"),
    )
)]
pub async fn generate(
    State(state): State<AppState>,
    identity: Identity,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, Error> {
    identity.require(Role::Instructor)?;
    let scheduler = InstanceScheduler::new(state.db.clone(), state.policy);
    let created = scheduler
        .generate_for_instructor(identity.user_id, request.window_days)
        .await?;
    Ok(Json(GenerateResponse { created }))
}

// GET /api/v1/instances/upcoming - live instances from today on
#[utoipa::path(
    get,
    path = "/api/v1/instances/upcoming",
    tag = "instances",
    responses(
        (status = 200, description = "Upcoming classes", body = [UpcomingInstanceResponse]),
        (status = 401, description = "Unauthorized"),
    )
)]
pub async fn upcoming(
    State(state): State<AppState>,
    _identity: Identity,
) -> Result<Json<Vec<UpcomingInstanceResponse>>, Error> {
    let scheduler = InstanceScheduler::new(state.db.clone(), state.policy);
    let instances = scheduler.list_upcoming().await?;
    Ok(Json(instances.into_iter().map(Into::into).collect()))
}

// DELETE /api/v1/instances/{instance_id} - cancel, cascading to reservations
#[utoipa::path(
    delete,
    path = "/api/v1/instances/{instance_id}",
    tag = "instances",
    params(("instance_id" = uuid::Uuid, Path, description = "Instance to cancel")),
    responses(
        (status = 200, description = "Cancelled; body carries the cascade count", body = CancelInstanceResponse),
        (status = 404, description = "Instance not found"),
        (status = 422, description = "Already cancelled"),
    )
)]
pub async fn cancel(
    State(state): State<AppState>,
    Path(instance_id): Path<InstanceId>,
    identity: Identity,
) -> Result<Json<CancelInstanceResponse>, Error> {
    identity.require(Role::Instructor)?;
    let scheduler = InstanceScheduler::new(state.db.clone(), state.policy);
    let cancelled_reservations = scheduler.cancel_instance(instance_id).await?;
    Ok(Json(CancelInstanceResponse {
        cancelled_reservations,
    }))
}

// GET /api/v1/instances/{instance_id}/reservations - roster (instructor only)
#[utoipa::path(
    get,
    path = "/api/v1/instances/{instance_id}/reservations",
    tag = "instances",
    params(("instance_id" = uuid::Uuid, Path, description = "Instance to inspect")),
    responses(
        (status = 200, description = "All reservations on the instance", body = [ReservationResponse]),
        (status = 403, description = "Instructor role required"),
    )
)]
pub async fn reservations(
    State(state): State<AppState>,
    Path(instance_id): Path<InstanceId>,
    identity: Identity,
) -> Result<Json<Vec<ReservationResponse>>, Error> {
    identity.require(Role::Instructor)?;
    let engine = ReservationEngine::new(state.db.clone(), state.policy);
    let rows = engine.list_for_instance(instance_id).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

// PUT /api/v1/instances/{instance_id}/attendance - bulk marking
#[utoipa::path(
    put,
    path = "/api/v1/instances/{instance_id}/attendance",
    tag = "instances",
    params(("instance_id" = uuid::Uuid, Path, description = "Instance to mark")),
    responses(
        (status = 200, description = "Attendance recorded", body = AttendanceResponse),
        (status = 404, description = "Instance not found"),
        (status = 422, description = "Cancelled, not yet held, or no reservations"),
    )
)]
pub async fn mark_attendance(
    State(state): State<AppState>,
    Path(instance_id): Path<InstanceId>,
    identity: Identity,
    Json(request): Json<AttendanceRequest>,
) -> Result<Json<AttendanceResponse>, Error> {
    identity.require(Role::Instructor)?;
    let engine = ReservationEngine::new(state.db.clone(), state.policy);
    let present: HashSet<_> = request.present_member_ids.into_iter().collect();
    let summary = engine.mark_attendance(instance_id, present).await?;
    Ok(Json(AttendanceResponse {
        present: summary.present,
        absent: summary.absent,
    }))
}
