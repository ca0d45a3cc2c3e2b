use axum::extract::{Path, State};
use axum::response::Json;
use chrono::NaiveDate;

use crate::api::models::instances::UpcomingInstanceResponse;
use crate::api::models::reservations::ReservationDetailResponse;
use crate::auth::Identity;
use crate::errors::Error;
use crate::services::{ReservationEngine, ScheduleQuery};
use crate::types::{InstructorId, Role};
use crate::AppState;

// GET /api/v1/schedule/{date} - all live classes on one day
#[utoipa::path(
    get,
    path = "/api/v1/schedule/{date}",
    tag = "schedule",
    params(("date" = String, Path, description = "Calendar day, e.g. 2026-03-02")),
    responses(
        (status = 200, description = "Classes on that day", body = [UpcomingInstanceResponse]),
        (status = 401, description = "Unauthorized"),
    )
)]
pub async fn day(
    State(state): State<AppState>,
    Path(date): Path<NaiveDate>,
    _identity: Identity,
) -> Result<Json<Vec<UpcomingInstanceResponse>>, Error> {
    let query = ScheduleQuery::new(state.db.clone());
    let instances = query.day_schedule(date).await?;
    Ok(Json(instances.into_iter().map(Into::into).collect()))
}

// GET /api/v1/instructors/{instructor_id}/schedule - upcoming classes by PT
#[utoipa::path(
    get,
    path = "/api/v1/instructors/{instructor_id}/schedule",
    tag = "schedule",
    params(("instructor_id" = uuid::Uuid, Path, description = "Instructor to read")),
    responses(
        (status = 200, description = "Upcoming classes for the instructor", body = [UpcomingInstanceResponse]),
        (status = 401, description = "Unauthorized"),
    )
)]
pub async fn instructor(
    State(state): State<AppState>,
    Path(instructor_id): Path<InstructorId>,
    _identity: Identity,
) -> Result<Json<Vec<UpcomingInstanceResponse>>, Error> {
    let query = ScheduleQuery::new(state.db.clone());
    let instances = query.instructor_schedule(instructor_id).await?;
    Ok(Json(instances.into_iter().map(Into::into).collect()))
}

// GET /api/v1/instructors/{instructor_id}/reservations - roster across classes
#[utoipa::path(
    get,
    path = "/api/v1/instructors/{instructor_id}/reservations",
    tag = "schedule",
    params(("instructor_id" = uuid::Uuid, Path, description = "Instructor to read")),
    responses(
        (status = 200, description = "Reservations against the instructor's classes", body = [ReservationDetailResponse]),
        (status = 403, description = "Instructor role required"),
    )
)]
pub async fn instructor_reservations(
    State(state): State<AppState>,
    Path(instructor_id): Path<InstructorId>,
    identity: Identity,
) -> Result<Json<Vec<ReservationDetailResponse>>, Error> {
    identity.require(Role::Instructor)?;
    let engine = ReservationEngine::new(state.db.clone(), state.policy);
    let rows = engine.list_for_instructor(instructor_id, None).await?;
    let responses = rows
        .into_iter()
        .map(TryInto::try_into)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(responses))
}
