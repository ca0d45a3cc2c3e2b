use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;

use crate::api::models::reservations::{
    ReservationDetailResponse, ReservationResponse, ReserveRequest,
};
use crate::auth::Identity;
use crate::errors::Error;
use crate::services::ReservationEngine;
use crate::types::{InstanceId, MemberId, Role};
use crate::AppState;

// POST /api/v1/reservations - book a seat for the calling member
#[utoipa::path(
    post,
    path = "/api/v1/reservations",
    tag = "reservations",
    responses(
        (status = 201, description = "Seat reserved", body = ReservationResponse),
        (status = 403, description = "Member role required"),
        (status = 404, description = "Class not found"),
        (status = 422, description = "Class full, cancelled, duplicate booking or outside the booking window"),
        (status = 503, description = "Concurrent booking conflict, retry"),
    )
)]
pub async fn reserve(
    State(state): State<AppState>,
    identity: Identity,
    Json(request): Json<ReserveRequest>,
) -> Result<(StatusCode, Json<ReservationResponse>), Error> {
    identity.require(Role::Member)?;
    let engine = ReservationEngine::new(state.db.clone(), state.policy);
    let reservation = engine.reserve(identity.user_id, request.instance_id).await?;
    Ok((StatusCode::CREATED, Json(reservation.into())))
}

// DELETE /api/v1/reservations/{instance_id} - cancel the caller's booking
#[utoipa::path(
    delete,
    path = "/api/v1/reservations/{instance_id}",
    tag = "reservations",
    params(("instance_id" = uuid::Uuid, Path, description = "Class the booking is against")),
    responses(
        (status = 204, description = "Reservation cancelled"),
        (status = 404, description = "No live reservation for this class"),
        (status = 422, description = "Class is today or already held"),
    )
)]
pub async fn cancel(
    State(state): State<AppState>,
    Path(instance_id): Path<InstanceId>,
    identity: Identity,
) -> Result<StatusCode, Error> {
    identity.require(Role::Member)?;
    let engine = ReservationEngine::new(state.db.clone(), state.policy);
    engine.cancel(identity.user_id, instance_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// GET /api/v1/members/{member_id}/reservations - a member's agenda
#[utoipa::path(
    get,
    path = "/api/v1/members/{member_id}/reservations",
    tag = "reservations",
    params(("member_id" = uuid::Uuid, Path, description = "Member whose agenda to read")),
    responses(
        (status = 200, description = "Reservations with class details", body = [ReservationDetailResponse]),
        (status = 403, description = "Members may only read their own agenda"),
    )
)]
pub async fn member_agenda(
    State(state): State<AppState>,
    Path(member_id): Path<MemberId>,
    identity: Identity,
) -> Result<Json<Vec<ReservationDetailResponse>>, Error> {
    if member_id != identity.user_id {
        identity.require(Role::Manager)?;
    }
    let engine = ReservationEngine::new(state.db.clone(), state.policy);
    let rows = engine.list_for_member(member_id).await?;
    let responses = rows
        .into_iter()
        .map(TryInto::try_into)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(responses))
}
