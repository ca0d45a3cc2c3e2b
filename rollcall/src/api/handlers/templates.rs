use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;

use crate::api::models::templates::{
    ActiveStateRequest, AssignInstructorRequest, TemplateCreateRequest, TemplateListQuery,
    TemplateResponse, TemplateUpdateRequest, TemplateUpdateResponse,
};
use crate::auth::Identity;
use crate::db::models::templates::TemplateFilter;
use crate::errors::Error;
use crate::services::TemplateService;
use crate::types::{Role, TemplateId};
use crate::AppState;

// GET /api/v1/templates - list templates
#[utoipa::path(
    get,
    path = "/api/v1/templates",
    tag = "templates",
    params(TemplateListQuery),
    responses(
        (status = 200, description = "Matching templates", body = [TemplateResponse]),
        (status = 401, description = "Unauthorized"),
    )
)]
pub async fn list(
    State(state): State<AppState>,
    _identity: Identity,
    Query(query): Query<TemplateListQuery>,
) -> Result<Json<Vec<TemplateResponse>>, Error> {
    let service = TemplateService::new(state.db.clone(), state.policy);
    let templates = service
        .list(TemplateFilter {
            active: query.active,
            weekday: query.weekday,
            instructor_id: query.instructor_id,
        })
        .await?;
    Ok(Json(templates.into_iter().map(Into::into).collect()))
}

// POST /api/v1/templates - create template (manager only)
#[utoipa::path(
    post,
    path = "/api/v1/templates",
    tag = "templates",
    responses(
        (status = 201, description = "Template created", body = TemplateResponse),
        (status = 400, description = "Invalid weekday, time window or capacity"),
        (status = 403, description = "Manager role required"),
        (status = 409, description = "Overlapping template for this instructor"),
    )
)]
pub async fn create(
    State(state): State<AppState>,
    identity: Identity,
    Json(request): Json<TemplateCreateRequest>,
) -> Result<(StatusCode, Json<TemplateResponse>), Error> {
    identity.require(Role::Manager)?;
    let service = TemplateService::new(state.db.clone(), state.policy);
    let template = service.create(request.into()).await?;
    Ok((StatusCode::CREATED, Json(template.into())))
}

// PATCH /api/v1/templates/{template_id} - partial update (manager only)
#[utoipa::path(
    patch,
    path = "/api/v1/templates/{template_id}",
    tag = "templates",
    params(("template_id" = uuid::Uuid, Path, description = "Template to update")),
    responses(
        (status = 200, description = "Update outcome", body = TemplateUpdateResponse),
        (status = 404, description = "Template not found"),
        (status = 409, description = "Overlapping slot, or swap refused"),
    )
)]
pub async fn update(
    State(state): State<AppState>,
    Path(template_id): Path<TemplateId>,
    identity: Identity,
    Json(request): Json<TemplateUpdateRequest>,
) -> Result<Json<TemplateUpdateResponse>, Error> {
    identity.require(Role::Manager)?;
    let service = TemplateService::new(state.db.clone(), state.policy);
    let outcome = service.update(template_id, request.into()).await?;
    Ok(Json(outcome.into()))
}

// PUT /api/v1/templates/{template_id}/instructor - reassign (manager only)
#[utoipa::path(
    put,
    path = "/api/v1/templates/{template_id}/instructor",
    tag = "templates",
    params(("template_id" = uuid::Uuid, Path, description = "Template to reassign")),
    responses(
        (status = 200, description = "Template with its new instructor", body = TemplateResponse),
        (status = 400, description = "Not an instructor, or a no-op reassignment"),
        (status = 404, description = "Template or instructor not found"),
        (status = 409, description = "Instructor has an overlapping template"),
    )
)]
pub async fn assign_instructor(
    State(state): State<AppState>,
    Path(template_id): Path<TemplateId>,
    identity: Identity,
    Json(request): Json<AssignInstructorRequest>,
) -> Result<Json<TemplateResponse>, Error> {
    identity.require(Role::Manager)?;
    let service = TemplateService::new(state.db.clone(), state.policy);
    let template = service
        .assign_instructor(template_id, request.instructor_id)
        .await?;
    Ok(Json(template.into()))
}

// PUT /api/v1/templates/{template_id}/active - toggle (manager only)
#[utoipa::path(
    put,
    path = "/api/v1/templates/{template_id}/active",
    tag = "templates",
    params(("template_id" = uuid::Uuid, Path, description = "Template to toggle")),
    responses(
        (status = 200, description = "State changed"),
        (status = 204, description = "Already in the requested state"),
        (status = 404, description = "Template not found"),
    )
)]
pub async fn change_active_state(
    State(state): State<AppState>,
    Path(template_id): Path<TemplateId>,
    identity: Identity,
    Json(request): Json<ActiveStateRequest>,
) -> Result<StatusCode, Error> {
    identity.require(Role::Manager)?;
    let service = TemplateService::new(state.db.clone(), state.policy);
    let changed = service
        .change_active_state(template_id, request.active)
        .await?;
    Ok(if changed {
        StatusCode::OK
    } else {
        StatusCode::NO_CONTENT
    })
}
