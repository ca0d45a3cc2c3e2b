use chrono::{DateTime, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::db::models::templates::ClassTemplate;
use crate::services::{TemplateCreate, TemplateUpdate, UpdateOutcome};
use crate::types::{InstructorId, TemplateId};

#[derive(Debug, Deserialize, ToSchema)]
pub struct TemplateCreateRequest {
    #[schema(value_type = Uuid)]
    pub instructor_id: InstructorId,
    pub name: String,
    #[schema(value_type = String, example = "tue")]
    pub weekday: Weekday,
    #[schema(value_type = String, example = "18:00:00")]
    pub start_time: NaiveTime,
    #[schema(value_type = String, example = "19:00:00")]
    pub end_time: NaiveTime,
    pub capacity: i32,
}

impl From<TemplateCreateRequest> for TemplateCreate {
    fn from(request: TemplateCreateRequest) -> Self {
        Self {
            instructor_id: request.instructor_id,
            name: request.name,
            weekday: request.weekday,
            start_time: request.start_time,
            end_time: request.end_time,
            capacity: request.capacity,
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct TemplateUpdateRequest {
    pub name: Option<String>,
    #[schema(value_type = Option<String>, example = "wed")]
    pub weekday: Option<Weekday>,
    #[schema(value_type = Option<String>)]
    pub start_time: Option<NaiveTime>,
    #[schema(value_type = Option<String>)]
    pub end_time: Option<NaiveTime>,
    pub capacity: Option<i32>,
    #[schema(value_type = Option<Uuid>)]
    pub instructor_id: Option<InstructorId>,
    #[serde(default)]
    pub force_swap: bool,
}

impl From<TemplateUpdateRequest> for TemplateUpdate {
    fn from(request: TemplateUpdateRequest) -> Self {
        Self {
            name: request.name,
            weekday: request.weekday,
            start_time: request.start_time,
            end_time: request.end_time,
            capacity: request.capacity,
            instructor_id: request.instructor_id,
            force_swap: request.force_swap,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignInstructorRequest {
    #[schema(value_type = Uuid)]
    pub instructor_id: InstructorId,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ActiveStateRequest {
    pub active: bool,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TemplateListQuery {
    /// Filter by active state.
    pub active: Option<bool>,
    /// Filter by weekday, e.g. `tue`.
    #[param(value_type = Option<String>)]
    pub weekday: Option<Weekday>,
    /// Filter by owning instructor.
    #[param(value_type = Option<Uuid>)]
    pub instructor_id: Option<InstructorId>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TemplateResponse {
    #[schema(value_type = Uuid)]
    pub id: TemplateId,
    #[schema(value_type = Uuid)]
    pub instructor_id: InstructorId,
    pub name: String,
    #[schema(value_type = String, example = "tue")]
    pub weekday: Weekday,
    #[schema(value_type = String)]
    pub start_time: NaiveTime,
    #[schema(value_type = String)]
    pub end_time: NaiveTime,
    pub capacity: i32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<ClassTemplate> for TemplateResponse {
    fn from(template: ClassTemplate) -> Self {
        let active = template.is_active();
        Self {
            id: template.id,
            instructor_id: template.instructor_id,
            name: template.name,
            weekday: template.weekday,
            start_time: template.start_time,
            end_time: template.end_time,
            capacity: template.capacity,
            active,
            created_at: template.created_at,
        }
    }
}

/// Typed outcome of a template update.
#[derive(Debug, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TemplateUpdateResponse {
    NoChanges,
    Updated { template: TemplateResponse },
    Swapped { template: TemplateResponse, with: Uuid },
}

impl From<UpdateOutcome> for TemplateUpdateResponse {
    fn from(outcome: UpdateOutcome) -> Self {
        match outcome {
            UpdateOutcome::NoChanges => TemplateUpdateResponse::NoChanges,
            UpdateOutcome::Updated(template) => TemplateUpdateResponse::Updated {
                template: template.into(),
            },
            UpdateOutcome::Swapped { template, with } => TemplateUpdateResponse::Swapped {
                template: template.into(),
                with,
            },
        }
    }
}
