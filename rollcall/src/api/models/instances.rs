use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::models::instances::{ClassInstance, UpcomingInstance};
use crate::types::{InstanceId, InstructorId, MemberId, TemplateId};

#[derive(Debug, Deserialize, ToSchema)]
pub struct InstanceCreateRequest {
    #[schema(value_type = Uuid)]
    pub template_id: TemplateId,
    pub class_date: NaiveDate,
    pub room: i32,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct GenerateRequest {
    /// Days ahead to generate for; defaults to the configured window.
    pub window_days: Option<u64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GenerateResponse {
    pub created: u32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InstanceResponse {
    #[schema(value_type = Uuid)]
    pub id: InstanceId,
    #[schema(value_type = Uuid)]
    pub template_id: TemplateId,
    pub class_date: NaiveDate,
    pub room: i32,
    pub cancelled: bool,
    pub created_at: DateTime<Utc>,
}

impl From<ClassInstance> for InstanceResponse {
    fn from(instance: ClassInstance) -> Self {
        let cancelled = instance.is_cancelled();
        Self {
            id: instance.id,
            template_id: instance.template_id,
            class_date: instance.class_date,
            room: instance.room,
            cancelled,
            created_at: instance.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CancelInstanceResponse {
    /// Reservations cascade-cancelled along with the instance.
    pub cancelled_reservations: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UpcomingInstanceResponse {
    #[schema(value_type = Uuid)]
    pub id: InstanceId,
    #[schema(value_type = Uuid)]
    pub template_id: TemplateId,
    pub name: String,
    pub class_date: NaiveDate,
    pub room: i32,
    #[schema(value_type = String)]
    pub start_time: NaiveTime,
    #[schema(value_type = String)]
    pub end_time: NaiveTime,
    pub capacity: i32,
    pub reserved: i64,
    #[schema(value_type = Uuid)]
    pub instructor_id: InstructorId,
    pub instructor_name: String,
}

impl From<UpcomingInstance> for UpcomingInstanceResponse {
    fn from(row: UpcomingInstance) -> Self {
        Self {
            id: row.id,
            template_id: row.template_id,
            name: row.name,
            class_date: row.class_date,
            room: row.room,
            start_time: row.start_time,
            end_time: row.end_time,
            capacity: row.capacity,
            reserved: row.reserved,
            instructor_id: row.instructor_id,
            instructor_name: row.instructor_name,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AttendanceRequest {
    /// Members who showed up; everyone else with a live reservation is
    /// marked absent.
    #[schema(value_type = Vec<Uuid>)]
    pub present_member_ids: Vec<MemberId>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AttendanceResponse {
    pub present: u32,
    pub absent: u32,
}
