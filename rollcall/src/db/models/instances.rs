use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::FromRow;

use crate::types::{InstanceId, InstructorId, TemplateId};

/// Database request for creating a dated instance of a template.
#[derive(Debug, Clone)]
pub struct InstanceCreateDBRequest {
    pub template_id: TemplateId,
    pub class_date: NaiveDate,
    pub room: i32,
}

/// One concrete occurrence of a template on a calendar date.
#[derive(Debug, Clone, FromRow)]
pub struct ClassInstance {
    pub id: InstanceId,
    pub template_id: TemplateId,
    pub class_date: NaiveDate,
    pub room: i32,
    pub deactivated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ClassInstance {
    pub fn is_cancelled(&self) -> bool {
        self.deactivated_at.is_some()
    }
}

/// Occupied slot in a room on a given date, joined with its template window.
#[derive(Debug, Clone, FromRow)]
pub struct RoomOccupancy {
    pub instance_id: InstanceId,
    pub room: i32,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

/// Upcoming-schedule projection row: instance annotated with its template
/// window, owning instructor and live reservation count.
#[derive(Debug, Clone, FromRow)]
pub struct UpcomingInstance {
    pub id: InstanceId,
    pub template_id: TemplateId,
    pub name: String,
    pub class_date: NaiveDate,
    pub room: i32,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub capacity: i32,
    pub instructor_id: InstructorId,
    pub instructor_name: String,
    pub reserved: i64,
}
