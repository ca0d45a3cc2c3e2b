use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::types::InstructorId;

/// Instructor record owned by the external membership system; read-only here.
#[derive(Debug, Clone, FromRow)]
pub struct Instructor {
    pub id: InstructorId,
    pub name: String,
    pub role: String,
    pub deactivated_at: Option<DateTime<Utc>>,
}

impl Instructor {
    /// Whether this person may own class templates.
    pub fn is_qualified(&self) -> bool {
        self.deactivated_at.is_none() && self.role == "instructor"
    }
}
