use chrono::{DateTime, NaiveTime, Utc, Weekday};
use sqlx::FromRow;

use crate::errors::{Error, Result};
use crate::types::{InstructorId, TemplateId};

/// Database request for creating a new class template.
#[derive(Debug, Clone)]
pub struct TemplateCreateDBRequest {
    pub instructor_id: InstructorId,
    pub name: String,
    pub weekday: Weekday,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub capacity: i32,
}

/// The (weekday, start, end) slot of a template, exchanged during a swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateSlot {
    pub weekday: Weekday,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

/// Listing filter; `None` fields are not constrained.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateFilter {
    pub active: Option<bool>,
    pub weekday: Option<Weekday>,
    pub instructor_id: Option<InstructorId>,
}

/// A recurring weekly class definition.
#[derive(Debug, Clone)]
pub struct ClassTemplate {
    pub id: TemplateId,
    pub instructor_id: InstructorId,
    pub name: String,
    pub weekday: Weekday,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub capacity: i32,
    pub deactivated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ClassTemplate {
    pub fn is_active(&self) -> bool {
        self.deactivated_at.is_none()
    }

    pub fn slot(&self) -> TemplateSlot {
        TemplateSlot {
            weekday: self.weekday,
            start_time: self.start_time,
            end_time: self.end_time,
        }
    }
}

/// Raw row as stored; weekday is an ISO number (1 = Monday .. 7 = Sunday).
#[derive(Debug, FromRow)]
pub struct TemplateRow {
    pub id: TemplateId,
    pub instructor_id: InstructorId,
    pub name: String,
    pub weekday: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub capacity: i32,
    pub deactivated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<TemplateRow> for ClassTemplate {
    type Error = Error;

    fn try_from(row: TemplateRow) -> Result<Self> {
        Ok(ClassTemplate {
            id: row.id,
            instructor_id: row.instructor_id,
            name: row.name,
            weekday: weekday_from_db(row.weekday)?,
            start_time: row.start_time,
            end_time: row.end_time,
            capacity: row.capacity,
            deactivated_at: row.deactivated_at,
            created_at: row.created_at,
        })
    }
}

pub fn weekday_to_db(weekday: Weekday) -> i16 {
    weekday.number_from_monday() as i16
}

pub fn weekday_from_db(value: i16) -> Result<Weekday> {
    match value {
        1 => Ok(Weekday::Mon),
        2 => Ok(Weekday::Tue),
        3 => Ok(Weekday::Wed),
        4 => Ok(Weekday::Thu),
        5 => Ok(Weekday::Fri),
        6 => Ok(Weekday::Sat),
        7 => Ok(Weekday::Sun),
        other => Err(Error::Internal(format!("invalid weekday in store: {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weekday_mapping_round_trips() {
        for weekday in [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
            Weekday::Sun,
        ] {
            assert_eq!(weekday_from_db(weekday_to_db(weekday)).unwrap(), weekday);
        }
        assert!(weekday_from_db(0).is_err());
        assert!(weekday_from_db(8).is_err());
    }
}
