use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::FromRow;

use crate::errors::{Error, Result};
use crate::schedule::AttendanceState;
use crate::types::{InstanceId, MemberId, ReservationId};

/// A member's seat claim against one class instance.
#[derive(Debug, Clone)]
pub struct Reservation {
    pub id: ReservationId,
    pub instance_id: InstanceId,
    pub member_id: MemberId,
    pub state: AttendanceState,
    pub reserved_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Raw row; state is stored as text.
#[derive(Debug, FromRow)]
pub struct ReservationRow {
    pub id: ReservationId,
    pub instance_id: InstanceId,
    pub member_id: MemberId,
    pub state: String,
    pub reserved_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ReservationRow> for Reservation {
    type Error = Error;

    fn try_from(row: ReservationRow) -> Result<Self> {
        let state = row
            .state
            .parse::<AttendanceState>()
            .map_err(Error::Internal)?;
        Ok(Reservation {
            id: row.id,
            instance_id: row.instance_id,
            member_id: row.member_id,
            state,
            reserved_at: row.reserved_at,
            updated_at: row.updated_at,
        })
    }
}

/// Member-agenda projection row: reservation joined with its class details.
#[derive(Debug, FromRow)]
pub struct MemberReservationRow {
    pub id: ReservationId,
    pub instance_id: InstanceId,
    pub member_id: MemberId,
    pub state: String,
    pub reserved_at: DateTime<Utc>,
    pub class_name: String,
    pub class_date: NaiveDate,
    pub room: i32,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}
