use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::models::reservations::{MemberReservationRow, Reservation};
use crate::errors::Error;
use crate::schedule::AttendanceState;
use crate::types::{InstanceId, MemberId, ReservationId};

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReserveRequest {
    #[schema(value_type = Uuid)]
    pub instance_id: InstanceId,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReservationResponse {
    #[schema(value_type = Uuid)]
    pub id: ReservationId,
    #[schema(value_type = Uuid)]
    pub instance_id: InstanceId,
    #[schema(value_type = Uuid)]
    pub member_id: MemberId,
    pub state: AttendanceState,
    pub reserved_at: DateTime<Utc>,
}

impl From<Reservation> for ReservationResponse {
    fn from(reservation: Reservation) -> Self {
        Self {
            id: reservation.id,
            instance_id: reservation.instance_id,
            member_id: reservation.member_id,
            state: reservation.state,
            reserved_at: reservation.reserved_at,
        }
    }
}

/// A reservation joined with its class details, for member agendas and
/// instructor rosters.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReservationDetailResponse {
    #[schema(value_type = Uuid)]
    pub id: ReservationId,
    #[schema(value_type = Uuid)]
    pub instance_id: InstanceId,
    #[schema(value_type = Uuid)]
    pub member_id: MemberId,
    pub state: AttendanceState,
    pub reserved_at: DateTime<Utc>,
    pub class_name: String,
    pub class_date: NaiveDate,
    pub room: i32,
    #[schema(value_type = String)]
    pub start_time: NaiveTime,
    #[schema(value_type = String)]
    pub end_time: NaiveTime,
}

impl TryFrom<MemberReservationRow> for ReservationDetailResponse {
    type Error = Error;

    fn try_from(row: MemberReservationRow) -> Result<Self, Error> {
        let state = row
            .state
            .parse::<AttendanceState>()
            .map_err(Error::Internal)?;
        Ok(Self {
            id: row.id,
            instance_id: row.instance_id,
            member_id: row.member_id,
            state,
            reserved_at: row.reserved_at,
            class_name: row.class_name,
            class_date: row.class_date,
            room: row.room,
            start_time: row.start_time,
            end_time: row.end_time,
        })
    }
}
