use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::db::models::reservations::{MemberReservationRow, Reservation, ReservationRow};
use crate::errors::Result;
use crate::schedule::AttendanceState;
use crate::types::{InstanceId, InstructorId, MemberId, ReservationId};

const RESERVATION_COLUMNS: &str = "id, instance_id, member_id, state, reserved_at, updated_at";

pub struct Reservations<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> Reservations<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    /// Insert a fresh `Reserved` row. Re-booking after cancellation always
    /// inserts; cancelled rows stay as history.
    pub async fn insert(
        &mut self,
        instance_id: InstanceId,
        member_id: MemberId,
    ) -> Result<Reservation> {
        let row = sqlx::query_as::<_, ReservationRow>(&format!(
            "INSERT INTO reservations (id, instance_id, member_id)
             VALUES ($1, $2, $3)
             RETURNING {RESERVATION_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(instance_id)
        .bind(member_id)
        .fetch_one(&mut *self.conn)
        .await?;

        row.try_into()
    }

    pub async fn find_reserved(
        &mut self,
        member_id: MemberId,
        instance_id: InstanceId,
    ) -> Result<Option<Reservation>> {
        let row = sqlx::query_as::<_, ReservationRow>(&format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations
             WHERE member_id = $1 AND instance_id = $2 AND state = 'reserved'"
        ))
        .bind(member_id)
        .bind(instance_id)
        .fetch_optional(&mut *self.conn)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Live seat count; the capacity check reads this inside the booking
    /// transaction, never from a cache.
    pub async fn reserved_count(&mut self, instance_id: InstanceId) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT count(*) FROM reservations WHERE instance_id = $1 AND state = 'reserved'",
        )
        .bind(instance_id)
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(count)
    }

    /// All reservations on an instance, any state.
    pub async fn for_instance(&mut self, instance_id: InstanceId) -> Result<Vec<Reservation>> {
        let rows = sqlx::query_as::<_, ReservationRow>(&format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations
             WHERE instance_id = $1
             ORDER BY reserved_at"
        ))
        .bind(instance_id)
        .fetch_all(&mut *self.conn)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    pub async fn set_state(
        &mut self,
        id: ReservationId,
        state: AttendanceState,
        now: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query("UPDATE reservations SET state = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(state.as_str())
            .bind(now)
            .execute(&mut *self.conn)
            .await?;

        Ok(())
    }

    /// Cascade used by instance cancellation: every live row goes to
    /// `Cancelled`, terminal rows are untouched.
    pub async fn cancel_live_for_instance(
        &mut self,
        instance_id: InstanceId,
        now: DateTime<Utc>,
    ) -> Result<u64> {
        let rows_affected = sqlx::query(
            "UPDATE reservations SET state = 'cancelled', updated_at = $2
             WHERE instance_id = $1 AND state = 'reserved'",
        )
        .bind(instance_id)
        .bind(now)
        .execute(&mut *self.conn)
        .await?
        .rows_affected();

        Ok(rows_affected)
    }

    pub async fn list_for_member(
        &mut self,
        member_id: MemberId,
    ) -> Result<Vec<MemberReservationRow>> {
        let rows = sqlx::query_as::<_, MemberReservationRow>(
            "SELECT r.id, r.instance_id, r.member_id, r.state, r.reserved_at,
                    t.name AS class_name, i.class_date, i.room, t.start_time, t.end_time
             FROM reservations r
             JOIN class_instances i ON i.id = r.instance_id
             JOIN class_templates t ON t.id = i.template_id
             WHERE r.member_id = $1
             ORDER BY i.class_date DESC, t.start_time",
        )
        .bind(member_id)
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(rows)
    }

    /// Reservations against an instructor's classes from a date onward.
    pub async fn list_for_instructor(
        &mut self,
        instructor_id: InstructorId,
        from: NaiveDate,
    ) -> Result<Vec<MemberReservationRow>> {
        let rows = sqlx::query_as::<_, MemberReservationRow>(
            "SELECT r.id, r.instance_id, r.member_id, r.state, r.reserved_at,
                    t.name AS class_name, i.class_date, i.room, t.start_time, t.end_time
             FROM reservations r
             JOIN class_instances i ON i.id = r.instance_id
             JOIN class_templates t ON t.id = i.template_id
             WHERE t.instructor_id = $1 AND i.class_date >= $2
             ORDER BY i.class_date, t.start_time, r.reserved_at",
        )
        .bind(instructor_id)
        .bind(from)
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(rows)
    }
}
