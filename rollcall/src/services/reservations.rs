//! Seat booking against instance capacity, cancellation, and attendance.
//!
//! Every mutating operation runs under `db::serializable`: the capacity
//! check counts live rows inside the same transaction that inserts, so two
//! racing bookings cannot both squeeze past `count < capacity`.

use std::collections::HashSet;

use chrono::{NaiveDate, Utc};
use sqlx::PgPool;

use crate::db;
use crate::db::handlers::{Instances, Reservations, Templates};
use crate::db::models::reservations::{MemberReservationRow, Reservation};
use crate::errors::{Error, Result};
use crate::schedule::{self, Policy};
use crate::types::{InstanceId, InstructorId, MemberId};

/// Outcome of a bulk attendance marking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttendanceSummary {
    pub present: u32,
    pub absent: u32,
}

pub struct ReservationEngine {
    pool: PgPool,
    policy: Policy,
}

impl ReservationEngine {
    pub fn new(pool: PgPool, policy: Policy) -> Self {
        Self { pool, policy }
    }

    /// Book a seat for a member.
    ///
    /// Checks, in order, against freshly loaded state: instance live,
    /// booking window, no duplicate live booking, seats remaining. A
    /// cancelled earlier booking does not block re-booking; a fresh row is
    /// inserted.
    pub async fn reserve(&self, member_id: MemberId, instance_id: InstanceId) -> Result<Reservation> {
        let policy = self.policy;
        db::serializable(&self.pool, move |conn| {
            Box::pin(async move {
                let instance = Instances::new(&mut *conn)
                    .get_by_id(instance_id)
                    .await?
                    .ok_or_else(|| Error::not_found("class", instance_id))?;
                if instance.is_cancelled() {
                    return Err(Error::InvalidOperation("class is cancelled".to_string()));
                }

                let today = Utc::now().date_naive();
                schedule::check_booking_window(&policy, today, instance.class_date)?;

                let template = Templates::new(&mut *conn)
                    .get_by_id(instance.template_id)
                    .await?
                    .ok_or_else(|| {
                        Error::Internal(format!("instance {instance_id} has no template"))
                    })?;

                let mut reservations = Reservations::new(&mut *conn);
                if reservations
                    .find_reserved(member_id, instance_id)
                    .await?
                    .is_some()
                {
                    return Err(Error::InvalidOperation(
                        "you already have a reservation for this class".to_string(),
                    ));
                }

                let reserved = reservations.reserved_count(instance_id).await?;
                if reserved >= i64::from(template.capacity) {
                    return Err(Error::InvalidOperation("class full".to_string()));
                }

                let reservation = reservations.insert(instance_id, member_id).await?;
                tracing::info!(%member_id, %instance_id, seat = reserved + 1, "seat reserved");
                Ok(reservation)
            })
        })
        .await
    }

    /// Cancel the member's live reservation; allowed only while the class
    /// date is strictly in the future.
    pub async fn cancel(&self, member_id: MemberId, instance_id: InstanceId) -> Result<()> {
        db::serializable(&self.pool, move |conn| {
            Box::pin(async move {
                let instance = Instances::new(&mut *conn)
                    .get_by_id(instance_id)
                    .await?
                    .ok_or_else(|| Error::not_found("class", instance_id))?;

                let today = Utc::now().date_naive();
                schedule::check_cancellation_window(today, instance.class_date)?;

                let mut reservations = Reservations::new(&mut *conn);
                let reservation = reservations
                    .find_reserved(member_id, instance_id)
                    .await?
                    .ok_or_else(|| Error::not_found("reservation", instance_id))?;

                reservations
                    .set_state(
                        reservation.id,
                        schedule::AttendanceState::Cancelled,
                        Utc::now(),
                    )
                    .await?;
                tracing::info!(%member_id, %instance_id, "reservation cancelled");
                Ok(())
            })
        })
        .await
    }

    /// Bulk attendance: members in `present` are marked `Present`, every
    /// other non-cancelled reservation becomes `Absent`. Re-marking is
    /// idempotent; cancelled rows are untouched.
    pub async fn mark_attendance(
        &self,
        instance_id: InstanceId,
        present: HashSet<MemberId>,
    ) -> Result<AttendanceSummary> {
        db::serializable(&self.pool, move |conn| {
            let present = present.clone();
            Box::pin(async move {
                let instance = Instances::new(&mut *conn)
                    .get_by_id(instance_id)
                    .await?
                    .ok_or_else(|| Error::not_found("class", instance_id))?;
                if instance.is_cancelled() {
                    return Err(Error::InvalidOperation("class is cancelled".to_string()));
                }

                let today = Utc::now().date_naive();
                schedule::check_attendance_window(today, instance.class_date)?;

                let mut reservations = Reservations::new(&mut *conn);
                let rows = reservations.for_instance(instance_id).await?;
                if rows.is_empty() {
                    return Err(Error::InvalidOperation(
                        "class has no reservations to mark".to_string(),
                    ));
                }

                let now = Utc::now();
                let mut summary = AttendanceSummary {
                    present: 0,
                    absent: 0,
                };
                for row in &rows {
                    let Some(next) = row.state.mark(present.contains(&row.member_id)) else {
                        continue;
                    };
                    if next != row.state {
                        reservations.set_state(row.id, next, now).await?;
                    }
                    match next {
                        schedule::AttendanceState::Present => summary.present += 1,
                        schedule::AttendanceState::Absent => summary.absent += 1,
                        _ => {}
                    }
                }
                tracing::info!(
                    %instance_id,
                    present = summary.present,
                    absent = summary.absent,
                    "attendance marked"
                );
                Ok(summary)
            })
        })
        .await
    }

    pub async fn list_for_member(&self, member_id: MemberId) -> Result<Vec<MemberReservationRow>> {
        let mut conn = self.pool.acquire().await?;
        Reservations::new(&mut conn).list_for_member(member_id).await
    }

    pub async fn list_for_instance(&self, instance_id: InstanceId) -> Result<Vec<Reservation>> {
        let mut conn = self.pool.acquire().await?;
        let mut reservations = Reservations::new(&mut conn);
        let rows = reservations.for_instance(instance_id).await?;
        Ok(rows)
    }

    pub async fn list_for_instructor(
        &self,
        instructor_id: InstructorId,
        from: Option<NaiveDate>,
    ) -> Result<Vec<MemberReservationRow>> {
        let from = from.unwrap_or_else(|| Utc::now().date_naive());
        let mut conn = self.pool.acquire().await?;
        Reservations::new(&mut conn)
            .list_for_instructor(instructor_id, from)
            .await
    }
}
