use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::db::models::instances::{
    ClassInstance, InstanceCreateDBRequest, RoomOccupancy, UpcomingInstance,
};
use crate::errors::Result;
use crate::types::{InstanceId, InstructorId, TemplateId};

/// Shared SELECT body for the annotated-instance projection.
const UPCOMING_PROJECTION: &str = "SELECT i.id, i.template_id, t.name, i.class_date, i.room,
            t.start_time, t.end_time, t.capacity,
            t.instructor_id, p.name AS instructor_name,
            count(r.id) FILTER (WHERE r.state = 'reserved') AS reserved
     FROM class_instances i
     JOIN class_templates t ON t.id = i.template_id
     JOIN instructors p ON p.id = t.instructor_id
     LEFT JOIN reservations r ON r.instance_id = i.id";

pub struct Instances<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> Instances<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&mut self, request: &InstanceCreateDBRequest) -> Result<ClassInstance> {
        let instance = sqlx::query_as::<_, ClassInstance>(
            "INSERT INTO class_instances (id, template_id, class_date, room)
             VALUES ($1, $2, $3, $4)
             RETURNING id, template_id, class_date, room, deactivated_at, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(request.template_id)
        .bind(request.class_date)
        .bind(request.room)
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(instance)
    }

    pub async fn get_by_id(&mut self, id: InstanceId) -> Result<Option<ClassInstance>> {
        let instance = sqlx::query_as::<_, ClassInstance>(
            "SELECT id, template_id, class_date, room, deactivated_at, created_at
             FROM class_instances WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(instance)
    }

    pub async fn live_for_template_date(
        &mut self,
        template_id: TemplateId,
        class_date: NaiveDate,
    ) -> Result<Option<ClassInstance>> {
        let instance = sqlx::query_as::<_, ClassInstance>(
            "SELECT id, template_id, class_date, room, deactivated_at, created_at
             FROM class_instances
             WHERE template_id = $1 AND class_date = $2 AND deactivated_at IS NULL",
        )
        .bind(template_id)
        .bind(class_date)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(instance)
    }

    /// Every live slot occupied on a date, with its template time window.
    pub async fn room_occupancy(&mut self, class_date: NaiveDate) -> Result<Vec<RoomOccupancy>> {
        let slots = sqlx::query_as::<_, RoomOccupancy>(
            "SELECT i.id AS instance_id, i.room, t.start_time, t.end_time
             FROM class_instances i
             JOIN class_templates t ON t.id = i.template_id
             WHERE i.class_date = $1 AND i.deactivated_at IS NULL
             ORDER BY i.room, t.start_time",
        )
        .bind(class_date)
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(slots)
    }

    /// Live instances of a template dated on or after `from`; a template with
    /// any of these cannot take part in a slot swap.
    pub async fn count_future_live_for_template(
        &mut self,
        template_id: TemplateId,
        from: NaiveDate,
    ) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT count(*) FROM class_instances
             WHERE template_id = $1 AND class_date >= $2 AND deactivated_at IS NULL",
        )
        .bind(template_id)
        .bind(from)
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(count)
    }

    pub async fn cancel(&mut self, id: InstanceId, now: DateTime<Utc>) -> Result<bool> {
        let rows_affected = sqlx::query(
            "UPDATE class_instances SET deactivated_at = $2
             WHERE id = $1 AND deactivated_at IS NULL",
        )
        .bind(id)
        .bind(now)
        .execute(&mut *self.conn)
        .await?
        .rows_affected();

        Ok(rows_affected > 0)
    }

    pub async fn upcoming(&mut self, from: NaiveDate) -> Result<Vec<UpcomingInstance>> {
        let rows = sqlx::query_as::<_, UpcomingInstance>(&format!(
            "{UPCOMING_PROJECTION}
             WHERE i.class_date >= $1 AND i.deactivated_at IS NULL
             GROUP BY i.id, t.id, p.id
             ORDER BY i.class_date, t.start_time, i.room"
        ))
        .bind(from)
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(rows)
    }

    pub async fn live_on_date(&mut self, class_date: NaiveDate) -> Result<Vec<UpcomingInstance>> {
        let rows = sqlx::query_as::<_, UpcomingInstance>(&format!(
            "{UPCOMING_PROJECTION}
             WHERE i.class_date = $1 AND i.deactivated_at IS NULL
             GROUP BY i.id, t.id, p.id
             ORDER BY t.start_time, i.room"
        ))
        .bind(class_date)
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(rows)
    }

    pub async fn upcoming_for_instructor(
        &mut self,
        instructor_id: InstructorId,
        from: NaiveDate,
    ) -> Result<Vec<UpcomingInstance>> {
        let rows = sqlx::query_as::<_, UpcomingInstance>(&format!(
            "{UPCOMING_PROJECTION}
             WHERE t.instructor_id = $1 AND i.class_date >= $2 AND i.deactivated_at IS NULL
             GROUP BY i.id, t.id, p.id
             ORDER BY i.class_date, t.start_time"
        ))
        .bind(instructor_id)
        .bind(from)
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(rows)
    }
}
