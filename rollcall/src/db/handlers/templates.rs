use chrono::{DateTime, Utc, Weekday};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::db::models::templates::{
    weekday_to_db, ClassTemplate, TemplateCreateDBRequest, TemplateFilter, TemplateRow,
    TemplateSlot,
};
use crate::errors::Result;
use crate::types::{InstructorId, TemplateId};

const TEMPLATE_COLUMNS: &str = "id, instructor_id, name, weekday, start_time, end_time, \
     capacity, deactivated_at, created_at";

pub struct Templates<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> Templates<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&mut self, request: &TemplateCreateDBRequest) -> Result<ClassTemplate> {
        let row = sqlx::query_as::<_, TemplateRow>(&format!(
            "INSERT INTO class_templates (id, instructor_id, name, weekday, start_time, end_time, capacity)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {TEMPLATE_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(request.instructor_id)
        .bind(&request.name)
        .bind(weekday_to_db(request.weekday))
        .bind(request.start_time)
        .bind(request.end_time)
        .bind(request.capacity)
        .fetch_one(&mut *self.conn)
        .await?;

        row.try_into()
    }

    pub async fn get_by_id(&mut self, id: TemplateId) -> Result<Option<ClassTemplate>> {
        let row = sqlx::query_as::<_, TemplateRow>(&format!(
            "SELECT {TEMPLATE_COLUMNS} FROM class_templates WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *self.conn)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    pub async fn list(&mut self, filter: &TemplateFilter) -> Result<Vec<ClassTemplate>> {
        let rows = sqlx::query_as::<_, TemplateRow>(&format!(
            "SELECT {TEMPLATE_COLUMNS} FROM class_templates
             WHERE ($1::boolean IS NULL OR (deactivated_at IS NULL) = $1)
               AND ($2::smallint IS NULL OR weekday = $2)
               AND ($3::uuid IS NULL OR instructor_id = $3)
             ORDER BY weekday, start_time, name"
        ))
        .bind(filter.active)
        .bind(filter.weekday.map(weekday_to_db))
        .bind(filter.instructor_id)
        .fetch_all(&mut *self.conn)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Active templates of one instructor on one weekday; the conflict-check
    /// working set for template creation and updates.
    pub async fn active_for_instructor_on(
        &mut self,
        instructor_id: InstructorId,
        weekday: Weekday,
    ) -> Result<Vec<ClassTemplate>> {
        let rows = sqlx::query_as::<_, TemplateRow>(&format!(
            "SELECT {TEMPLATE_COLUMNS} FROM class_templates
             WHERE instructor_id = $1 AND weekday = $2 AND deactivated_at IS NULL
             ORDER BY start_time"
        ))
        .bind(instructor_id)
        .bind(weekday_to_db(weekday))
        .fetch_all(&mut *self.conn)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    pub async fn active_for_instructor(
        &mut self,
        instructor_id: InstructorId,
    ) -> Result<Vec<ClassTemplate>> {
        let rows = sqlx::query_as::<_, TemplateRow>(&format!(
            "SELECT {TEMPLATE_COLUMNS} FROM class_templates
             WHERE instructor_id = $1 AND deactivated_at IS NULL
             ORDER BY weekday, start_time"
        ))
        .bind(instructor_id)
        .fetch_all(&mut *self.conn)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Overwrite the full definition; used by Update after the service has
    /// computed the effective field values.
    pub async fn update_definition(
        &mut self,
        id: TemplateId,
        name: &str,
        slot: TemplateSlot,
        capacity: i32,
        instructor_id: InstructorId,
    ) -> Result<ClassTemplate> {
        let row = sqlx::query_as::<_, TemplateRow>(&format!(
            "UPDATE class_templates
             SET name = $2, weekday = $3, start_time = $4, end_time = $5,
                 capacity = $6, instructor_id = $7
             WHERE id = $1
             RETURNING {TEMPLATE_COLUMNS}"
        ))
        .bind(id)
        .bind(name)
        .bind(weekday_to_db(slot.weekday))
        .bind(slot.start_time)
        .bind(slot.end_time)
        .bind(capacity)
        .bind(instructor_id)
        .fetch_one(&mut *self.conn)
        .await?;

        row.try_into()
    }

    /// Move a template to a new (weekday, start, end) slot; one half of a swap.
    pub async fn update_slot(&mut self, id: TemplateId, slot: TemplateSlot) -> Result<()> {
        sqlx::query(
            "UPDATE class_templates
             SET weekday = $2, start_time = $3, end_time = $4
             WHERE id = $1",
        )
        .bind(id)
        .bind(weekday_to_db(slot.weekday))
        .bind(slot.start_time)
        .bind(slot.end_time)
        .execute(&mut *self.conn)
        .await?;

        Ok(())
    }

    pub async fn set_instructor(
        &mut self,
        id: TemplateId,
        instructor_id: InstructorId,
    ) -> Result<()> {
        sqlx::query("UPDATE class_templates SET instructor_id = $2 WHERE id = $1")
            .bind(id)
            .bind(instructor_id)
            .execute(&mut *self.conn)
            .await?;

        Ok(())
    }

    pub async fn set_active(
        &mut self,
        id: TemplateId,
        deactivated_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        sqlx::query("UPDATE class_templates SET deactivated_at = $2 WHERE id = $1")
            .bind(id)
            .bind(deactivated_at)
            .execute(&mut *self.conn)
            .await?;

        Ok(())
    }
}
