use sqlx::PgConnection;

use crate::db::models::instructors::Instructor;
use crate::errors::Result;
use crate::types::InstructorId;

pub struct Instructors<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> Instructors<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_id(&mut self, id: InstructorId) -> Result<Option<Instructor>> {
        let instructor = sqlx::query_as::<_, Instructor>(
            "SELECT id, name, role, deactivated_at FROM instructors WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(instructor)
    }
}
