//! Read-side schedule projections consumed by the UI layer.

use chrono::{NaiveDate, Utc};
use sqlx::PgPool;

use crate::db::handlers::Instances;
use crate::db::models::instances::UpcomingInstance;
use crate::errors::Result;
use crate::types::InstructorId;

pub struct ScheduleQuery {
    pool: PgPool,
}

impl ScheduleQuery {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Every live class on one calendar day.
    pub async fn day_schedule(&self, date: NaiveDate) -> Result<Vec<UpcomingInstance>> {
        let mut conn = self.pool.acquire().await?;
        Instances::new(&mut conn).live_on_date(date).await
    }

    /// An instructor's upcoming live classes.
    pub async fn instructor_schedule(
        &self,
        instructor_id: InstructorId,
    ) -> Result<Vec<UpcomingInstance>> {
        let today = Utc::now().date_naive();
        let mut conn = self.pool.acquire().await?;
        Instances::new(&mut conn)
            .upcoming_for_instructor(instructor_id, today)
            .await
    }
}
