//! Turns templates into dated, room-assigned instances.

use chrono::{Datelike, NaiveDate, Utc};
use sqlx::PgPool;

use crate::db;
use crate::db::handlers::{Instances, Reservations, Templates};
use crate::db::models::instances::{ClassInstance, InstanceCreateDBRequest, UpcomingInstance};
use crate::db::models::templates::ClassTemplate;
use crate::errors::{Error, Result};
use crate::schedule::{self, Policy};
use crate::types::{InstanceId, InstructorId, TemplateId};

pub struct InstanceScheduler {
    pool: PgPool,
    policy: Policy,
}

impl InstanceScheduler {
    pub fn new(pool: PgPool, policy: Policy) -> Self {
        Self { pool, policy }
    }

    /// Schedule one dated occurrence of a template in a specific room.
    pub async fn create_instance(
        &self,
        template_id: TemplateId,
        class_date: NaiveDate,
        room: i32,
    ) -> Result<ClassInstance> {
        schedule::validate_room(&self.policy, room)?;

        db::serializable(&self.pool, move |conn| {
            Box::pin(async move {
                let template = Templates::new(&mut *conn)
                    .get_by_id(template_id)
                    .await?
                    .ok_or_else(|| Error::Validation(format!("unknown template: {template_id}")))?;
                if !template.is_active() {
                    return Err(Error::Conflict("template is deactivated".to_string()));
                }
                if class_date.weekday() != template.weekday {
                    return Err(Error::Conflict(format!(
                        "{class_date} is not a {}",
                        template.weekday
                    )));
                }

                let mut instances = Instances::new(&mut *conn);
                if instances
                    .live_for_template_date(template_id, class_date)
                    .await?
                    .is_some()
                {
                    return Err(Error::Conflict(format!(
                        "class is already scheduled on {class_date}"
                    )));
                }

                let occupancy = instances.room_occupancy(class_date).await?;
                let taken = occupancy.iter().any(|slot| {
                    slot.room == room
                        && schedule::overlaps(
                            template.start_time,
                            template.end_time,
                            slot.start_time,
                            slot.end_time,
                        )
                });
                if taken {
                    return Err(Error::Conflict(format!(
                        "room {room} is already booked at that time on {class_date}"
                    )));
                }

                let instance = instances
                    .create(&InstanceCreateDBRequest {
                        template_id,
                        class_date,
                        room,
                    })
                    .await?;
                tracing::info!(instance_id = %instance.id, %class_date, room, "instance scheduled");
                Ok(instance)
            })
        })
        .await
    }

    /// Bulk generation over a rolling window: one instance per active
    /// template per matching date, auto-assigning the first free room.
    ///
    /// Dates that already have an instance are skipped, and so are slots with
    /// no free room; partial progress is intentional. Each slot commits in
    /// its own transaction.
    pub async fn generate_for_instructor(
        &self,
        instructor_id: InstructorId,
        window_days: Option<u64>,
    ) -> Result<u32> {
        let window = window_days.unwrap_or(self.policy.generate_window_days);
        let today = Utc::now().date_naive();

        let templates = {
            let mut conn = self.pool.acquire().await?;
            Templates::new(&mut conn)
                .active_for_instructor(instructor_id)
                .await?
        };
        if templates.is_empty() {
            return Err(Error::InvalidOperation(
                "instructor has no active templates".to_string(),
            ));
        }

        let mut created = 0u32;
        for template in &templates {
            for class_date in schedule::matching_dates(today, window, template.weekday) {
                if self.generate_slot(template, class_date).await?.is_some() {
                    created += 1;
                }
            }
        }
        tracing::info!(%instructor_id, created, window, "bulk generation finished");
        Ok(created)
    }

    /// One slot of the bulk generation; `None` means skipped.
    async fn generate_slot(
        &self,
        template: &ClassTemplate,
        class_date: NaiveDate,
    ) -> Result<Option<ClassInstance>> {
        let rooms = self.policy.rooms;
        db::serializable(&self.pool, move |conn| {
            let template = template.clone();
            Box::pin(async move {
                let mut instances = Instances::new(&mut *conn);
                if instances
                    .live_for_template_date(template.id, class_date)
                    .await?
                    .is_some()
                {
                    return Ok(None);
                }

                let occupancy: Vec<_> = instances
                    .room_occupancy(class_date)
                    .await?
                    .iter()
                    .map(|slot| (slot.room, slot.start_time, slot.end_time))
                    .collect();
                let Some(room) = schedule::first_free_room(
                    rooms,
                    template.start_time,
                    template.end_time,
                    &occupancy,
                ) else {
                    tracing::debug!(
                        template_id = %template.id,
                        %class_date,
                        "no free room, slot skipped"
                    );
                    return Ok(None);
                };

                let instance = instances
                    .create(&InstanceCreateDBRequest {
                        template_id: template.id,
                        class_date,
                        room,
                    })
                    .await?;
                Ok(Some(instance))
            })
        })
        .await
    }

    /// Cancel an instance and cascade `Cancelled` to its live reservations.
    /// Returns the number of reservations cascaded.
    pub async fn cancel_instance(&self, instance_id: InstanceId) -> Result<u64> {
        db::serializable(&self.pool, move |conn| {
            Box::pin(async move {
                let instance = Instances::new(&mut *conn)
                    .get_by_id(instance_id)
                    .await?
                    .ok_or_else(|| Error::not_found("class", instance_id))?;
                if instance.is_cancelled() {
                    return Err(Error::InvalidOperation("class is already cancelled".to_string()));
                }

                let now = Utc::now();
                Instances::new(&mut *conn).cancel(instance_id, now).await?;
                let cascaded = Reservations::new(&mut *conn)
                    .cancel_live_for_instance(instance_id, now)
                    .await?;
                tracing::info!(%instance_id, cascaded, "instance cancelled");
                Ok(cascaded)
            })
        })
        .await
    }

    /// All live instances from today on, annotated with reservation counts
    /// and instructor names.
    pub async fn list_upcoming(&self) -> Result<Vec<UpcomingInstance>> {
        let today = Utc::now().date_naive();
        let mut conn = self.pool.acquire().await?;
        Instances::new(&mut conn).upcoming(today).await
    }
}
