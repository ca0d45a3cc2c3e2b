//! Class template administration: create, update (with the exact-window swap
//! protocol), instructor assignment, activation toggling and listings.

use chrono::{NaiveTime, Utc, Weekday};
use sqlx::PgPool;

use crate::db;
use crate::db::handlers::{Instances, Instructors, Templates};
use crate::db::models::templates::{
    ClassTemplate, TemplateCreateDBRequest, TemplateFilter, TemplateSlot,
};
use crate::errors::{Error, Result};
use crate::schedule::{self, classify, Overlap, Policy};
use crate::types::{InstructorId, TemplateId};

#[derive(Debug, Clone)]
pub struct TemplateCreate {
    pub instructor_id: InstructorId,
    pub name: String,
    pub weekday: Weekday,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub capacity: i32,
}

/// Partial update; `None` fields keep their current value.
#[derive(Debug, Clone, Default)]
pub struct TemplateUpdate {
    pub name: Option<String>,
    pub weekday: Option<Weekday>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub capacity: Option<i32>,
    pub instructor_id: Option<InstructorId>,
    /// Exchange slots with an exactly-identical conflicting template instead
    /// of failing.
    pub force_swap: bool,
}

#[derive(Debug)]
pub enum UpdateOutcome {
    /// Every supplied field already matched; nothing was written.
    NoChanges,
    Updated(ClassTemplate),
    /// The slot was exchanged with another template.
    Swapped {
        template: ClassTemplate,
        with: TemplateId,
    },
}

pub struct TemplateService {
    pool: PgPool,
    policy: Policy,
}

impl TemplateService {
    pub fn new(pool: PgPool, policy: Policy) -> Self {
        Self { pool, policy }
    }

    pub async fn create(&self, request: TemplateCreate) -> Result<ClassTemplate> {
        if request.name.trim().is_empty() {
            return Err(Error::Validation("class name must not be empty".to_string()));
        }
        schedule::validate_weekday(&self.policy, request.weekday)?;
        schedule::validate_time_window(request.start_time, request.end_time)?;
        schedule::validate_capacity(request.capacity)?;

        db::serializable(&self.pool, move |conn| {
            let request = request.clone();
            Box::pin(async move {
                let instructor = Instructors::new(&mut *conn)
                    .get_by_id(request.instructor_id)
                    .await?
                    .ok_or_else(|| Error::not_found("instructor", request.instructor_id))?;
                if !instructor.is_qualified() {
                    return Err(Error::Validation(format!(
                        "{} does not hold the instructor role",
                        instructor.name
                    )));
                }

                let mut templates = Templates::new(&mut *conn);
                let existing = templates
                    .active_for_instructor_on(request.instructor_id, request.weekday)
                    .await?;
                if let Some(other) = existing.iter().find(|t| {
                    schedule::overlaps(
                        request.start_time,
                        request.end_time,
                        t.start_time,
                        t.end_time,
                    )
                }) {
                    return Err(Error::Conflict(format!(
                        "instructor already teaches \"{}\" in an overlapping slot on {}",
                        other.name, other.weekday
                    )));
                }

                let template = templates
                    .create(&TemplateCreateDBRequest {
                        instructor_id: request.instructor_id,
                        name: request.name.trim().to_string(),
                        weekday: request.weekday,
                        start_time: request.start_time,
                        end_time: request.end_time,
                        capacity: request.capacity,
                    })
                    .await?;
                tracing::info!(template_id = %template.id, weekday = %template.weekday, "template created");
                Ok(template)
            })
        })
        .await
    }

    /// Apply a partial update, re-running the overlap check against the
    /// effective field values.
    ///
    /// An exactly-identical conflicting window may be resolved as a swap when
    /// `force_swap` is set: the two templates exchange (weekday, start, end)
    /// atomically. The swap is refused while either template has scheduled
    /// future classes, and so is any other slot move, since live instances
    /// must keep matching their template's weekday and window.
    pub async fn update(&self, id: TemplateId, update: TemplateUpdate) -> Result<UpdateOutcome> {
        let policy = self.policy;
        db::serializable(&self.pool, move |conn| {
            let update = update.clone();
            Box::pin(async move {
                let current = Templates::new(&mut *conn)
                    .get_by_id(id)
                    .await?
                    .ok_or_else(|| Error::not_found("template", id))?;

                let name = update.name.clone().unwrap_or_else(|| current.name.clone());
                let weekday = update.weekday.unwrap_or(current.weekday);
                let start_time = update.start_time.unwrap_or(current.start_time);
                let end_time = update.end_time.unwrap_or(current.end_time);
                let capacity = update.capacity.unwrap_or(current.capacity);
                let instructor_id = update.instructor_id.unwrap_or(current.instructor_id);
                let slot = TemplateSlot {
                    weekday,
                    start_time,
                    end_time,
                };

                if name == current.name
                    && slot == current.slot()
                    && capacity == current.capacity
                    && instructor_id == current.instructor_id
                {
                    return Ok(UpdateOutcome::NoChanges);
                }

                schedule::validate_weekday(&policy, weekday)?;
                schedule::validate_time_window(start_time, end_time)?;
                schedule::validate_capacity(capacity)?;

                if instructor_id != current.instructor_id {
                    let instructor = Instructors::new(&mut *conn)
                        .get_by_id(instructor_id)
                        .await?
                        .ok_or_else(|| Error::not_found("instructor", instructor_id))?;
                    if !instructor.is_qualified() {
                        return Err(Error::Validation(format!(
                            "{} does not hold the instructor role",
                            instructor.name
                        )));
                    }
                }

                let others = Templates::new(&mut *conn)
                    .active_for_instructor_on(instructor_id, weekday)
                    .await?;
                let mut exact: Option<&ClassTemplate> = None;
                for other in others.iter().filter(|t| t.id != id) {
                    match classify(start_time, end_time, other.start_time, other.end_time) {
                        Overlap::None => {}
                        Overlap::Exact if exact.is_none() => exact = Some(other),
                        _ => {
                            return Err(Error::Conflict(format!(
                                "new slot overlaps \"{}\" ({}-{} on {})",
                                other.name, other.start_time, other.end_time, other.weekday
                            )));
                        }
                    }
                }

                let today = Utc::now().date_naive();
                if slot != current.slot() {
                    let mut instances = Instances::new(&mut *conn);
                    if instances.count_future_live_for_template(id, today).await? > 0 {
                        return Err(Error::Conflict(
                            "template has scheduled classes; cancel them before moving the slot"
                                .to_string(),
                        ));
                    }
                    if let Some(other) = exact {
                        if instances
                            .count_future_live_for_template(other.id, today)
                            .await?
                            > 0
                        {
                            return Err(Error::Conflict(format!(
                                "\"{}\" has scheduled classes; cannot swap slots",
                                other.name
                            )));
                        }
                    }
                }

                if let Some(other) = exact {
                    if !update.force_swap {
                        return Err(Error::Conflict(format!(
                            "\"{}\" already occupies that exact slot; request a swap to exchange",
                            other.name
                        )));
                    }

                    let mut templates = Templates::new(&mut *conn);
                    templates.update_slot(other.id, current.slot()).await?;
                    let template = templates
                        .update_definition(id, &name, slot, capacity, instructor_id)
                        .await?;
                    tracing::info!(
                        template_id = %id,
                        with = %other.id,
                        "template slots swapped"
                    );
                    return Ok(UpdateOutcome::Swapped {
                        template,
                        with: other.id,
                    });
                }

                let template = Templates::new(&mut *conn)
                    .update_definition(id, &name, slot, capacity, instructor_id)
                    .await?;
                tracing::info!(template_id = %id, "template updated");
                Ok(UpdateOutcome::Updated(template))
            })
        })
        .await
    }

    /// Reassign the owning instructor after validating the target holds the
    /// qualifying role and has no overlapping template of their own.
    pub async fn assign_instructor(
        &self,
        id: TemplateId,
        instructor_id: InstructorId,
    ) -> Result<ClassTemplate> {
        db::serializable(&self.pool, move |conn| {
            Box::pin(async move {
                let current = Templates::new(&mut *conn)
                    .get_by_id(id)
                    .await?
                    .ok_or_else(|| Error::not_found("template", id))?;
                if current.instructor_id == instructor_id {
                    return Err(Error::Validation(
                        "template is already assigned to this instructor".to_string(),
                    ));
                }

                let instructor = Instructors::new(&mut *conn)
                    .get_by_id(instructor_id)
                    .await?
                    .ok_or_else(|| Error::not_found("instructor", instructor_id))?;
                if !instructor.is_qualified() {
                    return Err(Error::Validation(format!(
                        "{} does not hold the instructor role",
                        instructor.name
                    )));
                }

                let mut templates = Templates::new(&mut *conn);
                let existing = templates
                    .active_for_instructor_on(instructor_id, current.weekday)
                    .await?;
                if let Some(other) = existing.iter().find(|t| {
                    schedule::overlaps(
                        current.start_time,
                        current.end_time,
                        t.start_time,
                        t.end_time,
                    )
                }) {
                    return Err(Error::Conflict(format!(
                        "{} already teaches \"{}\" in an overlapping slot",
                        instructor.name, other.name
                    )));
                }

                templates.set_instructor(id, instructor_id).await?;
                let template = templates
                    .get_by_id(id)
                    .await?
                    .ok_or_else(|| Error::Internal("template vanished mid-update".to_string()))?;
                tracing::info!(template_id = %id, %instructor_id, "instructor reassigned");
                Ok(template)
            })
        })
        .await
    }

    /// Toggle the deactivation timestamp. Returns `false` without writing
    /// when the state already matches.
    pub async fn change_active_state(&self, id: TemplateId, active: bool) -> Result<bool> {
        db::serializable(&self.pool, move |conn| {
            Box::pin(async move {
                let mut templates = Templates::new(&mut *conn);
                let current = templates
                    .get_by_id(id)
                    .await?
                    .ok_or_else(|| Error::not_found("template", id))?;
                if current.is_active() == active {
                    return Ok(false);
                }

                let deactivated_at = if active { None } else { Some(Utc::now()) };
                templates.set_active(id, deactivated_at).await?;
                tracing::info!(template_id = %id, active, "template active state changed");
                Ok(true)
            })
        })
        .await
    }

    pub async fn list(&self, filter: TemplateFilter) -> Result<Vec<ClassTemplate>> {
        let mut conn = self.pool.acquire().await?;
        Templates::new(&mut conn).list(&filter).await
    }
}
