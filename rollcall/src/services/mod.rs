pub mod query;
pub mod reservations;
pub mod scheduler;
pub mod templates;

pub use query::ScheduleQuery;
pub use reservations::{AttendanceSummary, ReservationEngine};
pub use scheduler::InstanceScheduler;
pub use templates::{TemplateCreate, TemplateService, TemplateUpdate, UpdateOutcome};
