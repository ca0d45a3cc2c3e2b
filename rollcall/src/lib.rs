//! Gym class scheduling and reservation service.
//!
//! Recurring class templates are expanded into dated, room-assigned
//! instances; members book seats against a fixed capacity; attendance is
//! tracked through a small per-reservation state machine. Capacity and
//! conflict checks always read fresh state inside a serializable
//! transaction, so concurrent bookings cannot oversell a class.
//!
//! Member/instructor CRUD, billing and authentication are external systems;
//! this crate trusts forwarded identity headers and reads the instructor
//! roster maintained elsewhere.

use sqlx::PgPool;

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod schedule;
pub mod services;
pub mod types;

pub use config::Config;
pub use errors::{Error, Result};

/// Shared state for the HTTP layer.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub policy: schedule::Policy,
}

/// Build the service router.
pub fn router(state: AppState) -> axum::Router {
    api::router(state)
}
