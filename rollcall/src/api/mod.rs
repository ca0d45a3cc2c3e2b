use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;

use crate::AppState;

pub mod handlers;
pub mod models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "rollcall",
        description = "Gym class scheduling and reservation service"
    ),
    paths(
        handlers::templates::list,
        handlers::templates::create,
        handlers::templates::update,
        handlers::templates::assign_instructor,
        handlers::templates::change_active_state,
        handlers::instances::create,
        handlers::instances::generate,
        handlers::instances::upcoming,
        handlers::instances::cancel,
        handlers::instances::reservations,
        handlers::instances::mark_attendance,
        handlers::reservations::reserve,
        handlers::reservations::cancel,
        handlers::reservations::member_agenda,
        handlers::schedule::day,
        handlers::schedule::instructor,
        handlers::schedule::instructor_reservations,
    ),
    tags(
        (name = "templates", description = "Recurring class definitions"),
        (name = "instances", description = "Dated, room-assigned classes"),
        (name = "reservations", description = "Member seat bookings"),
        (name = "schedule", description = "Read-side projections"),
    )
)]
struct ApiDoc;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/v1/templates",
            get(handlers::templates::list).post(handlers::templates::create),
        )
        .route(
            "/api/v1/templates/{template_id}",
            axum::routing::patch(handlers::templates::update),
        )
        .route(
            "/api/v1/templates/{template_id}/instructor",
            put(handlers::templates::assign_instructor),
        )
        .route(
            "/api/v1/templates/{template_id}/active",
            put(handlers::templates::change_active_state),
        )
        .route("/api/v1/instances", post(handlers::instances::create))
        .route(
            "/api/v1/instances/generate",
            post(handlers::instances::generate),
        )
        .route(
            "/api/v1/instances/upcoming",
            get(handlers::instances::upcoming),
        )
        .route(
            "/api/v1/instances/{instance_id}",
            delete(handlers::instances::cancel),
        )
        .route(
            "/api/v1/instances/{instance_id}/reservations",
            get(handlers::instances::reservations),
        )
        .route(
            "/api/v1/instances/{instance_id}/attendance",
            put(handlers::instances::mark_attendance),
        )
        .route(
            "/api/v1/reservations",
            post(handlers::reservations::reserve),
        )
        .route(
            "/api/v1/reservations/{instance_id}",
            delete(handlers::reservations::cancel),
        )
        .route(
            "/api/v1/members/{member_id}/reservations",
            get(handlers::reservations::member_agenda),
        )
        .route("/api/v1/schedule/{date}", get(handlers::schedule::day))
        .route(
            "/api/v1/instructors/{instructor_id}/schedule",
            get(handlers::schedule::instructor),
        )
        .route(
            "/api/v1/instructors/{instructor_id}/reservations",
            get(handlers::schedule::instructor_reservations),
        )
        .merge(RapiDoc::with_openapi("/api-docs/openapi.json", ApiDoc::openapi()).path("/docs"))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
