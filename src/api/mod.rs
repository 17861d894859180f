//! REST API layer: route handlers, DTOs, OpenAPI document, and router
//! composition.
//!
//! Resource endpoints are mounted under `/api/v1`; `/health` and
//! `/config/roles` sit at the root.

pub mod dto;
pub mod handlers;

use axum::Router;
use utoipa::OpenApi;

use crate::app_state::AppState;
use crate::error::ErrorResponse;

/// OpenAPI document covering every REST endpoint.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "hospital-ops",
        description = "Theater scheduling, token queues and emergency alerts."
    ),
    paths(
        handlers::system::health_handler,
        handlers::system::roles_handler,
        handlers::theater::create_theater,
        handlers::theater::list_theaters,
        handlers::theater::get_theater,
        handlers::theater::update_theater,
        handlers::theater::delete_theater,
        handlers::theater::check_conflict,
        handlers::theater::schedule_surgery,
        handlers::theater::list_bookings,
        handlers::booking::cancel_booking,
        handlers::booking::complete_booking,
        handlers::alert::raise_alert,
        handlers::alert::list_alerts,
        handlers::alert::get_alert,
        handlers::alert::resolve_alert,
        handlers::alert::emergency_queue,
        handlers::token::issue_token,
        handlers::token::department_queue,
        handlers::token::call_next,
        handlers::token::get_token,
        handlers::token::update_token_status,
        handlers::token::cancel_token,
        handlers::directory::create_department,
        handlers::directory::list_departments,
        handlers::directory::get_department,
        handlers::directory::delete_department,
        handlers::directory::create_doctor,
        handlers::directory::list_doctors,
        handlers::directory::get_doctor,
        handlers::directory::delete_doctor,
        handlers::directory::create_patient,
        handlers::directory::list_patients,
        handlers::directory::get_patient,
        handlers::directory::update_patient,
        handlers::directory::delete_patient,
    ),
    components(schemas(ErrorResponse)),
    tags(
        (name = "System", description = "Health and catalogs"),
        (name = "Theaters", description = "Theater registry and live status"),
        (name = "Bookings", description = "Surgery scheduling"),
        (name = "Alerts", description = "Emergency alerts and the emergency queue"),
        (name = "Tokens", description = "Department token queues"),
        (name = "Directory", description = "Departments, doctors and patients"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes());

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router
}
