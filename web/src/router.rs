use crate::{
    controller::{
        certificate_controller, health_check_controller, instructor_controller, lesson_controller,
        notification_controller, order_controller, ticket_class_controller,
    },
    params, response, AppState,
};
use axum::{
    routing::{get, patch, post},
    Router,
};
use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;

// This is the global definition of our OpenAPI spec. To be a part
// of the rendered spec, a path and schema must be listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "Driving School Notifications API"
        ),
        paths(
            certificate_controller::create,
            certificate_controller::index,
            health_check_controller::health_check,
            instructor_controller::create_slot,
            instructor_controller::pending_requests,
            instructor_controller::pending_requests_stream,
            lesson_controller::accept,
            lesson_controller::reject,
            notification_controller::emit,
            notification_controller::stats,
            order_controller::pending,
            order_controller::pending_stream,
            ticket_class_controller::pending_requests,
            ticket_class_controller::pending_requests_stream,
            ticket_class_controller::accept_request,
            ticket_class_controller::reject_request,
            crate::sse::handler::notifications_stream,
        ),
        components(
            schemas(
                domain::certificate::CertificateView,
                domain::emails::EmailStats,
                domain::order::PendingOrder,
                domain::order::OrderItemView,
                domain::pending_request::PendingLessonRequest,
                domain::pending_request::PendingTicketRequest,
                domain::schedule::SlotView,
                domain::ticket_class::TicketClassView,
                domain::ticket_class::EnrolledStudentView,
                domain::ticket_class::StudentRequestView,
                params::certificate::CreateParams,
                params::notification::EmitParams,
                params::schedule::CreateParams,
                response::notification::EmitResponse,
                response::notification::StatsResponse,
                crate::error::ErrorResponse,
            )
        ),
        tags(
            (name = "driving_school", description = "Driving school admin notifications API")
        )
    )]
struct ApiDoc;

pub fn define_routes(app_state: AppState) -> Router {
    Router::new()
        .merge(certificate_routes(app_state.clone()))
        .merge(health_routes())
        .merge(instructor_routes(app_state.clone()))
        .merge(lesson_routes(app_state.clone()))
        .merge(notification_routes(app_state.clone()))
        .merge(order_routes(app_state.clone()))
        .merge(ticket_class_routes(app_state))
        .merge(RapiDoc::with_openapi("/api-docs/openapi2.json", ApiDoc::openapi()).path("/rapidoc"))
}

fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}

fn notification_routes(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/api/notifications/stream",
            get(crate::sse::handler::notifications_stream),
        )
        .route("/api/notifications/emit", post(notification_controller::emit))
        .route("/api/notifications/stats", get(notification_controller::stats))
        .with_state(app_state)
}

fn instructor_routes(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/api/instructors/schedule",
            post(instructor_controller::create_slot),
        )
        .route(
            "/api/instructors/pending-requests",
            get(instructor_controller::pending_requests),
        )
        .route(
            "/api/instructors/pending-requests/stream",
            get(instructor_controller::pending_requests_stream),
        )
        .with_state(app_state)
}

fn lesson_routes(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/api/instructors/{instructor_id}/lessons/{lesson_id}/accept",
            patch(lesson_controller::accept),
        )
        .route(
            "/api/instructors/{instructor_id}/lessons/{lesson_id}/reject",
            patch(lesson_controller::reject),
        )
        .with_state(app_state)
}

fn ticket_class_routes(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/api/ticket-classes/pending-requests",
            get(ticket_class_controller::pending_requests),
        )
        .route(
            "/api/ticket-classes/pending-requests/stream",
            get(ticket_class_controller::pending_requests_stream),
        )
        .route(
            "/api/ticket-classes/{id}/requests/{student_id}/accept",
            post(ticket_class_controller::accept_request),
        )
        .route(
            "/api/ticket-classes/{id}/requests/{student_id}/reject",
            post(ticket_class_controller::reject_request),
        )
        .with_state(app_state)
}

fn certificate_routes(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/api/certificates",
            post(certificate_controller::create).get(certificate_controller::index),
        )
        .with_state(app_state)
}

fn order_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/api/orders/pending", get(order_controller::pending))
        .route(
            "/api/orders/pending/stream",
            get(order_controller::pending_stream),
        )
        .with_state(app_state)
}
