//! HTTP surface of the driving school notification relay.
//!
//! Routes, controllers and SSE endpoints live here; business rules are in
//! `domain`, and the broadcaster plus connection registry are in `sse`.

use axum::http::{header, HeaderValue, Method};
use domain::emails::EmailMetrics;
use domain::events::EventPublisher;
use log::*;
use mongodb::Database;
use service::config::Config;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

mod controller;
mod error;
mod extractors;
mod params;
mod response;
pub(crate) mod router;
mod sse;
pub mod watchers;

pub use error::{Error, Result};

/// State shared by every handler. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub service_state: service::AppState,
    pub sse_manager: Arc<::sse::Manager>,
    pub event_publisher: Arc<EventPublisher>,
    /// Present only when admin notification emails are enabled.
    pub email_metrics: Option<Arc<EmailMetrics>>,
}

impl AppState {
    pub fn new(
        service_state: service::AppState,
        sse_manager: Arc<::sse::Manager>,
        event_publisher: EventPublisher,
    ) -> Self {
        Self {
            service_state,
            sse_manager,
            event_publisher: Arc::new(event_publisher),
            email_metrics: None,
        }
    }

    pub fn with_email_metrics(mut self, metrics: Arc<EmailMetrics>) -> Self {
        self.email_metrics = Some(metrics);
        self
    }

    pub fn db_ref(&self) -> &Database {
        self.service_state.db_ref()
    }

    pub fn config(&self) -> &Config {
        &self.service_state.config
    }
}

pub async fn init_server(app_state: AppState) -> std::io::Result<()> {
    let interface = app_state
        .config()
        .interface
        .clone()
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let server_url = format!("{}:{}", interface, app_state.config().port);

    let cors_layer = cors_layer(app_state.config());
    let router = router::define_routes(app_state).layer(cors_layer);

    info!("Server starting... listening for connections on http://{server_url}");

    let listener = tokio::net::TcpListener::bind(&server_url).await?;
    axum::serve(listener, router).await
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring invalid CORS origin '{origin}': {e}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ACCEPT,
            header::AUTHORIZATION,
            header::CACHE_CONTROL,
            header::CONTENT_TYPE,
        ])
}
