use domain::emails::AdminNotifier;
use events::EventPublisher;
use log::*;
use service::{config::Config, logging::Logger};
use sse::domain_event_handler::SseDomainEventHandler;
use std::process;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let config = Config::new();
    if let Err(e) = Logger::init_logger(&config) {
        eprintln!("Failed to initialize logger: {e}");
    }

    info!(
        "Starting driving school notification relay [{}]",
        config.runtime_env()
    );

    let db = match service::init_database(&config).await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to establish database connection: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = entity_api::ensure_indexes(&db).await {
        error!("Failed to prepare database indexes: {e}");
        process::exit(1);
    }

    let admin_notifier = match AdminNotifier::from_config(&config) {
        Ok(notifier) => notifier,
        Err(e) => {
            error!("Failed to set up admin notification emails: {e}");
            process::exit(1);
        }
    };

    let mut sse_manager =
        sse::Manager::new().with_dedupe_window(config.broadcast_dedupe_window());
    let mut email_metrics = None;
    if let Some(notifier) = admin_notifier {
        email_metrics = Some(notifier.metrics());
        sse_manager = sse_manager.with_sink(Arc::new(notifier));
    }
    let sse_manager = Arc::new(sse_manager);

    // Explicit mutation events reach every open stream through the broadcaster
    let event_publisher = EventPublisher::new()
        .with_handler(Arc::new(SseDomainEventHandler::new(sse_manager.clone())));

    let watchers = web::watchers::spawn_watchers(&db, sse_manager.clone());
    info!("Started {} change stream watcher(s)", watchers.len());

    let mut app_state = web::AppState::new(
        service::AppState::new(config, db),
        sse_manager,
        event_publisher,
    );
    if let Some(metrics) = email_metrics {
        app_state = app_state.with_email_metrics(metrics);
    }

    if let Err(e) = web::init_server(app_state).await {
        error!("Server stopped: {e}");
        process::exit(1);
    }
}
