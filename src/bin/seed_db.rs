use log::{error, info};
use service::{config::Config, logging::Logger};
use std::process;

#[tokio::main]
async fn main() {
    let config = Config::new();
    if let Err(e) = Logger::init_logger(&config) {
        eprintln!("Failed to initialize logger: {e}");
    }

    info!("Seeding database [{}]...", config.database_name());

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

    match entity_api::seed_database(&db).await {
        Ok(()) => info!("Database seeded"),
        Err(e) => {
            error!("Failed to seed database: {e}");
            process::exit(1);
        }
    }
}
