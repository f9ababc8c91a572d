use config::Config;
use log::info;
use mongodb::bson::doc;
use mongodb::error::Error as MongoError;
use mongodb::options::ClientOptions;
use mongodb::{Client, Database};
use tokio::time::Duration;

pub mod config;
pub mod logging;

pub async fn init_database(config: &Config) -> Result<Database, MongoError> {
    info!(
        "Database client config: database={}, max_pool_size={}, connect_timeout={}s",
        config.database_name(),
        config.db_max_pool_size,
        config.db_connect_timeout_secs,
    );

    let mut options = ClientOptions::parse(config.mongodb_uri()).await?;
    options.app_name = Some("driving_school_rs".to_string());
    options.max_pool_size = Some(config.db_max_pool_size);
    options.connect_timeout = Some(Duration::from_secs(config.db_connect_timeout_secs));

    let client = Client::with_options(options)?;
    let db = client.database(config.database_name());

    // Fail fast at startup instead of on the first request
    db.run_command(doc! { "ping": 1 }).await?;

    Ok(db)
}

// Service-level state containing only infrastructure concerns
// Needs to implement Clone to be able to be passed into Router as State
#[derive(Clone)]
pub struct AppState {
    pub database: Database,
    pub config: Config,
}

impl AppState {
    pub fn new(app_config: Config, db: Database) -> Self {
        Self {
            database: db,
            config: app_config,
        }
    }

    pub fn db_ref(&self) -> &Database {
        &self.database
    }
}
