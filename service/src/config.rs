use clap::builder::TypedValueParser as _;
use clap::Parser;
use dotenvy::dotenv;
use log::LevelFilter;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default MailerSend API base URL used when `MAILERSEND_BASE_URL` is not set.
pub const DEFAULT_MAILERSEND_BASE_URL: &str = "https://api.mailersend.com/v1";

#[derive(Clone, Debug, PartialEq)]
pub enum RustEnv {
    Development,
    Production,
    Staging,
}

#[derive(Debug, PartialEq, Eq)]
pub struct RustEnvParseError;

impl FromStr for RustEnv {
    type Err = RustEnvParseError;
    fn from_str(level: &str) -> Result<RustEnv, Self::Err> {
        match level.to_lowercase().as_str() {
            "development" => Ok(RustEnv::Development),
            "production" => Ok(RustEnv::Production),
            "staging" => Ok(RustEnv::Staging),
            _ => Err(RustEnvParseError),
        }
    }
}

impl fmt::Display for RustEnv {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RustEnv::Development => write!(f, "development"),
            RustEnv::Production => write!(f, "production"),
            RustEnv::Staging => write!(f, "staging"),
        }
    }
}

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// A list of full CORS origin URLs that allowed to receive server responses.
    #[arg(
        long,
        env,
        value_delimiter = ',',
        use_value_delimiter = true,
        default_value = "http://localhost:3000,https://localhost:3000"
    )]
    pub allowed_origins: Vec<String>,

    /// Sets the MongoDB connection string to connect to
    #[arg(short, long, env, default_value = "mongodb://localhost:27017")]
    mongodb_uri: Option<String>,

    /// Name of the MongoDB database holding the driving school collections
    #[arg(long, env, default_value = "driving_school")]
    database_name: String,

    /// Maximum number of connections the MongoDB driver keeps per server
    #[arg(long, env, default_value_t = 50)]
    pub db_max_pool_size: u32,

    /// Timeout in seconds for establishing a new database connection
    #[arg(long, env, default_value_t = 8)]
    pub db_connect_timeout_secs: u64,

    /// The base URL of the MailerSend API.
    /// Override in tests to point at a mock server.
    #[arg(long, env, default_value = DEFAULT_MAILERSEND_BASE_URL)]
    mailersend_base_url: String,
    /// The API key to use when calling the MailerSend API.
    #[arg(long, env)]
    mailersend_api_key: Option<String>,
    /// Address that receives an email for every broadcast notification.
    #[arg(long, env)]
    admin_notification_email: Option<String>,
    /// Sender address for notification emails.
    #[arg(long, env, default_value = "notifications@drivingschool.com")]
    notification_from_email: String,

    /// Seconds between `ping` frames on open SSE streams
    #[arg(long, env, default_value_t = 30)]
    pub sse_keepalive_secs: u64,

    /// Reconnection delay hint (milliseconds) sent to SSE clients with the handshake
    #[arg(long, env, default_value_t = 3000)]
    pub sse_retry_millis: u64,

    /// A recomputed channel view identical to the last one sent inside this
    /// window is not re-sent. 0 disables suppression.
    #[arg(long, env, default_value_t = 0)]
    pub broadcast_dedupe_window_millis: u64,

    /// The host interface to listen for incoming connections
    #[arg(short, long, env, default_value = "127.0.0.1")]
    pub interface: Option<String>,

    /// The host TCP port to listen for incoming connections
    #[arg(short, long, env, default_value_t = 4000)]
    pub port: u16,

    /// Set the log level verbosity threshold (level) to control what gets displayed on console output
    #[arg(
        short,
        long,
        env,
        default_value_t = LevelFilter::Info,
        value_parser = clap::builder::PossibleValuesParser::new(["OFF", "ERROR", "WARN", "INFO", "DEBUG", "TRACE"])
            .map(|s| s.parse::<LevelFilter>().unwrap()),
        )]
    pub log_level_filter: LevelFilter,

    /// Set the Rust runtime environment to use.
    #[arg(
    short,
    long,
    env,
    default_value_t = RustEnv::Development,
    value_parser = clap::builder::PossibleValuesParser::new([
        "DEVELOPMENT", "PRODUCTION", "STAGING",
        "development", "production", "staging"
    ])
        .map(|s| s.parse::<RustEnv>().unwrap()),
    )]
    pub runtime_env: RustEnv,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        // Load .env file first
        dotenv().ok();
        // Then parse the command line parameters and flags
        Config::parse()
    }

    pub fn mongodb_uri(&self) -> &str {
        self.mongodb_uri
            .as_deref()
            .unwrap_or("mongodb://localhost:27017")
    }

    pub fn database_name(&self) -> &str {
        &self.database_name
    }

    /// Returns the MailerSend API base URL.
    pub fn mailersend_base_url(&self) -> &str {
        &self.mailersend_base_url
    }

    /// Returns the MailerSend API key, if configured.
    pub fn mailersend_api_key(&self) -> Option<String> {
        self.mailersend_api_key.clone()
    }

    /// Returns the administrator address for broadcast notification emails, if configured.
    pub fn admin_notification_email(&self) -> Option<String> {
        self.admin_notification_email.clone()
    }

    pub fn notification_from_email(&self) -> &str {
        &self.notification_from_email
    }

    pub fn sse_keepalive(&self) -> Duration {
        Duration::from_secs(self.sse_keepalive_secs)
    }

    pub fn sse_retry(&self) -> Duration {
        Duration::from_millis(self.sse_retry_millis)
    }

    pub fn broadcast_dedupe_window(&self) -> Duration {
        Duration::from_millis(self.broadcast_dedupe_window_millis)
    }

    /// Both an API key and a recipient are required before broadcast emails go out.
    pub fn admin_emails_enabled(&self) -> bool {
        self.mailersend_api_key.is_some() && self.admin_notification_email.is_some()
    }

    pub fn runtime_env(&self) -> RustEnv {
        self.runtime_env.clone()
    }

    pub fn is_production(&self) -> bool {
        self.runtime_env() == RustEnv::Production
    }
}
