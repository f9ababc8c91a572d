use crate::config::{Config, RustEnv};
use log::{LevelFilter, SetLoggerError};
use simplelog::{self, ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

/// Dependency modules whose output is hidden unless the level is Trace.
/// The MongoDB driver and the HTTP stack are chatty at Debug.
const FILTERED_MODULES: &[&str] = &[
    "mongodb", "hyper", "tower", "axum", "reqwest", "rustls",
];

pub struct Logger {}

impl Logger {
    /// Installs the global terminal logger described by `config`.
    ///
    /// Production output is uncolored so log shippers don't receive ANSI codes.
    pub fn init_logger(config: &Config) -> Result<(), SetLoggerError> {
        let level = to_simplelog_level(config.log_level_filter);
        let log_config = Self::build_log_config(Self::should_filter_dependencies(
            config.log_level_filter,
        ));

        TermLogger::init(
            level,
            log_config,
            TerminalMode::Mixed,
            Self::color_choice(&config.runtime_env),
        )
    }

    fn should_filter_dependencies(level: LevelFilter) -> bool {
        level != LevelFilter::Trace
    }

    fn color_choice(env: &RustEnv) -> ColorChoice {
        match env {
            RustEnv::Production => ColorChoice::Never,
            RustEnv::Development | RustEnv::Staging => ColorChoice::Auto,
        }
    }

    fn build_log_config(apply_filters: bool) -> simplelog::Config {
        let mut builder = ConfigBuilder::new();
        builder.set_time_format_rfc3339();

        if apply_filters {
            for module in FILTERED_MODULES {
                builder.add_filter_ignore_str(module);
            }
        }

        builder.build()
    }
}

fn to_simplelog_level(level: LevelFilter) -> simplelog::LevelFilter {
    match level {
        LevelFilter::Off => simplelog::LevelFilter::Off,
        LevelFilter::Error => simplelog::LevelFilter::Error,
        LevelFilter::Warn => simplelog::LevelFilter::Warn,
        LevelFilter::Info => simplelog::LevelFilter::Info,
        LevelFilter::Debug => simplelog::LevelFilter::Debug,
        LevelFilter::Trace => simplelog::LevelFilter::Trace,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filtered_modules_cover_driver_and_http_stack() {
        for module in ["mongodb", "hyper", "tower", "axum", "reqwest", "rustls"] {
            assert!(
                FILTERED_MODULES.contains(&module),
                "{module} should be filtered"
            );
        }
    }

    #[test]
    fn test_application_crates_are_never_filtered() {
        for module in ["web", "domain", "entity_api", "sse", "events"] {
            assert!(
                !FILTERED_MODULES.contains(&module),
                "{module} logs must stay visible"
            );
        }
    }

    #[test]
    fn test_only_trace_shows_dependency_logs() {
        assert!(!Logger::should_filter_dependencies(LevelFilter::Trace));
        for level in [
            LevelFilter::Off,
            LevelFilter::Error,
            LevelFilter::Warn,
            LevelFilter::Info,
            LevelFilter::Debug,
        ] {
            assert!(Logger::should_filter_dependencies(level), "{level} should filter");
        }
    }

    #[test]
    fn test_production_disables_color() {
        assert!(matches!(
            Logger::color_choice(&RustEnv::Production),
            ColorChoice::Never
        ));
        assert!(matches!(
            Logger::color_choice(&RustEnv::Development),
            ColorChoice::Auto
        ));
    }

    #[test]
    fn test_level_conversion_preserves_ordering() {
        assert_eq!(
            to_simplelog_level(LevelFilter::Debug) as u8,
            simplelog::LevelFilter::Debug as u8
        );
        assert_eq!(
            to_simplelog_level(LevelFilter::Off) as u8,
            simplelog::LevelFilter::Off as u8
        );
    }
}
