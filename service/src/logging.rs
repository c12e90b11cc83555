use crate::config::Config;
use crate::error::{Error, ErrorKind};
use log::{info, LevelFilter};
use simplelog::{self, ConfigBuilder, ThreadLogMode};

/// Modules to filter out from logging when not in Trace mode.
/// These are the HTTP stack's internals, which drown out connection and
/// broadcast logs at debug level.
const FILTERED_MODULES: &[&str] = &["tower", "tower_http", "tracing", "hyper", "hyper_util", "axum"];

pub struct Logger {}

impl Logger {
    /// Installs the global terminal logger at the level given by `config`.
    ///
    /// At Trace level every log line is shown, including dependencies. At any
    /// other level the modules in `FILTERED_MODULES` are silenced. Fails if a
    /// global logger is already installed.
    pub fn init_logger(config: &Config) -> Result<(), Error> {
        let apply_filters = Self::should_filter_dependencies(config.log_level_filter);
        let log_config = Self::build_log_config(config.log_level_filter, apply_filters);

        simplelog::TermLogger::init(
            config.log_level_filter,
            log_config,
            simplelog::TerminalMode::Mixed,
            simplelog::ColorChoice::Auto,
        )
        .map_err(|err| Error::new(ErrorKind::Logger, err))?;

        info!("Logging at level {}", config.log_level_filter);
        Ok(())
    }

    /// Returns `false` for Trace level (show all logs), `true` for all other levels.
    fn should_filter_dependencies(level: LevelFilter) -> bool {
        level != LevelFilter::Trace
    }

    /// Builds the simplelog Config. Thread ids are added at Debug and above so
    /// interleaved connection tasks can be told apart.
    fn build_log_config(level: LevelFilter, apply_filters: bool) -> simplelog::Config {
        let mut builder = ConfigBuilder::new();
        builder.set_time_format_rfc3339();

        if level >= LevelFilter::Debug {
            builder
                .set_thread_level(LevelFilter::Error)
                .set_thread_mode(ThreadLogMode::Both);
        }

        if apply_filters {
            for module in FILTERED_MODULES {
                builder.add_filter_ignore_str(module);
            }
        }

        builder.build()
    }
}
