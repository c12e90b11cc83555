use clap::builder::TypedValueParser as _;
use clap::Parser;
use dotenvy::dotenv;
use log::LevelFilter;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Largest chat message body accepted by default (2 MiB).
pub const DEFAULT_MAX_MESSAGE_BYTES: usize = 2 * 1024 * 1024;

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// A list of full CORS origin URLs that allowed to receive server responses.
    #[arg(
        long,
        env,
        value_delimiter = ',',
        use_value_delimiter = true,
        default_value = "http://localhost:8080"
    )]
    pub allowed_origins: Vec<String>,

    /// The host interface to listen for incoming connections
    #[arg(short, long, env, default_value = "127.0.0.1")]
    pub interface: Option<String>,

    /// The host TCP port to listen for incoming connections
    #[arg(short, long, env, default_value_t = 8080)]
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

    /// Path to the HTML chat client served at `/`. The bundled client is served when unset.
    #[arg(long, env)]
    index_html_path: Option<PathBuf>,

    /// Seconds between keep-alive comments on idle event streams (0 disables them)
    #[arg(long, env, default_value_t = 15)]
    keep_alive_secs: u64,

    /// Largest accepted chat message body, in bytes
    #[arg(long, env, default_value_t = DEFAULT_MAX_MESSAGE_BYTES)]
    pub max_message_bytes: usize,
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

    pub fn interface(&self) -> &str {
        self.interface.as_deref().unwrap_or("127.0.0.1")
    }

    /// Address the listener binds to, e.g. `127.0.0.1:8080`.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.interface(), self.port)
    }

    pub fn index_html_path(&self) -> Option<&Path> {
        self.index_html_path.as_deref()
    }

    pub fn set_index_html_path(mut self, path: PathBuf) -> Self {
        self.index_html_path = Some(path);
        self
    }

    /// Interval between keep-alive comments, `None` when disabled.
    pub fn keep_alive_interval(&self) -> Option<Duration> {
        match self.keep_alive_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn set_keep_alive_secs(mut self, secs: u64) -> Self {
        self.keep_alive_secs = secs;
        self
    }
}
