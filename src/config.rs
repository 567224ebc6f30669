use std::net::{AddrParseError, SocketAddr};

use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "finledger", about = "finledger - personal finance ledger with summaries and charts")]
pub struct CliArgs {
    /// Path to config file
    #[arg(short, long, default_value = "finledger.toml")]
    pub config: String,

    /// Port to listen on (overrides config file)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Log level (overrides config file)
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Database file path (overrides config file)
    #[arg(short, long)]
    pub database: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Run the web server (default)
    Serve,
    /// Print entries and their summary to stdout
    Summary {
        #[arg(long)]
        category: Option<String>,
        /// Inclusive lower bound, YYYY-MM-DD
        #[arg(long)]
        start_date: Option<String>,
        /// Inclusive upper bound, YYYY-MM-DD
        #[arg(long)]
        end_date: Option<String>,
    },
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_server")]
    pub server: ServerConfig,

    #[serde(default = "default_logging")]
    pub logging: LoggingConfig,

    #[serde(default = "default_database")]
    pub database: DatabaseConfig,

    #[serde(default = "default_charts")]
    pub charts: ChartsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json: bool,
}

impl LoggingConfig {
    /// Installs the global subscriber. `RUST_LOG` takes precedence over the configured level.
    pub fn init(&self) {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));

        if self.json {
            fmt().json().with_env_filter(filter).init();
        } else {
            fmt().with_env_filter(filter).init();
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    Sqlite,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    #[serde(default = "default_backend")]
    pub backend: StorageKind,

    #[serde(default = "default_database_path")]
    pub path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChartsConfig {
    /// Script URL of the Plotly bundle the pages load.
    #[serde(default = "default_plotly_url")]
    pub plotly_url: String,
}

fn default_server() -> ServerConfig {
    ServerConfig {
        host: default_host(),
        port: default_port(),
    }
}

fn default_logging() -> LoggingConfig {
    LoggingConfig {
        level: default_log_level(),
        json: false,
    }
}

fn default_database() -> DatabaseConfig {
    DatabaseConfig {
        backend: default_backend(),
        path: default_database_path(),
    }
}

fn default_charts() -> ChartsConfig {
    ChartsConfig {
        plotly_url: default_plotly_url(),
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_backend() -> StorageKind {
    StorageKind::Sqlite
}

fn default_database_path() -> String {
    "instance/finance.db".to_string()
}

fn default_plotly_url() -> String {
    "https://cdn.plot.ly/plotly-2.27.0.min.js".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: default_server(),
            logging: default_logging(),
            database: default_database(),
            charts: default_charts(),
        }
    }
}

impl Config {
    pub fn load(cli: &CliArgs) -> Self {
        let mut config = match std::fs::read_to_string(&cli.config) {
            Ok(contents) => Self::parse(&contents).unwrap_or_else(|e| {
                eprintln!("Warning: Failed to parse config file: {}", e);
                Config::default()
            }),
            Err(_) => Config::default(),
        };

        // CLI overrides
        if let Some(port) = cli.port {
            config.server.port = port;
        }
        if let Some(ref level) = cli.log_level {
            config.logging.level = level.clone();
        }
        if let Some(ref path) = cli.database {
            config.database.path = path.clone();
        }

        config
    }

    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    pub fn listen_addr(&self) -> Result<SocketAddr, AddrParseError> {
        format!("{}:{}", self.server.host, self.server.port).parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json);
        assert_eq!(config.database.backend, StorageKind::Sqlite);
        assert_eq!(config.database.path, "instance/finance.db");
        assert!(config.charts.plotly_url.contains("plotly"));
    }

    #[test]
    fn test_partial_sections() {
        let config = Config::parse(
            r#"
            [server]
            port = 8080

            [database]
            backend = "memory"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.backend, StorageKind::Memory);
        assert_eq!(config.database.path, "instance/finance.db");
        assert_eq!(config.listen_addr().unwrap().port(), 8080);
    }

    #[test]
    fn test_cli_overrides() {
        let cli = CliArgs::parse_from([
            "finledger",
            "--config",
            "does-not-exist.toml",
            "--port",
            "9000",
            "--database",
            ":memory:",
            "summary",
            "--category",
            "Food",
        ]);
        let config = Config::load(&cli);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.database.path, ":memory:");
        assert_eq!(
            cli.command,
            Some(Command::Summary {
                category: Some("Food".to_string()),
                start_date: None,
                end_date: None,
            })
        );
    }

    #[test]
    fn test_bad_host_is_an_error() {
        let mut config = Config::default();
        config.server.host = "not a host".to_string();
        assert!(config.listen_addr().is_err());
    }
}
