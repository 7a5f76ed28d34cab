use clap::{Parser, ValueEnum};
use pinhole_telemetry::LogFormat;
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;

pub const LISTEN_ADDR_ENV: &str = "PINHOLE_GATEWAY_LISTEN_ADDR";
pub const BASE_URL_ENV: &str = "PINHOLE_GATEWAY_BASE_URL";
pub const STORAGE_BACKEND_ENV: &str = "PINHOLE_STORAGE_BACKEND";
pub const MYSQL_DSN_ENV: &str = "PINHOLE_MYSQL_DSN";
pub const GENERATOR_ENV: &str = "PINHOLE_GENERATOR";
pub const CODE_LENGTH_ENV: &str = "PINHOLE_CODE_LENGTH";
pub const MAX_ATTEMPTS_ENV: &str = "PINHOLE_MAX_ATTEMPTS";
pub const LOG_FORMAT_ENV: &str = "PINHOLE_LOG_FORMAT";

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "mysql")]
    Mysql,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::InMemory => write!(f, "in-memory"),
            StorageBackendArg::Mysql => write!(f, "mysql"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GeneratorArg {
    #[value(name = "random")]
    Random,
    #[value(name = "sequential")]
    Sequential,
}

impl Display for GeneratorArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            GeneratorArg::Random => write!(f, "random"),
            GeneratorArg::Sequential => write!(f, "sequential"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    #[value(name = "text")]
    Text,
    #[value(name = "json")]
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Text => LogFormat::Text,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "gateway")]
pub struct CLI {
    #[arg(long, env = LISTEN_ADDR_ENV, default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: SocketAddr,

    /// Prefix used to build `short_url` in responses.
    #[arg(long, env = BASE_URL_ENV, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    #[arg(
        long,
        env = STORAGE_BACKEND_ENV,
        value_enum,
        default_value_t = StorageBackendArg::InMemory
    )]
    pub storage: StorageBackendArg,

    #[arg(long, env = MYSQL_DSN_ENV, required_if_eq("storage", "mysql"))]
    pub mysql_dsn: Option<String>,

    #[arg(long, env = GENERATOR_ENV, value_enum, default_value_t = GeneratorArg::Random)]
    pub generator: GeneratorArg,

    #[arg(long, env = CODE_LENGTH_ENV, default_value_t = pinhole_generator::DEFAULT_LENGTH)]
    pub code_length: usize,

    #[arg(
        long,
        env = MAX_ATTEMPTS_ENV,
        default_value_t = pinhole_shortener::allocator::DEFAULT_MAX_ATTEMPTS
    )]
    pub max_attempts: usize,

    #[arg(long, env = LOG_FORMAT_ENV, value_enum, default_value_t = LogFormatArg::Text)]
    pub log_format: LogFormatArg,
}
