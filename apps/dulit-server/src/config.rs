//! Configuration management for Dulit Server

use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub documents: DocumentConfig,
    pub integrations: IntegrationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentConfig {
    /// DOCX template filled for every pass
    pub template_path: PathBuf,
    /// Scratch directory for per-request artifacts
    pub temp_dir: PathBuf,
    pub conversion: ConversionConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConversionConfig {
    pub strategy: ConversionKind,
    /// Local converter executable (LibreOffice)
    pub soffice_bin: String,
    pub poll_interval: Duration,
    /// Upper bound for a single conversion, local or remote
    pub job_timeout: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConversionKind {
    Local,
    RemoteScript,
    JobPolling,
}

impl ConversionKind {
    fn from_env_value(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "local" => ConversionKind::Local,
            "job-polling" | "job_polling" | "cloudconvert" => ConversionKind::JobPolling,
            _ => ConversionKind::RemoteScript,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IntegrationConfig {
    pub apps_script_url: Option<String>,
    pub imgbb_key: Option<String>,
    pub imgbb_url: String,
    pub cloudconvert_key: Option<String>,
    pub cloudconvert_url: String,
}

pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 3;
pub const DEFAULT_JOB_TIMEOUT_SECS: u64 = 300;

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            database: DatabaseConfig {
                url: "sqlite:./dulit.db".to_string(),
            },
            documents: DocumentConfig {
                template_path: PathBuf::from("templates/Dulit-pass.docx"),
                temp_dir: PathBuf::from("temp"),
                conversion: ConversionConfig {
                    strategy: ConversionKind::RemoteScript,
                    soffice_bin: "soffice".to_string(),
                    poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
                    job_timeout: Duration::from_secs(DEFAULT_JOB_TIMEOUT_SECS),
                },
            },
            integrations: IntegrationConfig {
                apps_script_url: None,
                imgbb_key: None,
                imgbb_url: "https://api.imgbb.com/1/upload".to_string(),
                cloudconvert_key: None,
                cloudconvert_url: "https://api.cloudconvert.com".to_string(),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        let defaults = Config::default();

        Ok(Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or(defaults.server.host),
                port: env::var("SERVER_PORT")
                    .unwrap_or_else(|_| "3000".to_string())
                    .parse()
                    .unwrap_or(3000),
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or(defaults.database.url),
            },
            documents: DocumentConfig {
                template_path: env::var("TEMPLATE_PATH")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.documents.template_path),
                temp_dir: env::var("TEMP_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.documents.temp_dir),
                conversion: ConversionConfig {
                    strategy: env::var("CONVERSION_STRATEGY")
                        .map(|v| ConversionKind::from_env_value(&v))
                        .unwrap_or(ConversionKind::RemoteScript),
                    soffice_bin: env::var("SOFFICE_BIN")
                        .unwrap_or(defaults.documents.conversion.soffice_bin),
                    poll_interval: Duration::from_secs(secs_from_env(
                        "CONVERSION_POLL_INTERVAL_SECS",
                        DEFAULT_POLL_INTERVAL_SECS,
                    )),
                    job_timeout: Duration::from_secs(secs_from_env(
                        "CONVERSION_TIMEOUT_SECS",
                        DEFAULT_JOB_TIMEOUT_SECS,
                    )),
                },
            },
            integrations: IntegrationConfig {
                apps_script_url: non_empty_var("APPS_SCRIPT_URL"),
                imgbb_key: non_empty_var("IMGBB_KEY"),
                imgbb_url: env::var("IMGBB_URL").unwrap_or(defaults.integrations.imgbb_url),
                cloudconvert_key: non_empty_var("CLOUDCONVERT_API_KEY"),
                cloudconvert_url: env::var("CLOUDCONVERT_BASE_URL")
                    .unwrap_or(defaults.integrations.cloudconvert_url),
            },
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn secs_from_env(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .filter(|secs| *secs > 0)
        .unwrap_or(default)
}
