use std::env;
use std::path::PathBuf;
use std::time::Duration;

use log::LevelFilter;
use url::Url;

pub const DEFAULT_CATALOG_URL: &str = "https://storage.googleapis.com/uamp/catalog.json";

pub struct Config {
    pub catalog_url: Url,
    pub api_host: String,
    pub api_port: u16,
    pub fetch_timeout: Duration,
    pub last_played_path: PathBuf,
    pub allowed_clients: Vec<String>,
    pub log_level: LevelFilter,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            catalog_url: env::var("CATALOG_URL")
                .ok()
                .and_then(|url| Url::parse(&url).ok())
                .unwrap_or_else(default_catalog_url),
            api_host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            api_port: env::var("API_PORT")
                .unwrap_or_else(|_| "4000".to_string())
                .parse()
                .unwrap_or(4000),
            fetch_timeout: Duration::from_secs(
                env::var("FETCH_TIMEOUT_SECS")
                    .ok()
                    .and_then(|secs| secs.parse().ok())
                    .unwrap_or(30),
            ),
            last_played_path: env::var("LAST_PLAYED_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_last_played_path()),
            allowed_clients: parse_client_list(&env::var("ALLOWED_CLIENTS").unwrap_or_default()),
            log_level: env::var("LOG_LEVEL")
                .ok()
                .and_then(|level| level.parse().ok())
                .unwrap_or(LevelFilter::Info),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }

    /// Boolean allow/deny check for a calling client. An empty allow list admits everyone.
    pub fn is_client_allowed(&self, client_id: Option<&str>) -> bool {
        if self.allowed_clients.is_empty() {
            return true;
        }
        match client_id {
            Some(id) => self.allowed_clients.iter().any(|allowed| allowed == id),
            None => false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog_url: default_catalog_url(),
            api_host: "0.0.0.0".to_string(),
            api_port: 4000,
            fetch_timeout: Duration::from_secs(30),
            last_played_path: default_last_played_path(),
            allowed_clients: Vec::new(),
            log_level: LevelFilter::Info,
        }
    }
}

fn default_catalog_url() -> Url {
    Url::parse(DEFAULT_CATALOG_URL).expect("default catalog url is valid")
}

fn default_last_played_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ongaku-catalog")
        .join("last_played.json")
}

fn parse_client_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}
