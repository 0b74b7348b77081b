use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

pub const DEFAULT_SHIKIMORI_KINDS: [&str; 12] = [
    "tv",
    "movie",
    "ova",
    "ona",
    "special",
    "tv_special",
    "music",
    "pv",
    "cm",
    "tv_13",
    "tv_24",
    "tv_48",
];

/// Process settings, read from environment variables.
///
/// Field names map to upper-snake variables (`postgres_server` is read from
/// `POSTGRES_SERVER`). Fields without a default are required.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_api_v1_str")]
    pub api_v1_str: String,

    #[serde(default = "generate_secret", skip_serializing)]
    pub secret: String,

    pub server_name: String,

    #[serde(default, deserialize_with = "deserialize_list")]
    pub backend_cors_origins: Vec<String>,

    pub project_name: String,

    pub first_superuser_email: String,

    pub postgres_scheme: String,

    pub postgres_server: String,

    pub postgres_user: String,

    #[serde(skip_serializing)]
    pub postgres_password: String,

    pub postgres_db: String,

    /// Explicit connection string. When unset it is assembled from the
    /// `postgres_*` fields.
    #[serde(default, skip_serializing)]
    pub database_uri: Option<String>,

    pub google_client_id: String,

    #[serde(skip_serializing)]
    pub google_client_secret: String,

    #[serde(default = "default_shikimori_expiration_hours")]
    pub shikimori_expiration_hours: u32,

    #[serde(default = "default_true")]
    pub users_open_registration: bool,

    #[serde(
        default = "default_shikimori_kinds",
        deserialize_with = "deserialize_list"
    )]
    pub shikimori_kinds: Vec<String>,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// `pretty` or `json`
    #[serde(default = "default_log_format")]
    pub log_format: String,

    #[serde(default = "default_max_db_connections")]
    pub max_db_connections: u32,

    #[serde(default = "default_min_db_connections")]
    pub min_db_connections: u32,

    /// Number of tokio worker threads, 0 uses the number of CPU cores.
    #[serde(default)]
    pub worker_threads: usize,

    #[serde(default = "default_files_path")]
    pub files_path: String,

    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    #[serde(default = "default_true")]
    pub metrics_enabled: bool,

    #[serde(default = "default_shikimori_base_url")]
    pub shikimori_base_url: String,

    #[serde(default = "default_google_tokeninfo_url")]
    pub google_tokeninfo_url: String,

    /// Argon2 memory cost in KiB
    #[serde(default = "default_argon2_memory_cost_kib")]
    pub argon2_memory_cost_kib: u32,

    #[serde(default = "default_argon2_time_cost")]
    pub argon2_time_cost: u32,

    #[serde(default = "default_argon2_parallelism")]
    pub argon2_parallelism: u32,

    /// `.env` file the settings were loaded with, logged once tracing is up.
    #[serde(skip)]
    pub env_file: Option<PathBuf>,
}

/// Argon2id cost parameters for password hashing.
#[derive(Debug, Clone, Copy)]
pub struct Argon2Settings {
    pub memory_cost_kib: u32,
    pub time_cost: u32,
    pub parallelism: u32,
}

fn default_api_v1_str() -> String {
    "/api/v1".to_string()
}

const fn default_true() -> bool {
    true
}

const fn default_shikimori_expiration_hours() -> u32 {
    24
}

fn default_shikimori_kinds() -> Vec<String> {
    DEFAULT_SHIKIMORI_KINDS
        .iter()
        .map(ToString::to_string)
        .collect()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

const fn default_max_db_connections() -> u32 {
    10
}

const fn default_min_db_connections() -> u32 {
    1
}

fn default_files_path() -> String {
    "files".to_string()
}

const fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_shikimori_base_url() -> String {
    "https://shikimori.one".to_string()
}

fn default_google_tokeninfo_url() -> String {
    "https://oauth2.googleapis.com/tokeninfo".to_string()
}

const fn default_argon2_memory_cost_kib() -> u32 {
    8192
}

const fn default_argon2_time_cost() -> u32 {
    3
}

const fn default_argon2_parallelism() -> u32 {
    1
}

/// 32 random bytes, hex encoded.
fn generate_secret() -> String {
    crate::db::repositories::user::generate_api_key()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrList {
    List(Vec<String>),
    Str(String),
}

/// Accepts either a list, a JSON array string (`["a", "b"]`) or a
/// comma-separated string.
fn deserialize_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match StringOrList::deserialize(deserializer)? {
        StringOrList::List(items) => Ok(items),
        StringOrList::Str(raw) => parse_list(&raw).map_err(serde::de::Error::custom),
    }
}

pub fn parse_list(raw: &str) -> Result<Vec<String>> {
    let trimmed = raw.trim();
    if trimmed.starts_with('[') {
        let items: Vec<String> =
            serde_json::from_str(trimmed).context("Invalid JSON list in settings")?;
        return Ok(items);
    }

    Ok(trimmed
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect())
}

impl Settings {
    /// Loads `.env` (if present) and reads settings from the environment.
    pub fn load() -> Result<Self> {
        let env_file = dotenvy::dotenv().ok();

        let cfg = ::config::Config::builder()
            .add_source(::config::Environment::default())
            .build()
            .context("Failed to read settings from environment")?;

        let mut settings: Self = cfg
            .try_deserialize()
            .context("Failed to parse settings from environment")?;
        settings.validate()?;
        settings.env_file = env_file;
        Ok(settings)
    }

    /// Reads settings from an explicit variable map instead of the process
    /// environment.
    pub fn from_env_map(vars: HashMap<String, String>) -> Result<Self> {
        let source: ::config::Map<String, String> = vars.into_iter().collect();

        let cfg = ::config::Config::builder()
            .add_source(::config::Environment::default().source(Some(source)))
            .build()
            .context("Failed to read settings")?;

        let settings: Self = cfg.try_deserialize().context("Failed to parse settings")?;
        settings.validate()?;
        Ok(settings)
    }

    /// Connection string used by the store.
    pub fn database_url(&self) -> Result<String> {
        if let Some(uri) = self.database_uri.as_deref().filter(|s| !s.is_empty()) {
            return Ok(uri.to_string());
        }

        assemble_database_url(
            &self.postgres_scheme,
            &self.postgres_user,
            &self.postgres_password,
            &self.postgres_server,
            &self.postgres_db,
        )
    }

    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            anyhow::bail!("PORT must be > 0");
        }

        if !self.api_v1_str.starts_with('/') || self.api_v1_str.len() < 2 {
            anyhow::bail!("API_V1_STR must start with '/' and not be the root path");
        }

        if self.shikimori_expiration_hours == 0 {
            anyhow::bail!("SHIKIMORI_EXPIRATION_HOURS must be > 0");
        }

        if self.min_db_connections > self.max_db_connections {
            anyhow::bail!("MIN_DB_CONNECTIONS cannot exceed MAX_DB_CONNECTIONS");
        }

        Ok(())
    }

    #[must_use]
    pub const fn argon2(&self) -> Argon2Settings {
        Argon2Settings {
            memory_cost_kib: self.argon2_memory_cost_kib,
            time_cost: self.argon2_time_cost,
            parallelism: self.argon2_parallelism,
        }
    }

    #[must_use]
    pub fn is_first_superuser(&self, email: &str) -> bool {
        !self.first_superuser_email.is_empty()
            && self.first_superuser_email.eq_ignore_ascii_case(email.trim())
    }
}

/// Builds `{scheme}://{user}:{password}@{server}/{db}` with the credentials
/// percent-encoded.
pub fn assemble_database_url(
    scheme: &str,
    user: &str,
    password: &str,
    server: &str,
    db: &str,
) -> Result<String> {
    let mut url = url::Url::parse(&format!("{scheme}://{server}"))
        .with_context(|| format!("Invalid database host: {server}"))?;

    url.set_username(user)
        .map_err(|()| anyhow::anyhow!("Cannot set database user on {server}"))?;
    if !password.is_empty() {
        url.set_password(Some(password))
            .map_err(|()| anyhow::anyhow!("Cannot set database password on {server}"))?;
    }
    url.set_path(db);

    Ok(url.to_string())
}
