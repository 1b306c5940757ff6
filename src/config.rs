use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::Parser;
use serde::Deserialize;

#[derive(Parser, Debug, Default)]
#[command(name = "quill", about = "A blogging backend")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Path to data directory
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: Option<PathBuf>,
}

/// Session cookie and password hashing settings.
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct AuthConfig {
    pub cookie_name: String,
    pub session_hours: u64,
    pub bcrypt_cost: u32,
}

/// Upper bound for `auth.session_hours` (ten years).
pub const MAX_SESSION_HOURS: u64 = 24 * 365 * 10;

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            cookie_name: "quill_session".to_string(),
            session_hours: 720,
            bcrypt_cost: 10,
        }
    }
}

impl Config {
    /// File (if any) under the data dir, then CLI flags on top.
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let data_dir = Self::data_dir(cli)?;
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| data_dir.join("config.toml"));

        let mut config = if config_path.exists() {
            Self::from_file(&config_path)?
        } else {
            Config::default()
        };

        if let Some(ref host) = cli.host {
            config.server.host = host.clone();
        }
        if let Some(port) = cli.port {
            config.server.port = port;
        }
        config
            .database
            .path
            .get_or_insert_with(|| data_dir.join("quill.db"));

        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
    }

    fn validate(&self) -> anyhow::Result<()> {
        let cost = self.auth.bcrypt_cost;
        if !(4..=31).contains(&cost) {
            bail!("auth.bcrypt_cost must be between 4 and 31, got {}", cost);
        }
        if !(1..=MAX_SESSION_HOURS).contains(&self.auth.session_hours) {
            bail!(
                "auth.session_hours must be between 1 and {}, got {}",
                MAX_SESSION_HOURS,
                self.auth.session_hours
            );
        }
        if self.auth.cookie_name.trim().is_empty() {
            bail!("auth.cookie_name must not be empty");
        }
        Ok(())
    }

    pub fn data_dir(cli: &Cli) -> anyhow::Result<PathBuf> {
        match &cli.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => dirs::home_dir()
                .map(|home| home.join(".quill"))
                .context("Could not determine home directory"),
        }
    }

    /// Database file, resolved against the data directory by `load`.
    pub fn db_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from("quill.db"))
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
