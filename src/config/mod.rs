use anyhow::Result;
use dotenvy::dotenv;
use serde::Deserialize;

/// Configuration for the application
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,
    /// Login credentials checked by the session guard
    #[serde(default = "default_username")]
    pub auth_username: String,
    #[serde(default = "default_password")]
    pub auth_password: String,
    /// Title shown in screen headers
    #[serde(default = "default_site_title")]
    pub site_title: String,
    /// Directory report files are written to
    #[serde(default = "default_export_dir")]
    pub export_dir: String,
    /// File the authenticated-session flag persists in
    #[serde(default = "default_session_file")]
    pub session_file: String,
}

fn default_username() -> String {
    "admin".to_string()
}

fn default_password() -> String {
    "admin123".to_string()
}

fn default_site_title() -> String {
    "Gestión de Obras".to_string()
}

fn default_export_dir() -> String {
    "./exports".to_string()
}

fn default_session_file() -> String {
    ".obra_session".to_string()
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// This function will:
    /// 1. Load variables from .env file if it exists
    /// 2. Deserialize environment variables into Config struct
    pub fn load() -> Result<Self> {
        // Load .env file if it exists
        dotenv().ok();

        // Parse environment variables into Config struct
        let config = envy::from_env::<Config>()?;

        Ok(config)
    }

    /// Get a direct reference to the database URL
    pub fn database_url(&self) -> &str {
        &self.database_url
    }
}

/// Initialize environment variables and load configuration
pub fn init() -> Result<Config> {
    // Ensure .env file is loaded
    dotenv().ok();

    // Load the configuration
    let config = Config::load()?;

    Ok(config)
}
