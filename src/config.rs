//! Configuration management for Canvas Chat.
//!
//! Configuration comes from environment variables; a `.env` file in the
//! working directory is honored when present:
//! - `GEMINI_API_KEY` - Required. Gemini API key (`GOOGLE_API_KEY` is accepted as a fallback).
//! - `GEMINI_MODEL` - Optional. The model to use. Defaults to `gemini-2.5-pro`.
//! - `CANVAS_API_URL` - Optional. Canvas instance base URL, e.g. `https://canvas.example.edu`.
//! - `CANVAS_API_KEY` - Optional. Canvas access token. Both Canvas variables
//!   must be set together; when present the Canvas course tools are registered.
//! - `COURSE_FILTER` - Optional. Substring a course name must contain to be
//!   listed. Defaults to `[2520]`.
//! - `FIXTURE_PATH` - Optional. Path to a local JSON document exposed through
//!   the fixture lookup tool.
//! - `HOST` - Optional. Server host. Defaults to `127.0.0.1`.
//! - `PORT` - Optional. Server port. Defaults to `5000`.
//! - `MAX_ITERATIONS` - Optional. Maximum model/tool cycles per request. Defaults to `8`.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Canvas API access configuration.
#[derive(Debug, Clone)]
pub struct CanvasConfig {
    /// Canvas instance base URL
    pub api_url: String,

    /// Canvas access token
    pub api_key: String,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Gemini API key
    pub gemini_api_key: String,

    /// Gemini model identifier
    pub gemini_model: String,

    /// Canvas access, when course tools are enabled
    pub canvas: Option<CanvasConfig>,

    /// Substring filter applied to course names when listing courses
    pub course_filter: String,

    /// Local JSON document for the fixture lookup tool
    pub fixture_path: Option<PathBuf>,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Maximum model/tool cycles per request
    pub max_iterations: usize,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if no Gemini key is set, or if
    /// only one of the two Canvas variables is present.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Pull in a .env file before the first read; a missing file is fine.
        let _ = dotenvy::dotenv();

        let gemini_api_key = std::env::var("GEMINI_API_KEY")
            .or_else(|_| std::env::var("GOOGLE_API_KEY"))
            .map_err(|_| ConfigError::MissingEnvVar("GEMINI_API_KEY".to_string()))?;

        let gemini_model =
            std::env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-2.5-pro".to_string());

        let canvas = match (
            std::env::var("CANVAS_API_URL").ok(),
            std::env::var("CANVAS_API_KEY").ok(),
        ) {
            (Some(api_url), Some(api_key)) => Some(CanvasConfig { api_url, api_key }),
            (None, None) => None,
            (Some(_), None) => {
                return Err(ConfigError::MissingEnvVar("CANVAS_API_KEY".to_string()))
            }
            (None, Some(_)) => {
                return Err(ConfigError::MissingEnvVar("CANVAS_API_URL".to_string()))
            }
        };

        let course_filter =
            std::env::var("COURSE_FILTER").unwrap_or_else(|_| "[2520]".to_string());

        let fixture_path = std::env::var("FIXTURE_PATH").ok().map(PathBuf::from);

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "5000".to_string())
            .parse()
            .map_err(|e| ConfigError::InvalidValue("PORT".to_string(), format!("{}", e)))?;

        let max_iterations = std::env::var("MAX_ITERATIONS")
            .unwrap_or_else(|_| "8".to_string())
            .parse()
            .map_err(|e| {
                ConfigError::InvalidValue("MAX_ITERATIONS".to_string(), format!("{}", e))
            })?;

        Ok(Self {
            gemini_api_key,
            gemini_model,
            canvas,
            course_filter,
            fixture_path,
            host,
            port,
            max_iterations,
        })
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(gemini_api_key: String) -> Self {
        Self {
            gemini_api_key,
            gemini_model: "gemini-2.5-pro".to_string(),
            canvas: None,
            course_filter: "[2520]".to_string(),
            fixture_path: None,
            host: "127.0.0.1".to_string(),
            port: 5000,
            max_iterations: 8,
        }
    }
}
