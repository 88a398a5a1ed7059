use crate::db::StoreProvider;
use crate::types::{AppError, Result};
use std::env;
use std::time::Duration;

/// Platforms the social stage covers when `RESEARCH_PLATFORMS` is unset.
const DEFAULT_PLATFORMS: &[&str] = &["linkedin", "facebook", "instagram", "x"];

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: StoreProvider,
    pub research: ResearchConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct ResearchConfig {
    /// Upper bound on concurrently running research pipelines.
    pub max_concurrent_jobs: usize,
    /// Platforms the social fan-out covers.
    pub platforms: Vec<String>,
    /// Per-request timeout for the built-in HTTP collaborators.
    pub request_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|e| AppError::InvalidInput(format!("Invalid PORT: {}", e)))?;

        let max_concurrent_jobs = env::var("MAX_CONCURRENT_JOBS")
            .unwrap_or_else(|_| "4".to_string())
            .parse::<usize>()
            .map_err(|e| AppError::InvalidInput(format!("Invalid MAX_CONCURRENT_JOBS: {}", e)))?;

        let request_timeout_secs = env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "15".to_string())
            .parse::<u64>()
            .map_err(|e| AppError::InvalidInput(format!("Invalid REQUEST_TIMEOUT_SECS: {}", e)))?;

        let platforms = match env::var("RESEARCH_PLATFORMS") {
            Ok(raw) => {
                let platforms: Vec<String> = raw
                    .split(',')
                    .map(|p| p.trim().to_lowercase())
                    .filter(|p| !p.is_empty())
                    .collect();
                if platforms.is_empty() {
                    return Err(AppError::InvalidInput(
                        "RESEARCH_PLATFORMS must name at least one platform".to_string(),
                    ));
                }
                platforms
            }
            Err(_) => DEFAULT_PLATFORMS.iter().map(|p| p.to_string()).collect(),
        };

        Ok(Config {
            server: ServerConfig {
                host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
                port,
            },
            database: StoreProvider::from_env(),
            research: ResearchConfig {
                max_concurrent_jobs,
                platforms,
                request_timeout: Duration::from_secs(request_timeout_secs),
            },
        })
    }
}
