use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub v0_api_key: String,
    pub vercel_api_key: String,
    /// Endpoint notified when a job reaches a terminal state. The
    /// notifier is a no-op when unset.
    pub webhook_url: Option<String>,
    /// Apex under which custom domains are created.
    pub domain_suffix: String,
    pub worker_count: usize,
    pub max_job_attempts: i32,
    pub retry_base_delay_ms: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            v0_api_key: env::var("V0_API_KEY").context("V0_API_KEY must be set")?,
            vercel_api_key: env::var("VERCEL_API_KEY").context("VERCEL_API_KEY must be set")?,
            webhook_url: env::var("WEBHOOK_URL").ok(),
            domain_suffix: env::var("DOMAIN_SUFFIX")
                .unwrap_or_else(|_| "trady.finance".to_string()),
            worker_count: env::var("WORKER_COUNT")
                .unwrap_or_else(|_| "2".to_string())
                .parse()
                .context("WORKER_COUNT must be a valid number")?,
            max_job_attempts: env::var("MAX_JOB_ATTEMPTS")
                .unwrap_or_else(|_| "3".to_string())
                .parse()
                .context("MAX_JOB_ATTEMPTS must be a valid number")?,
            retry_base_delay_ms: env::var("RETRY_BASE_DELAY_MS")
                .unwrap_or_else(|_| "2000".to_string())
                .parse()
                .context("RETRY_BASE_DELAY_MS must be a valid number")?,
        })
    }
}
