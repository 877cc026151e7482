use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

/// Settings for the external meal-plan drafting endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct DraftingConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl DraftingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub jwt: JwtConfig,
    /// Shared code required to register an admin. `None` disables admin sign-up.
    pub admin_code: Option<String>,
    pub allowed_origins: Vec<String>,
    pub host: String,
    pub port: u16,
    pub drafting: DraftingConfig,
}

const DEFAULT_ORIGINS: &str = "http://localhost:3000,http://localhost:8000";

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let parsed = |key: &str| -> anyhow::Result<Option<i64>> {
            var(key)
                .map(|v| v.trim().parse::<i64>().with_context(|| format!("{key} must be an integer")))
                .transpose()
        };

        let database_url = var("DATABASE_URL")
            .or_else(|| var("DATABASE_PUBLIC_URL"))
            .context("DATABASE_URL is not set")?;

        let jwt = JwtConfig {
            secret: var("JWT_SECRET")
                .or_else(|| var("SECRET_KEY"))
                .context("JWT_SECRET is not set")?,
            issuer: var("JWT_ISSUER").unwrap_or_else(|| "fitcoach".into()),
            audience: var("JWT_AUDIENCE").unwrap_or_else(|| "fitcoach-users".into()),
            ttl_minutes: parsed("ACCESS_TOKEN_EXPIRE_MINUTES")?.unwrap_or(30),
        };
        anyhow::ensure!(jwt.ttl_minutes > 0, "ACCESS_TOKEN_EXPIRE_MINUTES must be positive");

        let allowed_origins = var("ALLOWED_ORIGINS")
            .unwrap_or_else(|| DEFAULT_ORIGINS.into())
            .split(',')
            .map(|o| o.trim().trim_end_matches('/').to_string())
            .filter(|o| !o.is_empty())
            .collect();

        let port = var("APP_PORT")
            .or_else(|| var("PORT"))
            .map(|p| p.trim().parse::<u16>().context("APP_PORT must be a port number"))
            .transpose()?
            .unwrap_or(8080);

        let drafting = DraftingConfig {
            api_key: var("OPENAI_API_KEY"),
            model: var("OPENAI_MODEL").unwrap_or_else(|| "gpt-4-turbo-preview".into()),
            base_url: var("OPENAI_BASE_URL")
                .unwrap_or_else(|| "https://api.openai.com/v1".into())
                .trim_end_matches('/')
                .to_string(),
            timeout_secs: parsed("DRAFT_TIMEOUT_SECS")?.unwrap_or(30).max(1) as u64,
            max_retries: parsed("DRAFT_MAX_RETRIES")?.unwrap_or(1).clamp(0, 5) as u32,
        };

        Ok(Self {
            database_url,
            db_max_connections: parsed("DB_MAX_CONNECTIONS")?.unwrap_or(10).clamp(1, 100) as u32,
            jwt,
            admin_code: var("ADMIN_CODE"),
            allowed_origins,
            host: var("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            drafting,
        })
    }
}
