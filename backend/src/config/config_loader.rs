use anyhow::{Context, Result};
use crates::payments::polar_client::PolarEnvironment;

use super::config_model::{
    App, AuthSecret, BackendServer, Database, DotEnvyConfig, Email, ExpirySweep, PlanCache, Polar,
};

const DEFAULT_PLAN_CACHE_TTL_SECONDS: u64 = 300;
const DEFAULT_EXPIRY_SWEEP_INTERVAL_SECONDS: u64 = 3600;

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let backend_server = BackendServer {
        port: required("SERVER_PORT_BACKEND")?
            .parse()
            .context("SERVER_PORT_BACKEND is invalid")?,
        body_limit: required("SERVER_BODY_LIMIT")?
            .parse()
            .context("SERVER_BODY_LIMIT is invalid")?,
        timeout: required("SERVER_TIMEOUT")?
            .parse()
            .context("SERVER_TIMEOUT is invalid")?,
    };

    let database = Database {
        url: required("DATABASE_URL")?,
    };

    let app = App {
        base_url: optional("APP_BASE_URL")
            .unwrap_or_else(|| "http://localhost:3000".to_string())
            .trim_end_matches('/')
            .to_string(),
    };

    let jwt_secret = required("JWT_SECRET")?;
    if jwt_secret.len() < 32 {
        anyhow::bail!("JWT_SECRET must be at least 32 bytes");
    }
    let auth = AuthSecret { jwt_secret };

    let polar = Polar {
        access_token: required("POLAR_ACCESS_TOKEN")?,
        webhook_secret: required("POLAR_WEBHOOK_SECRET")?,
        environment: PolarEnvironment::from_str(&optional("POLAR_ENV").unwrap_or_default()),
        organization_id: optional("POLAR_ORGANIZATION_ID"),
    };

    let email = Email {
        resend_api_key: required("RESEND_API_KEY")?,
        from_address: required("EMAIL_FROM_ADDRESS")?,
        from_name: optional("EMAIL_FROM_NAME"),
    };

    let plan_cache = PlanCache {
        ttl_seconds: parse_or("PLAN_CACHE_TTL_SECONDS", DEFAULT_PLAN_CACHE_TTL_SECONDS)?,
    };

    let expiry_sweep = ExpirySweep {
        interval_seconds: parse_or(
            "EXPIRY_SWEEP_INTERVAL_SECONDS",
            DEFAULT_EXPIRY_SWEEP_INTERVAL_SECONDS,
        )?,
        internal_token: optional("INTERNAL_SWEEP_TOKEN"),
    };

    Ok(DotEnvyConfig {
        backend_server,
        database,
        app,
        auth,
        polar,
        email,
        plan_cache,
        expiry_sweep,
    })
}

fn required(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("{} is invalid", key))
}

fn optional(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_or(key: &str, default: u64) -> Result<u64> {
    match optional(key) {
        Some(value) => value
            .parse()
            .with_context(|| format!("{} is invalid", key)),
        None => Ok(default),
    }
}
