use crates::payments::polar_client::PolarEnvironment;

#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub backend_server: BackendServer,
    pub database: Database,
    pub app: App,
    pub auth: AuthSecret,
    pub polar: Polar,
    pub email: Email,
    pub plan_cache: PlanCache,
    pub expiry_sweep: ExpirySweep,
}

#[derive(Debug, Clone)]
pub struct BackendServer {
    pub port: u16,
    pub body_limit: u64,
    pub timeout: u64,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct App {
    pub base_url: String,
}

impl App {
    pub fn login_url(&self) -> String {
        format!("{}/login", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Clone)]
pub struct AuthSecret {
    pub jwt_secret: String,
}

#[derive(Debug, Clone)]
pub struct Polar {
    pub access_token: String,
    pub webhook_secret: String,
    pub environment: PolarEnvironment,
    pub organization_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Email {
    pub resend_api_key: String,
    pub from_address: String,
    pub from_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PlanCache {
    pub ttl_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct ExpirySweep {
    pub interval_seconds: u64,
    pub internal_token: Option<String>,
}
