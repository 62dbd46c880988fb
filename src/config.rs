use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    /// "dev" enables permissive CORS — the UI runs on a different port
    /// locally. In hosting, UI and API share an origin.
    pub environment: String,
    /// Endpoint that kicks off the dataset provisioning pipeline on
    /// approval. Unset = skip the trigger (no pipeline in this environment).
    pub provisioning_url: Option<String>,
}

impl Config {
    pub fn is_dev(&self) -> bool {
        self.environment == "dev"
    }
}

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();

    Ok(Config {
        port: std::env::var("ACCESSDESK_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(8000),
        database_url: std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost/accessdesk".into()),
        environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".into()),
        provisioning_url: std::env::var("DATA_PROVISIONING_URL")
            .ok()
            .filter(|v| !v.is_empty()),
    })
}
