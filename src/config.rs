use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// Phone number the checkout handoff message is addressed to.
    pub seller_phone: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let seller_phone = env::var("SELLER_PHONE").unwrap_or_else(|_| "+242064767604".to_string());
        Ok(Self {
            database_url,
            host,
            port,
            seller_phone,
        })
    }
}
