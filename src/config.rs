use std::net::IpAddr;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub host: IpAddr,
    pub port: u16,
    pub max_body_size: usize,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_required("DATABASE_URL")?;
        let jwt_secret = env_required("JWT_SECRET")?;

        let host: IpAddr = env_or("STRIDE_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid STRIDE_HOST: {e}"))?;

        let port: u16 = env_or("STRIDE_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid STRIDE_PORT: {e}"))?;

        let max_body_size: usize = env_or("STRIDE_MAX_BODY_SIZE", "1048576")
            .parse()
            .map_err(|e| format!("Invalid STRIDE_MAX_BODY_SIZE: {e}"))?;

        let log_level = env_or("STRIDE_LOG_LEVEL", "info");

        Ok(Config {
            database_url,
            jwt_secret,
            host,
            port,
            max_body_size,
            log_level,
        })
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
