use std::net::IpAddr;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub host: IpAddr,
    pub port: u16,
    pub base_url: String,
    pub max_body_size: usize,
    pub recovery: RecoveryConfig,
    pub session_ttl_hours: i64,
    pub log_level: String,
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Clone)]
pub struct RecoveryConfig {
    /// Lifetime of a freshly issued recovery token.
    pub token_ttl_minutes: i64,
    /// Recovery requests allowed per identity in a 15 minute window.
    pub max_requests: u32,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            token_ttl_minutes: 15,
            max_requests: 5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub from: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_required("DATABASE_URL")?;
        let jwt_secret = env_required("JWT_SECRET")?;

        let host: IpAddr = env_or("RECOVERY_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid RECOVERY_HOST: {e}"))?;

        let port: u16 = env_or("RECOVERY_PORT", "3000")
            .parse()
            .map_err(|e| format!("Invalid RECOVERY_PORT: {e}"))?;

        let base_url = env_or("RECOVERY_BASE_URL", &format!("http://{host}:{port}"))
            .trim_end_matches('/')
            .to_string();

        let max_body_size: usize = env_or("RECOVERY_MAX_BODY_SIZE", "65536")
            .parse()
            .map_err(|e| format!("Invalid RECOVERY_MAX_BODY_SIZE: {e}"))?;

        let token_ttl_minutes: i64 = env_or("RECOVERY_TOKEN_TTL_MINUTES", "15")
            .parse()
            .map_err(|e| format!("Invalid RECOVERY_TOKEN_TTL_MINUTES: {e}"))?;
        if token_ttl_minutes <= 0 {
            return Err("RECOVERY_TOKEN_TTL_MINUTES must be positive".to_string());
        }

        let max_requests: u32 = env_or("RECOVERY_MAX_REQUESTS", "5")
            .parse()
            .map_err(|e| format!("Invalid RECOVERY_MAX_REQUESTS: {e}"))?;

        let session_ttl_hours: i64 = env_or("RECOVERY_SESSION_TTL_HOURS", "720")
            .parse()
            .map_err(|e| format!("Invalid RECOVERY_SESSION_TTL_HOURS: {e}"))?;

        let log_level = env_or("RECOVERY_LOG_LEVEL", "info");

        let smtp = match (
            std::env::var("RECOVERY_SMTP_HOST").ok(),
            std::env::var("RECOVERY_SMTP_PORT").ok(),
            std::env::var("RECOVERY_SMTP_USER").ok(),
            std::env::var("RECOVERY_SMTP_PASS").ok(),
            std::env::var("RECOVERY_SMTP_FROM").ok(),
        ) {
            (Some(host), Some(port), Some(user), Some(pass), Some(from)) => Some(SmtpConfig {
                host,
                port: port
                    .parse()
                    .map_err(|e| format!("Invalid RECOVERY_SMTP_PORT: {e}"))?,
                user,
                pass,
                from,
            }),
            _ => None,
        };

        Ok(Config {
            database_url,
            jwt_secret,
            host,
            port,
            base_url,
            max_body_size,
            recovery: RecoveryConfig {
                token_ttl_minutes,
                max_requests,
            },
            session_ttl_hours,
            log_level,
            smtp,
        })
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
