// config.rs
use thiserror::Error;
use tracing::level_filters::LevelFilter;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    /// No URL means the in-memory store.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub jwt_maxage: i64,
    pub port: u16,
    pub admin_email_domains: Vec<String>,
    pub resend_api_key: Option<String>,
    pub from_email: String,
    pub log_level: LevelFilter,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
    pub name: String,
}

impl Config {
    pub fn init() -> Result<Config, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &'static str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &'static str| var(name).ok_or(ConfigError::Missing(name));

        let jwt_secret = required("JWT_SECRET_KEY")?;

        let jwt_maxage = match var("JWT_MAXAGE") {
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|minutes| *minutes > 0)
                .ok_or(ConfigError::Invalid {
                    name: "JWT_MAXAGE",
                    value: raw,
                })?,
            None => 60,
        };

        let port = match var("PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value: raw,
            })?,
            None => 8000,
        };

        let domains_raw = required("ADMIN_EMAIL_DOMAINS")?;
        let admin_email_domains: Vec<String> = domains_raw
            .split(',')
            .map(|d| d.trim().trim_start_matches('@').to_lowercase())
            .filter(|d| !d.is_empty())
            .collect();
        if admin_email_domains.is_empty() {
            return Err(ConfigError::Invalid {
                name: "ADMIN_EMAIL_DOMAINS",
                value: domains_raw,
            });
        }

        let log_level = match var("LOG_LEVEL") {
            Some(raw) => raw.trim().parse::<LevelFilter>().map_err(|_| ConfigError::Invalid {
                name: "LOG_LEVEL",
                value: raw,
            })?,
            None => LevelFilter::DEBUG,
        };

        let bootstrap_admin = match (var("BOOTSTRAP_ADMIN_EMAIL"), var("BOOTSTRAP_ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(BootstrapAdmin {
                email,
                password,
                name: var("BOOTSTRAP_ADMIN_NAME").unwrap_or_else(|| "Administrator".to_string()),
            }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing("BOOTSTRAP_ADMIN_PASSWORD")),
            (None, Some(_)) => return Err(ConfigError::Missing("BOOTSTRAP_ADMIN_EMAIL")),
        };

        Ok(Config {
            database_url: var("DATABASE_URL"),
            jwt_secret,
            jwt_maxage,
            port,
            admin_email_domains,
            resend_api_key: var("RESEND_API_KEY"),
            from_email: var("FROM_EMAIL")
                .unwrap_or_else(|| "WorkBridge <noreply@workbridge.dev>".to_string()),
            log_level,
            bootstrap_admin,
        })
    }
}
