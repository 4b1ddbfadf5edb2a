use std::env;

use dotenv::dotenv;
use tracing::warn;

use crate::{
    panel::Locale,
    security::{MAX_SESSION_DAYS, MIN_SESSION_DAYS},
};

const DEFAULT_JWT_SECRET: &str = "change-me";
const DEFAULT_LOG_FILTER: &str = "user_admin=info,tower_http=info";

/// Server settings, read from the environment (and `.env` when present)
#[derive(Debug, Clone)]
pub struct Config {
    pub db_url: String,
    pub jwt_secret: String,
    pub jwt_maxage_days: i64,
    pub bind_addr: String,
    /// Reject state-changing API calls whose `X-CSRF-TOKEN` header does not match the session
    pub csrf_protection: bool,
    pub cors_origin: Option<String>,
    /// `tracing` filter directives (`RUST_LOG`)
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_url: "sqlite:user-admin.db?mode=rwc".to_string(),
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            jwt_maxage_days: 7,
            bind_addr: "0.0.0.0:8080".to_string(),
            csrf_protection: true,
            cors_origin: None,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Config {
    pub fn init() -> Config {
        dotenv().ok();
        let defaults = Config::default();

        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            warn!("JWT_SECRET is not set, falling back to an insecure default");
            defaults.jwt_secret.clone()
        });
        let jwt_maxage_days = match env::var("JWT_MAXAGE_DAYS") {
            Ok(raw) => parse_maxage_days(&raw).unwrap_or_else(|| {
                warn!(value = %raw, "JWT_MAXAGE_DAYS is not a number, using default");
                defaults.jwt_maxage_days
            }),
            Err(_) => defaults.jwt_maxage_days,
        };

        Config {
            db_url: env::var("DATABASE_URL").unwrap_or(defaults.db_url),
            jwt_secret,
            jwt_maxage_days,
            bind_addr: env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            csrf_protection: env_flag("CSRF_PROTECTION", defaults.csrf_protection),
            cors_origin: env::var("CORS_ORIGIN").ok().filter(|origin| !origin.is_empty()),
            log_filter: log_filter_from_env(),
        }
    }
}

/// Settings for the admin panel client
#[derive(Debug, Clone)]
pub struct PanelConfig {
    pub base_url: String,
    /// Discover the page's CSRF token and echo it back on writes and logout
    pub csrf: bool,
    pub locale: Locale,
    /// Page the panel is mounted on; its markup decides which regions exist
    pub page_path: String,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            csrf: true,
            locale: Locale::default(),
            page_path: "/admin".to_string(),
            email: None,
            password: None,
        }
    }
}

impl PanelConfig {
    pub fn from_env() -> PanelConfig {
        dotenv().ok();
        let defaults = PanelConfig::default();

        let locale = match env::var("ADMIN_LOCALE") {
            Ok(raw) => Locale::parse(&raw).unwrap_or_else(|| {
                warn!(value = %raw, "unknown ADMIN_LOCALE, using default");
                defaults.locale
            }),
            Err(_) => defaults.locale,
        };

        PanelConfig {
            base_url: env::var("ADMIN_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            csrf: env_flag("ADMIN_CSRF", defaults.csrf),
            locale,
            page_path: env::var("ADMIN_PAGE").unwrap_or(defaults.page_path),
            email: env::var("ADMIN_EMAIL").ok(),
            password: env::var("ADMIN_PASSWORD").ok(),
        }
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    match env::var(name) {
        Ok(raw) => parse_flag(&raw).unwrap_or_else(|| {
            warn!(name, value = %raw, "unrecognised boolean, using default");
            default
        }),
        Err(_) => default,
    }
}

/// Log filter from `RUST_LOG` (after loading `.env`). Needs no subscriber,
/// so binaries call it before anything logs.
pub fn log_filter_from_env() -> String {
    dotenv().ok();
    log_filter(env::var("RUST_LOG").ok().as_deref())
}

fn log_filter(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        Some(directives) if !directives.is_empty() => directives.to_owned(),
        _ => DEFAULT_LOG_FILTER.to_owned(),
    }
}

/// Session lifetime in days, clamped to what a token can carry
fn parse_maxage_days(raw: &str) -> Option<i64> {
    let days: i64 = raw.trim().parse().ok()?;
    let clamped = days.clamp(MIN_SESSION_DAYS, MAX_SESSION_DAYS);
    if clamped != days {
        warn!(days, clamped, "JWT_MAXAGE_DAYS out of range, clamping");
    }
    Some(clamped)
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.csrf_protection);
        assert_eq!(config.jwt_maxage_days, 7);
        assert_eq!(config.bind_addr, "0.0.0.0:8080");

        let panel = PanelConfig::default();
        assert!(panel.csrf);
        assert_eq!(panel.page_path, "/admin");
    }

    #[test]
    fn test_log_filter() {
        assert_eq!(log_filter(None), DEFAULT_LOG_FILTER);
        assert_eq!(log_filter(Some("  ")), DEFAULT_LOG_FILTER);
        assert_eq!(log_filter(Some("debug")), "debug");
    }

    #[test]
    fn test_parse_maxage_days() {
        assert_eq!(parse_maxage_days(" 14 "), Some(14));
        assert_eq!(parse_maxage_days("0"), Some(MIN_SESSION_DAYS));
        assert_eq!(parse_maxage_days("9223372036854775807"), Some(MAX_SESSION_DAYS));
        assert_eq!(parse_maxage_days("week"), None);
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" off "), Some(false));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}
