use anyhow::{bail, Context, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// `memory://`, `sqlite://<path>` or `file://<path>`
    pub command_log: String,
    /// Log and skip commands that fail during replay instead of aborting startup
    pub skip_errors: bool,
    pub base_url: String,
    pub tick_interval: Duration,
    pub bcrypt_cost: u32,
    pub fetch_previews: bool,
    /// When set, wraps the email transport so this share of sends fails
    pub email_failure_rate: Option<f64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            command_log: "memory://".to_string(),
            skip_errors: false,
            base_url: "http://localhost:8080".to_string(),
            tick_interval: Duration::from_millis(1000),
            bcrypt_cost: bcrypt::DEFAULT_COST,
            fetch_previews: true,
            email_failure_rate: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let defaults = Self::default();

        let email_failure_rate = match env::var("COMMONS_EMAIL_FAILURE_RATE").ok() {
            Some(raw) => {
                let rate: f64 = raw
                    .parse()
                    .context("COMMONS_EMAIL_FAILURE_RATE must be a number")?;
                if !(0.0..1.0).contains(&rate) {
                    bail!("COMMONS_EMAIL_FAILURE_RATE must be in [0, 1), got {}", rate);
                }
                Some(rate)
            }
            None => None,
        };

        Ok(Self {
            command_log: env::var("COMMONS_COMMAND_LOG").unwrap_or(defaults.command_log),
            skip_errors: parse_bool("COMMONS_SKIP_ERRORS", defaults.skip_errors)?,
            base_url: env::var("COMMONS_BASE_URL").unwrap_or(defaults.base_url),
            tick_interval: match env::var("COMMONS_TICK_MS").ok() {
                Some(ms) => Duration::from_millis(
                    ms.parse().context("COMMONS_TICK_MS must be a valid number")?,
                ),
                None => defaults.tick_interval,
            },
            bcrypt_cost: match env::var("COMMONS_BCRYPT_COST").ok() {
                Some(cost) => cost
                    .parse()
                    .context("COMMONS_BCRYPT_COST must be a valid number")?,
                None => defaults.bcrypt_cost,
            },
            fetch_previews: parse_bool("COMMONS_FETCH_PREVIEWS", defaults.fetch_previews)?,
            email_failure_rate,
        })
    }
}

fn parse_bool(name: &str, default: bool) -> Result<bool> {
    match env::var(name).ok().as_deref().map(str::to_ascii_lowercase).as_deref() {
        None => Ok(default),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(other) => bail!("{} must be a boolean, got {:?}", name, other),
    }
}
