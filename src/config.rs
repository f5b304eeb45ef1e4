use std::env;
use std::path::PathBuf;
use std::time::Duration;

use chrono::TimeDelta;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub event_buffer_size: usize,
    pub store_path: Option<PathBuf>,
    pub demo_username: String,
    pub demo_password: String,
    pub login_delay: Duration,
    pub rejection_threshold: u32,
    pub block_duration: Duration,
    pub block_poll_interval: Duration,
    pub order_delay_min: Duration,
    pub order_delay_max: Duration,
    pub request_timeout: Duration,
    pub notification_capacity: usize,
    pub notification_ttl: Duration,
    pub verification_delay: Duration,
    pub idle_tick: Duration,
    pub idle_warning_ticks: u32,
    pub demo_seed: bool,
    pub rng_seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: 3000,
            log_level: "info".to_string(),
            event_buffer_size: 256,
            store_path: None,
            demo_username: "delivery123".to_string(),
            demo_password: "delivery123".to_string(),
            login_delay: Duration::from_millis(500),
            rejection_threshold: 3,
            block_duration: Duration::from_secs(5 * 60),
            block_poll_interval: Duration::from_secs(5),
            order_delay_min: Duration::from_millis(5_000),
            order_delay_max: Duration::from_millis(15_000),
            request_timeout: Duration::from_secs(30),
            notification_capacity: 10,
            notification_ttl: Duration::from_millis(3_300),
            verification_delay: Duration::from_secs(5),
            idle_tick: Duration::from_secs(60),
            idle_warning_ticks: 5,
            demo_seed: true,
            rng_seed: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();
        let defaults = Self::default();

        let config = Self {
            http_port: parse_or_default("HTTP_PORT", defaults.http_port)?,
            log_level: env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", defaults.event_buffer_size)?,
            store_path: env::var("STORE_PATH").ok().map(PathBuf::from),
            demo_username: env::var("DEMO_USERNAME").unwrap_or(defaults.demo_username),
            demo_password: env::var("DEMO_PASSWORD").unwrap_or(defaults.demo_password),
            login_delay: millis_or_default("LOGIN_DELAY_MS", defaults.login_delay)?,
            rejection_threshold: parse_or_default(
                "REJECTION_THRESHOLD",
                defaults.rejection_threshold,
            )?,
            block_duration: secs_or_default("BLOCK_DURATION_SECS", defaults.block_duration)?,
            block_poll_interval: secs_or_default("BLOCK_POLL_SECS", defaults.block_poll_interval)?,
            order_delay_min: millis_or_default("ORDER_DELAY_MIN_MS", defaults.order_delay_min)?,
            order_delay_max: millis_or_default("ORDER_DELAY_MAX_MS", defaults.order_delay_max)?,
            request_timeout: secs_or_default("REQUEST_TIMEOUT_SECS", defaults.request_timeout)?,
            notification_capacity: parse_or_default(
                "NOTIFICATION_CAPACITY",
                defaults.notification_capacity,
            )?,
            notification_ttl: millis_or_default("NOTIFICATION_TTL_MS", defaults.notification_ttl)?,
            verification_delay: secs_or_default(
                "VERIFICATION_DELAY_SECS",
                defaults.verification_delay,
            )?,
            idle_tick: secs_or_default("IDLE_TICK_SECS", defaults.idle_tick)?,
            idle_warning_ticks: parse_or_default("IDLE_WARNING_TICKS", defaults.idle_warning_ticks)?,
            demo_seed: parse_or_default("DEMO_SEED", defaults.demo_seed)?,
            rng_seed: match env::var("RNG_SEED") {
                Ok(raw) => Some(
                    raw.parse()
                        .map_err(|err| AppError::Config(format!("invalid RNG_SEED: {err}")))?,
                ),
                Err(_) => None,
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.rejection_threshold == 0 {
            return Err(AppError::Config("REJECTION_THRESHOLD must be > 0".to_string()));
        }
        if self.notification_capacity == 0 {
            return Err(AppError::Config("NOTIFICATION_CAPACITY must be > 0".to_string()));
        }
        if self.order_delay_min > self.order_delay_max {
            return Err(AppError::Config(
                "ORDER_DELAY_MIN_MS must not exceed ORDER_DELAY_MAX_MS".to_string(),
            ));
        }
        if self.block_poll_interval.is_zero() {
            return Err(AppError::Config("BLOCK_POLL_SECS must be > 0".to_string()));
        }
        if self.idle_tick.is_zero() {
            return Err(AppError::Config("IDLE_TICK_SECS must be > 0".to_string()));
        }
        if TimeDelta::from_std(self.block_duration).is_err() {
            return Err(AppError::Config(
                "BLOCK_DURATION_SECS is out of range".to_string(),
            ));
        }
        if self.event_buffer_size == 0 {
            return Err(AppError::Config("EVENT_BUFFER_SIZE must be > 0".to_string()));
        }
        Ok(())
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Config(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}

fn millis_or_default(key: &str, default: Duration) -> Result<Duration, AppError> {
    let millis = parse_or_default(key, default.as_millis() as u64)?;
    Ok(Duration::from_millis(millis))
}

fn secs_or_default(key: &str, default: Duration) -> Result<Duration, AppError> {
    let secs = parse_or_default(key, default.as_secs())?;
    Ok(Duration::from_secs(secs))
}
