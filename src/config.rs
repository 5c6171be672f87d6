use std::str::FromStr;

use crate::errors::ServerError;

pub const DEFAULT_JSON_LIMIT: usize = 256 * 1024;

/// Server settings, read from the environment (and `.env`).
#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// Pepper for update secret hashes
    pub secret_key: Option<String>,
    /// Only origin allowed by CORS; any origin when unset
    pub frontend_origin: Option<String>,
    pub rate_limit_replenish_secs: u64,
    pub rate_limit_burst: u32,
    pub pool_size: u32,
    pub json_limit: usize,
}

impl Config {
    pub fn from_env() -> Result<Config, ServerError> {
        Config::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Config, ServerError> {
        let required = |key: &str| {
            lookup(key).ok_or_else(|| {
                log::error!("env {key} is not set");
                ServerError::EnvironmentError
            })
        };
        let optional = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Ok(Config {
            database_url: required("DATABASE_URL")?,
            port: parse(&required("PORT")?, "PORT")?,
            secret_key: optional("SECRET_KEY"),
            frontend_origin: optional("FRONTEND_ORIGIN"),
            rate_limit_replenish_secs: parse_or(
                optional("RATE_LIMIT_REPLENISH_SECS"),
                "RATE_LIMIT_REPLENISH_SECS",
                2,
            )?,
            rate_limit_burst: parse_or(optional("RATE_LIMIT_BURST"), "RATE_LIMIT_BURST", 30)?,
            pool_size: parse_or(optional("DATABASE_POOL_SIZE"), "DATABASE_POOL_SIZE", 10)?,
            json_limit: parse_or(
                optional("JSON_LIMIT_BYTES"),
                "JSON_LIMIT_BYTES",
                DEFAULT_JSON_LIMIT,
            )?,
        })
    }
}

fn parse<T: FromStr>(value: &str, key: &str) -> Result<T, ServerError> {
    value.trim().parse::<T>().map_err(|_| {
        log::error!("env {key} must be a positive integer");
        ServerError::EnvironmentError
    })
}

fn parse_or<T: FromStr>(value: Option<String>, key: &str, default: T) -> Result<T, ServerError> {
    match value {
        Some(value) => parse(&value, key),
        None => Ok(default),
    }
}
