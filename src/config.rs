// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment at startup. A `.env` file in
//! the working directory is read first when present; real environment
//! variables take precedence.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` (or `SERVER_PORT`) | Server bind port | `8080` |
//! | `DATABASE_PATH` | redb database file | `data/orders.redb` |
//! | `OIDC_PROVIDER_URL` | Identity provider issuer URL | Required |
//! | `OIDC_CLIENT_ID` | Expected token audience | Required |
//! | `AUTH_TIMEOUT_SECS` | Upper bound on one token verification | `10` |
//! | `AT_USERNAME` | SMS gateway username | empty (sends skipped) |
//! | `AT_API_KEY` | SMS gateway API key | empty (sends skipped) |
//! | `AT_ENV` | `sandbox` or production | production |
//! | `AT_BASE_URL` | SMS gateway host override | per `AT_ENV` |
//! | `NOTIFY_MAX_IN_FLIGHT` | Concurrent SMS sends, `0` = unbounded | `64` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::notify::sms::SmsSettings;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const SERVER_PORT_ENV: &str = "SERVER_PORT";
pub const DATABASE_PATH_ENV: &str = "DATABASE_PATH";
pub const OIDC_PROVIDER_URL_ENV: &str = "OIDC_PROVIDER_URL";
pub const OIDC_CLIENT_ID_ENV: &str = "OIDC_CLIENT_ID";
pub const AUTH_TIMEOUT_ENV: &str = "AUTH_TIMEOUT_SECS";
pub const AT_USERNAME_ENV: &str = "AT_USERNAME";
pub const AT_API_KEY_ENV: &str = "AT_API_KEY";
pub const AT_ENV_ENV: &str = "AT_ENV";
pub const AT_BASE_URL_ENV: &str = "AT_BASE_URL";
pub const NOTIFY_MAX_IN_FLIGHT_ENV: &str = "NOTIFY_MAX_IN_FLIGHT";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATABASE_PATH: &str = "data/orders.redb";
const DEFAULT_AUTH_TIMEOUT_SECS: u64 = 10;
const DEFAULT_NOTIFY_MAX_IN_FLIGHT: usize = 64;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Fully resolved service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: PathBuf,
    pub oidc_provider_url: String,
    pub oidc_client_id: String,
    pub auth_timeout: Duration,
    pub sms: SmsSettings,
    pub notify_max_in_flight: usize,
    pub log_format: LogFormat,
}

impl Config {
    /// Load `.env` (if any) and read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let port: Option<u16> = match get(PORT_ENV) {
            Some(value) => parse(PORT_ENV, Some(value))?,
            None => parse(SERVER_PORT_ENV, get(SERVER_PORT_ENV))?,
        };

        let log_format = get(LOG_FORMAT_ENV).map(|v| v.to_ascii_lowercase());
        let log_format = match log_format.as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: LOG_FORMAT_ENV,
                    reason: format!("expected 'json' or 'pretty', got '{other}'"),
                })
            }
        };

        Ok(Self {
            host: get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: port.unwrap_or(DEFAULT_PORT),
            database_path: PathBuf::from(
                get(DATABASE_PATH_ENV).unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string()),
            ),
            oidc_provider_url: get(OIDC_PROVIDER_URL_ENV)
                .ok_or(ConfigError::Missing(OIDC_PROVIDER_URL_ENV))?,
            oidc_client_id: get(OIDC_CLIENT_ID_ENV)
                .ok_or(ConfigError::Missing(OIDC_CLIENT_ID_ENV))?,
            auth_timeout: Duration::from_secs(
                parse(AUTH_TIMEOUT_ENV, get(AUTH_TIMEOUT_ENV))?
                    .unwrap_or(DEFAULT_AUTH_TIMEOUT_SECS),
            ),
            sms: SmsSettings {
                username: get(AT_USERNAME_ENV).unwrap_or_default(),
                api_key: get(AT_API_KEY_ENV).unwrap_or_default(),
                environment: get(AT_ENV_ENV).unwrap_or_default(),
                base_url: get(AT_BASE_URL_ENV),
            },
            notify_max_in_flight: parse(NOTIFY_MAX_IN_FLIGHT_ENV, get(NOTIFY_MAX_IN_FLIGHT_ENV))?
                .unwrap_or(DEFAULT_NOTIFY_MAX_IN_FLIGHT),
            log_format,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse<T>(name: &'static str, value: Option<String>) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .map(|v| {
            v.parse::<T>().map_err(|e| ConfigError::Invalid {
                name,
                reason: format!("'{v}': {e}"),
            })
        })
        .transpose()
}
