// © https://github.com/LukeMathWalker/zero-to-production

use std::{
    convert::{TryFrom, TryInto},
    time::Duration,
};

use config::{Config, ConfigError};
use serde::Deserialize;
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions, PgSslMode},
    PgPool,
};

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub database: DatabaseSettings,
    pub daemon: DaemonSettings,
    pub enforcer: EnforcerSettings,
    pub monitor: MonitorSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub database_name: String,
    pub require_ssl: bool,
}

///
/// Connection to the node daemon that applies suspensions and reports utilization.
///
#[derive(Debug, Deserialize, Clone)]
pub struct DaemonSettings {
    pub base_url: String,
    pub token: String,
    pub timeout_seconds: Seconds,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EnforcerSettings {
    pub enabled: bool,
    pub interval_seconds: Seconds,
}

///
/// Settings of the `lapse-monitor` dashboard.
///
#[derive(Debug, Deserialize, Clone)]
pub struct MonitorSettings {
    pub panel_url: String,
    pub poll_interval_seconds: Seconds,
    pub status_interval_seconds: Seconds,
    pub refresh_seconds: Seconds,
    pub timeout_seconds: Seconds,
}

///
/// Provides a validated, non-zero amount of seconds for intervals and timeouts.
///
/// Deserializing a `0` fails, so a zero period never reaches a timer.
///
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(try_from = "u64")]
pub struct Seconds(u64);

impl Seconds {
    ///
    /// Parse [`Seconds`] from a raw value.
    ///
    /// This ensures the value is at least one second.
    ///
    pub fn parse(value: u64) -> Result<Seconds, String> {
        if value >= 1 {
            Ok(Self(value))
        } else {
            Err(format!("{} is not a valid amount of seconds!", value))
        }
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(self.0)
    }
}

impl TryFrom<u64> for Seconds {
    type Error = String;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl DatabaseSettings {
    ///
    /// Get [PgConnectOptions](sqlx::postgres::PgConnectOptions) without a specific database.
    ///
    pub fn without_db(&self) -> PgConnectOptions {
        let ssl_mode = if self.require_ssl {
            PgSslMode::Require
        } else {
            PgSslMode::Prefer
        };

        PgConnectOptions::new()
            .username(&self.username)
            .password(&self.password)
            .host(&self.host)
            .port(self.port)
            .ssl_mode(ssl_mode)
    }

    ///
    /// Get [PgConnectOptions](sqlx::postgres::PgConnectOptions) with the database specified in the settings.
    ///
    pub fn with_db(&self) -> PgConnectOptions {
        self.without_db().database(&self.database_name)
    }
}

impl DaemonSettings {
    pub fn timeout(&self) -> Duration {
        self.timeout_seconds.as_duration()
    }
}

impl EnforcerSettings {
    pub fn interval(&self) -> Duration {
        self.interval_seconds.as_duration()
    }
}

impl MonitorSettings {
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval_seconds.as_duration()
    }

    pub fn status_interval(&self) -> Duration {
        self.status_interval_seconds.as_duration()
    }

    pub fn refresh_interval(&self) -> Duration {
        self.refresh_seconds.as_duration()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout_seconds.as_duration()
    }
}

///
/// Available settings environments
///
#[derive(Debug)]
pub enum Environment {
    Local,
    Production,
    Testing,
}

impl Environment {
    ///
    /// Get the string representation for an enum.
    /// This can be used to load the settings files.
    ///
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
            Environment::Testing => "testing",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            "testing" => Ok(Self::Testing),
            other => Err(format!("Unknown environment {:?}!", other)),
        }
    }
}

///
/// Get an instance of the settings.
///
/// This uses the current `APP_ENV` to dertermine the settings file to load.
///
pub fn get_settings() -> Result<Settings, ConfigError> {
    let base_path = std::env::current_dir()
        .map_err(|e| ConfigError::Message(format!("Error while getting current directory: {e}")))?;
    let settings_directory = base_path.join("settings");

    let environment: Environment = std::env::var("APP_ENV")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(ConfigError::Message)?;

    Config::builder()
        .add_source(config::File::from(settings_directory.join("base")).required(true))
        .add_source(
            config::File::from(settings_directory.join(environment.as_str())).required(true),
        )
        .add_source(config::Environment::with_prefix("app").separator("__"))
        .build()?
        .try_deserialize()
}

///
/// Get a [`PgPool`] from the supplied [`DatabaseSettings`].
///
/// Also sets a default timeout of 5 seconds.
///
pub async fn get_db_pool(settings: &DatabaseSettings) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .acquire_timeout(Duration::from_secs(5))
        .connect_with(settings.with_db())
        .await
}
