//! [`Config`]-related definitions.

use std::time;

use config::{builder::DefaultState, ConfigBuilder, ConfigError};
use hub::{command::reconcile_services::Automation, task};
use secrecy::SecretString;
use serde::Deserialize;
use smart_default::SmartDefault;

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: Server,

    /// Hub configuration.
    pub hub: Hub,

    /// Postgres configuration.
    pub postgres: Postgres,

    /// Log configuration.
    pub log: Log,
}

impl Config {
    /// Creates a new [`Config`] by:
    /// - loading it from the provided `path` (if any);
    /// - merging it with the environment variables (if any);
    /// - using default values for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(path: impl AsRef<str>) -> Result<Self, ConfigError> {
        ConfigBuilder::<DefaultState>::default()
            .add_source(config::File::with_name(path.as_ref()).required(false))
            .add_source(config::Environment::with_prefix("CONF").separator("."))
            .build()?
            .try_deserialize()
    }
}

/// Server configuration.
#[derive(Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Server {
    /// Host to bind the server to.
    #[default("0.0.0.0".to_owned())]
    pub host: String,

    /// Port to bind the server to.
    #[default(8080)]
    pub port: u16,

    /// [CORS] configuration.
    ///
    /// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
    pub cors: Cors,

    /// Bearer token required by GraphQL mutations.
    ///
    /// Mutations are open to everyone if [`None`].
    pub api_token: Option<SecretString>,
}

/// [CORS] configuration.
///
/// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Cors {
    /// List of allowed origins.
    #[default(vec!["*".to_owned()])]
    pub origins: Vec<String>,
}

/// Hub configuration.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Hub {
    /// Hub tasks configuration.
    pub tasks: Tasks,
}

impl From<Hub> for hub::Config {
    fn from(value: Hub) -> Self {
        let Hub {
            tasks:
                Tasks {
                    reconcile_services,
                    expire_services,
                },
        } = value;
        Self {
            reconcile_services: task::reconcile_services::Config {
                interval: reconcile_services.interval,
                automation: Automation {
                    activate_on_payment: reconcile_services
                        .activate_on_payment,
                    suspend_overdue_after: reconcile_services
                        .suspend_overdue_after_days,
                },
            },
            expire_services: task::expire_services::Config {
                interval: expire_services.interval,
            },
        }
    }
}

/// Hub tasks configuration.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Tasks {
    /// `ReconcileServices` task configuration.
    pub reconcile_services: ReconcileServices,

    /// `ExpireServices` task configuration.
    pub expire_services: ExpireServices,
}

/// `ReconcileServices` task configuration.
#[derive(Clone, Copy, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct ReconcileServices {
    /// Task execution interval.
    #[default(time::Duration::from_secs(60 * 15))]
    #[serde(with = "humantime_serde")]
    pub interval: time::Duration,

    /// Indicator whether paid `PENDING` and `SUSPENDED` services are
    /// activated automatically.
    pub activate_on_payment: bool,

    /// Number of overdue days after which unpaid `ACTIVE` services are
    /// suspended automatically.
    ///
    /// Automatic suspension is disabled if [`None`].
    pub suspend_overdue_after_days: Option<u16>,
}

/// `ExpireServices` task configuration.
#[derive(Clone, Copy, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct ExpireServices {
    /// Task execution interval.
    #[default(time::Duration::from_secs(60 * 60))]
    #[serde(with = "humantime_serde")]
    pub interval: time::Duration,
}

/// Postgres configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Postgres {
    /// Host to connect to.
    #[default("127.0.0.1".to_owned())]
    pub host: String,

    /// Port to connect to.
    #[default(5432)]
    pub port: u16,

    /// User to connect as.
    #[default("postgres".to_owned())]
    pub user: String,

    /// Password to connect with.
    #[default("postgres".to_owned())]
    pub password: String,

    /// Database name to connect to.
    #[default("domainhub".to_owned())]
    pub dbname: String,
}

impl From<Postgres> for hub::infra::postgres::Config {
    fn from(value: Postgres) -> Self {
        let Postgres {
            host,
            port,
            user,
            password,
            dbname,
        } = value;

        Self {
            host: Some(host),
            port: Some(port),
            user: Some(user),
            password: Some(password),
            dbname: Some(dbname),
            ..Self::default()
        }
    }
}

/// Log configuration.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Log {
    /// Log level.
    pub level: LogLevel,
}

/// Log level.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    /// Designates very low priority, often extremely verbose, information.
    Trace,

    /// Designates lower priority information.
    Debug,

    /// Designates useful information.
    #[default]
    Info,

    /// Designates hazardous situations.
    Warn,

    /// Designates very serious errors.
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use config::{builder::DefaultState, ConfigBuilder, FileFormat};
    use secrecy::ExposeSecret as _;

    use super::Config;

    fn parse(toml: &str) -> Config {
        ConfigBuilder::<DefaultState>::default()
            .add_source(config::File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn disables_automation_by_default() {
        let conf = hub::Config::from(parse("").hub);

        assert!(!conf.reconcile_services.automation.is_enabled());
        assert_eq!(
            conf.reconcile_services.interval,
            Duration::from_secs(60 * 15),
        );
        assert_eq!(conf.expire_services.interval, Duration::from_secs(3600));
    }

    #[test]
    fn reads_automation_and_token() {
        let conf = parse(
            r#"
            [server]
            api_token = "s3cr3t"

            [hub.tasks.reconcile_services]
            interval = "5m"
            activate_on_payment = true
            suspend_overdue_after_days = 30

            [hub.tasks.expire_services]
            interval = "24h"
            "#,
        );

        assert_eq!(
            conf.server.api_token.as_ref().map(|t| t.expose_secret()),
            Some("s3cr3t"),
        );

        let conf = hub::Config::from(conf.hub);
        let automation = conf.reconcile_services.automation;
        assert!(automation.activate_on_payment);
        assert_eq!(automation.suspend_overdue_after, Some(30));
        assert_eq!(conf.reconcile_services.interval, Duration::from_secs(300));
        assert_eq!(
            conf.expire_services.interval,
            Duration::from_secs(60 * 60 * 24),
        );
    }
}
