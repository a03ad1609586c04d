use anyhow::{Context, Result, bail};
use chrono::{TimeDelta, Utc};
use sea_orm::Database;
use serde::Deserialize;
use social::Policy;
use tracing::{debug, info};

use crate::schemas::AppState;

const DEFAULT_DATABASE_URL: &str = "sqlite://socialnet.db?mode=rwc";
const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";
const DEFAULT_SESSION_TTL_HOURS: i64 = 24 * 14;

/// Runtime settings of the server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    pub database_url: String,
    pub bind_address: String,
    pub session_ttl_hours: i64,
    pub allow_self_follow: bool,
    pub secure_cookies: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            session_ttl_hours: DEFAULT_SESSION_TTL_HOURS,
            allow_self_follow: false,
            secure_cookies: false,
        }
    }
}

impl Settings {
    /// Load settings.
    ///
    /// Sources, later ones winning:
    /// 1. built-in defaults
    /// 2. `socialnet.toml` in the working directory, if present
    /// 3. environment variables with the `SOCIALNET_` prefix
    ///
    /// A `.env` file is read into the environment first.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let settings: Self = Self::builder()?
            .add_source(config::File::with_name("socialnet").required(false))
            .add_source(config::Environment::with_prefix("SOCIALNET").try_parsing(true))
            .build()?
            .try_deserialize()
            .context("Invalid configuration")?;
        settings.policy()?;

        debug!("Loaded settings: {:?}", settings);
        Ok(settings)
    }

    fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
        let defaults = Self::default();
        Ok(config::Config::builder()
            .set_default("database_url", defaults.database_url)?
            .set_default("bind_address", defaults.bind_address)?
            .set_default("session_ttl_hours", defaults.session_ttl_hours)?
            .set_default("allow_self_follow", defaults.allow_self_follow)?
            .set_default("secure_cookies", defaults.secure_cookies)?)
    }

    /// Apply command line overrides on top of the loaded settings.
    pub fn with_overrides(mut self, database_url: Option<String>, bind_address: Option<String>) -> Self {
        if let Some(database_url) = database_url {
            self.database_url = database_url;
        }
        if let Some(bind_address) = bind_address {
            self.bind_address = bind_address;
        }
        self
    }

    /// Domain policy for these settings. Fails unless `session_ttl_hours`
    /// is positive and the resulting expiry stays representable.
    pub fn policy(&self) -> Result<Policy> {
        if self.session_ttl_hours <= 0 {
            bail!(
                "session_ttl_hours must be positive, got {}",
                self.session_ttl_hours
            );
        }
        let session_ttl = TimeDelta::try_hours(self.session_ttl_hours)
            .filter(|ttl| Utc::now().checked_add_signed(*ttl).is_some())
            .with_context(|| {
                format!("session_ttl_hours {} is out of range", self.session_ttl_hours)
            })?;

        Ok(Policy {
            allow_self_follow: self.allow_self_follow,
            session_ttl,
        })
    }
}

/// Initialize application state from settings
pub async fn initialize_app_state(settings: &Settings) -> Result<AppState> {
    info!("Connecting to database: {}", settings.database_url);
    let db = Database::connect(&settings.database_url)
        .await
        .context("Failed to connect to database")?;

    Ok(AppState {
        db,
        policy: settings.policy()?,
        secure_cookies: settings.secure_cookies,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{File, FileFormat};

    #[test]
    fn test_builder_defaults_match_default_impl() {
        let settings: Settings = Settings::builder()
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let settings: Settings = Settings::builder()
            .unwrap()
            .add_source(File::from_str(
                "allow_self_follow = true\nsession_ttl_hours = 2",
                FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert!(settings.allow_self_follow);
        assert_eq!(settings.session_ttl_hours, 2);
        assert_eq!(settings.bind_address, DEFAULT_BIND_ADDRESS);
    }

    #[test]
    fn test_policy_from_settings() {
        let settings = Settings {
            allow_self_follow: true,
            session_ttl_hours: 5,
            ..Settings::default()
        };

        let policy = settings.policy().unwrap();
        assert!(policy.allow_self_follow);
        assert_eq!(policy.session_ttl, TimeDelta::hours(5));
        assert_eq!(Settings::default().policy().unwrap(), Policy::default());
    }

    #[test]
    fn test_policy_rejects_bad_session_ttl() {
        for session_ttl_hours in [0, -1, i64::MAX, 10_000_000_000] {
            let settings = Settings {
                session_ttl_hours,
                ..Settings::default()
            };
            assert!(settings.policy().is_err(), "accepted {session_ttl_hours}");
        }
    }

    #[test]
    fn test_load_rejects_bad_session_ttl_from_file() {
        let settings: Settings = Settings::builder()
            .unwrap()
            .add_source(File::from_str("session_ttl_hours = 0", FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        let err = settings.policy().unwrap_err();
        assert!(err.to_string().contains("must be positive"));
    }

    #[test]
    fn test_cli_overrides() {
        let settings = Settings::default().with_overrides(Some("sqlite::memory:".to_string()), None);
        assert_eq!(settings.database_url, "sqlite::memory:");
        assert_eq!(settings.bind_address, DEFAULT_BIND_ADDRESS);
    }
}
