use serde::{Deserialize, Serialize};
use std::fs::read_to_string;
use std::path::Path;
use tracing::{info, warn};

use super::connection::Connection;
use super::error::Error;
use super::sql::Sql;

/// Root configuration, usually loaded from `hostlink.toml`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub connection: Connection,
    #[serde(default)]
    pub sql: Sql,
}

impl Config {
    /// Load configuration from disk or use defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let config: Config = if let Ok(config) = read_to_string(path) {
            let config = toml::from_str(&config)?;
            info!("loaded \"{}\"", path.display());
            config
        } else {
            warn!(
                "\"{}\" doesn't exist, loading defaults instead",
                path.display()
            );
            Config::default()
        };

        config.check()?;
        Ok(config)
    }

    /// Validate values that serde defaults cannot.
    pub fn check(&self) -> Result<(), Error> {
        if self.connection.system.trim().is_empty() {
            return Err(Error::MissingField("connection.system"));
        }

        Ok(())
    }
}
