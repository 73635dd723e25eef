//! Connection settings.

use serde::{Deserialize, Serialize};

/// Settings for the host database connection, including the alternate
/// servers used for client reroute when the primary becomes unreachable.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Connection {
    /// Name of the primary host system.
    #[serde(default)]
    pub system: String,

    /// TCP port of the host database server.
    ///
    /// _Default:_ `8471`
    #[serde(default = "Connection::port")]
    pub port: u16,

    /// User profile used to sign on.
    #[serde(default)]
    pub user: String,

    /// Password for the user profile.
    #[serde(default)]
    pub password: String,

    /// Comma-separated list of alternate host systems, in priority order.
    /// Consulted only when the connection to the primary is lost.
    #[serde(default)]
    pub alternate_servers: Option<String>,

    /// Comma-separated list of ports paired positionally with
    /// `alternate_servers`. Alternates without a paired entry use the
    /// standard host server port.
    #[serde(default)]
    pub alternate_ports: Option<String>,

    /// Maximum number of reroute rounds through the full server list.
    /// `-1` means unlimited rounds inside the reroute time budget.
    /// Unset while `retry_interval_for_reroute` is set defaults to `3`.
    #[serde(default)]
    pub max_retries_for_reroute: Option<i32>,

    /// Seconds to wait between reroute rounds. `-1` selects the adaptive
    /// schedule. Unset while `max_retries_for_reroute` is set defaults
    /// to `0` (immediate retry).
    #[serde(default)]
    pub retry_interval_for_reroute: Option<i32>,

    /// Seconds allowed for a single connection attempt to one server.
    ///
    /// _Default:_ `10`
    #[serde(default = "Connection::connect_timeout")]
    pub connect_timeout: u64,
}

impl Connection {
    fn port() -> u16 {
        8471
    }

    fn connect_timeout() -> u64 {
        10
    }
}

impl Default for Connection {
    fn default() -> Self {
        Self {
            system: String::new(),
            port: Self::port(),
            user: String::new(),
            password: String::new(),
            alternate_servers: None,
            alternate_ports: None,
            max_retries_for_reroute: None,
            retry_interval_for_reroute: None,
            connect_timeout: Self::connect_timeout(),
        }
    }
}
