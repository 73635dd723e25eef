//! Server endpoint.
use serde::{Deserialize, Serialize};
use tracing::warn;

use hostlink_config::Connection;

/// One server the redirector may route the session to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, Eq, Hash)]
pub struct Endpoint {
    /// Host name.
    pub host: String,
    /// Host database server port.
    pub port: u16,
    /// User profile.
    pub user: String,
    /// Password.
    pub password: String,
}

impl Endpoint {
    /// Build the prioritized endpoint list from config values: the
    /// configured primary first, then alternates in listed order.
    ///
    /// Alternate ports pair positionally with alternate servers; entries
    /// without a paired port (or with one that doesn't parse) fall back
    /// to the standard host server port.
    pub fn build_list(connection: &Connection) -> Vec<Endpoint> {
        let mut endpoints = vec![Endpoint {
            host: connection.system.clone(),
            port: connection.port,
            user: connection.user.clone(),
            password: connection.password.clone(),
        }];

        let servers = connection.alternate_servers.as_deref().unwrap_or("");
        let ports: Vec<&str> = connection
            .alternate_ports
            .as_deref()
            .unwrap_or("")
            .split(',')
            .map(|port| port.trim())
            .collect();

        for (index, server) in servers.split(',').map(|server| server.trim()).enumerate() {
            if server.is_empty() {
                continue;
            }

            let port = match ports.get(index) {
                Some(port) if !port.is_empty() => match port.parse() {
                    Ok(port) => port,
                    Err(_) => {
                        warn!("ignoring unparseable alternate port \"{}\"", port);
                        Connection::default().port
                    }
                },
                _ => Connection::default().port,
            };

            endpoints.push(Endpoint {
                host: server.to_string(),
                port,
                user: connection.user.clone(),
                password: connection.password.clone(),
            });
        }

        endpoints
    }

    #[cfg(test)]
    pub fn new_test() -> Self {
        Self {
            host: "prod400".into(),
            port: 8471,
            user: "quser".into(),
            password: "quser".into(),
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}:{}", self.user, self.host, self.port)
    }
}
