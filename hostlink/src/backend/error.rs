//! Backend errors.

use thiserror::Error;

/// Error code carried by the re-established signal.
pub const REESTABLISHED_CODE: i32 = -4498;
/// SQLSTATE carried by the re-established signal.
pub const REESTABLISHED_SQLSTATE: &str = "08506";

/// SQLSTATE values that mean the link to the server is gone.
const LINK_FAILURE_STATES: [&str; 3] = ["08S01", "08001", "08003"];

#[derive(Debug, Error)]
pub enum Error {
    /// The transport to the host dropped mid-operation.
    #[error("connection to the host has been dropped")]
    ConnectionDropped,

    /// Structured error returned by the host database server.
    #[error("host error [{code}] sqlstate {sqlstate}: {message}")]
    Sql {
        code: i32,
        sqlstate: String,
        message: String,
    },

    /// The connection was re-established against an alternate server.
    /// Not a true failure: the caller must re-issue the operation.
    #[error("[-4498] sqlstate 08506: connection has been re-established, retry the operation")]
    Reestablished,

    #[error("not connected")]
    NotConnected,

    #[error("statement is closed")]
    StatementClosed,

    #[error("cursor is closed")]
    CursorClosed,

    #[error("{0}")]
    Config(#[from] hostlink_config::Error),

    #[error("{0}")]
    Parse(#[from] crate::frontend::sql::Error),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Structured host error.
    pub fn sql(code: i32, sqlstate: impl ToString, message: impl ToString) -> Self {
        Self::Sql {
            code,
            sqlstate: sqlstate.to_string(),
            message: message.to_string(),
        }
    }

    /// The operation failed because the link to the server is gone.
    /// Only these conditions make an operation eligible for reroute.
    pub fn is_link_failure(&self) -> bool {
        match self {
            Error::ConnectionDropped => true,
            Error::Sql { sqlstate, .. } => {
                LINK_FAILURE_STATES.iter().any(|state| sqlstate == state)
            }
            _ => false,
        }
    }

    /// The distinguished "retry your operation" signal.
    pub fn is_reestablished(&self) -> bool {
        matches!(self, Error::Reestablished)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_link_failure_classification() {
        assert!(Error::ConnectionDropped.is_link_failure());
        assert!(Error::sql(-99999, "08S01", "comm link failure").is_link_failure());
        assert!(Error::sql(-30080, "08001", "unable to establish").is_link_failure());
        assert!(Error::sql(-30081, "08003", "connection does not exist").is_link_failure());

        // Anything else is not eligible for reroute.
        assert!(!Error::sql(-204, "42704", "object not found").is_link_failure());
        assert!(!Error::sql(-551, "42501", "not authorized").is_link_failure());
        assert!(!Error::Reestablished.is_link_failure());
        assert!(!Error::StatementClosed.is_link_failure());
    }

    #[test]
    fn test_reestablished_signal() {
        assert!(Error::Reestablished.is_reestablished());
        assert!(!Error::ConnectionDropped.is_reestablished());
        let message = Error::Reestablished.to_string();
        assert!(message.contains("-4498"));
        assert!(message.contains("08506"));
    }
}
