//! The session a redirector delegates to.
//!
//! A session is one authenticated connection to one host database server.
//! Opening sockets, signing on and encoding the wire datastreams all live
//! behind [`SessionFactory`]; the redirector only needs "execute this
//! operation, raise a structured error on failure".

use std::time::Duration;

use async_trait::async_trait;

use super::redirect::Endpoint;
use super::Error;

/// Stable handle for a prepared statement, resolved through the
/// redirector. Survives a reroute; the host-side state does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StatementId(pub u32);

/// Stable handle for an open cursor. Does not survive a reroute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CursorId(pub u32);

/// Identity of the host system a session signs on to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemIdentity {
    pub host: String,
}

/// Everything needed to open one session against one endpoint.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub identity: SystemIdentity,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub connect_timeout: Duration,
}

impl SessionOptions {
    /// Options for one endpoint. Only the target host and port vary
    /// between endpoints; credentials are cloned.
    pub fn new(endpoint: &Endpoint, connect_timeout: Duration) -> Self {
        Self {
            identity: SystemIdentity {
                host: endpoint.host.clone(),
            },
            port: endpoint.port,
            user: endpoint.user.clone(),
            password: endpoint.password.clone(),
            connect_timeout,
        }
    }
}

/// One logical request against the host database server.
///
/// Carries exactly what a reroute needs to replay the request; the wire
/// encoding is the session implementation's concern.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Prepare a statement, optionally storing its access plan in the
    /// host package.
    Prepare {
        statement: StatementId,
        sql: String,
        package: bool,
    },
    /// Execute a statement with no parameters and no result set.
    ExecuteImmediate { sql: String },
    /// Execute a prepared statement.
    Execute {
        statement: StatementId,
        parameters: Vec<String>,
    },
    /// Open a cursor over a prepared statement.
    OpenCursor {
        statement: StatementId,
        cursor: CursorId,
    },
    /// Fetch up to `rows` rows from an open cursor.
    Fetch { cursor: CursorId, rows: u32 },
    /// Close an open cursor.
    CloseCursor { cursor: CursorId },
    Commit,
    Rollback,
    /// Change a session property, e.g. the transaction isolation.
    SetProperty { name: String, value: String },
}

/// Reply to an [`Operation`].
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Reply {
    #[default]
    Done,
    /// Statement prepared on the host.
    Prepared { statement: StatementId },
    /// Rows from a fetch; `done` marks end of data.
    Rows { rows: Vec<Vec<String>>, done: bool },
    /// Rows affected by an execute.
    Updated { rows: u64 },
}

/// A live connection to one host database server.
#[async_trait]
pub trait Session: Send {
    /// Execute one operation against the server.
    async fn execute(&mut self, operation: Operation) -> Result<Reply, Error>;

    /// The endpoint this session is connected to.
    fn endpoint(&self) -> &Endpoint;

    /// Tear the session down. Best effort; errors are swallowed.
    async fn close(&mut self);
}

/// Opens sessions. The redirector probes alternate endpoints through this
/// during a reroute; tests inject scripted factories.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn connect(&self, options: &SessionOptions) -> Result<Box<dyn Session>, Error>;
}
