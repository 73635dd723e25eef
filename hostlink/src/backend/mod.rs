//! Session management for the host database server.

pub mod error;
pub mod redirect;
pub mod session;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::Error;
pub use redirect::{Endpoint, Redirector, RetryPolicy};
pub use session::{
    CursorId, Operation, Reply, Session, SessionFactory, SessionOptions, StatementId,
    SystemIdentity,
};
