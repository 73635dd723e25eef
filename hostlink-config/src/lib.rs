// Submodules
pub mod connection;
pub mod core;
pub mod error;
pub mod sql;

pub use connection::Connection;
pub use core::Config;
pub use error::Error;
pub use sql::{Naming, PackageCriteria, Sql};
