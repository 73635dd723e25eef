//! Client access library for legacy midrange host database servers.
//!
//! Applications hold a [`backend::Redirector`] instead of a raw host
//! session. The redirector delegates every operation to the live session,
//! detects dropped links and re-routes the session to an alternate server,
//! transferring statement state and signalling the caller to retry.
//! Statement text is classified by [`frontend::sql`] before it reaches
//! the wire.

pub mod backend;
pub mod config;
pub mod frontend;
pub mod logger;
pub mod util;
