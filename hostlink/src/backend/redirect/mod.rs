//! Transparent client reroute.
//!
//! [`Redirector`] owns the live session and delegates every operation to
//! it. When a delegated call fails with a link-loss condition, the
//! redirector searches the prioritized endpoint list for a replacement
//! server, transfers session-scoped state onto the new session and
//! retries the call. Cursors do not survive the transfer; statement
//! shells do, and are re-prepared on first use.

pub mod endpoint;
pub mod policy;
mod search;

pub use endpoint::Endpoint;
pub use policy::RetryPolicy;

use std::collections::BTreeMap;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use hostlink_config::Config;

use super::session::{
    CursorId, Operation, Reply, Session, SessionFactory, SessionOptions, StatementId,
};
use super::Error;
use crate::frontend::sql::{Classifier, ClassifierContext, Statement};

/// Outcome of one delegated call.
enum CallOutcome<T> {
    Success(T),
    /// The session was re-routed mid-call; re-issue the operation.
    Retry,
    Fatal(Error),
}

/// Prepared statement state that survives a reroute.
struct StatementShell {
    descriptor: Statement,
    /// Prepared on the current session. Cleared by a reroute.
    prepared: bool,
}

/// Cursor state. Force-closed by a reroute.
struct CursorShell {
    statement: StatementId,
    open: bool,
}

pub struct Redirector {
    factory: Box<dyn SessionFactory>,
    config: Config,
    context: ClassifierContext,
    /// Priority-ordered server list: the configured primary first. Built
    /// on the first connection attempt, immutable until [`Self::reconfigure`].
    endpoints: Vec<Endpoint>,
    policy: RetryPolicy,
    /// The single live session slot.
    session: Option<Box<dyn Session>>,
    statements: BTreeMap<StatementId, StatementShell>,
    cursors: BTreeMap<CursorId, CursorShell>,
    /// Session properties, replayed onto a replacement session.
    properties: BTreeMap<String, String>,
    next_statement: u32,
    next_cursor: u32,
    /// Reroute in progress; suppresses nested reroute handling.
    failing_over: bool,
    cancel: CancellationToken,
    reroutes: usize,
    force_closed_cursors: usize,
}

impl Redirector {
    pub fn new(factory: Box<dyn SessionFactory>, config: Config) -> Self {
        let policy = RetryPolicy::from_config(
            config.connection.max_retries_for_reroute,
            config.connection.retry_interval_for_reroute,
        );
        let context = ClassifierContext::from_config(&config.sql);

        Self {
            factory,
            config,
            context,
            endpoints: Vec::new(),
            policy,
            session: None,
            statements: BTreeMap::new(),
            cursors: BTreeMap::new(),
            properties: BTreeMap::new(),
            next_statement: 0,
            next_cursor: 0,
            failing_over: false,
            cancel: CancellationToken::new(),
            reroutes: 0,
            force_closed_cursors: 0,
        }
    }

    /// Replace the endpoint list and retry policy wholesale.
    pub fn reconfigure(&mut self, config: Config) {
        self.policy = RetryPolicy::from_config(
            config.connection.max_retries_for_reroute,
            config.connection.retry_interval_for_reroute,
        );
        self.context = ClassifierContext::from_config(&config.sql);
        self.endpoints = Endpoint::build_list(&config.connection);
        self.config = config;
    }

    /// Token that aborts an in-progress reroute search when cancelled.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// The server the live session is connected to.
    pub fn endpoint(&self) -> Option<&Endpoint> {
        self.session.as_ref().map(|session| session.endpoint())
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    pub fn statement_count(&self) -> usize {
        self.statements.len()
    }

    pub fn open_cursor_count(&self) -> usize {
        self.cursors.values().filter(|cursor| cursor.open).count()
    }

    /// Number of successful reroutes over the life of this wrapper.
    pub fn reroutes(&self) -> usize {
        self.reroutes
    }

    /// Cursors invalidated by reroutes.
    pub fn force_closed_cursors(&self) -> usize {
        self.force_closed_cursors
    }

    /// Classification descriptor of a prepared statement.
    pub fn statement(&self, statement: StatementId) -> Option<&Statement> {
        self.statements
            .get(&statement)
            .map(|shell| &shell.descriptor)
    }

    /// The cursor is usable. Cursors open before a reroute are not.
    pub fn cursor_is_open(&self, cursor: CursorId) -> bool {
        self.cursors
            .get(&cursor)
            .map(|shell| shell.open)
            .unwrap_or(false)
    }

    fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.config.connection.connect_timeout)
    }

    /// Open the initial connection to the primary. A primary that is
    /// unreachable with a link-loss condition starts the same endpoint
    /// search a mid-operation drop would.
    pub async fn connect(&mut self) -> Result<(), Error> {
        if self.session.is_some() {
            return Ok(());
        }

        if self.endpoints.is_empty() {
            self.endpoints = Endpoint::build_list(&self.config.connection);
        }

        let options = SessionOptions::new(&self.endpoints[0], self.connect_timeout());

        match self.factory.connect(&options).await {
            Ok(session) => {
                info!("connected to {}", session.endpoint());
                self.session = Some(session);
                Ok(())
            }
            Err(err) => {
                if !err.is_link_failure() {
                    return Err(err);
                }

                self.failing_over = true;
                let rerouted = self.fail_over().await;
                self.failing_over = false;

                if rerouted {
                    Ok(())
                } else {
                    Err(err)
                }
            }
        }
    }

    /// Classify and prepare a statement. The returned id stays valid
    /// across reroutes.
    pub async fn prepare(&mut self, sql: &str) -> Result<StatementId, Error> {
        let descriptor = Classifier::parse(sql, &self.context)?;
        self.prepare_descriptor(descriptor).await
    }

    async fn prepare_descriptor(&mut self, descriptor: Statement) -> Result<StatementId, Error> {
        let statement = StatementId(self.next_statement);
        self.next_statement += 1;
        self.statements.insert(
            statement,
            StatementShell {
                descriptor,
                prepared: false,
            },
        );

        match self.ensure_prepared(statement).await {
            Ok(()) => Ok(statement),
            Err(err) => {
                self.statements.remove(&statement);
                Err(err)
            }
        }
    }

    /// Execute a prepared statement, re-preparing it first when a
    /// reroute invalidated the host-side state.
    pub async fn execute(
        &mut self,
        statement: StatementId,
        parameters: Vec<String>,
    ) -> Result<Reply, Error> {
        loop {
            self.ensure_prepared(statement).await?;

            let operation = Operation::Execute {
                statement,
                parameters: parameters.clone(),
            };

            match self.call(operation).await {
                CallOutcome::Success(reply) => return Ok(reply),
                CallOutcome::Retry => continue,
                CallOutcome::Fatal(err) => return Err(err),
            }
        }
    }

    /// Classify and run one statement: immediately executable text goes
    /// straight to the server, everything else is prepared first.
    pub async fn run(&mut self, sql: &str) -> Result<Reply, Error> {
        let descriptor = Classifier::parse(sql, &self.context)?;

        if descriptor.is_immediately_executable {
            let operation = Operation::ExecuteImmediate {
                sql: descriptor.text.clone(),
            };
            self.with_failover(operation).await
        } else {
            let statement = self.prepare_descriptor(descriptor).await?;
            let reply = self.execute(statement, Vec::new()).await;
            let _ = self.close_statement(statement).await;
            reply
        }
    }

    /// Open a cursor over a prepared statement.
    pub async fn open_cursor(&mut self, statement: StatementId) -> Result<CursorId, Error> {
        if !self.statements.contains_key(&statement) {
            return Err(Error::StatementClosed);
        }

        let cursor = CursorId(self.next_cursor);
        self.next_cursor += 1;

        loop {
            self.ensure_prepared(statement).await?;

            match self.call(Operation::OpenCursor { statement, cursor }).await {
                CallOutcome::Success(_) => {
                    self.cursors.insert(
                        cursor,
                        CursorShell {
                            statement,
                            open: true,
                        },
                    );
                    return Ok(cursor);
                }
                CallOutcome::Retry => continue,
                CallOutcome::Fatal(err) => return Err(err),
            }
        }
    }

    /// Fetch rows. A reroute mid-fetch invalidates the cursor: the
    /// re-established signal is surfaced and the caller re-runs its
    /// query against the new session.
    pub async fn fetch(&mut self, cursor: CursorId, rows: u32) -> Result<Reply, Error> {
        let open = self
            .cursors
            .get(&cursor)
            .map(|shell| shell.open)
            .ok_or(Error::CursorClosed)?;

        if !open {
            return Err(Error::CursorClosed);
        }

        match self.call(Operation::Fetch { cursor, rows }).await {
            CallOutcome::Success(reply) => Ok(reply),
            CallOutcome::Retry => Err(Error::Reestablished),
            CallOutcome::Fatal(err) => Err(err),
        }
    }

    /// Close a cursor. Teardown paths never start a reroute; a dropped
    /// link already invalidated the cursor server-side.
    pub async fn close_cursor(&mut self, cursor: CursorId) -> Result<(), Error> {
        let was_open = match self.cursors.remove(&cursor) {
            Some(shell) => shell.open,
            None => return Ok(()),
        };

        if was_open {
            if let Some(session) = self.session.as_mut() {
                match session.execute(Operation::CloseCursor { cursor }).await {
                    Ok(_) => (),
                    Err(err) if err.is_link_failure() => {
                        debug!("close cursor after link loss: {}", err)
                    }
                    Err(err) => return Err(err),
                }
            }
        }

        Ok(())
    }

    /// Close a statement and any cursors over it.
    pub async fn close_statement(&mut self, statement: StatementId) -> Result<(), Error> {
        let cursors: Vec<CursorId> = self
            .cursors
            .iter()
            .filter(|(_, shell)| shell.statement == statement)
            .map(|(cursor, _)| *cursor)
            .collect();

        for cursor in cursors {
            self.close_cursor(cursor).await?;
        }

        self.statements.remove(&statement);
        Ok(())
    }

    pub async fn commit(&mut self) -> Result<Reply, Error> {
        self.with_failover(Operation::Commit).await
    }

    pub async fn rollback(&mut self) -> Result<Reply, Error> {
        self.with_failover(Operation::Rollback).await
    }

    /// Change a session property. Replayed onto replacement sessions.
    pub async fn set_property(&mut self, name: &str, value: &str) -> Result<Reply, Error> {
        let reply = self
            .with_failover(Operation::SetProperty {
                name: name.to_string(),
                value: value.to_string(),
            })
            .await?;

        self.properties.insert(name.to_string(), value.to_string());
        Ok(reply)
    }

    /// Single attempt with the caller-visible signal contract: when a
    /// reroute happens mid-call, surfaces [`Error::Reestablished`]
    /// instead of retrying, so the caller re-issues the operation.
    pub async fn execute_once(&mut self, operation: Operation) -> Result<Reply, Error> {
        match self.call(operation).await {
            CallOutcome::Success(reply) => Ok(reply),
            CallOutcome::Retry => Err(Error::Reestablished),
            CallOutcome::Fatal(err) => Err(err),
        }
    }

    /// Tear down all session state and the session itself. Teardown
    /// never reroutes.
    pub async fn close(&mut self) {
        let cursors: Vec<CursorId> = self.cursors.keys().copied().collect();
        for cursor in cursors {
            let _ = self.close_cursor(cursor).await;
        }

        self.statements.clear();
        self.properties.clear();

        if let Some(mut session) = self.session.take() {
            session.close().await;
        }
    }

    /// Delegate one operation, retrying across reroutes until it either
    /// succeeds or fails with a condition reroute can't fix.
    async fn with_failover(&mut self, operation: Operation) -> Result<Reply, Error> {
        loop {
            match self.call(operation.clone()).await {
                CallOutcome::Success(reply) => return Ok(reply),
                CallOutcome::Retry => continue,
                CallOutcome::Fatal(err) => return Err(err),
            }
        }
    }

    /// One delegated attempt against the live session.
    async fn call(&mut self, operation: Operation) -> CallOutcome<Reply> {
        let session = match self.session.as_mut() {
            Some(session) => session,
            None => return CallOutcome::Fatal(Error::NotConnected),
        };

        match session.execute(operation).await {
            Ok(reply) => CallOutcome::Success(reply),
            Err(err) => self.handle_error(err).await,
        }
    }

    /// Decide what a failed call does: start a reroute for a link-loss
    /// condition, pass everything else through untouched.
    async fn handle_error(&mut self, err: Error) -> CallOutcome<Reply> {
        if self.failing_over || !err.is_link_failure() {
            return CallOutcome::Fatal(err);
        }

        self.failing_over = true;
        let rerouted = self.fail_over().await;
        self.failing_over = false;

        if rerouted {
            CallOutcome::Retry
        } else {
            // Search exhausted: the original error surfaces unchanged.
            CallOutcome::Fatal(err)
        }
    }

    /// Search for a replacement server and transfer session state onto
    /// it. Returns false when the search was exhausted or cancelled.
    async fn fail_over(&mut self) -> bool {
        info!("connection lost, searching for a replacement server");

        let replacement = match search::find_new_connection(
            self.factory.as_ref(),
            &self.endpoints,
            self.policy,
            self.connect_timeout(),
            &self.cancel,
        )
        .await
        {
            Some(session) => session,
            None => return false,
        };

        // Cursors tied to the old session are unusable. Close them
        // before the transfer so callers observe it.
        for cursor in self.cursors.values_mut() {
            if cursor.open {
                cursor.open = false;
                self.force_closed_cursors += 1;
            }
        }

        // Statement shells survive; the host-side prepared state does
        // not. Cleared flags re-prepare on first use.
        for shell in self.statements.values_mut() {
            shell.prepared = false;
        }

        if let Some(mut old) = self.session.replace(replacement) {
            old.close().await;
        }

        // Replay session properties onto the new session. Best effort;
        // reroute handling is already suppressed here.
        if let Some(session) = self.session.as_mut() {
            for (name, value) in &self.properties {
                let operation = Operation::SetProperty {
                    name: name.clone(),
                    value: value.clone(),
                };
                if let Err(err) = session.execute(operation).await {
                    debug!("property replay failed for \"{}\": {}", name, err);
                }
            }
        }

        self.reroutes += 1;
        true
    }

    /// Prepare the statement on the current session if it isn't yet.
    async fn ensure_prepared(&mut self, statement: StatementId) -> Result<(), Error> {
        let (sql, package, prepared) = match self.statements.get(&statement) {
            Some(shell) => (
                shell.descriptor.text.clone(),
                shell.descriptor.is_packaged,
                shell.prepared,
            ),
            None => return Err(Error::StatementClosed),
        };

        if prepared {
            return Ok(());
        }

        self.with_failover(Operation::Prepare {
            statement,
            sql,
            package,
        })
        .await?;

        if let Some(shell) = self.statements.get_mut(&statement) {
            shell.prepared = true;
        }

        Ok(())
    }
}
