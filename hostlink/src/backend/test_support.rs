//! Scripted sessions and factories for redirector tests.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::redirect::Endpoint;
use super::session::{Operation, Reply, Session, SessionFactory, SessionOptions};
use super::Error;

#[derive(Default)]
struct State {
    attempts: Vec<String>,
    refuse_hosts: HashSet<String>,
    /// Replies handed out, in order, across all sessions the factory
    /// created. Empty script means every operation succeeds with `Done`.
    script: VecDeque<Result<Reply, Error>>,
    executed: Vec<Operation>,
}

/// Factory whose sessions answer from a shared, ordered script.
#[derive(Default, Clone)]
pub(crate) struct ScriptedFactory {
    state: Arc<Mutex<State>>,
    closed: Arc<AtomicUsize>,
}

impl ScriptedFactory {
    /// Refuse connection attempts to this host.
    pub(crate) fn refuse_host(&self, host: &str) {
        self.state.lock().refuse_hosts.insert(host.to_string());
    }

    /// Accept connection attempts to this host again.
    pub(crate) fn allow_host(&self, host: &str) {
        self.state.lock().refuse_hosts.remove(host);
    }

    /// Queue the reply for the next executed operation.
    pub(crate) fn push_reply(&self, reply: Result<Reply, Error>) {
        self.state.lock().script.push_back(reply);
    }

    /// Hosts probed so far, in order.
    pub(crate) fn attempts(&self) -> Vec<String> {
        self.state.lock().attempts.clone()
    }

    /// Operations executed so far, across all sessions, in order.
    pub(crate) fn executed(&self) -> Vec<Operation> {
        self.state.lock().executed.clone()
    }

    /// Number of sessions that were closed.
    pub(crate) fn closed_sessions(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionFactory for ScriptedFactory {
    async fn connect(&self, options: &SessionOptions) -> Result<Box<dyn Session>, Error> {
        let mut state = self.state.lock();
        state.attempts.push(options.identity.host.clone());

        if state.refuse_hosts.contains(&options.identity.host) {
            return Err(Error::sql(-30080, "08001", "connection refused"));
        }

        Ok(Box::new(ScriptedSession {
            endpoint: Endpoint {
                host: options.identity.host.clone(),
                port: options.port,
                user: options.user.clone(),
                password: options.password.clone(),
            },
            state: self.state.clone(),
            closed: self.closed.clone(),
        }))
    }
}

struct ScriptedSession {
    endpoint: Endpoint,
    state: Arc<Mutex<State>>,
    closed: Arc<AtomicUsize>,
}

#[async_trait]
impl Session for ScriptedSession {
    async fn execute(&mut self, operation: Operation) -> Result<Reply, Error> {
        let mut state = self.state.lock();
        state.executed.push(operation);
        state.script.pop_front().unwrap_or(Ok(Reply::Done))
    }

    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    async fn close(&mut self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}
