//! Replacement-connection search.

use std::time::Duration;

use tokio::select;
use tokio::time::{sleep, timeout, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::super::session::{Session, SessionFactory, SessionOptions};
use super::policy::Schedule;
use super::{Endpoint, RetryPolicy};
use crate::util::human_duration;

/// Search the endpoint list for a server that accepts a connection.
///
/// Endpoints are probed in priority order, one full pass per round; the
/// first success wins and the rest of the round is abandoned. Probe
/// failures are traced and swallowed. Between rounds the search sleeps
/// per the policy; cancelling the token during the sleep aborts the
/// whole search. Exhaustion returns `None` and the caller re-raises
/// whatever error started the search.
pub(crate) async fn find_new_connection(
    factory: &dyn SessionFactory,
    endpoints: &[Endpoint],
    policy: RetryPolicy,
    connect_timeout: Duration,
    cancel: &CancellationToken,
) -> Option<Box<dyn Session>> {
    let mut schedule = Schedule::new(policy);

    loop {
        let round_started = Instant::now();

        for endpoint in endpoints {
            let options = SessionOptions::new(endpoint, connect_timeout);

            match timeout(connect_timeout, factory.connect(&options)).await {
                Ok(Ok(session)) => {
                    info!("connection re-routed to {}", endpoint);
                    return Some(session);
                }
                Ok(Err(err)) => debug!("reroute attempt to {} failed: {}", endpoint, err),
                Err(_) => debug!("reroute attempt to {} timed out", endpoint),
            }
        }

        match schedule.backoff(round_started.elapsed()) {
            Some(delay) if !delay.is_zero() => {
                debug!("next reroute round in {}", human_duration(delay));

                select! {
                    _ = cancel.cancelled() => {
                        debug!("reroute search cancelled");
                        return None;
                    }
                    _ = sleep(delay) => (),
                }
            }
            Some(_) => (),
            None => {
                debug!("reroute search exhausted");
                return None;
            }
        }
    }
}
