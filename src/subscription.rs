//! Background polling with explicit leases
//!
//! A poller refetches on a fixed interval and immediately whenever its
//! parameters change. Every result is tagged with the parameters it was
//! fetched for so the receiver can drop answers to questions it no longer
//! asks. The poller stops when its [`PollLease`] is cancelled or dropped.

use std::future::Future;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::ProviderError;

/// A fetched value and the parameters it answers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyed<K, V> {
    pub key: K,
    pub value: V,
}

/// Handle keeping a poller alive
#[derive(Debug)]
pub struct PollLease {
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl PollLease {
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Cancel and wait for the poller to exit
    pub async fn shutdown(mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!("Poller task ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for PollLease {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Spawn a poller for `fetch`.
///
/// `params` holds the current parameters; `None` pauses fetching. Results
/// are sent on `sender`; the poller exits when the receiver is gone.
pub fn spawn_poll<K, V, F, Fut>(
    name: &'static str,
    period: Duration,
    mut params: watch::Receiver<Option<K>>,
    sender: mpsc::UnboundedSender<Keyed<K, V>>,
    fetch: F,
) -> PollLease
where
    K: Clone + Send + Sync + 'static,
    V: Send + 'static,
    F: Fn(K) -> Fut + Send + 'static,
    Fut: Future<Output = Result<V, ProviderError>> + Send + 'static,
{
    let token = CancellationToken::new();
    let cancellation_token = token.clone();

    let handle = tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancellation_token.cancelled() => break,
                changed = params.changed() => {
                    if changed.is_err() {
                        debug!(poller = name, "Parameters closed, stopping");
                        break;
                    }
                    ticker.reset();
                }
                _ = ticker.tick() => {}
            }

            let current = params.borrow_and_update().clone();
            let Some(key) = current else {
                continue;
            };
            let result = tokio::select! {
                _ = cancellation_token.cancelled() => break,
                result = fetch(key.clone()) => result,
            };
            match result {
                Ok(value) => {
                    if sender.send(Keyed { key, value }).is_err() {
                        debug!(poller = name, "Receiver dropped, stopping");
                        break;
                    }
                }
                Err(e) => warn!(poller = name, "Fetch failed: {}", e),
            }
        }
    });

    PollLease {
        token,
        handle: Some(handle),
    }
}
