//! Readiness gate: bounded wait for every registered file to load.

use std::cell::RefCell;
use std::time::Duration;

use serde::Serialize;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

use crate::constants::MIN_POLL_INTERVAL_MS;
use crate::services::store::VisibilityStore;

/// How a readiness wait ended. Both variants are normal outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Readiness {
    /// Every registered file became ready.
    AllReady,
    /// The timeout elapsed first.
    TimedOut,
}

impl Readiness {
    /// Returns true if every file became ready.
    #[must_use]
    pub const fn is_all_ready(self) -> bool {
        matches!(self, Self::AllReady)
    }
}

/// Waits until the store reports all files ready or `timeout` elapses.
///
/// An empty store is never ready, so it always waits out the timeout.
/// The store is borrowed only between sleeps.
pub async fn wait_all_ready(
    store: &RefCell<VisibilityStore>,
    timeout: Duration,
    poll_interval: Duration,
) -> Readiness {
    let poll = poll_interval.max(Duration::from_millis(MIN_POLL_INTERVAL_MS));
    let deadline = Instant::now() + timeout;

    loop {
        let (ready, total, all) = {
            let store = store.borrow();
            (store.ready_count(), store.len(), store.all_ready())
        };
        if all {
            debug!(total, "all files ready");
            return Readiness::AllReady;
        }

        let now = Instant::now();
        if now >= deadline {
            info!(ready, total, ?timeout, "readiness wait timed out");
            return Readiness::TimedOut;
        }
        sleep(poll.min(deadline - now)).await;
    }
}
