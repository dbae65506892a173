use crate::config::{Integration, Settings};
use crate::feeds::{FeedFetcher, FeedKind, FeedStore};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{self, JoinHandle};
use tokio::time::{self, Instant, MissedTickBehavior};

struct Registration {
    handle: JoinHandle<()>,
    periodic: bool,
}

/// Registry of the per-feed refresh tasks. Every task is aborted on `shutdown` or drop.
pub struct RefreshScheduler {
    tasks: HashMap<FeedKind, Registration>,
}

impl RefreshScheduler {
    pub fn start<F: FeedFetcher>(fetcher: &Arc<F>, store: &FeedStore, settings: &Settings) -> Self {
        let mut tasks = HashMap::new();
        for kind in FeedKind::ALL {
            let period = settings
                .integration(kind)
                .and_then(Integration::refresh_period);
            match period {
                Some(period) => info!("Refreshing {kind} every {}s", period.as_secs()),
                None => info!("{kind} is fetched once at start-up"),
            }
            let handle = task::spawn(refresh_feed(
                kind,
                period,
                Arc::clone(fetcher),
                store.clone(),
            ));
            tasks.insert(
                kind,
                Registration {
                    handle,
                    periodic: period.is_some(),
                },
            );
        }
        Self { tasks }
    }

    /// Whether a repeating refetch timer is armed for `kind`.
    pub fn has_timer(&self, kind: FeedKind) -> bool {
        self.tasks
            .get(&kind)
            .is_some_and(|r| r.periodic && !r.handle.is_finished())
    }

    pub fn shutdown(&mut self) {
        for (kind, registration) in self.tasks.drain() {
            registration.handle.abort();
            debug!("Cancelled {kind} refresh task");
        }
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn refresh_feed<F: FeedFetcher>(
    kind: FeedKind,
    period: Option<Duration>,
    fetcher: Arc<F>,
    store: FeedStore,
) {
    refresh_once(kind, fetcher.as_ref(), &store).await;

    let Some(period) = period else {
        return;
    };
    let Some(first) = Instant::now().checked_add(period) else {
        warn!("{kind} refresh interval is out of range, no further refreshes");
        return;
    };
    let mut ticker = time::interval_at(first, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        refresh_once(kind, fetcher.as_ref(), &store).await;
    }
}

async fn refresh_once<F: FeedFetcher>(kind: FeedKind, fetcher: &F, store: &FeedStore) {
    match fetcher.fetch(kind).await {
        Ok(snapshot) if snapshot.kind() != kind => {
            warn!("{kind} fetch returned a {} snapshot, ignoring", snapshot.kind());
        }
        Ok(snapshot) => {
            store.apply(snapshot).await;
            debug!("{kind} snapshot updated");
        }
        Err(e) => {
            warn!("Refreshing {kind} failed, keeping previous snapshot: {e}");
        }
    }
}
