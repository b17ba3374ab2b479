//! Source of live match-state changes polled by the coordinator.

use std::{collections::HashMap, error::Error, sync::Arc};

use dashmap::DashSet;
use futures::future::BoxFuture;
use thiserror::Error;
use tokio::{
    sync::{Mutex, mpsc},
    time::{Instant, timeout_at},
};
use tracing::debug;

use crate::state::matches::{MatchId, SharedMatch};

/// Batch of updated snapshots keyed by match identifier. Empty means "no change".
pub type MatchUpdates = HashMap<MatchId, SharedMatch>;

/// Result alias for watcher requests.
pub type WatcherResult<T> = Result<T, WatcherError>;

/// Failures a watcher reports explicitly. Any of them aborts a game run.
#[derive(Debug, Error)]
pub enum WatcherError {
    /// The upstream live-score source failed.
    #[error("live-score source failed: {message}")]
    Upstream {
        /// Human readable context.
        message: String,
        /// Underlying failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The update feed was closed by its producer.
    #[error("match update feed closed")]
    Closed,
}

impl WatcherError {
    /// Wrap an upstream failure.
    pub fn upstream(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        WatcherError::Upstream {
            message,
            source: Box::new(source),
        }
    }
}

/// Polling capability yielding match-state deltas.
pub trait MatchWatcher: Send + Sync {
    /// Register the set of matches of interest. Called once before polling starts.
    fn watch_matches(&self, matches: Vec<SharedMatch>);

    /// Request the updates available by `deadline`.
    ///
    /// The returned future resolves to exactly one batch. Callers drop it to
    /// abandon a request; implementations must not block or lose data when that
    /// happens. The coordinator never polls two requests at once.
    fn get_updates(&self, deadline: Instant) -> BoxFuture<'static, WatcherResult<MatchUpdates>>;
}

/// Producer side of a [`FeedWatcher`], handed to whatever fetches live scores.
#[derive(Debug, Clone)]
pub struct MatchFeed {
    sender: mpsc::UnboundedSender<MatchUpdates>,
}

impl MatchFeed {
    /// Push a batch of snapshots. Fails once the watcher is gone.
    pub fn publish(&self, updates: MatchUpdates) -> WatcherResult<()> {
        self.sender.send(updates).map_err(|_| WatcherError::Closed)
    }
}

/// Watcher fed through an in-process channel.
///
/// Each request waits for the first batch until its deadline, then drains
/// everything already queued. Batches for unwatched matches are dropped.
#[derive(Clone)]
pub struct FeedWatcher {
    inner: Arc<FeedInner>,
}

struct FeedInner {
    receiver: Mutex<mpsc::UnboundedReceiver<MatchUpdates>>,
    watched: DashSet<MatchId>,
}

impl FeedWatcher {
    /// Create a connected feed/watcher pair.
    pub fn channel() -> (MatchFeed, FeedWatcher) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let watcher = FeedWatcher {
            inner: Arc::new(FeedInner {
                receiver: Mutex::new(receiver),
                watched: DashSet::new(),
            }),
        };
        (MatchFeed { sender }, watcher)
    }
}

impl MatchWatcher for FeedWatcher {
    fn watch_matches(&self, matches: Vec<SharedMatch>) {
        for fixture in matches {
            self.inner.watched.insert(fixture.id());
        }
    }

    fn get_updates(&self, deadline: Instant) -> BoxFuture<'static, WatcherResult<MatchUpdates>> {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move {
            let mut receiver = inner.receiver.lock().await;
            let mut merged = MatchUpdates::new();

            // `recv` is cancel safe: an abandoned request leaves queued batches in place.
            match timeout_at(deadline, receiver.recv()).await {
                Ok(Some(batch)) => merge(&mut merged, batch),
                Ok(None) => return Err(WatcherError::Closed),
                Err(_) => return Ok(merged),
            }
            while let Ok(batch) = receiver.try_recv() {
                merge(&mut merged, batch);
            }

            if !inner.watched.is_empty() {
                merged.retain(|id, _| inner.watched.contains(id));
            }
            debug!(updates = merged.len(), "drained match feed");
            Ok(merged)
        })
    }
}

/// Later snapshots win, except that a finished snapshot is never replaced by an unfinished one.
fn merge(into: &mut MatchUpdates, batch: MatchUpdates) {
    for (id, snapshot) in batch {
        let keep_existing = into
            .get(&id)
            .is_some_and(|existing| existing.is_finished() && !snapshot.is_finished());
        if !keep_existing {
            into.insert(id, snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use time::macros::datetime;

    use super::*;
    use crate::state::matches::{FinalScore, Match, Odds, SeasonMatch};

    fn fixture(home: &str) -> SeasonMatch {
        let kickoff = datetime!(2024-05-18 13:30 UTC);
        SeasonMatch::scheduled(home, "Away", "2024", "Bundesliga", kickoff, 34)
    }

    fn batch(snapshots: Vec<SharedMatch>) -> MatchUpdates {
        snapshots.into_iter().map(|m| (m.id(), m)).collect()
    }

    fn soon() -> Instant {
        Instant::now() + Duration::from_millis(50)
    }

    #[tokio::test]
    async fn empty_feed_yields_empty_batch_at_deadline() {
        let (_feed, watcher) = FeedWatcher::channel();
        let updates = watcher.get_updates(soon()).await.unwrap();
        assert!(updates.is_empty());
    }

    #[tokio::test]
    async fn queued_batches_are_merged_and_filtered() {
        let (feed, watcher) = FeedWatcher::channel();
        let watched = fixture("Home");
        let ignored = fixture("Elsewhere");
        watcher.watch_matches(vec![watched.clone().shared()]);

        let finished = watched
            .clone()
            .finish(FinalScore::new(2, 2), Odds::new(2.1, 3.3, 3.5))
            .shared();
        feed.publish(batch(vec![finished])).unwrap();
        feed.publish(batch(vec![watched.clone().shared(), ignored.shared()]))
            .unwrap();

        let updates = watcher.get_updates(soon()).await.unwrap();

        assert_eq!(updates.len(), 1);
        assert!(updates[&watched.id()].is_finished());
    }

    #[tokio::test]
    async fn dropped_producer_is_reported() {
        let (feed, watcher) = FeedWatcher::channel();
        drop(feed);

        let err = watcher.get_updates(soon()).await.unwrap_err();
        assert!(matches!(err, WatcherError::Closed));
    }

    #[tokio::test]
    async fn abandoned_request_loses_nothing() {
        let (feed, watcher) = FeedWatcher::channel();
        let m = fixture("Home");

        let pending = watcher.get_updates(Instant::now() + Duration::from_secs(60));
        drop(pending);
        feed.publish(batch(vec![m.clone().shared()])).unwrap();

        let updates = watcher.get_updates(soon()).await.unwrap();
        assert!(updates.contains_key(&m.id()));
    }
}
