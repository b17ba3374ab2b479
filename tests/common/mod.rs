//! Shared helpers for coordinator integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex, OnceLock};

use futures::future::{self, BoxFuture};
use liguain::{
    dao::{
        game_store::GameStore,
        models::{GameEntity, MatchEntity, ScoreEntity},
        storage::{StorageError, StorageResult},
    },
    services::{
        match_watcher::{MatchUpdates, MatchWatcher, WatcherError, WatcherResult},
        scorer::Scorer,
    },
    state::{Bet, Match, MatchId, SharedMatch},
};
use tokio::time::Instant;
use tracing_subscriber::{EnvFilter, fmt};
use uuid::Uuid;

static LOGGING: OnceLock<()> = OnceLock::new();

/// Install a test subscriber once. Level comes from `TEST_LOG`, then `RUST_LOG`, then `warn`.
pub fn init_logging() {
    LOGGING.get_or_init(|| {
        let filter = std::env::var("TEST_LOG")
            .or_else(|_| std::env::var("RUST_LOG"))
            .map(EnvFilter::new)
            .unwrap_or_else(|_| EnvFilter::new("warn"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .without_time()
            .try_init()
            .ok();
    });
}

/// One scripted reply of a [`ScriptedWatcher`].
pub enum Step {
    Batch(Vec<SharedMatch>),
    /// Delivered with the given keys, even when they disagree with the snapshot ids.
    Keyed(Vec<(MatchId, SharedMatch)>),
    /// Never answers; the coordinator must give up at its deadline.
    Stall,
    Fail,
}

/// Replays scripted steps, then answers with empty batches.
#[derive(Clone, Default)]
pub struct ScriptedWatcher {
    steps: Arc<Mutex<Vec<Step>>>,
    watched: Arc<Mutex<Vec<SharedMatch>>>,
    requests: Arc<Mutex<usize>>,
}

impl ScriptedWatcher {
    pub fn new(steps: Vec<Step>) -> Self {
        let mut steps = steps;
        steps.reverse();
        Self {
            steps: Arc::new(Mutex::new(steps)),
            ..Self::default()
        }
    }

    pub fn batches(batches: Vec<Vec<SharedMatch>>) -> Self {
        Self::new(batches.into_iter().map(Step::Batch).collect())
    }

    pub fn watched(&self) -> usize {
        self.watched.lock().unwrap().len()
    }

    pub fn requests(&self) -> usize {
        *self.requests.lock().unwrap()
    }
}

impl MatchWatcher for ScriptedWatcher {
    fn watch_matches(&self, matches: Vec<SharedMatch>) {
        self.watched.lock().unwrap().extend(matches);
    }

    fn get_updates(&self, _deadline: Instant) -> BoxFuture<'static, WatcherResult<MatchUpdates>> {
        *self.requests.lock().unwrap() += 1;
        match self.steps.lock().unwrap().pop() {
            None => Box::pin(future::ready(Ok(MatchUpdates::new()))),
            Some(Step::Batch(batch)) => {
                let updates = batch.into_iter().map(|m| (m.id(), m)).collect();
                Box::pin(future::ready(Ok(updates)))
            }
            Some(Step::Keyed(entries)) => {
                let updates = entries.into_iter().collect();
                Box::pin(future::ready(Ok(updates)))
            }
            Some(Step::Stall) => Box::pin(future::pending()),
            Some(Step::Fail) => Box::pin(future::ready(Err(WatcherError::upstream(
                "scripted failure".into(),
                std::io::Error::other("feed unreachable"),
            )))),
        }
    }
}

/// Awards 500 points for the right outcome category and nothing otherwise.
pub struct ScorerMock;

impl Scorer for ScorerMock {
    fn score(&self, finished: &dyn Match, bets: &[Bet]) -> Vec<i32> {
        bets.iter()
            .map(|bet| if bet.is_correct(finished) { 500 } else { 0 })
            .collect()
    }
}

/// Scores like [`ScorerMock`] but only ever returns the first score.
pub struct ShortScorer;

impl Scorer for ShortScorer {
    fn score(&self, finished: &dyn Match, bets: &[Bet]) -> Vec<i32> {
        let mut scores = ScorerMock.score(finished, bets);
        scores.truncate(1);
        scores
    }
}

/// Gives every bet the same number of points.
pub struct FixedScorer(pub i32);

impl Scorer for FixedScorer {
    fn score(&self, _finished: &dyn Match, bets: &[Bet]) -> Vec<i32> {
        vec![self.0; bets.len()]
    }
}

/// Accepts the initial registration, then fails every write.
#[derive(Clone, Default)]
pub struct FlakyGameStore {
    saves: Arc<Mutex<usize>>,
}

impl GameStore for FlakyGameStore {
    fn save_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<Uuid>> {
        let mut saves = self.saves.lock().unwrap();
        *saves += 1;
        let result = if *saves == 1 {
            Ok(game.id)
        } else {
            Err(outage())
        };
        Box::pin(future::ready(result))
    }

    fn find_game(&self, _id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        Box::pin(future::ready(Err(outage())))
    }

    fn update_scores(
        &self,
        _game_id: Uuid,
        _finished: MatchEntity,
        _scores: Vec<ScoreEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(future::ready(Err(outage())))
    }
}

fn outage() -> StorageError {
    StorageError::unavailable(
        "store offline".into(),
        std::io::Error::other("connection refused"),
    )
}
