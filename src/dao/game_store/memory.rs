//! In-process storage backend keeping games and bets in concurrent maps.

use std::{sync::Arc, time::SystemTime};

use dashmap::DashMap;
use futures::future::BoxFuture;
use indexmap::IndexMap;
use uuid::Uuid;

use crate::{
    dao::{
        bet_store::BetStore,
        game_store::GameStore,
        models::{BetEntity, GameEntity, MatchEntity, ScoreEntity},
        storage::{StorageError, StorageResult},
    },
    state::{
        game::Player,
        matches::{MatchId, MatchStatus},
    },
};

/// Storage backend living in the process memory. Cloning shares the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    games: DashMap<Uuid, GameEntity>,
    /// Bets per game, keyed by (match, player) in first-submission order.
    bets: DashMap<Uuid, IndexMap<(MatchId, Player), BetEntity>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Synchronous read of a stored game.
    pub fn game(&self, id: Uuid) -> Option<GameEntity> {
        self.inner.games.get(&id).map(|game| game.clone())
    }

    /// Number of stored bets across all games.
    pub fn bet_count(&self) -> usize {
        self.inner.bets.iter().map(|bets| bets.len()).sum()
    }
}

impl GameStore for MemoryStore {
    fn save_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<Uuid>> {
        let store = self.clone();
        Box::pin(async move {
            let id = game.id;
            store.inner.games.insert(id, game);
            Ok(id)
        })
    }

    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.game(id)) })
    }

    fn update_scores(
        &self,
        game_id: Uuid,
        finished: MatchEntity,
        scores: Vec<ScoreEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let mut game = store
                .inner
                .games
                .get_mut(&game_id)
                .ok_or_else(|| StorageError::not_found("game", game_id))?;

            if let Some(slot) = game.matches.iter_mut().find(|m| m.id == finished.id) {
                *slot = finished;
            }
            game.scores = scores;
            game.finished = game
                .matches
                .iter()
                .all(|m| m.status == MatchStatus::Finished);
            game.updated_at = SystemTime::now();
            Ok(())
        })
    }
}

impl BetStore for MemoryStore {
    fn save_bet(&self, bet: BetEntity) -> BoxFuture<'static, StorageResult<Uuid>> {
        let store = self.clone();
        Box::pin(async move {
            let mut bets = store.inner.bets.entry(bet.game_id).or_default();
            let key = (bet.match_id, bet.player.clone());
            let id = match bets.get_mut(&key) {
                Some(existing) if existing.revision > bet.revision => existing.id,
                Some(existing) => {
                    let id = existing.id;
                    *existing = BetEntity { id, ..bet };
                    id
                }
                None => {
                    let id = bet.id;
                    bets.insert(key, bet);
                    id
                }
            };
            Ok(id)
        })
    }

    fn get_bets(
        &self,
        game_id: Uuid,
        player: Player,
    ) -> BoxFuture<'static, StorageResult<Vec<BetEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let bets = store
                .inner
                .bets
                .get(&game_id)
                .map(|bets| {
                    bets.values()
                        .filter(|bet| bet.player == player)
                        .cloned()
                        .collect()
                })
                .unwrap_or_default();
            Ok(bets)
        })
    }

    fn get_bets_for_match(
        &self,
        match_id: MatchId,
    ) -> BoxFuture<'static, StorageResult<Vec<BetEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let bets = store
                .inner
                .bets
                .iter()
                .flat_map(|bets| {
                    bets.values()
                        .filter(|bet| bet.match_id == match_id)
                        .cloned()
                        .collect::<Vec<_>>()
                })
                .collect();
            Ok(bets)
        })
    }
}
