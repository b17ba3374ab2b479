pub mod memory;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::models::{GameEntity, MatchEntity, ScoreEntity};
use crate::dao::storage::StorageResult;

/// Abstraction over the persistence layer for games and their running totals.
///
/// Implementations must be safe to share between coordinators of unrelated games.
pub trait GameStore: Send + Sync {
    /// Upsert a game and return its identifier.
    fn save_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<Uuid>>;
    /// Fetch a game by id.
    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>>;
    /// Record that `finished` ended and store the new per-player totals.
    fn update_scores(
        &self,
        game_id: Uuid,
        finished: MatchEntity,
        scores: Vec<ScoreEntity>,
    ) -> BoxFuture<'static, StorageResult<()>>;
}
