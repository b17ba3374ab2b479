use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::{models::BetEntity, storage::StorageResult};
use crate::state::{game::Player, matches::MatchId};

/// Abstraction over the persistence layer for bets.
///
/// Listing operations return bets in submission order.
pub trait BetStore: Send + Sync {
    /// Upsert the bet of a (game, match, player) triple and return the record id.
    ///
    /// A write whose `revision` is lower than the stored one is ignored, so
    /// concurrent saves landing out of order keep the latest bet.
    fn save_bet(&self, bet: BetEntity) -> BoxFuture<'static, StorageResult<Uuid>>;
    /// Every bet `player` placed in `game_id`.
    fn get_bets(&self, game_id: Uuid, player: Player)
    -> BoxFuture<'static, StorageResult<Vec<BetEntity>>>;
    /// Every bet placed on `match_id`, across games.
    fn get_bets_for_match(&self, match_id: MatchId)
    -> BoxFuture<'static, StorageResult<Vec<BetEntity>>>;
}
