use std::{collections::HashMap, sync::Arc};

use indexmap::IndexSet;
use time::OffsetDateTime;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    dao::{bet_store::BetStore, models::BetEntity, storage::StorageResult},
    state::{
        bet::{Bet, BetError},
        bet_book::BetBook,
        game::{Game, Player},
        matches::MatchId,
    },
};

/// Cloneable handle accepting bet submissions for one game.
///
/// Handles can be used from any task, including while the coordinator loop runs.
#[derive(Clone)]
pub struct BetService {
    inner: Arc<BetServiceInner>,
}

struct BetServiceInner {
    game_id: Uuid,
    book: BetBook,
    kickoffs: HashMap<MatchId, OffsetDateTime>,
    players: IndexSet<Player>,
    store: Arc<dyn BetStore>,
}

impl BetService {
    pub(crate) fn new(game_id: Uuid, game: &Game, store: Arc<dyn BetStore>) -> Self {
        Self {
            inner: Arc::new(BetServiceInner {
                game_id,
                book: BetBook::new(),
                kickoffs: game.matches().map(|m| (m.id(), m.kickoff())).collect(),
                players: game.players().cloned().collect(),
                store,
            }),
        }
    }

    /// Record or replace the bet of `player`, as submitted at `submitted_at`.
    ///
    /// Rejected when `submitted_at` is at or after kickoff, when the stored bet
    /// is locked, or when the match has already finished. Persisting an accepted
    /// bet is best-effort: a storage failure is logged and the bet stays accepted.
    pub async fn update_bet(
        &self,
        bet: Bet,
        player: &Player,
        submitted_at: OffsetDateTime,
    ) -> Result<(), BetError> {
        let inner = &self.inner;
        let match_id = bet.match_id();
        let Some(kickoff) = inner.kickoffs.get(&match_id).copied() else {
            return Err(BetError::UnknownMatch(match_id));
        };
        if !inner.players.contains(player) {
            return Err(BetError::UnknownPlayer(player.clone()));
        }

        let placement = inner.book.place(player, bet.clone(), kickoff, submitted_at)?;
        debug!(
            game_id = %inner.game_id,
            match_id = %match_id,
            player = %player,
            home = bet.home_goals(),
            away = bet.away_goals(),
            revision = placement.revision,
            "bet recorded"
        );

        let entity = BetEntity::new(
            inner.game_id,
            player.clone(),
            &bet,
            placement,
            submitted_at,
        );
        if let Err(err) = inner.store.save_bet(entity).await {
            warn!(
                game_id = %inner.game_id,
                match_id = %match_id,
                player = %player,
                error = %err,
                "failed to persist bet; keeping it in memory"
            );
        }

        Ok(())
    }

    /// Current bet of `player` on `match_id`.
    pub fn bet(&self, match_id: MatchId, player: &Player) -> Option<Bet> {
        self.inner.book.get(match_id, player)
    }

    /// Bets recorded on `match_id`, in submission order.
    pub fn bets_for_match(&self, match_id: MatchId) -> Vec<(Player, Bet)> {
        self.inner.book.bets_for_match(match_id)
    }

    pub(crate) fn book(&self) -> &BetBook {
        &self.inner.book
    }

    /// Load the bets already persisted for this game. Returns how many were restored.
    ///
    /// Bets keep the submission order they were persisted with.
    pub(crate) async fn hydrate(&self) -> StorageResult<usize> {
        let inner = &self.inner;
        let mut entities = Vec::new();
        for player in &inner.players {
            let persisted = inner.store.get_bets(inner.game_id, player.clone()).await?;
            entities.extend(
                persisted
                    .into_iter()
                    .filter(|entity| inner.kickoffs.contains_key(&entity.match_id)),
            );
        }
        entities.sort_by_key(|entity| entity.placement());

        for entity in &entities {
            inner
                .book
                .restore(entity.player.clone(), Bet::from(entity), entity.placement());
        }
        Ok(entities.len())
    }
}
