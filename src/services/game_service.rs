use std::sync::Arc;

use time::OffsetDateTime;
use tokio::time::{Instant, MissedTickBehavior, interval, timeout_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    config::CoordinatorConfig,
    dao::{
        bet_store::BetStore,
        game_store::GameStore,
        models::{GameEntity, MatchEntity, score_entities},
    },
    error::{PlayError, ServiceError},
    services::{
        bet_service::BetService,
        match_watcher::{MatchUpdates, MatchWatcher},
        scorer::Scorer,
    },
    state::{
        bet::{Bet, BetError},
        game::{Game, MatchUpdate, Player},
        matches::{Match, SharedMatch},
    },
};

/// Drives one game from registration to its winners.
///
/// Each coordinator owns its game; running several games means building several coordinators.
pub struct GameCoordinator {
    id: Uuid,
    game: Game,
    config: CoordinatorConfig,
    game_store: Arc<dyn GameStore>,
    watcher: Arc<dyn MatchWatcher>,
    scorer: Arc<dyn Scorer>,
    bets: BetService,
    persistence_failures: usize,
}

impl GameCoordinator {
    /// Register `game` under a fresh identifier.
    ///
    /// Saves the initial game (fatal on failure) and hands the match set to the watcher.
    pub async fn new(
        game: Game,
        game_store: Arc<dyn GameStore>,
        bet_store: Arc<dyn BetStore>,
        watcher: Arc<dyn MatchWatcher>,
        scorer: Arc<dyn Scorer>,
        config: CoordinatorConfig,
    ) -> Result<Self, ServiceError> {
        Self::register(
            Uuid::new_v4(),
            game,
            game_store,
            bet_store,
            watcher,
            scorer,
            config,
        )
        .await
    }

    /// Pick up a game previously registered as `id`, restoring its persisted bets.
    ///
    /// Standings are rebuilt from the bets: matches already finished in `game`
    /// are settled again when [`GameCoordinator::play`] starts.
    pub async fn resume(
        id: Uuid,
        game: Game,
        game_store: Arc<dyn GameStore>,
        bet_store: Arc<dyn BetStore>,
        watcher: Arc<dyn MatchWatcher>,
        scorer: Arc<dyn Scorer>,
        config: CoordinatorConfig,
    ) -> Result<Self, ServiceError> {
        if game_store.find_game(id).await?.is_none() {
            return Err(ServiceError::NotFound(format!("game `{id}` not found")));
        }
        Self::register(id, game, game_store, bet_store, watcher, scorer, config).await
    }

    async fn register(
        id: Uuid,
        game: Game,
        game_store: Arc<dyn GameStore>,
        bet_store: Arc<dyn BetStore>,
        watcher: Arc<dyn MatchWatcher>,
        scorer: Arc<dyn Scorer>,
        config: CoordinatorConfig,
    ) -> Result<Self, ServiceError> {
        config.validate()?;
        if game.match_count() == 0 {
            return Err(ServiceError::InvalidConfig(
                "a game requires at least one match".into(),
            ));
        }
        if game.player_count() == 0 {
            return Err(ServiceError::InvalidConfig(
                "a game requires at least one player".into(),
            ));
        }

        let id = game_store.save_game(GameEntity::from((id, &game))).await?;

        let bets = BetService::new(id, &game, bet_store);
        let restored = bets.hydrate().await?;

        watcher.watch_matches(game.matches().cloned().collect());

        info!(
            game_id = %id,
            season = game.season(),
            competition = game.competition(),
            matches = game.match_count(),
            players = game.player_count(),
            restored_bets = restored,
            "game registered"
        );

        Ok(Self {
            id,
            game,
            config,
            game_store,
            watcher,
            scorer,
            bets,
            persistence_failures: 0,
        })
    }

    /// Identifier assigned by the game store.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Current in-memory game state.
    pub fn game(&self) -> &Game {
        &self.game
    }

    /// Handle for submitting bets from other tasks while [`GameCoordinator::play`] runs.
    pub fn bets(&self) -> BetService {
        self.bets.clone()
    }

    /// Record or replace a bet. See [`BetService::update_bet`].
    pub async fn update_bet(
        &self,
        bet: Bet,
        player: &Player,
        submitted_at: OffsetDateTime,
    ) -> Result<(), BetError> {
        self.bets.update_bet(bet, player, submitted_at).await
    }

    /// Number of score updates the game store failed to persist.
    pub fn persistence_failures(&self) -> usize {
        self.persistence_failures
    }

    /// Poll the watcher until every match has finished, then return the winners.
    ///
    /// A request that misses its deadline counts as an empty tick. A watcher
    /// error or `cancel` firing stops the run without winners.
    pub async fn play(&mut self, cancel: CancellationToken) -> Result<Vec<Player>, PlayError> {
        self.finish_pending();

        let mut ticker = interval(self.config.poll_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        while !self.game.is_finished() {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(self.cancelled()),
                _ = ticker.tick() => {}
            }

            let deadline = Instant::now() + self.config.request_timeout();
            let request = self.watcher.get_updates(deadline);
            // Dropping `request` on either early exit abandons it.
            let response = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(self.cancelled()),
                response = timeout_at(deadline, request) => response,
            };

            match response {
                Ok(Ok(updates)) => self.apply_updates(updates).await,
                Ok(Err(err)) => {
                    error!(
                        game_id = %self.id,
                        error = %err,
                        "match watcher failed; aborting game"
                    );
                    return Err(err.into());
                }
                Err(_) => warn!(
                    game_id = %self.id,
                    timeout_ms = self.config.request_timeout().as_millis() as u64,
                    "match watcher missed its deadline; skipping tick"
                ),
            }
        }

        self.save_final_snapshot().await;

        let winners = self.game.winners();
        let names: Vec<&str> = winners.iter().map(|p| p.name.as_str()).collect();
        info!(game_id = %self.id, winners = ?names, "game finished");
        Ok(winners)
    }

    fn cancelled(&self) -> PlayError {
        info!(game_id = %self.id, "game run cancelled");
        PlayError::Cancelled
    }

    /// Lock and score matches that were already finished when the game was built.
    fn finish_pending(&mut self) {
        let pending: Vec<SharedMatch> = self
            .game
            .matches()
            .filter(|m| m.is_finished() && !self.bets.book().is_closed(m.id()))
            .cloned()
            .collect();
        for finished in pending {
            self.settle(finished.as_ref());
        }
    }

    async fn apply_updates(&mut self, updates: MatchUpdates) {
        if updates.is_empty() {
            return;
        }

        let mut snapshots: Vec<_> = updates.into_iter().collect();
        snapshots.sort_by_key(|(id, snapshot)| (snapshot.kickoff(), *id));

        for (id, snapshot) in snapshots {
            if snapshot.id() != id {
                warn!(
                    game_id = %self.id,
                    key = %id,
                    match_id = %snapshot.id(),
                    "update keyed under a foreign id; ignoring"
                );
                continue;
            }
            match self.game.apply_update(snapshot) {
                MatchUpdate::Finished(finished) => self.finish_match(finished).await,
                MatchUpdate::Unchanged => {}
                MatchUpdate::Unknown => debug!(
                    game_id = %self.id,
                    match_id = %id,
                    "update for a match outside this game"
                ),
            }
        }
    }

    async fn finish_match(&mut self, finished: SharedMatch) {
        self.settle(finished.as_ref());

        let entity = MatchEntity::snapshot(finished.as_ref());
        let scores = score_entities(&self.game);
        if let Err(err) = self
            .game_store
            .update_scores(self.id, entity, scores)
            .await
        {
            self.persistence_failures += 1;
            error!(
                game_id = %self.id,
                match_id = %finished.id(),
                error = %err,
                "failed to persist scores; keeping in-memory totals"
            );
        }
    }

    /// Lock the bets of a finished match and add their scores to the standings.
    fn settle(&mut self, finished: &dyn Match) {
        let locked = self.bets.book().close_match(finished.id());
        let (players, bets): (Vec<Player>, Vec<Bet>) = locked.into_iter().unzip();
        let scores = self.scorer.score(finished, &bets);
        if scores.len() != bets.len() {
            error!(
                game_id = %self.id,
                match_id = %finished.id(),
                bets = bets.len(),
                scores = scores.len(),
                "scorer returned a misaligned score list"
            );
        }

        for (player, points) in players.iter().zip(scores) {
            self.game.add_points(player, points);
        }

        info!(
            game_id = %self.id,
            match_id = %finished.id(),
            home = finished.home_team(),
            away = finished.away_team(),
            bets = bets.len(),
            finished = self.game.finished_count(),
            total = self.game.match_count(),
            "match settled"
        );
    }

    async fn save_final_snapshot(&mut self) {
        let entity = GameEntity::from((self.id, &self.game));
        if let Err(err) = self.game_store.save_game(entity).await {
            self.persistence_failures += 1;
            warn!(game_id = %self.id, error = %err, "failed to persist final game snapshot");
        }
    }
}
