use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::state::{
    bet::Bet,
    bet_book::Placement,
    game::{Game, Player},
    matches::{FinalScore, Match, MatchId, MatchStatus, Odds},
};

/// Snapshot of a fixture as persisted by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchEntity {
    /// Deterministic fixture identifier.
    pub id: MatchId,
    /// Home team name.
    pub home_team: String,
    /// Away team name.
    pub away_team: String,
    /// Season the fixture belongs to.
    pub season: String,
    /// Competition the fixture belongs to.
    pub competition: String,
    /// Scheduled kickoff.
    #[serde(with = "time::serde::rfc3339")]
    pub kickoff: OffsetDateTime,
    /// Match day / round number.
    pub round: u32,
    /// Lifecycle status at the time of the snapshot.
    pub status: MatchStatus,
    /// Final score once finished.
    pub score: Option<FinalScore>,
    /// Odds captured at finish time.
    pub odds: Option<Odds>,
}

/// Running total of one player.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoreEntity {
    /// Scored player.
    pub player: Player,
    /// Cumulative points.
    pub score: i32,
}

/// Aggregate game entity persisted by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameEntity {
    /// Primary key of the game.
    pub id: Uuid,
    /// Season of the game.
    pub season: String,
    /// Competition of the game.
    pub competition: String,
    /// Registered players, in declaration order.
    pub players: Vec<Player>,
    /// Fixtures of the game, in declaration order.
    pub matches: Vec<MatchEntity>,
    /// Current totals, one entry per player.
    pub scores: Vec<ScoreEntity>,
    /// Whether every match has finished.
    pub finished: bool,
    /// Last time the entity was written.
    pub updated_at: SystemTime,
}

/// A single bet as persisted by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BetEntity {
    /// Primary key of the bet record.
    pub id: Uuid,
    /// Game the bet was placed in.
    pub game_id: Uuid,
    /// Target fixture.
    pub match_id: MatchId,
    /// Player who placed the bet.
    pub player: Player,
    /// Predicted home goals.
    pub home_goals: u32,
    /// Predicted away goals.
    pub away_goals: u32,
    /// Whether the bet was frozen when written.
    pub locked: bool,
    /// Submission position of the first bet for this (match, player) pair.
    pub sequence: u64,
    /// Write stamp; a store keeps the highest revision it has seen.
    pub revision: u64,
    /// Client-supplied submission time.
    #[serde(with = "time::serde::rfc3339")]
    pub submitted_at: OffsetDateTime,
}

impl MatchEntity {
    /// Capture the current state of `value`.
    pub fn snapshot(value: &dyn Match) -> Self {
        Self {
            id: value.id(),
            home_team: value.home_team().to_owned(),
            away_team: value.away_team().to_owned(),
            season: value.season().to_owned(),
            competition: value.competition().to_owned(),
            kickoff: value.kickoff(),
            round: value.round(),
            status: value.status(),
            score: value.score(),
            odds: value.odds(),
        }
    }
}

impl From<(Uuid, &Game)> for GameEntity {
    fn from((id, game): (Uuid, &Game)) -> Self {
        Self {
            id,
            season: game.season().to_owned(),
            competition: game.competition().to_owned(),
            players: game.players().cloned().collect(),
            matches: game
                .matches()
                .map(|fixture| MatchEntity::snapshot(fixture.as_ref()))
                .collect(),
            scores: score_entities(game),
            finished: game.is_finished(),
            updated_at: SystemTime::now(),
        }
    }
}

impl BetEntity {
    /// Describe a freshly accepted bet of `player` in game `game_id`.
    pub fn new(
        game_id: Uuid,
        player: Player,
        bet: &Bet,
        placement: Placement,
        submitted_at: OffsetDateTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            game_id,
            match_id: bet.match_id(),
            player,
            home_goals: bet.home_goals(),
            away_goals: bet.away_goals(),
            locked: bet.is_locked(),
            sequence: placement.sequence,
            revision: placement.revision,
            submitted_at,
        }
    }

    /// Book stamps recorded with this bet.
    pub fn placement(&self) -> Placement {
        Placement {
            sequence: self.sequence,
            revision: self.revision,
        }
    }
}

impl From<&BetEntity> for Bet {
    fn from(value: &BetEntity) -> Self {
        Bet::from_parts(
            value.match_id,
            value.home_goals,
            value.away_goals,
            value.locked,
        )
    }
}

/// Current totals of every player in `game`.
pub fn score_entities(game: &Game) -> Vec<ScoreEntity> {
    game.scores()
        .iter()
        .map(|(player, score)| ScoreEntity {
            player: player.clone(),
            score: *score,
        })
        .collect()
}
