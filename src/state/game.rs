use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::state::matches::{MatchId, SharedMatch};

/// Participant of a game, identified by a name unique within the game.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Player {
    /// Display name, also the player's identity.
    pub name: String,
}

impl Player {
    /// Build a player from its name.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Invalid game definitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// The same player name was listed twice.
    #[error("duplicate player `{0}`")]
    DuplicatePlayer(Player),
    /// The same fixture was listed twice.
    #[error("duplicate match `{0}`")]
    DuplicateMatch(MatchId),
    /// A fixture belongs to another season or competition.
    #[error("match `{match_id}` belongs to {season} {competition}, not to this game")]
    ForeignMatch {
        /// Offending fixture.
        match_id: MatchId,
        /// Season of the fixture.
        season: String,
        /// Competition of the fixture.
        competition: String,
    },
}

/// Effect of merging an incoming snapshot into the game.
#[derive(Debug, Clone)]
pub enum MatchUpdate {
    /// The snapshot does not belong to this game.
    Unknown,
    /// Nothing changed: the match is still running, or was already finished.
    Unchanged,
    /// The match just finished; carries the stored finished snapshot.
    Finished(SharedMatch),
}

/// Scored competition over a fixed set of matches and players.
#[derive(Debug, Clone)]
pub struct Game {
    season: String,
    competition: String,
    matches: IndexMap<MatchId, SharedMatch>,
    scores: IndexMap<Player, i32>,
}

impl Game {
    /// Create a game where every player starts at zero points.
    pub fn new(
        season: impl Into<String>,
        competition: impl Into<String>,
        players: Vec<Player>,
        matches: Vec<SharedMatch>,
    ) -> Result<Self, GameError> {
        let season = season.into();
        let competition = competition.into();

        let mut scores = IndexMap::with_capacity(players.len());
        for player in players {
            if scores.contains_key(&player) {
                return Err(GameError::DuplicatePlayer(player));
            }
            scores.insert(player, 0);
        }

        let mut by_id = IndexMap::with_capacity(matches.len());
        for fixture in matches {
            let id = fixture.id();
            if fixture.season() != season || fixture.competition() != competition {
                return Err(GameError::ForeignMatch {
                    match_id: id,
                    season: fixture.season().to_owned(),
                    competition: fixture.competition().to_owned(),
                });
            }
            if by_id.insert(id, fixture).is_some() {
                return Err(GameError::DuplicateMatch(id));
            }
        }

        Ok(Self {
            season,
            competition,
            matches: by_id,
            scores,
        })
    }

    /// Season of the game.
    pub fn season(&self) -> &str {
        &self.season
    }

    /// Competition of the game.
    pub fn competition(&self) -> &str {
        &self.competition
    }

    /// Current snapshots of the matches, in declaration order.
    pub fn matches(&self) -> impl Iterator<Item = &SharedMatch> {
        self.matches.values()
    }

    /// Current snapshot of one match.
    pub fn get_match(&self, id: MatchId) -> Option<&SharedMatch> {
        self.matches.get(&id)
    }

    /// Number of matches in the game.
    pub fn match_count(&self) -> usize {
        self.matches.len()
    }

    /// Number of finished matches.
    pub fn finished_count(&self) -> usize {
        self.matches.values().filter(|m| m.is_finished()).count()
    }

    /// Registered players, in declaration order.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.scores.keys()
    }

    /// Whether `player` takes part in the game.
    pub fn has_player(&self, player: &Player) -> bool {
        self.scores.contains_key(player)
    }

    /// Number of players.
    pub fn player_count(&self) -> usize {
        self.scores.len()
    }

    /// Running totals per player.
    pub fn scores(&self) -> &IndexMap<Player, i32> {
        &self.scores
    }

    /// True once every match is finished.
    pub fn is_finished(&self) -> bool {
        self.matches.values().all(|m| m.is_finished())
    }

    /// Merge an incoming snapshot.
    ///
    /// Only a Scheduled to Finished transition replaces the stored snapshot, so a
    /// re-delivered finished snapshot is a no-op and a finished match never reverts.
    pub fn apply_update(&mut self, incoming: SharedMatch) -> MatchUpdate {
        let Some(stored) = self.matches.get_mut(&incoming.id()) else {
            return MatchUpdate::Unknown;
        };

        if stored.is_finished() || !incoming.is_finished() {
            return MatchUpdate::Unchanged;
        }

        *stored = incoming.clone();
        MatchUpdate::Finished(incoming)
    }

    /// Add `points` to the running total of `player`. Returns false for unknown players.
    ///
    /// Totals saturate at the bounds of `i32` instead of overflowing.
    pub fn add_points(&mut self, player: &Player, points: i32) -> bool {
        match self.scores.get_mut(player) {
            Some(total) => {
                *total = total.saturating_add(points);
                true
            }
            None => false,
        }
    }

    /// Players holding the highest total.
    pub fn winners(&self) -> Vec<Player> {
        winners(&self.scores)
    }
}

/// Every player whose score equals the maximum, in map order.
///
/// When nobody scored, every player ties at zero and all of them win.
pub fn winners(scores: &IndexMap<Player, i32>) -> Vec<Player> {
    let Some(best) = scores.values().copied().max() else {
        return Vec::new();
    };

    scores
        .iter()
        .filter(|(_, score)| **score == best)
        .map(|(player, _)| player.clone())
        .collect()
}
