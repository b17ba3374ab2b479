use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::state::{
    game::Player,
    matches::{Match, MatchId, Outcome},
};

/// A player's predicted score for one match.
///
/// The player is implied by where the bet is stored. Predicted values cannot be
/// changed in place: an open bet is replaced as a whole, a locked bet not at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bet {
    match_id: MatchId,
    home_goals: u32,
    away_goals: u32,
    locked: bool,
}

impl Bet {
    /// Open a bet predicting `home_goals`-`away_goals` for `target`.
    pub fn new(target: &dyn Match, home_goals: u32, away_goals: u32) -> Self {
        Self::from_parts(target.id(), home_goals, away_goals, false)
    }

    /// Rebuild a bet from persisted values.
    pub fn from_parts(match_id: MatchId, home_goals: u32, away_goals: u32, locked: bool) -> Self {
        Self {
            match_id,
            home_goals,
            away_goals,
            locked,
        }
    }

    /// Match the prediction targets.
    pub fn match_id(&self) -> MatchId {
        self.match_id
    }

    /// Predicted home goals.
    pub fn home_goals(&self) -> u32 {
        self.home_goals
    }

    /// Predicted away goals.
    pub fn away_goals(&self) -> u32 {
        self.away_goals
    }

    /// Result category implied by the predicted score.
    pub fn predicted_outcome(&self) -> Outcome {
        Outcome::from_goals(self.home_goals, self.away_goals)
    }

    /// Whether the bet is frozen.
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Freeze the bet. Locking is irreversible and idempotent.
    pub fn lock(&mut self) {
        self.locked = true;
    }

    /// True when `target` is this bet's match, it is finished, and the predicted
    /// outcome category matches the actual one.
    pub fn is_correct(&self, target: &dyn Match) -> bool {
        target.id() == self.match_id && target.outcome() == Some(self.predicted_outcome())
    }

    /// True when the exact final score was predicted.
    pub fn is_exact(&self, target: &dyn Match) -> bool {
        target.id() == self.match_id
            && target
                .score()
                .is_some_and(|score| score.home == self.home_goals && score.away == self.away_goals)
    }
}

/// Why a bet can no longer be changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockReason {
    /// The submission was made at or after kickoff.
    KickedOff,
    /// The match has finished and its bets were scored.
    MatchFinished,
    /// The stored bet was already locked.
    AlreadyLocked,
}

impl fmt::Display for LockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            LockReason::KickedOff => "match already kicked off",
            LockReason::MatchFinished => "match already finished",
            LockReason::AlreadyLocked => "bet is locked",
        };
        f.write_str(reason)
    }
}

/// Reasons a bet submission is refused. The stored bet is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BetError {
    /// The bet for this match and player can no longer change.
    #[error("bet of `{player}` on match `{match_id}` is immutable: {reason}")]
    Immutable {
        /// Target match.
        match_id: MatchId,
        /// Player who submitted.
        player: Player,
        /// Lock that rejected the submission.
        reason: LockReason,
    },
    /// The bet targets a match outside the game.
    #[error("match `{0}` is not part of this game")]
    UnknownMatch(MatchId),
    /// The submitting player is not registered in the game.
    #[error("player `{0}` is not part of this game")]
    UnknownPlayer(Player),
}

impl BetError {
    /// Whether the error reports a locked bet, as opposed to an invalid submission.
    pub fn is_immutable(&self) -> bool {
        matches!(self, BetError::Immutable { .. })
    }
}
