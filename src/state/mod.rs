//! Domain model of a prediction game: fixtures, bets, players and standings.
//!
//! Everything here is synchronous. The only shared-mutable piece is the
//! [`BetBook`], which accepts submissions from any task.

pub mod bet;
pub mod bet_book;
pub mod game;
pub mod matches;

pub use self::bet::{Bet, BetError, LockReason};
pub use self::bet_book::{BetBook, Placement};
pub use self::game::{Game, GameError, MatchUpdate, Player, winners};
pub use self::matches::{
    FinalScore, Match, MatchId, MatchStatus, Odds, Outcome, SeasonMatch, SharedMatch, Winner,
};
