/// Bet submission and locking for a running game.
pub mod bet_service;
/// Polling loop, finish protocol and winner computation.
pub mod game_service;
/// Live match-state source contract and the channel-fed watcher.
pub mod match_watcher;
/// Scoring contract and the built-in outcome scorer.
pub mod scorer;

pub use self::game_service::GameCoordinator;
