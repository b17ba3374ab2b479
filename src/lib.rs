//! Scoring coordinator for prediction games: players bet on match results,
//! bets lock at kickoff, and points are awarded as matches finish.

pub mod config;
pub mod dao;
pub mod error;
pub mod services;
pub mod state;
