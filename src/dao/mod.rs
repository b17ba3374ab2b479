/// Bet persistence contract.
pub mod bet_store;
/// Game persistence contract and its in-memory implementation.
pub mod game_store;
/// Database model definitions.
pub mod models;
/// Storage abstraction layer for database operations.
pub mod storage;
