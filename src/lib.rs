//! TRIARB — triangular arbitrage bot for Binance spot
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod engine;
pub mod events;
pub mod exchange;
pub mod storage;
pub mod types;
