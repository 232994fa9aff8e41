//! Core engine: market graph → triangles → evaluation → execution.

pub mod evaluator;
pub mod executor;
pub mod graph;
pub mod monitor;
pub mod runner;
pub mod scanner;
pub mod triangles;

pub use runner::{Bot, BotHandle, BotSettings};
