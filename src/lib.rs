pub mod autopilot;
pub mod board;
pub mod config;
pub mod constants;
pub mod engine;
pub mod entities;
pub mod error;
pub mod high_scores;
pub mod maze;
pub mod pathfinding;
pub mod rng;
pub mod runner;
pub mod server_protocol;
pub mod server_utils;
pub mod types;
