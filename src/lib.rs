pub mod commands;
pub mod config;
pub mod graph;
pub mod heap;
pub mod hpa;
pub mod level;
pub mod logging;
pub mod maze;
pub mod models;
pub mod neighbor_policy;
pub mod search;
