pub mod benchmark;
pub mod config;
pub mod error;
pub mod evolution;
pub mod heuristics;
pub mod network;
pub mod pqueue;
// cmd and reports are binary modules, declared in main.rs.
