pub mod benchmark;
pub mod reset;
pub mod search;
pub mod show;
