//! Infrastructure adapters for git, configuration, and external tools.

pub mod checkers;
pub mod config;
pub mod git;
