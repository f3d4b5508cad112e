//! # Engine Module
//!
//! Stateful orchestration on top of [`crate::core`]: validated configuration,
//! error aggregation, progress reporting, the group-association analysis and the
//! Merizo-search client.

pub mod analysis;
pub mod config;
pub mod error;
pub mod merizo;
pub mod progress;
