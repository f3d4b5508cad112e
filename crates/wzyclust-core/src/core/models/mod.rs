//! Plain data models used throughout the crate.

pub mod af3;
pub mod sequence;
pub mod table;
