//! Statistical routines backing the group-association analysis.
//!
//! Conventions (two-sided alternatives, continuity corrections, method selection for
//! the Mann-Whitney U test) follow the ones used by SciPy so that results can be
//! compared directly against notebook output.

pub mod correction;
pub mod descriptive;
pub mod distributions;
pub mod error;
pub mod hypothesis;

pub use error::StatsError;
