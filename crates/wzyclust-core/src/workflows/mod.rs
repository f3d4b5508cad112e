//! # Workflows Module
//!
//! High-level procedures that combine file I/O, configuration and the engine into
//! complete batch operations. Each workflow reports its phases through a
//! [`ProgressReporter`](crate::engine::progress::ProgressReporter) so that front ends
//! can render progress without knowing the details.
//!
//! - **AlphaFold3 jobs** ([`af3`]) - one job document per FASTA record.
//! - **Merizo-search submission** ([`merizo`]) - upload predicted structures for
//!   domain search, continuing past individual failures.

pub mod af3;
pub mod merizo;
