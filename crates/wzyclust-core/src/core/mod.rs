//! # Core Module
//!
//! Stateless building blocks shared by the engine and the workflows.
//!
//! - **Models** ([`models`]) - Sequence records, AlphaFold3 job documents, and tabular data
//! - **File I/O** ([`io`]) - FASTA reading, AlphaFold3 job writing, and CSV table loading
//! - **Statistics** ([`stats`]) - Distributions, hypothesis tests, and FDR correction

pub mod io;
pub mod models;
pub mod stats;
