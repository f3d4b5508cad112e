//! # wzyclust Core Library
//!
//! Supporting tooling for structure-based clustering of bacterial Wzy polymerases:
//! preparing structure-prediction inputs, submitting predicted structures to a
//! domain-search service, and testing whether the resulting clusters are associated
//! with categorical or numeric protein features.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture.
//!
//! - **[`core`]: The Foundation.** Stateless data models (`SequenceRecord`, `Af3Job`,
//!   `Table`), file I/O, and the pure statistics (`distributions`, hypothesis tests,
//!   multiple-testing correction).
//!
//! - **[`engine`]: The Logic Core.** Configuration, errors, progress reporting, the
//!   group-association analysis (`GroupAnalysis`) and the Merizo-search HTTP client.
//!
//! - **[`workflows`]: The Public API.** Complete procedures (AlphaFold3 job generation,
//!   batch structure submission) that tie `core` and `engine` together and report
//!   progress to the caller.

pub mod core;
pub mod engine;
pub mod workflows;
