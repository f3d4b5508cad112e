//! Provides input/output functionality for the file formats used by the pipeline.
//!
//! Sequence formats share the [`traits::SequenceFile`] interface; AlphaFold3 job
//! documents and CSV feature tables have dedicated readers and writers.

pub mod af3;
pub mod fasta;
pub mod table;
pub mod traits;
