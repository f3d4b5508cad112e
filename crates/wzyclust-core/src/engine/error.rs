use thiserror::Error;

use super::config::ConfigError;
use super::merizo::MerizoError;
use crate::core::io::af3::Af3Error;
use crate::core::io::fasta::FastaError;
use crate::core::models::table::TableError;
use crate::core::stats::StatsError;
use std::path::PathBuf;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to read FASTA file '{path}': {source}", path = path.display())]
    Fasta {
        path: PathBuf,
        #[source]
        source: FastaError,
    },

    #[error("Failed to write AlphaFold3 job: {0}")]
    Af3(#[from] Af3Error),

    #[error("Table error: {0}")]
    Table(#[from] TableError),

    #[error("Statistics error: {0}")]
    Stats(#[from] StatsError),

    #[error("Structure submission failed: {0}")]
    Merizo(#[from] MerizoError),

    #[error("Could not create output directory '{path}': {source}", path = path.display())]
    OutputDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Column '{column}' has no usable values")]
    EmptyColumn { column: String },
}
