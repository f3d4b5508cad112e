use super::sequence::SequenceRecord;
use crate::engine::config::Af3Config;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CHAIN_ID: &str = "A";
pub const DEFAULT_DIALECT: &str = "alphafold3";
pub const DEFAULT_VERSION: u32 = 1;
pub const DEFAULT_MODEL_SEED: u64 = 1;

/// Protein chain entry of an AlphaFold3 job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProteinChain {
    pub id: String,
    pub sequence: String,
}

/// One entity of the `sequences` array. Only protein chains are produced here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SequenceEntry {
    Protein(ProteinChain),
}

/// An AlphaFold3 input document for a single prediction job.
///
/// Field order matches the serialised key order: `name`, `sequences`,
/// `modelSeeds`, `dialect`, `version`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Af3Job {
    pub name: String,
    pub sequences: Vec<SequenceEntry>,
    pub model_seeds: Vec<u64>,
    pub dialect: String,
    pub version: u32,
}

impl Af3Job {
    /// Creates a single-chain protein job with the given settings.
    pub fn single_protein(
        record: &SequenceRecord,
        chain_id: &str,
        model_seeds: &[u64],
        dialect: &str,
        version: u32,
    ) -> Self {
        Self {
            name: record.name.clone(),
            sequences: vec![SequenceEntry::Protein(ProteinChain {
                id: chain_id.to_string(),
                sequence: record.sequence.clone(),
            })],
            model_seeds: model_seeds.to_vec(),
            dialect: dialect.to_string(),
            version,
        }
    }

    pub fn from_record(record: &SequenceRecord, config: &Af3Config) -> Self {
        Self::single_protein(
            record,
            &config.chain_id,
            &config.model_seeds,
            &config.dialect,
            config.version,
        )
    }
}

impl From<&SequenceRecord> for Af3Job {
    fn from(record: &SequenceRecord) -> Self {
        Self::single_protein(
            record,
            DEFAULT_CHAIN_ID,
            &[DEFAULT_MODEL_SEED],
            DEFAULT_DIALECT,
            DEFAULT_VERSION,
        )
    }
}
