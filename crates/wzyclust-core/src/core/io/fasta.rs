use crate::core::io::traits::SequenceFile;
use crate::core::models::sequence::SequenceRecord;
use std::io::{self, BufRead};
use thiserror::Error;
use tracing::trace;

#[derive(Debug, Error)]
pub enum FastaError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Streaming FASTA reader over any buffered input.
///
/// Lines are trimmed and blank lines ignored. A header line starts a new record;
/// a record is only yielded once it has both an identifier and at least one
/// residue, so header-only entries and sequence lines that precede the first
/// header are silently dropped.
pub struct FastaRecords<R> {
    lines: io::Lines<R>,
    header: Option<String>,
    sequence: String,
    exhausted: bool,
}

impl<R: BufRead> FastaRecords<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            header: None,
            sequence: String::new(),
            exhausted: false,
        }
    }

    fn take_record(&mut self, next_header: Option<String>) -> Option<SequenceRecord> {
        let header = std::mem::replace(&mut self.header, next_header);
        let sequence = std::mem::take(&mut self.sequence);
        header.and_then(|h| SequenceRecord::from_header(&h, sequence))
    }
}

impl<R: BufRead> Iterator for FastaRecords<R> {
    type Item = Result<SequenceRecord, FastaError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.exhausted {
            let line = match self.lines.next() {
                Some(Ok(line)) => line,
                Some(Err(e)) => return Some(Err(e.into())),
                None => {
                    self.exhausted = true;
                    if let Some(record) = self.take_record(None) {
                        return Some(Ok(record));
                    }
                    break;
                }
            };

            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(header) = line.strip_prefix('>') {
                if let Some(record) = self.take_record(Some(header.to_string())) {
                    trace!("Parsed FASTA record '{}' ({} residues)", record.name, record.len());
                    return Some(Ok(record));
                }
            } else {
                self.sequence.push_str(line);
            }
        }
        None
    }
}

pub struct FastaFile;

impl FastaFile {
    /// Returns a lazy iterator over the records of `reader`.
    pub fn records<R: BufRead>(reader: R) -> FastaRecords<R> {
        FastaRecords::new(reader)
    }
}

impl SequenceFile for FastaFile {
    type Error = FastaError;

    fn read_from(reader: &mut impl BufRead) -> Result<Vec<SequenceRecord>, Self::Error> {
        FastaRecords::new(reader).collect()
    }
}
