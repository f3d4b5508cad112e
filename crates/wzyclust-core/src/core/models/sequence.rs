/// A single named protein sequence read from a FASTA file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceRecord {
    /// First whitespace-delimited token of the FASTA header.
    pub name: String,
    /// Residues concatenated across all sequence lines.
    pub sequence: String,
}

impl SequenceRecord {
    pub fn new(name: impl Into<String>, sequence: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sequence: sequence.into(),
        }
    }

    /// Builds a record from a raw header (without the leading `>`) and its sequence.
    ///
    /// Returns `None` when either the header has no identifier token or the
    /// sequence is empty.
    pub fn from_header(header: &str, sequence: String) -> Option<Self> {
        let name = header.split_whitespace().next()?;
        if sequence.is_empty() {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            sequence,
        })
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_header_keeps_only_first_token() {
        let record =
            SequenceRecord::from_header("WzyA_Ecoli O-antigen polymerase", "MKT".into()).unwrap();
        assert_eq!(record.name, "WzyA_Ecoli");
        assert_eq!(record.sequence, "MKT");
        assert_eq!(record.len(), 3);
    }

    #[test]
    fn from_header_rejects_blank_header_or_empty_sequence() {
        assert!(SequenceRecord::from_header("   ", "MKT".into()).is_none());
        assert!(SequenceRecord::from_header("WzyA", String::new()).is_none());
    }
}
