use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum StatsError {
    #[error("Contingency table must have at least one row and one column")]
    EmptyTable,
    #[error("Contingency table rows must all have the same length")]
    RaggedTable,
    #[error("Expected frequency of zero at cell ({row}, {column})")]
    ZeroExpectedFrequency { row: usize, column: usize },
    #[error("At least {required} groups are required, got {found}")]
    TooFewGroups { required: usize, found: usize },
}
