use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum DisplayerError {
    #[error("{source_name}: malformed series file: {reason}")]
    FileFormat { source_name: String, reason: String },

    #[error("{0}: no data rows found")]
    #[diagnostic(help("the file has a sample-title header but nothing below it"))]
    NoData(String),

    #[error("annotation request failed: {0}")]
    AnnotationHttp(String),

    #[error("annotation service returned status {status}: {message}")]
    AnnotationStatus { status: u16, message: String },

    #[error("failed to decode annotation response: {0}")]
    AnnotationDecode(String),

    #[error("annotation service resolved none of the {queried} queried probes")]
    AnnotationEmpty { queried: usize },

    #[error("gene {gene} not found in dataset {dataset}")]
    GeneNotFound { gene: String, dataset: String },

    #[error("dataset {dataset}: value {value:?} for gene {gene} in column {column} is not numeric")]
    NumericConversion {
        dataset: String,
        gene: String,
        column: String,
        value: String,
    },

    #[error("dataset {dataset}: column {column:?} carries no hour value")]
    #[diagnostic(help("measurement columns must contain a time such as `24hrs` or `6hr`"))]
    TimeLabel { dataset: String, column: String },

    #[error("dataset not found: {0}")]
    DatasetNotFound(String),

    #[error("dataset already exists: {0} (use --force to replace it)")]
    DatasetExists(String),

    #[error("dataset {dataset}: gene {gene} has {found} values for {expected} measurement columns")]
    #[diagnostic(help("the stored artifact is damaged; re-run `annotate --force` on its source file"))]
    CorruptSnapshot {
        dataset: String,
        gene: String,
        expected: usize,
        found: usize,
    },

    #[error("invalid replicate mode: {0}")]
    #[diagnostic(help("expected one of replicate1, replicate2, replicate3, average"))]
    InvalidReplicateMode(String),

    #[error("invalid gene selection: {0}")]
    InvalidGeneSelection(String),

    #[error("invalid dataset name: {0}")]
    InvalidDatasetName(String),

    #[error("sample type {0:?} matches no measurement column")]
    InvalidSampleType(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
