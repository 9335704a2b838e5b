use thiserror::Error;

use crate::coerce::CoerceError;

#[derive(Error, Debug)]
pub enum SbciError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Duplicate attribute name in schema: {0}")]
    DuplicateAttribute(String),

    #[error("Duplicate header '{header}' in schema (columns '{first}' and '{second}')")]
    DuplicateHeader {
        header: String,
        first: String,
        second: String,
    },

    #[error("{file}: missing required columns: {}", .attributes.join(", "))]
    MissingColumns { file: String, attributes: Vec<String> },

    #[error("{file}:{line}: column '{header}' ({attribute}): {source}")]
    Cell {
        file: String,
        line: u64,
        header: String,
        attribute: String,
        #[source]
        source: CoerceError,
    },

    #[error("{0}")]
    Coerce(#[from] CoerceError),

    #[error("Date of birth {dob} is in two age groups ({first}, {second})")]
    AmbiguousAgeGroup {
        dob: chrono::NaiveDate,
        first: String,
        second: String,
    },

    #[error("Unknown schema: {0}")]
    UnknownSchema(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, SbciError>;
