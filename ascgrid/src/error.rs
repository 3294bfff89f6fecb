use thiserror::Error;

#[derive(Error, Debug)]
pub enum AscError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("missing header field '{0}'")]
    MissingField(&'static str),

    #[error("invalid value '{value}' for header field '{key}'")]
    BadHeaderValue { key: &'static str, value: String },

    #[error("invalid sample '{value}' at row {row}, column {col}")]
    BadSample {
        row: usize,
        col: usize,
        value: String,
    },

    #[error("row {row} ends after {found} of {expected} samples")]
    ShortRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("file ends after {found} of {expected} rows")]
    ShortFile { expected: usize, found: usize },
}
