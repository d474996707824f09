use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ErrorType {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Date storage expects date in time zone {expected}, yet received {supplied}")]
    IllegalTimezone { expected: String, supplied: String },
}
