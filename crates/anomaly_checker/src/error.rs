use rust_decimal::Decimal;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CheckError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CheckError {
    #[error("Malformed amount '{raw}' at row {row} (GL {gl_code})")]
    MalformedAmount {
        row: usize,
        gl_code: String,
        raw: String,
    },

    #[error("Malformed row {row}: missing {field}")]
    MalformedRow { row: usize, field: &'static str },

    #[error("Zero-sum threshold must be non-negative, got {0}")]
    InvalidThreshold(Decimal),

    #[error("Running total overflowed at row {row}")]
    TotalOverflow { row: usize },

    #[error("Invalid grouping rules: {0}")]
    InvalidRules(String),
}

impl CheckError {
    /// Source row the error points at, when it is about a row.
    pub fn row(&self) -> Option<usize> {
        match self {
            CheckError::MalformedAmount { row, .. }
            | CheckError::MalformedRow { row, .. }
            | CheckError::TotalOverflow { row } => Some(*row),
            _ => None,
        }
    }
}
