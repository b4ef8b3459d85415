use thiserror::Error;

/// Errors produced by the calculator core.
///
/// Arithmetic and routing failures are meant to be reported by the caller and
/// never end the process. Store failures (`Io`, `Csv`, `MalformedHistory`)
/// come back from the history store unchanged.
#[derive(Debug, Error)]
pub enum CalcError {
    /// The second operand of a division was exactly zero.
    #[error("division by zero is not allowed")]
    DivisionByZero,

    /// An operand could not be read as a finite number.
    #[error("invalid operand: {0:?} is not a valid number")]
    InvalidOperand(String),

    /// An arithmetic command received the wrong number of operands.
    #[error("{operation} operation requires exactly {expected} arguments, but {actual} were provided")]
    InvalidArgumentCount {
        operation: String,
        expected: usize,
        actual: usize,
    },

    /// The command keyword does not name an operation.
    #[error("unknown mathematical operation: {0:?}")]
    UnknownOperation(String),

    /// A delete addressed a row that does not exist.
    #[error("index {position} is out of bounds for a history of {len} entries")]
    IndexOutOfBounds { position: i64, len: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("history file: {0}")]
    Csv(#[from] csv::Error),

    /// The history file exists but is not laid out as `index,name,operation,result`.
    #[error("malformed history file: {0}")]
    MalformedHistory(String),
}

pub type Result<T> = std::result::Result<T, CalcError>;
