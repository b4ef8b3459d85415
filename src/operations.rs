use crate::error::{CalcError, Result};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, error};

/// Signature shared by every arithmetic handler.
pub type Handler = fn(&mut Operations, f64, f64) -> Result<f64>;

/// The four arithmetic operations the calculator knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operation {
    /// Every operation, in the order they are offered to the user.
    pub const ALL: [Operation; 4] = [
        Operation::Add,
        Operation::Subtract,
        Operation::Multiply,
        Operation::Divide,
    ];

    /// Command word, also written to the `operation` column of the history file.
    pub fn keyword(self) -> &'static str {
        match self {
            Operation::Add => "add",
            Operation::Subtract => "subtract",
            Operation::Multiply => "multiply",
            Operation::Divide => "divide",
        }
    }

    /// Label recorded in the in-memory operation log.
    pub fn label(self) -> &'static str {
        match self {
            Operation::Add => "addition",
            Operation::Subtract => "subtraction",
            Operation::Multiply => "multiplication",
            Operation::Divide => "division",
        }
    }

    /// Dispatch table entry for this operation.
    ///
    /// The match is exhaustive, so adding a variant without a handler does not compile.
    pub fn handler(self) -> Handler {
        match self {
            Operation::Add => |ops: &mut Operations, x: f64, y: f64| Ok(ops.add(x, y)),
            Operation::Subtract => |ops: &mut Operations, x: f64, y: f64| Ok(ops.subtract(x, y)),
            Operation::Multiply => |ops: &mut Operations, x: f64, y: f64| Ok(ops.multiply(x, y)),
            Operation::Divide => Operations::divide,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for Operation {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Operation::ALL
            .into_iter()
            .find(|op| op.keyword().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| CalcError::UnknownOperation(s.to_string()))
    }
}

/// One entry of the operation log.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub operation: &'static str,
    pub result: f64,
}

/// Stateless arithmetic plus a process-lifetime log of every successful call.
///
/// The log is owned by the instance and lives as long as it does. It is never
/// persisted and never cleared automatically.
#[derive(Debug, Default)]
pub struct Operations {
    log: Vec<LogRecord>,
}

impl Operations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, x: f64, y: f64) -> f64 {
        self.record(Operation::Add, x + y)
    }

    pub fn subtract(&mut self, x: f64, y: f64) -> f64 {
        self.record(Operation::Subtract, x - y)
    }

    pub fn multiply(&mut self, x: f64, y: f64) -> f64 {
        self.record(Operation::Multiply, x * y)
    }

    /// Divides `x` by `y`.
    ///
    /// Fails with [`CalcError::DivisionByZero`] when `y` is zero, in which case
    /// nothing is appended to the log.
    pub fn divide(&mut self, x: f64, y: f64) -> Result<f64> {
        if y == 0.0 {
            error!("division by zero is not allowed");
            return Err(CalcError::DivisionByZero);
        }
        Ok(self.record(Operation::Divide, x / y))
    }

    /// Runs `op` through the dispatch table.
    pub fn apply(&mut self, op: Operation, x: f64, y: f64) -> Result<f64> {
        (op.handler())(self, x, y)
    }

    /// Everything computed so far, oldest first.
    pub fn results(&self) -> &[LogRecord] {
        &self.log
    }

    fn record(&mut self, op: Operation, result: f64) -> f64 {
        debug!(operation = op.label(), result, "recorded operation");
        self.log.push(LogRecord {
            operation: op.label(),
            result,
        });
        result
    }
}
