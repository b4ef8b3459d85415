use crate::error::{CalcError, Result};
use crate::history::{HistoryEntry, HistoryRepository};
use crate::operations::{LogRecord, Operation, Operations};
use tracing::info;

/// Number of operands every arithmetic command takes.
pub const OPERAND_COUNT: usize = 2;

/// Reads one operand, rejecting anything that is not a finite number.
pub fn parse_operand(raw: &str) -> Result<f64> {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(CalcError::InvalidOperand(raw.to_string())),
    }
}

/// Routes command keywords to arithmetic and history actions.
///
/// The router holds no state of its own between calls apart from the
/// operation log and whatever the repository persists.
///
/// ```
/// use csv_calculator::{CommandRouter, MemoryHistoryStore};
///
/// let mut router = CommandRouter::new(MemoryHistoryStore::new());
/// assert_eq!(router.execute("add", &[2.0, 3.0]).unwrap(), 5.0);
/// assert!(router.execute("divide", &[10.0, 0.0]).is_err());
/// ```
#[derive(Debug)]
pub struct CommandRouter<R> {
    operations: Operations,
    history: R,
}

impl<R: HistoryRepository> CommandRouter<R> {
    pub fn new(history: R) -> Self {
        Self {
            operations: Operations::new(),
            history,
        }
    }

    /// Runs the arithmetic command named `command` on `args`.
    ///
    /// The operand count is checked before the keyword, so `execute("foo", &[1.0])`
    /// reports [`CalcError::InvalidArgumentCount`].
    pub fn execute(&mut self, command: &str, args: &[f64]) -> Result<f64> {
        let [x, y] = args else {
            return Err(CalcError::InvalidArgumentCount {
                operation: command.to_string(),
                expected: OPERAND_COUNT,
                actual: args.len(),
            });
        };
        let op: Operation = command.parse()?;
        let result = self.operations.apply(op, *x, *y)?;
        info!("operation result: {op}({x}, {y}) = {result}");
        Ok(result)
    }

    pub fn is_valid_operation(command: &str) -> bool {
        command.parse::<Operation>().is_ok()
    }

    pub fn available_operations() -> [&'static str; 4] {
        Operation::ALL.map(Operation::keyword)
    }

    /// The operation log kept since this router was created.
    pub fn operations(&self) -> &[LogRecord] {
        self.operations.results()
    }

    pub fn save_history(&mut self, entry: HistoryEntry) -> Result<HistoryEntry> {
        self.history.save(entry)
    }

    pub fn load_history(&self) -> Result<Vec<HistoryEntry>> {
        self.history.load()
    }

    pub fn delete_history(&mut self, position: i64) -> Result<HistoryEntry> {
        self.history.delete(position)
    }

    pub fn clear_history(&mut self) -> Result<()> {
        self.history.clear()
    }
}
