//! An interactive four-function calculator with a CSV-backed history.
//!
//! The core is small: [`Operations`] does the arithmetic and keeps an
//! in-memory log, a [`HistoryRepository`] persists saved results, and
//! [`CommandRouter`] maps command keywords onto both. [`CsvHistoryStore`]
//! is the file-backed repository the binary uses; [`MemoryHistoryStore`]
//! follows the same contract without touching the disk.
//!
//! On top of the core sits a small shell: [`Interpreter`] reads command
//! lines from any [`LineSource`], dispatches them to the builtin commands
//! and reports every error without ending the loop.

mod builtin;
pub mod command;
pub mod config;
pub mod error;
pub mod history;
mod interpreter;
pub mod io_adapters;
pub mod logging;
pub mod operations;
pub mod router;
pub mod session;

pub use command::LineSource;
pub use error::{CalcError, Result};
pub use history::{CsvHistoryStore, HistoryEntry, HistoryRepository, MemoryHistoryStore};
pub use interpreter::{COMMAND_PROMPT, Interpreter};
pub use io_adapters::{EditorInput, ScriptedInput};
pub use operations::{Operation, Operations};
pub use router::CommandRouter;
pub use session::Session;
