use crate::session::Session;
use anyhow::Result;
use std::io::Write;

/// Conventional exit code type used by the interactive commands.
///
/// A value of 0 indicates success; any non-zero value indicates the command
/// failed and its error has already been reported.
pub type ExitCode = i32;

/// Somewhere the shell can ask the user for one more line of input.
///
/// The interactive implementation is backed by `rustyline`; tests and scripted
/// runs use an in-memory queue of lines.
pub trait LineSource {
    /// Show `prompt` and read one line without its trailing newline.
    ///
    /// Returns `Ok(None)` once the input is exhausted (end of file, Ctrl-C).
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;
}

/// Object-safe trait for any command the shell can execute.
pub trait ExecutableCommand {
    /// Executes the command, asking `input` for anything that was not given
    /// inline and writing user-facing messages to `stdout`.
    fn execute(
        self: Box<Self>,
        input: &mut dyn LineSource,
        stdout: &mut dyn Write,
        session: &mut Session,
    ) -> Result<ExitCode>;
}

/// Factory that tries to create a command from a keyword and its inline arguments.
///
/// Returns `None` when the factory doesn't recognize `name`.
pub trait CommandFactory {
    fn try_create(&self, name: &str, args: &[&str]) -> Option<Box<dyn ExecutableCommand>>;
}
