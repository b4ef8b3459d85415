use crate::command::{CommandFactory, ExitCode, LineSource};
use crate::error::CalcError;
use crate::session::Session;
use std::io::Write;
use tracing::{error, info};

/// Prompt shown before every command.
pub const COMMAND_PROMPT: &str =
    "Enter a command (add, subtract, multiply, divide, save, load, delete, clear, help, exit): ";

/// Factory allows creating instances of ExecutableCommand.
///
/// Only supports the argh-parsed builtins defined in this crate.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// The interactive calculator: a [`Session`] plus the commands that act on it.
///
/// Commands are looked up by keyword through a list of [`CommandFactory`]
/// objects. Every failure is reported to the user and logged here, so a bad
/// command never ends the read loop.
///
/// Example
/// ```
/// use csv_calculator::{Interpreter, MemoryHistoryStore, ScriptedInput, Session};
///
/// let mut calc = Interpreter::new(Session::new("Alice", MemoryHistoryStore::new()));
/// let mut out = Vec::new();
/// let code = calc
///     .run("add", &["2", "3"], &mut ScriptedInput::default(), &mut out)
///     .unwrap();
/// assert_eq!(code, 0);
/// assert_eq!(String::from_utf8(out).unwrap(), "Result: 5\n");
/// ```
pub struct Interpreter {
    session: Session,
    commands: Vec<Box<dyn CommandFactory>>,
}

impl Interpreter {
    /// Create an interpreter with the default set of commands:
    /// - arithmetic: `add`, `subtract`, `multiply`, `divide`
    /// - history: `save`, `load`, `delete`, `clear`
    /// - `help` and `exit`
    pub fn new(session: Session) -> Self {
        use crate::builtin::*;
        Self::with_commands(
            session,
            vec![
                Box::new(ArithmeticFactory),
                Box::new(Factory::<Save>::default()),
                Box::new(Factory::<Load>::default()),
                Box::new(DeleteFactory),
                Box::new(Factory::<Clear>::default()),
                Box::new(Factory::<Help>::default()),
                Box::new(Factory::<Exit>::default()),
            ],
        )
    }

    /// Create an interpreter with a custom set of command factories.
    pub fn with_commands(session: Session, commands: Vec<Box<dyn CommandFactory>>) -> Self {
        Self { session, commands }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Run a single command invocation by keyword with inline arguments.
    ///
    /// Returns the command's exit code, or an error if no factory knows the
    /// keyword or the command fails.
    pub fn run(
        &mut self,
        name: &str,
        args: &[&str],
        input: &mut dyn LineSource,
        stdout: &mut dyn Write,
    ) -> anyhow::Result<ExitCode> {
        for factory in &self.commands {
            if let Some(cmd) = factory.try_create(name, args) {
                return cmd.execute(input, stdout, &mut self.session);
            }
        }
        Err(CalcError::UnknownOperation(name.to_string()).into())
    }

    /// Run one line typed at the command prompt.
    ///
    /// The keyword is matched case-insensitively and blank lines do nothing.
    /// Errors are written to `stdout`, logged, and turned into exit code 1.
    pub fn run_line(
        &mut self,
        line: &str,
        input: &mut dyn LineSource,
        stdout: &mut dyn Write,
    ) -> anyhow::Result<ExitCode> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Ok(0);
        };
        let name = name.to_lowercase();
        let args: Vec<&str> = words.collect();

        match self.run(&name, &args, input, stdout) {
            Ok(code) => Ok(code),
            Err(e) => {
                match e.downcast_ref::<CalcError>() {
                    Some(CalcError::UnknownOperation(_)) => {
                        error!("invalid command: {name:?}");
                        writeln!(stdout, "Error. Invalid command. Try again.")?;
                    }
                    _ => {
                        error!("{name} failed: {e:#}");
                        writeln!(stdout, "Error: {e}")?;
                    }
                }
                Ok(1)
            }
        }
    }

    /// Read and run commands from `input` until `exit` or end of input.
    ///
    /// With an [`EditorInput`](crate::EditorInput) this is the interactive
    /// read-eval-print loop.
    pub fn run_loop(
        &mut self,
        input: &mut dyn LineSource,
        stdout: &mut dyn Write,
    ) -> anyhow::Result<()> {
        while !self.session.should_exit {
            let Some(line) = input.read_line(COMMAND_PROMPT)? else {
                info!("input closed, exiting application");
                break;
            };
            self.run_line(&line, input, stdout)?;
            stdout.flush()?;
        }
        Ok(())
    }
}
