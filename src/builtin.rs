use crate::command::{CommandFactory, ExecutableCommand, ExitCode, LineSource};
use crate::history::HistoryEntry;
use crate::interpreter::Factory;
use crate::operations::Operation;
use crate::router::parse_operand;
use crate::session::{LastResult, Session};
use anyhow::{Result, bail};
use argh::{EarlyExit, FromArgs};
use std::io::Write;
use tracing::{error, info, warn};

pub(crate) const FIRST_NUMBER_PROMPT: &str = "Insert first number: ";
pub(crate) const SECOND_NUMBER_PROMPT: &str = "Insert second number: ";
pub(crate) const DELETE_PROMPT: &str = "Enter the index of the record to delete: ";

/// Commands that take no inline arguments beyond flags known at compile time.
///
/// They are parsed using the [`argh`] crate (`FromArgs`), which gives every one
/// of them `--help` and rejects stray arguments for free.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical keyword of the command, e.g. "save" or "exit".
    fn name() -> &'static str;

    fn execute(
        self,
        input: &mut dyn LineSource,
        stdout: &mut dyn Write,
        session: &mut Session,
    ) -> Result<ExitCode>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(
        self: Box<Self>,
        input: &mut dyn LineSource,
        stdout: &mut dyn Write,
        session: &mut Session,
    ) -> Result<ExitCode> {
        <T as BuiltinCommand>::execute(*self, input, stdout, session)
    }
}

struct InvalidArgs {
    output: String,
    is_error: bool,
}

impl ExecutableCommand for InvalidArgs {
    fn execute(
        self: Box<Self>,
        _input: &mut dyn LineSource,
        stdout: &mut dyn Write,
        _session: &mut Session,
    ) -> Result<ExitCode> {
        writeln!(stdout, "{}", self.output.trim_end())?;
        Ok(if self.is_error { 1 } else { 0 })
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn try_create(&self, name: &str, args: &[&str]) -> Option<Box<dyn ExecutableCommand>> {
        if name == T::name() {
            Some(match T::from_args(&[name], args) {
                Ok(cmd) => Box::new(cmd),
                Err(EarlyExit { output, status }) => Box::new(InvalidArgs {
                    output,
                    is_error: status.is_err(),
                }),
            })
        } else {
            None
        }
    }
}

/// Asks for a number until the answer parses, or input runs out.
fn read_number(
    input: &mut dyn LineSource,
    stdout: &mut dyn Write,
    prompt: &str,
) -> Result<Option<f64>> {
    while let Some(line) = input.read_line(prompt)? {
        match parse_operand(&line) {
            Ok(value) => return Ok(Some(value)),
            Err(e) => {
                error!("invalid input for number: {e}");
                writeln!(stdout, "Error: Must insert valid number.")?;
            }
        }
    }
    Ok(None)
}

/// One of the four arithmetic commands, with whatever operands were typed inline.
pub(crate) struct Arithmetic {
    op: Operation,
    operands: Vec<String>,
}

impl ExecutableCommand for Arithmetic {
    fn execute(
        self: Box<Self>,
        input: &mut dyn LineSource,
        stdout: &mut dyn Write,
        session: &mut Session,
    ) -> Result<ExitCode> {
        info!("performing operation: {}", self.op);
        let values = if self.operands.is_empty() {
            let Some(x) = read_number(input, stdout, FIRST_NUMBER_PROMPT)? else {
                return Ok(1);
            };
            let Some(y) = read_number(input, stdout, SECOND_NUMBER_PROMPT)? else {
                return Ok(1);
            };
            vec![x, y]
        } else {
            self.operands
                .iter()
                .map(|raw| parse_operand(raw))
                .collect::<crate::Result<Vec<f64>>>()?
        };

        let value = session.router.execute(self.op.keyword(), &values)?;
        session.last_result = Some(LastResult {
            operation: self.op,
            value,
        });
        writeln!(stdout, "Result: {value}")?;
        Ok(0)
    }
}

/// Recognizes every arithmetic keyword.
pub(crate) struct ArithmeticFactory;

impl CommandFactory for ArithmeticFactory {
    fn try_create(&self, name: &str, args: &[&str]) -> Option<Box<dyn ExecutableCommand>> {
        let op = name.parse::<Operation>().ok()?;
        Some(Box::new(Arithmetic {
            op,
            operands: args.iter().map(|s| s.to_string()).collect(),
        }))
    }
}

/// Remove one saved entry. The position may be given inline or is asked for.
///
/// Not parsed with argh, because a negative position would read as a flag.
pub(crate) struct Delete {
    args: Vec<String>,
}

impl ExecutableCommand for Delete {
    fn execute(
        self: Box<Self>,
        input: &mut dyn LineSource,
        stdout: &mut dyn Write,
        session: &mut Session,
    ) -> Result<ExitCode> {
        let raw = match self.args.as_slice() {
            [] => match input.read_line(DELETE_PROMPT)? {
                Some(line) => line,
                None => return Ok(1),
            },
            [position] => position.clone(),
            _ => bail!(
                "delete takes at most one position, but {} were provided",
                self.args.len()
            ),
        };

        let Ok(position) = raw.trim().parse::<i64>() else {
            error!("invalid index input: {raw:?}");
            writeln!(stdout, "Error: You must enter a valid number for the index.")?;
            return Ok(1);
        };

        session.router.delete_history(position)?;
        info!("deleted history entry at index {position}");
        writeln!(stdout, "Deleted entry at index {position}.")?;
        Ok(0)
    }
}

pub(crate) struct DeleteFactory;

impl CommandFactory for DeleteFactory {
    fn try_create(&self, name: &str, args: &[&str]) -> Option<Box<dyn ExecutableCommand>> {
        (name == "delete").then(|| {
            Box::new(Delete {
                args: args.iter().map(|s| s.to_string()).collect(),
            }) as Box<dyn ExecutableCommand>
        })
    }
}

#[derive(FromArgs)]
/// Save the last result to the history file.
pub struct Save {}

impl BuiltinCommand for Save {
    fn name() -> &'static str {
        "save"
    }

    fn execute(
        self,
        _input: &mut dyn LineSource,
        stdout: &mut dyn Write,
        session: &mut Session,
    ) -> Result<ExitCode> {
        let Some(last) = session.last_result else {
            warn!("no result to save");
            writeln!(
                stdout,
                "No results to save. You must perform an operation first."
            )?;
            return Ok(1);
        };

        let entry = HistoryEntry::new(session.user.clone(), last.operation.keyword(), last.value);
        let saved = session.router.save_history(entry)?;
        session.last_result = None;
        info!("history saved at index {}", saved.index);
        writeln!(stdout, "History saved.")?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Show every saved entry.
pub struct Load {}

impl BuiltinCommand for Load {
    fn name() -> &'static str {
        "load"
    }

    fn execute(
        self,
        _input: &mut dyn LineSource,
        stdout: &mut dyn Write,
        session: &mut Session,
    ) -> Result<ExitCode> {
        let history = session.router.load_history()?;
        if history.is_empty() {
            info!("cannot locate history");
            writeln!(stdout, "History is empty.")?;
        } else {
            info!("loaded {} history entries", history.len());
            writeln!(stdout, "Loaded history:")?;
            write_table(stdout, &history)?;
        }
        Ok(0)
    }
}

/// Aligned `index name operation result` table.
fn write_table(stdout: &mut dyn Write, entries: &[HistoryEntry]) -> std::io::Result<()> {
    let name_width = entries
        .iter()
        .map(|e| e.name.chars().count())
        .chain([4])
        .max()
        .unwrap_or(4);
    writeln!(
        stdout,
        "{:>5}  {:<name_width$}  {:<9}  result",
        "index", "name", "operation"
    )?;
    for e in entries {
        writeln!(
            stdout,
            "{:>5}  {:<name_width$}  {:<9}  {}",
            e.index, e.name, e.operation, e.result
        )?;
    }
    Ok(())
}

#[derive(FromArgs)]
/// Delete the history file and every entry in it.
pub struct Clear {}

impl BuiltinCommand for Clear {
    fn name() -> &'static str {
        "clear"
    }

    fn execute(
        self,
        _input: &mut dyn LineSource,
        stdout: &mut dyn Write,
        session: &mut Session,
    ) -> Result<ExitCode> {
        session.router.clear_history()?;
        info!("history cleared");
        writeln!(stdout, "History cleared.")?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// List the available commands.
pub struct Help {}

impl BuiltinCommand for Help {
    fn name() -> &'static str {
        "help"
    }

    fn execute(
        self,
        _input: &mut dyn LineSource,
        stdout: &mut dyn Write,
        _session: &mut Session,
    ) -> Result<ExitCode> {
        for op in Operation::ALL {
            writeln!(
                stdout,
                "  {:<9} [x y]       {} of two numbers",
                op.keyword(),
                op.label()
            )?;
        }
        writeln!(stdout, "  save                 store the last result")?;
        writeln!(stdout, "  load                 show the saved history")?;
        writeln!(stdout, "  delete    [index]    remove one saved entry")?;
        writeln!(stdout, "  clear                remove the whole history")?;
        writeln!(stdout, "  exit                 leave the calculator")?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Leave the calculator.
pub struct Exit {}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn execute(
        self,
        _input: &mut dyn LineSource,
        _stdout: &mut dyn Write,
        session: &mut Session,
    ) -> Result<ExitCode> {
        info!("exit command received, exiting application");
        session.should_exit = true;
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CalcError;
    use crate::history::MemoryHistoryStore;
    use crate::io_adapters::ScriptedInput;

    fn session() -> Session {
        Session::new("Alice", MemoryHistoryStore::new())
    }

    fn output(out: Vec<u8>) -> String {
        String::from_utf8(out).unwrap()
    }

    fn arithmetic(op: Operation, operands: &[&str]) -> Box<Arithmetic> {
        Box::new(Arithmetic {
            op,
            operands: operands.iter().map(|s| s.to_string()).collect(),
        })
    }

    #[test]
    fn test_arithmetic_with_inline_operands() {
        let mut session = session();
        let mut out = Vec::new();
        let code = arithmetic(Operation::Multiply, &["4", "2.5"])
            .execute(&mut ScriptedInput::default(), &mut out, &mut session)
            .unwrap();

        assert_eq!(code, 0);
        assert_eq!(output(out), "Result: 10\n");
        assert_eq!(
            session.last_result,
            Some(LastResult {
                operation: Operation::Multiply,
                value: 10.0
            })
        );
    }

    #[test]
    fn test_arithmetic_prompts_and_reprompts() {
        let mut session = session();
        let mut input = ScriptedInput::new(["five", "5", "", "3"]);
        let mut out = Vec::new();
        let code = arithmetic(Operation::Subtract, &[])
            .execute(&mut input, &mut out, &mut session)
            .unwrap();

        assert_eq!(code, 0);
        assert_eq!(
            output(out),
            "Error: Must insert valid number.\nError: Must insert valid number.\nResult: 2\n"
        );
        assert_eq!(
            input.prompts(),
            [
                FIRST_NUMBER_PROMPT,
                FIRST_NUMBER_PROMPT,
                SECOND_NUMBER_PROMPT,
                SECOND_NUMBER_PROMPT
            ]
        );
    }

    #[test]
    fn test_arithmetic_gives_up_when_input_ends() {
        let mut session = session();
        let mut out = Vec::new();
        let code = arithmetic(Operation::Add, &[])
            .execute(&mut ScriptedInput::new(["1"]), &mut out, &mut session)
            .unwrap();

        assert_eq!(code, 1);
        assert_eq!(session.last_result, None);
        assert!(session.router.operations().is_empty());
    }

    #[test]
    fn test_arithmetic_errors_propagate() {
        let mut session = session();
        let mut out = Vec::new();

        let err = arithmetic(Operation::Divide, &["10", "0"])
            .execute(&mut ScriptedInput::default(), &mut out, &mut session)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CalcError>(),
            Some(CalcError::DivisionByZero)
        ));

        let err = arithmetic(Operation::Add, &["1"])
            .execute(&mut ScriptedInput::default(), &mut out, &mut session)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CalcError>(),
            Some(CalcError::InvalidArgumentCount { actual: 1, .. })
        ));

        let err = arithmetic(Operation::Add, &["1", "x"])
            .execute(&mut ScriptedInput::default(), &mut out, &mut session)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CalcError>(),
            Some(CalcError::InvalidOperand(_))
        ));

        assert!(out.is_empty());
        assert_eq!(session.last_result, None);
    }

    #[test]
    fn test_save_without_result() {
        let mut session = session();
        let mut out = Vec::new();
        let code = Save {}
            .execute(&mut ScriptedInput::default(), &mut out, &mut session)
            .unwrap();

        assert_eq!(code, 1);
        assert_eq!(
            output(out),
            "No results to save. You must perform an operation first.\n"
        );
        assert!(session.router.load_history().unwrap().is_empty());
    }

    #[test]
    fn test_save_stores_last_result_once() {
        let mut session = session();
        session.last_result = Some(LastResult {
            operation: Operation::Add,
            value: 8.0,
        });

        let mut out = Vec::new();
        let code = Save {}
            .execute(&mut ScriptedInput::default(), &mut out, &mut session)
            .unwrap();
        assert_eq!(code, 0);
        assert_eq!(output(out), "History saved.\n");
        assert_eq!(session.last_result, None);

        let history = session.router.load_history().unwrap();
        assert_eq!(history, vec![HistoryEntry::new("Alice", "add", 8.0)]);
    }

    #[test]
    fn test_load_empty_and_populated() {
        let mut session = session();
        let mut out = Vec::new();
        Load {}
            .execute(&mut ScriptedInput::default(), &mut out, &mut session)
            .unwrap();
        assert_eq!(output(out), "History is empty.\n");

        session
            .router
            .save_history(HistoryEntry::new("Alice", "add", 8.0))
            .unwrap();
        session
            .router
            .save_history(HistoryEntry::new("Bartholomew", "divide", 0.5))
            .unwrap();

        let mut out = Vec::new();
        Load {}
            .execute(&mut ScriptedInput::default(), &mut out, &mut session)
            .unwrap();
        assert_eq!(
            output(out),
            "Loaded history:\n\
             index  name         operation  result\n\
             \x20   0  Alice        add        8\n\
             \x20   1  Bartholomew  divide     0.5\n"
        );
    }

    #[test]
    fn test_delete_inline_and_prompted() {
        let mut session = session();
        for name in ["a", "b", "c"] {
            session
                .router
                .save_history(HistoryEntry::new(name, "add", 1.0))
                .unwrap();
        }

        let mut out = Vec::new();
        let code = Box::new(Delete {
            args: vec!["1".into()],
        })
        .execute(&mut ScriptedInput::default(), &mut out, &mut session)
        .unwrap();
        assert_eq!(code, 0);

        let mut input = ScriptedInput::new([" 0 "]);
        let code = Box::new(Delete { args: vec![] })
            .execute(&mut input, &mut out, &mut session)
            .unwrap();
        assert_eq!(code, 0);
        assert_eq!(input.prompts(), [DELETE_PROMPT]);

        assert_eq!(
            output(out),
            "Deleted entry at index 1.\nDeleted entry at index 0.\n"
        );
        let history = session.router.load_history().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].name, "c");
        assert_eq!(history[0].index, 0);
    }

    #[test]
    fn test_delete_rejects_bad_positions() {
        let mut session = session();
        let mut out = Vec::new();

        let code = Box::new(Delete {
            args: vec!["first".into()],
        })
        .execute(&mut ScriptedInput::default(), &mut out, &mut session)
        .unwrap();
        assert_eq!(code, 1);
        assert_eq!(
            output(out),
            "Error: You must enter a valid number for the index.\n"
        );

        let err = Box::new(Delete {
            args: vec!["-1".into()],
        })
        .execute(&mut ScriptedInput::default(), &mut Vec::<u8>::new(), &mut session)
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CalcError>(),
            Some(CalcError::IndexOutOfBounds {
                position: -1,
                len: 0
            })
        ));

        let err = Box::new(Delete {
            args: vec!["1".into(), "2".into()],
        })
        .execute(&mut ScriptedInput::default(), &mut Vec::<u8>::new(), &mut session)
        .unwrap_err();
        assert!(err.to_string().contains("at most one position"));
    }

    #[test]
    fn test_clear_and_exit() {
        let mut session = session();
        session
            .router
            .save_history(HistoryEntry::new("Alice", "add", 8.0))
            .unwrap();

        let mut out = Vec::new();
        Clear {}
            .execute(&mut ScriptedInput::default(), &mut out, &mut session)
            .unwrap();
        assert_eq!(output(out), "History cleared.\n");
        assert!(session.router.load_history().unwrap().is_empty());

        Exit {}
            .execute(&mut ScriptedInput::default(), &mut Vec::<u8>::new(), &mut session)
            .unwrap();
        assert!(session.should_exit);
    }

    #[test]
    fn test_factory_rejects_stray_arguments() {
        let factory = Factory::<Save>::default();
        assert!(factory.try_create("load", &[]).is_none());

        let cmd = factory.try_create("save", &["now"]).unwrap();
        let mut out = Vec::new();
        let code = cmd
            .execute(&mut ScriptedInput::default(), &mut out, &mut session())
            .unwrap();
        assert_eq!(code, 1);
        assert!(!out.is_empty());
    }

    #[test]
    fn test_factory_help_is_not_an_error() {
        let cmd = Factory::<Clear>::default()
            .try_create("clear", &["--help"])
            .unwrap();
        let mut out = Vec::new();
        let code = cmd
            .execute(&mut ScriptedInput::default(), &mut out, &mut session())
            .unwrap();
        assert_eq!(code, 0);
        assert!(output(out).contains("Delete the history file"));
    }

    #[test]
    fn test_help_lists_every_command() {
        let mut out = Vec::new();
        Help {}
            .execute(&mut ScriptedInput::default(), &mut out, &mut session())
            .unwrap();
        let text = output(out);
        for keyword in ["add", "subtract", "multiply", "divide", "save", "load", "delete", "clear", "exit"] {
            assert!(text.contains(keyword), "missing {keyword}");
        }
    }
}
