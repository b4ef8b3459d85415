use anyhow::Context;
use csv_calculator::config::{Cli, Config};
use csv_calculator::{CsvHistoryStore, EditorInput, Interpreter, LineSource, Session, logging};
use tracing::info;

fn main() -> anyhow::Result<()> {
    let cli: Cli = argh::from_env();
    let config = Config::from_env(&cli);
    logging::init(&config)?;
    info!("starting app");

    let store = CsvHistoryStore::new(&config.history_location);
    store.initialize().with_context(|| {
        format!(
            "can't initialize history file {}",
            config.history_location.display()
        )
    })?;

    let mut input = EditorInput::new()?;
    let user = match cli.user_name() {
        Some(name) => name.to_string(),
        None => match input.read_line("Please input your name: ")? {
            Some(name) => name.trim().to_string(),
            None => return Ok(()),
        },
    };
    info!("{user} entered the application");

    let mut calc = Interpreter::new(Session::new(user, store));
    calc.run_loop(&mut input, &mut std::io::stdout())
}
