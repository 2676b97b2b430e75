use std::fs::OpenOptions;
use std::io;

use anyhow::Result;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

mod stats;
mod storage;
mod store;
mod task;
mod ui;
mod validate;

const LOG_FILE: &str = "taskdeck.log";

fn main() -> Result<()> {
    // The alternate screen owns the terminal, so logs go to a file.
    let log = OpenOptions::new().create(true).append(true).open(LOG_FILE)?;
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_writer(log)
        .with_ansi(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let storage = storage::Storage::new(validate::DATA_FILE);
    storage.ensure_exists();
    let mut store = store::TaskStore::new(storage.load());

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = ui::run_app(&mut terminal, &mut store, &storage);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    // Last full write wins
    storage.save(store.all());

    result?;
    Ok(())
}
