mod app;
mod render;

pub use app::{App, InputMode};
pub use render::draw;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::time::Duration;
use tracing::info;

use crate::utils::error::BrowserError;

type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Takes over the terminal and runs `app` until the user quits. The terminal
/// is restored even if the loop fails.
pub fn run(app: &mut App) -> Result<()> {
    let mut terminal = setup_terminal()?;
    info!(event = "ui_started", message = "Terminal UI started");

    let result = event_loop(&mut terminal, app);
    restore_terminal(&mut terminal)?;

    info!(event = "ui_stopped", message = "Terminal UI stopped");
    result
}

fn setup_terminal() -> Result<Tui, BrowserError> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

fn restore_terminal(terminal: &mut Tui) -> Result<(), BrowserError> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn event_loop(terminal: &mut Tui, app: &mut App) -> Result<()> {
    let tick_rate = Duration::from_millis(100);

    while !app.should_exit() {
        app.tick();
        terminal.draw(|f| draw(f, app))?;

        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }
    }

    Ok(())
}
