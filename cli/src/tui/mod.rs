pub mod app;
pub mod ui;

use std::io;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use taskdeck_core::TaskApi;
use tokio::runtime::Runtime;

use crate::tui::app::{App, Request};

pub fn run<A: TaskApi>(runtime: &Runtime, app: &mut App<A>) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, runtime, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res
}

fn run_app<B: Backend, A: TaskApi>(
    terminal: &mut Terminal<B>,
    runtime: &Runtime,
    app: &mut App<A>,
) -> Result<()> {
    dispatch(terminal, runtime, app, Request::Load)?;

    while !app.should_quit {
        draw(terminal, app)?;

        if event::poll(Duration::from_millis(250))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if let Some(request) = app.handle_key(key) {
                    dispatch(terminal, runtime, app, request)?;
                }
            }
        }
    }
    Ok(())
}

fn draw<B: Backend, A: TaskApi>(terminal: &mut Terminal<B>, app: &mut App<A>) -> Result<()> {
    terminal
        .draw(|f| ui::draw(f, app))
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    Ok(())
}

/// Runs one request to completion. The busy marker is drawn first, and keys
/// pressed while waiting are dropped so a repeated key cannot resend it.
fn dispatch<B: Backend, A: TaskApi>(
    terminal: &mut Terminal<B>,
    runtime: &Runtime,
    app: &mut App<A>,
    request: Request,
) -> Result<()> {
    app.busy = Some(request.operation());
    draw(terminal, app)?;

    runtime.block_on(app.perform(request));

    app.busy = None;
    discard_queued_input()?;
    Ok(())
}

fn discard_queued_input() -> io::Result<()> {
    while event::poll(Duration::ZERO)? {
        event::read()?;
    }
    Ok(())
}
