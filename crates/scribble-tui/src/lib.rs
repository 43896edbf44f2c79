//! scribble-tui - Terminal drawing frontend for scribble using Ratatui

pub mod app;
pub mod canvas;
pub mod components;
pub mod ui;

pub use app::App;

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use scribble_core::{GameSession, ScoringGateway};
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Run the TUI until the player quits
pub async fn run<G>(session: GameSession, gateway: G, export_dir: PathBuf) -> Result<()>
where
    G: ScoringGateway + Clone + Send + Sync + 'static,
{
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(session, gateway, export_dir);
    info!(prompt = %app.session.prompt(), "TUI started");

    let result = run_loop(&mut terminal, &mut app).await;

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    info!(score = app.session.score(), "TUI stopped");
    result
}

async fn run_loop<B, G>(terminal: &mut Terminal<B>, app: &mut App<G>) -> Result<()>
where
    B: Backend,
    <B as Backend>::Error: Send + Sync + 'static,
    G: ScoringGateway + Clone + Send + Sync + 'static,
{
    loop {
        app.tick();

        terminal.draw(|f| ui::render(f, app))?;

        // Short poll keeps the spinner moving and lets judge answers land
        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    app.handle_key(key.code, key.modifiers);
                }
                Event::Mouse(mouse) => app.handle_mouse(mouse),
                _ => {}
            }
        }

        if app.should_quit {
            return Ok(());
        }

        tokio::task::yield_now().await;
    }
}
