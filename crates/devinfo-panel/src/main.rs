mod config;
mod state;
mod theme;
mod ui;

use std::{io, process::ExitCode, sync::Arc};

use anyhow::{Context, Result};
use crossterm::{
    event::{Event, EventStream},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use devinfo_connector::{PiecesClient, PiecesConfig};
use devinfo_core::{
    render::{render_developer, render_status},
    Connector, DeveloperBinder, SnapshotSource, StatusBinder, TrackedApplication,
};
use futures_util::{Stream, StreamExt};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use tracing::info;

use crate::state::{App, View};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let config = config::load_config()?;
    config::init_logging(&config);

    let client = PiecesClient::with_config(PiecesConfig {
        base_url: config.base_url.clone(),
        timeout: config.timeout,
    })
    .context("failed to build Pieces OS client")?;
    let source = Arc::new(client);
    let descriptor = TrackedApplication::default();
    info!(
        event = "panel_start",
        url = %config.base_url,
        view = config.view.title(),
        once = config.once
    );

    if config.once {
        return Ok(run_once(source, descriptor, config.view).await);
    }

    let mut app = App::new(source, descriptor, config.base_url.as_str(), config.view);
    let mut terminal = setup_terminal()?;
    let result = run_app(&mut terminal, &mut app).await;
    restore_terminal(&mut terminal)?;
    result?;
    Ok(ExitCode::SUCCESS)
}

/// Mounts the view, waits for it to settle and prints it.
async fn run_once<S>(source: Arc<S>, descriptor: TrackedApplication, view: View) -> ExitCode
where
    S: Connector + SnapshotSource + 'static,
{
    let (text, connected) = match view {
        View::Connection => {
            let mut binder = StatusBinder::mount(source, descriptor);
            let state = binder.settled().await;
            (render_status(&state), state.is_ready())
        }
        View::Developer => {
            let mut binder = DeveloperBinder::mount(source, descriptor);
            let state = binder.settled().await;
            (render_developer(&state), state.is_ready())
        }
    };
    println!("{text}");
    if connected {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

async fn run_app<S>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App<S>,
) -> Result<()>
where
    S: Connector + SnapshotSource + 'static,
{
    let mut events = EventStream::new();

    loop {
        draw_frame(terminal, app)?;
        if !next_update(app, &mut events).await? || app.should_quit() {
            break;
        }
    }

    Ok(())
}

fn draw_frame<B, S>(terminal: &mut Terminal<B>, app: &App<S>) -> Result<()>
where
    B: Backend,
{
    terminal.draw(|frame| ui::render(frame, app))?;
    Ok(())
}

/// Waits for a key or the mount transition and applies it. Returns `false`
/// once the event stream ends.
///
/// The mount branch is always armed; `mount_changed` resolves only for a
/// transition not yet observed.
async fn next_update<S, E>(app: &mut App<S>, events: &mut E) -> Result<bool>
where
    S: Connector + SnapshotSource + 'static,
    E: Stream<Item = io::Result<Event>> + Unpin,
{
    tokio::select! {
        _ = app.mount_changed() => Ok(true),
        maybe_event = events.next() => match maybe_event {
            Some(Ok(Event::Key(key))) => {
                app.handle_key(key);
                Ok(true)
            }
            Some(Ok(_)) => Ok(true),
            Some(Err(err)) => Err(err.into()),
            None => Ok(false),
        },
    }
}
