// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod render;

use anyhow::{Context, Result, anyhow};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use mbx_app::{AppState, Command, Input, Key, LoadCompleted, LoadPayload, LoadRequest, RequestId};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;
use tracing::{debug, info, warn};

pub use render::{SPINNER, format_timestamp};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Side effects the navigation core asks for. Implementations own the HTTP
/// client and the browser launcher.
pub trait AppRuntime {
    fn fetch(&mut self, request: &LoadRequest) -> Result<LoadPayload>;
    fn open_url(&mut self, url: &str) -> Result<()>;

    /// Runs `request` and reports back on `tx`. The default runs inline;
    /// real runtimes move the fetch onto its own thread.
    fn spawn_fetch(
        &mut self,
        id: RequestId,
        request: LoadRequest,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let result = self
            .fetch(&request)
            .map_err(|error| format!("{error:#}"));
        tx.send(InternalEvent::Loaded(LoadCompleted { id, result }))
            .map_err(|_| anyhow!("load event channel closed"))?;
        Ok(())
    }

    fn spawn_update_check(&mut self, _tx: Sender<InternalEvent>) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    Loaded(LoadCompleted),
    /// A newer release tag, or `None` when already current.
    UpdateChecked(Option<String>),
}

pub fn run_app<R: AppRuntime>(state: &mut AppState, runtime: &mut R) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let (internal_tx, internal_rx) = mpsc::channel();
    if let Err(error) = runtime.spawn_update_check(internal_tx.clone()) {
        debug!(error = %error, "update check not started");
    }
    info!(url = state.base_url(), "explorer started");

    let mut result = Ok(());
    loop {
        process_internal_events(state, runtime, &internal_tx, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render::render(frame, state)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = match event::poll(POLL_INTERVAL).context("poll event") {
            Ok(has_event) => has_event,
            Err(error) => {
                result = Err(error);
                break;
            }
        };
        if !has_event {
            state.handle(Input::Tick);
            continue;
        }
        match event::read().context("read event") {
            Ok(Event::Key(key)) => {
                if handle_key_event(state, runtime, &internal_tx, key) {
                    break;
                }
            }
            Ok(_) => {}
            Err(error) => {
                result = Err(error);
                break;
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    info!("explorer stopped");
    result
}

fn process_internal_events<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        let command = match event {
            InternalEvent::Loaded(completed) => state.handle(Input::Loaded(completed)),
            InternalEvent::UpdateChecked(latest) => state.handle(Input::UpdateChecked(latest)),
        };
        // Completions can chain another load (single-schema skip).
        execute_command(state, runtime, tx, command);
    }
}

/// Returns true when the app should exit.
fn handle_key_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    let Some(key) = translate_key(key) else {
        return false;
    };
    let command = state.handle(Input::Key(key));
    execute_command(state, runtime, tx, command)
}

fn execute_command<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    tx: &Sender<InternalEvent>,
    command: Option<Command>,
) -> bool {
    match command {
        None => false,
        Some(Command::Quit) => true,
        Some(Command::Load { id, request }) => {
            if let Err(error) = runtime.spawn_fetch(id, request, tx.clone()) {
                warn!(id, error = %error, "could not start load");
                state.handle(Input::Loaded(LoadCompleted {
                    id,
                    result: Err(format!("{error:#}")),
                }));
            }
            false
        }
        Some(Command::OpenUrl(url)) => {
            debug!(%url, "opening browser");
            if let Err(error) = runtime.open_url(&url) {
                warn!(%url, error = %error, "browser launch failed");
                state.set_error(format!("open {url}: {error:#}"));
            }
            false
        }
    }
}

fn translate_key(key: KeyEvent) -> Option<Key> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(Key::Interrupt),
            _ => None,
        };
    }
    match key.code {
        KeyCode::Char(ch) => Some(Key::Char(ch)),
        KeyCode::Up => Some(Key::Up),
        KeyCode::Down => Some(Key::Down),
        KeyCode::Left => Some(Key::Left),
        KeyCode::Right => Some(Key::Right),
        KeyCode::Enter => Some(Key::Enter),
        KeyCode::Backspace => Some(Key::Backspace),
        KeyCode::Esc => Some(Key::Esc),
        _ => None,
    }
}
