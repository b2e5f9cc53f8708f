//! Terminal browser for subjects, notebooks and notes.
//!
//! Provides a filter input, an entry list and a detail panel that renders
//! note documents with their important snippets highlighted. Uses ratatui
//! for rendering and crossterm for terminal management.

use std::io;
use std::panic;

use anyhow::{Context, Result};
use crossterm::{
    event::{self as crossterm_event, Event},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use time::OffsetDateTime;

use crate::config::Config;
use crate::views::View;
use crate::{CanvasService, Database, UserId};

mod app;
pub mod event;
mod ui;

pub use app::{App, Entry, Focus};
pub use event::Command;

/// Initializes the terminal for TUI rendering.
///
/// Enables raw mode and enters the alternate screen.
/// Returns a configured Terminal instance.
///
/// # Errors
///
/// Returns an error if terminal initialization fails.
fn init_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend).context("failed to create terminal")?;
    Ok(terminal)
}

/// Restores the terminal to its original state.
///
/// Disables raw mode and leaves the alternate screen.
/// This should always be called before exiting the TUI,
/// even in error cases, to prevent terminal corruption.
///
/// # Errors
///
/// Returns an error if terminal restoration fails.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;
    Ok(())
}

/// Minimal terminal restoration for panic handler.
///
/// Does not require a Terminal reference, making it safe to call
/// from a panic hook where we may not have access to the Terminal.
/// Ignores errors since we're likely already in a bad state.
fn restore_terminal_panic() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen);
}

/// Initializes a panic hook that restores the terminal before panicking.
///
/// This ensures the terminal is restored even if a panic occurs anywhere
/// in the application, not just in the event loop. The original panic
/// hook is preserved and called after terminal restoration.
fn init_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        restore_terminal_panic();
        original_hook(panic_info);
    }));
}

/// Runs the main event loop for the TUI.
///
/// Polls for keyboard events, updates app state, and re-renders.
/// Exits when the user presses 'q' or an error occurs.
///
/// # Errors
///
/// Returns an error if event polling, rendering, or terminal operations fail.
/// Terminal state is always restored, even on error.
pub fn run_event_loop(app: &mut App, service: &CanvasService, user: &UserId) -> Result<()> {
    let mut terminal = init_terminal()?;

    let result = run_event_loop_internal(app, service, user, &mut terminal);

    if let Err(e) = restore_terminal(&mut terminal) {
        eprintln!("Error restoring terminal: {e}");
    }

    result
}

fn run_event_loop_internal(
    app: &mut App,
    service: &CanvasService,
    user: &UserId,
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
) -> Result<()> {
    loop {
        terminal.draw(|frame| {
            ui::draw(frame, app);
        })?;

        if crossterm_event::poll(std::time::Duration::from_millis(100))?
            && let Event::Key(key) = crossterm_event::read()?
        {
            match event::handle_key_event(app, key) {
                Command::Quit => break,
                Command::Reload => load_entries(app, service, user)?,
                Command::DeleteSelected => {
                    delete_selected(app, service, user);
                    load_entries(app, service, user)?;
                }
                Command::None => {}
            }
        }
    }

    Ok(())
}

/// Loads the entries for the current view, plus the user's stats.
///
/// Children of a parent that no longer exists load as an empty list.
///
/// # Errors
///
/// Returns an error if a store query fails.
fn load_entries(app: &mut App, service: &CanvasService, user: &UserId) -> Result<()> {
    let entries = match app.view() {
        View::Dashboard => service
            .list_subjects(user)
            .context("Failed to load subjects")?
            .into_iter()
            .map(Entry::Subject)
            .collect(),
        View::Subject(subject) => service
            .list_notebooks(user, subject)
            .context("Failed to load notebooks")?
            .into_iter()
            .map(Entry::Notebook)
            .collect(),
        View::Notebook { notebook, .. } => service
            .list_notes(user, notebook)
            .context("Failed to load notes")?
            .into_iter()
            .map(Entry::Note)
            .collect(),
    };
    app.set_entries(entries);

    let stats = service
        .user_stats(user, OffsetDateTime::now_utc())
        .context("Failed to load stats")?;
    app.set_stats(stats);
    Ok(())
}

/// Deletes the selected entry with its cascade. Failures are shown in the
/// status line rather than ending the session.
fn delete_selected(app: &mut App, service: &CanvasService, user: &UserId) {
    let Some(entry) = app.selected_entry().cloned() else {
        return;
    };

    let result = match &entry {
        Entry::Subject(subject) => service.delete_subject(user, subject.id).map(|(_, r)| r),
        Entry::Notebook(notebook) => service.delete_notebook(user, notebook.id).map(|(_, r)| r),
        Entry::Note(note) => service.delete_note(user, note.id).map(|(_, r)| r),
    };

    match result {
        Ok(report) => {
            app.forget(&entry);
            app.set_status(format!(
                "Deleted \"{}\" ({} items removed)",
                entry.label(),
                report.operations()
            ));
        }
        Err(err) => app.set_status(format!("Delete failed: {err}")),
    }
}

/// Entry point for the TUI application.
///
/// Opens the configured database, loads the dashboard and starts the event
/// loop for the configured default user.
///
/// # Errors
///
/// Returns an error if:
/// - Database directory creation fails
/// - Database connection fails
/// - Initial loading fails
/// - Terminal initialization or event loop fails
pub fn run(config: &Config) -> Result<()> {
    init_panic_hook();

    crate::utils::ensure_database_directory(&config.database_path)
        .context("Failed to ensure database directory")?;
    let db = Database::open(&config.database_path).context("Failed to open database")?;
    let service = CanvasService::new(db).with_max_batch_operations(config.max_batch_operations);
    let user = &config.default_user;

    let mut app = App::new();
    load_entries(&mut app, &service, user).context("Failed to load subjects from database")?;

    run_event_loop(&mut app, &service, user).context("TUI event loop failed")?;

    Ok(())
}
