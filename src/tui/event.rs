//! Keyboard event handling for the TUI.
//!
//! Maps crossterm keyboard events to application state changes. Anything that
//! needs the store is returned as a [`Command`] for the event loop to run.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::app::{App, Focus};

/// Follow-up work for the event loop after a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    None,
    Quit,
    /// The view changed; reload its entries.
    Reload,
    /// Delete the selected entry, then reload.
    DeleteSelected,
}

/// Handles a keyboard event and updates the app state accordingly.
///
/// # Event Handling
///
/// - `q`: quit (except while typing a filter)
/// - `Tab` / `Shift+Tab`: cycle focus
/// - `Esc`: clear focus back to the list and go up one level
/// - List: `j`/`k` navigate, `Enter` open, `h`/`Backspace` back, `d` delete
/// - Detail: `j`/`k` scroll
///
/// # Examples
///
/// ```
/// use cognicanvas::tui::{App, event::{Command, handle_key_event}};
/// use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
///
/// let mut app = App::new();
/// let key = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
/// assert_eq!(handle_key_event(&mut app, key), Command::Quit);
/// ```
pub fn handle_key_event(app: &mut App, key: KeyEvent) -> Command {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Command::Quit;
    }

    match key.code {
        KeyCode::Tab => {
            app.next_focus();
            return Command::None;
        }
        KeyCode::BackTab => {
            app.prev_focus();
            return Command::None;
        }
        KeyCode::Esc => {
            if app.focus() == Focus::List {
                return reload_if(app.back());
            }
            while app.focus() != Focus::List {
                app.next_focus();
            }
            return Command::None;
        }
        _ => {}
    }

    match app.focus() {
        Focus::FilterInput => handle_filter_input(app, key),
        Focus::List => handle_list(app, key),
        Focus::DetailView => handle_detail_view(app, key),
    }
}

fn reload_if(changed: bool) -> Command {
    if changed { Command::Reload } else { Command::None }
}

fn handle_filter_input(app: &mut App, key: KeyEvent) -> Command {
    match key.code {
        KeyCode::Char(c) if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT => {
            app.push_filter_char(c);
        }
        KeyCode::Backspace => app.pop_filter_char(),
        KeyCode::Enter => app.next_focus(),
        _ => {}
    }
    Command::None
}

fn handle_list(app: &mut App, key: KeyEvent) -> Command {
    if !key.modifiers.is_empty() && key.modifiers != KeyModifiers::SHIFT {
        return Command::None;
    }
    match key.code {
        KeyCode::Char('q') => Command::Quit,
        KeyCode::Char('j') | KeyCode::Down => {
            app.select_next();
            Command::None
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.select_previous();
            Command::None
        }
        KeyCode::Enter | KeyCode::Char('l') | KeyCode::Right => reload_if(app.open_selected()),
        KeyCode::Char('h') | KeyCode::Left | KeyCode::Backspace => reload_if(app.back()),
        KeyCode::Char('d') if app.selected_entry().is_some() => Command::DeleteSelected,
        _ => Command::None,
    }
}

fn handle_detail_view(app: &mut App, key: KeyEvent) -> Command {
    match key.code {
        KeyCode::Char('q') => return Command::Quit,
        KeyCode::Char('j') | KeyCode::Down => app.scroll_detail_down(1),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_detail_up(1),
        KeyCode::PageDown => app.scroll_detail_down(10),
        KeyCode::PageUp => app.scroll_detail_up(10),
        _ => {}
    }
    Command::None
}
