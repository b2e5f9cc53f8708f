use crate::editor::Document;
use crate::gamification::UserStats;
use crate::models::{Note, Notebook, Subject};
use crate::views::{View, ViewStack};

/// One row of the list panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Subject(Subject),
    Notebook(Notebook),
    Note(Note),
}

impl Entry {
    pub fn label(&self) -> &str {
        match self {
            Self::Subject(subject) => &subject.name,
            Self::Notebook(notebook) => &notebook.title,
            Self::Note(note) => &note.title,
        }
    }

    fn matches(&self, query: &str) -> bool {
        self.label().to_lowercase().contains(query)
    }
}

/// Application state for the TUI.
///
/// Holds the current view, the entries listed for it, the filter buffer and
/// panel focus. Loading from the store happens outside, in the event loop.
#[derive(Debug, Clone)]
pub struct App {
    views: ViewStack,
    /// Everything loaded for the current view
    all_entries: Vec<Entry>,
    /// Entries passing the filter
    entries: Vec<Entry>,
    selected_index: Option<usize>,
    filter_input: String,
    focus: Focus,
    detail_scroll: u16,
    stats: Option<UserStats>,
    status: Option<String>,
}

/// Panel focus state for keyboard navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    /// Typing narrows the list by name
    FilterInput,
    /// j/k moves, Enter opens, d deletes
    List,
    /// j/k scrolls
    DetailView,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    /// Creates an App on the dashboard with focus on the list.
    ///
    /// # Examples
    ///
    /// ```
    /// use cognicanvas::tui::{App, Focus};
    ///
    /// let app = App::new();
    /// assert!(app.entries().is_empty());
    /// assert_eq!(app.focus(), Focus::List);
    /// ```
    pub fn new() -> Self {
        Self {
            views: ViewStack::new(),
            all_entries: Vec::new(),
            entries: Vec::new(),
            selected_index: None,
            filter_input: String::new(),
            focus: Focus::List,
            detail_scroll: 0,
            stats: None,
            status: None,
        }
    }

    pub fn view(&self) -> View {
        self.views.current()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected_index
    }

    pub fn selected_entry(&self) -> Option<&Entry> {
        self.selected_index.and_then(|i| self.entries.get(i))
    }

    pub fn filter_input(&self) -> &str {
        &self.filter_input
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn stats(&self) -> Option<&UserStats> {
        self.stats.as_ref()
    }

    pub fn set_stats(&mut self, stats: UserStats) {
        self.stats = Some(stats);
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = Some(status.into());
    }

    /// Replaces the listed entries, keeping the selection index when it is
    /// still in range.
    pub fn set_entries(&mut self, entries: Vec<Entry>) {
        self.all_entries = entries;
        let previous = self.selected_index;
        self.apply_filter();
        self.selected_index = previous
            .filter(|i| *i < self.entries.len())
            .or_else(|| (!self.entries.is_empty()).then_some(0));
    }

    /// Filters entries by case-insensitive substring match on their label.
    pub fn apply_filter(&mut self) {
        let query = self.filter_input.to_lowercase();
        self.entries = self
            .all_entries
            .iter()
            .filter(|entry| query.is_empty() || entry.matches(&query))
            .cloned()
            .collect();
        self.selected_index = (!self.entries.is_empty()).then_some(0);
        self.detail_scroll = 0;
    }

    pub fn push_filter_char(&mut self, c: char) {
        self.filter_input.push(c);
        self.apply_filter();
    }

    pub fn pop_filter_char(&mut self) {
        self.filter_input.pop();
        self.apply_filter();
    }

    fn clear_filter(&mut self) {
        self.filter_input.clear();
        self.selected_index = None;
        self.detail_scroll = 0;
    }

    /// Opens the selected subject or notebook. Returns true if the view
    /// changed and entries must be reloaded.
    pub fn open_selected(&mut self) -> bool {
        let opened = match (self.views.current(), self.selected_entry()) {
            (_, Some(Entry::Subject(subject))) => {
                let id = subject.id;
                self.views.open_subject(id);
                true
            }
            (View::Subject(_), Some(Entry::Notebook(notebook))) => {
                let (subject, notebook) = (notebook.subject_id, notebook.id);
                self.views.open_notebook(subject, notebook)
            }
            (_, Some(Entry::Note(_))) => {
                self.focus = Focus::DetailView;
                false
            }
            _ => false,
        };
        if opened {
            self.clear_filter();
            self.focus = Focus::List;
        }
        opened
    }

    /// Goes one level up. Returns true if the view changed.
    pub fn back(&mut self) -> bool {
        let moved = self.views.back();
        if moved {
            self.clear_filter();
            self.focus = Focus::List;
        }
        moved
    }

    /// Leaves views that belonged to a deleted entry.
    pub fn forget(&mut self, entry: &Entry) {
        match entry {
            Entry::Subject(subject) => self.views.forget_subject(subject.id),
            Entry::Notebook(notebook) => self.views.forget_notebook(notebook.id),
            Entry::Note(_) => {}
        }
    }

    /// Parsed document of the selected note.
    pub fn selected_document(&self) -> Option<Document> {
        match self.selected_entry()? {
            Entry::Note(note) => Some(Document::parse(&note.content)),
            _ => None,
        }
    }

    /// Cycles focus: `FilterInput` -> `List` -> `DetailView` -> `FilterInput`.
    pub fn next_focus(&mut self) {
        self.focus = match self.focus {
            Focus::FilterInput => Focus::List,
            Focus::List => Focus::DetailView,
            Focus::DetailView => Focus::FilterInput,
        };
    }

    pub fn prev_focus(&mut self) {
        self.focus = match self.focus {
            Focus::FilterInput => Focus::DetailView,
            Focus::List => Focus::FilterInput,
            Focus::DetailView => Focus::List,
        };
    }

    /// Moves selection down, wrapping to the top.
    pub fn select_next(&mut self) {
        if self.entries.is_empty() {
            self.selected_index = None;
            return;
        }
        self.selected_index = Some(match self.selected_index {
            Some(i) if i + 1 < self.entries.len() => i + 1,
            _ => 0,
        });
        self.detail_scroll = 0;
    }

    /// Moves selection up, wrapping to the bottom.
    pub fn select_previous(&mut self) {
        if self.entries.is_empty() {
            self.selected_index = None;
            return;
        }
        self.selected_index = Some(match self.selected_index {
            None | Some(0) => self.entries.len() - 1,
            Some(i) => i - 1,
        });
        self.detail_scroll = 0;
    }

    pub fn detail_scroll(&self) -> u16 {
        self.detail_scroll
    }

    pub fn scroll_detail_down(&mut self, amount: u16) {
        self.detail_scroll = self.detail_scroll.saturating_add(amount);
    }

    pub fn scroll_detail_up(&mut self, amount: u16) {
        self.detail_scroll = self.detail_scroll.saturating_sub(amount);
    }
}
