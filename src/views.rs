//! Navigation between the dashboard, a subject and one of its notebooks.

use crate::models::{NotebookId, SubjectId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Dashboard,
    Subject(SubjectId),
    Notebook {
        subject: SubjectId,
        notebook: NotebookId,
    },
}

impl View {
    /// Subject the view belongs to, if any.
    pub fn subject(self) -> Option<SubjectId> {
        match self {
            Self::Dashboard => None,
            Self::Subject(subject) | Self::Notebook { subject, .. } => Some(subject),
        }
    }
}

/// Current view with implicit parent chain.
///
/// The hierarchy is fixed, so "back" is derived from the current view rather
/// than from a history list.
#[derive(Debug, Clone, Default)]
pub struct ViewStack {
    current: View,
}

impl ViewStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> View {
        self.current
    }

    /// Opens a subject from any view.
    pub fn open_subject(&mut self, subject: SubjectId) {
        self.current = View::Subject(subject);
    }

    /// Opens a notebook. Only allowed while its subject is open; returns
    /// false and leaves the view unchanged otherwise.
    pub fn open_notebook(&mut self, subject: SubjectId, notebook: NotebookId) -> bool {
        match self.current {
            View::Subject(open) if open == subject => {
                self.current = View::Notebook { subject, notebook };
                true
            }
            _ => false,
        }
    }

    /// Moves one level up. Returns false at the dashboard.
    pub fn back(&mut self) -> bool {
        self.current = match self.current {
            View::Dashboard => return false,
            View::Subject(_) => View::Dashboard,
            View::Notebook { subject, .. } => View::Subject(subject),
        };
        true
    }

    /// Returns to the dashboard if the current view is inside `subject`.
    pub fn forget_subject(&mut self, subject: SubjectId) {
        if self.current.subject() == Some(subject) {
            self.current = View::Dashboard;
        }
    }

    /// Returns to the subject view if `notebook` is open.
    pub fn forget_notebook(&mut self, notebook: NotebookId) {
        if let View::Notebook {
            subject,
            notebook: open,
        } = self.current
            && open == notebook
        {
            self.current = View::Subject(subject);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MATH: SubjectId = SubjectId::new(1);
    const ART: SubjectId = SubjectId::new(2);
    const CHAPTER: NotebookId = NotebookId::new(10);

    #[test]
    fn starts_at_dashboard() {
        let mut views = ViewStack::new();
        assert_eq!(views.current(), View::Dashboard);
        assert!(!views.back());
    }

    #[test]
    fn notebook_requires_owning_subject() {
        let mut views = ViewStack::new();
        assert!(!views.open_notebook(MATH, CHAPTER));

        views.open_subject(ART);
        assert!(!views.open_notebook(MATH, CHAPTER));
        assert_eq!(views.current(), View::Subject(ART));

        views.open_subject(MATH);
        assert!(views.open_notebook(MATH, CHAPTER));
        assert_eq!(
            views.current(),
            View::Notebook {
                subject: MATH,
                notebook: CHAPTER
            }
        );
    }

    #[test]
    fn back_walks_up_the_hierarchy() {
        let mut views = ViewStack::new();
        views.open_subject(MATH);
        views.open_notebook(MATH, CHAPTER);

        assert!(views.back());
        assert_eq!(views.current(), View::Subject(MATH));
        assert!(views.back());
        assert_eq!(views.current(), View::Dashboard);
    }

    #[test]
    fn opening_a_subject_resets_the_notebook() {
        let mut views = ViewStack::new();
        views.open_subject(MATH);
        views.open_notebook(MATH, CHAPTER);
        views.open_subject(ART);
        assert_eq!(views.current(), View::Subject(ART));
    }

    #[test]
    fn forgetting_a_subject_only_affects_its_views() {
        let mut views = ViewStack::new();
        views.open_subject(MATH);
        views.open_notebook(MATH, CHAPTER);

        views.forget_subject(ART);
        assert_eq!(views.current().subject(), Some(MATH));

        views.forget_subject(MATH);
        assert_eq!(views.current(), View::Dashboard);
    }

    #[test]
    fn forgetting_the_open_notebook_returns_to_subject() {
        let mut views = ViewStack::new();
        views.open_subject(MATH);
        views.open_notebook(MATH, CHAPTER);
        views.forget_notebook(CHAPTER);
        assert_eq!(views.current(), View::Subject(MATH));
    }
}
