//! Structured note documents.
//!
//! A note's content is a list of typed [`Block`]s. Markup is produced and
//! consumed only at the persistence boundary ([`Document::parse`] and
//! [`Document::to_html`]); every edit operates on the tree. Interactive
//! controls (delete, resize, rotate, unwrap) are expressed as
//! [`EditorAction`]s dispatched against a block index, and the serialized
//! fragments carry `data-block` attributes so a single delegated handler can
//! route them.

mod action;
mod document;
mod markup;
mod selection;

use thiserror::Error;

pub use action::EditorAction;
pub use document::{Block, Document, Inline};
pub use selection::Selection;

/// Errors raised by document edits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditorError {
    /// The block index is past the end of the document.
    #[error("block {index} is out of range (document has {len} blocks)")]
    BlockOutOfRange { index: usize, len: usize },

    /// The control does not exist on this kind of block.
    #[error("cannot {action} a {kind} block")]
    UnsupportedAction {
        action: &'static str,
        kind: &'static str,
    },

    /// Text selection targeted a block without inline text.
    #[error("a {kind} block has no selectable text")]
    NotTextual { kind: &'static str },

    /// A list selection named no item or a missing item.
    #[error("list item {item:?} is out of range (list has {len} items)")]
    ItemOutOfRange { item: Option<usize>, len: usize },

    /// Selection offsets fall outside the block text.
    #[error("selection {start}..{end} is out of range (text has {len} characters)")]
    SelectionOutOfRange { start: usize, end: usize, len: usize },

    /// The selection is empty or whitespace-only.
    #[error("selection is empty")]
    EmptySelection,

    /// Resize width outside the accepted range.
    #[error("width must be between 1 and {max} pixels, got {width}")]
    InvalidWidth { width: u32, max: u32 },

    /// Heading level other than 1, 2 or 3.
    #[error("heading level must be 1, 2 or 3, got {0}")]
    InvalidHeadingLevel(u8),
}
