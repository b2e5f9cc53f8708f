use serde::{Deserialize, Serialize};

use super::document::{normalize, plain_text};
use super::{Document, EditorError, Inline};

/// A character range inside one block's text.
///
/// Offsets count Unicode scalar values in the block's plain text. List
/// blocks need `item` to pick the list entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub block: usize,
    #[serde(default)]
    pub item: Option<usize>,
    pub start: usize,
    pub end: usize,
}

impl Selection {
    pub fn new(block: usize, start: usize, end: usize) -> Self {
        Self {
            block,
            item: None,
            start,
            end,
        }
    }

    pub fn in_item(mut self, item: usize) -> Self {
        self.item = Some(item);
        self
    }

    /// Checks the range against `text`. Whitespace-only ranges are empty.
    fn checked_range(&self, text: &str) -> Result<(usize, usize), EditorError> {
        let len = text.chars().count();
        if self.start > self.end || self.end > len {
            return Err(EditorError::SelectionOutOfRange {
                start: self.start,
                end: self.end,
                len,
            });
        }
        if text
            .chars()
            .skip(self.start)
            .take(self.end - self.start)
            .all(char::is_whitespace)
        {
            return Err(EditorError::EmptySelection);
        }
        Ok((self.start, self.end))
    }

    pub(crate) fn text_in(&self, doc: &Document) -> Result<String, EditorError> {
        let text = plain_text(doc.block(self.block)?.inlines(self.item)?);
        let (start, end) = self.checked_range(&text)?;
        Ok(slice_chars(&text, start, end))
    }

    pub(crate) fn highlight_in(&self, doc: &mut Document) -> Result<String, EditorError> {
        let inlines = doc.block_mut(self.block)?.inlines_mut(self.item)?;
        let text = plain_text(inlines);
        let (start, end) = self.checked_range(&text)?;

        let marked = wrap_range(inlines, start, end);
        *inlines = marked;
        Ok(slice_chars(&text, start, end))
    }
}

fn slice_chars(text: &str, start: usize, end: usize) -> String {
    text.chars().skip(start).take(end - start).collect()
}

/// Splits the runs at `start` and `end` and replaces the covered part with a
/// single highlight. Marks outside the range are preserved.
fn wrap_range(inlines: &[Inline], start: usize, end: usize) -> Vec<Inline> {
    let mut out = Vec::with_capacity(inlines.len() + 2);
    let mut selected = String::new();
    let mut pos = 0;

    for inline in inlines {
        let text = inline.as_str();
        let len = text.chars().count();
        let (run_start, run_end) = (pos, pos + len);
        pos = run_end;

        if run_end <= start || run_start >= end {
            out.push(inline.clone());
            continue;
        }

        let local_start = start.saturating_sub(run_start);
        let local_end = (end - run_start).min(len);

        let before = slice_chars(text, 0, local_start);
        if !before.is_empty() {
            out.push(inline.with_text(before));
        }
        selected.push_str(&slice_chars(text, local_start, local_end));

        if run_end >= end {
            out.push(Inline::highlight(std::mem::take(&mut selected)));
            let after = slice_chars(text, local_end, len);
            if !after.is_empty() {
                out.push(inline.with_text(after));
            }
        }
    }

    normalize(out)
}
