use serde::{Deserialize, Serialize};

use super::{EditorAction, EditorError, Selection, markup};

/// Inline run of text with at most one mark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Inline {
    Text { text: String },
    Bold { text: String },
    Italic { text: String },
    Underline { text: String },
    Link { href: String, text: String },
    /// Text the user marked as important.
    Highlight { text: String },
}

impl Inline {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn highlight(text: impl Into<String>) -> Self {
        Self::Highlight { text: text.into() }
    }

    /// The visible text of this run.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text { text }
            | Self::Bold { text }
            | Self::Italic { text }
            | Self::Underline { text }
            | Self::Link { text, .. }
            | Self::Highlight { text } => text,
        }
    }

    pub fn is_highlight(&self) -> bool {
        matches!(self, Self::Highlight { .. })
    }

    /// Same mark, different text.
    pub(crate) fn with_text(&self, text: String) -> Self {
        match self {
            Self::Text { .. } => Self::Text { text },
            Self::Bold { .. } => Self::Bold { text },
            Self::Italic { .. } => Self::Italic { text },
            Self::Underline { .. } => Self::Underline { text },
            Self::Link { href, .. } => Self::Link {
                href: href.clone(),
                text,
            },
            Self::Highlight { .. } => Self::Highlight { text },
        }
    }

    fn text_mut(&mut self) -> &mut String {
        match self {
            Self::Text { text }
            | Self::Bold { text }
            | Self::Italic { text }
            | Self::Underline { text }
            | Self::Link { text, .. }
            | Self::Highlight { text } => text,
        }
    }

    fn same_mark(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Link { href: a, .. }, Self::Link { href: b, .. }) => a == b,
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }
}

/// Drops empty runs and merges adjacent runs carrying the same mark.
pub(crate) fn normalize(inlines: Vec<Inline>) -> Vec<Inline> {
    let mut out: Vec<Inline> = Vec::with_capacity(inlines.len());
    for inline in inlines {
        if inline.as_str().is_empty() {
            continue;
        }
        match out.last_mut() {
            Some(last) if last.same_mark(&inline) => last.text_mut().push_str(inline.as_str()),
            _ => out.push(inline),
        }
    }
    out
}

/// Concatenated visible text of a run of inlines.
pub(crate) fn plain_text(inlines: &[Inline]) -> String {
    inlines.iter().map(Inline::as_str).collect()
}

/// One top-level element of a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Block {
    Heading {
        level: u8,
        inlines: Vec<Inline>,
    },
    Paragraph {
        #[serde(default)]
        inlines: Vec<Inline>,
    },
    List {
        #[serde(default)]
        ordered: bool,
        items: Vec<Vec<Inline>>,
    },
    Quote {
        inlines: Vec<Inline>,
    },
    Code {
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        language: Option<String>,
        #[serde(default)]
        code: String,
    },
    Image {
        src: String,
        #[serde(default)]
        width: Option<u32>,
        #[serde(default)]
        rotation: u16,
    },
    Drawing {
        src: String,
        #[serde(default)]
        width: Option<u32>,
    },
    #[serde(rename_all = "camelCase")]
    Pdf { name: String, size_bytes: u64 },
    /// Markup the editor does not model, kept verbatim.
    Raw { html: String },
}

impl Block {
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::Paragraph {
            inlines: normalize(vec![Inline::text(text)]),
        }
    }

    /// Heading with plain text. Levels outside 1..=3 are rejected.
    pub fn heading(level: u8, text: impl Into<String>) -> Result<Self, EditorError> {
        if !(1..=3).contains(&level) {
            return Err(EditorError::InvalidHeadingLevel(level));
        }
        Ok(Self::Heading {
            level,
            inlines: normalize(vec![Inline::text(text)]),
        })
    }

    pub fn quote(text: impl Into<String>) -> Self {
        Self::Quote {
            inlines: normalize(vec![Inline::text(text)]),
        }
    }

    pub fn image(src: impl Into<String>) -> Self {
        Self::Image {
            src: src.into(),
            width: None,
            rotation: 0,
        }
    }

    /// Block name used in markup and error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Heading { .. } => "heading",
            Self::Paragraph { .. } => "paragraph",
            Self::List { .. } => "list",
            Self::Quote { .. } => "quote",
            Self::Code { .. } => "code",
            Self::Image { .. } => "image",
            Self::Drawing { .. } => "drawing",
            Self::Pdf { .. } => "pdf",
            Self::Raw { .. } => "raw",
        }
    }

    /// Plain text of the block, list items on separate lines.
    pub fn plain_text(&self) -> String {
        match self {
            Self::Heading { inlines, .. } | Self::Paragraph { inlines } | Self::Quote { inlines } => {
                plain_text(inlines)
            }
            Self::List { items, .. } => items
                .iter()
                .map(|item| plain_text(item))
                .collect::<Vec<_>>()
                .join("\n"),
            Self::Code { code, .. } => code.clone(),
            Self::Image { .. } | Self::Drawing { .. } | Self::Raw { .. } => String::new(),
            Self::Pdf { name, .. } => name.clone(),
        }
    }

    /// Mutable inline run addressed by a selection.
    pub(crate) fn inlines_mut(&mut self, item: Option<usize>) -> Result<&mut Vec<Inline>, EditorError> {
        let kind = self.kind();
        match self {
            Self::Heading { inlines, .. } | Self::Paragraph { inlines } | Self::Quote { inlines } => {
                Ok(inlines)
            }
            Self::List { items, .. } => {
                let len = items.len();
                item.and_then(|i| items.get_mut(i))
                    .ok_or(EditorError::ItemOutOfRange { item, len })
            }
            _ => Err(EditorError::NotTextual { kind }),
        }
    }

    pub(crate) fn inlines(&self, item: Option<usize>) -> Result<&[Inline], EditorError> {
        match self {
            Self::Heading { inlines, .. } | Self::Paragraph { inlines } | Self::Quote { inlines } => {
                Ok(inlines)
            }
            Self::List { items, .. } => item
                .and_then(|i| items.get(i))
                .map(Vec::as_slice)
                .ok_or(EditorError::ItemOutOfRange {
                    item,
                    len: items.len(),
                }),
            _ => Err(EditorError::NotTextual { kind: self.kind() }),
        }
    }
}

/// An ordered sequence of blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    blocks: Vec<Block>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    /// Parses stored note markup.
    ///
    /// Never fails: elements the editor does not model become [`Block::Raw`],
    /// and markup that cannot be parsed at all is kept as a single raw block.
    pub fn parse(markup: &str) -> Self {
        Self {
            blocks: markup::parse_blocks(markup),
        }
    }

    /// Serializes the document to the markup stored in `notes.content`.
    pub fn to_html(&self) -> String {
        markup::render_blocks(&self.blocks)
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn block(&self, index: usize) -> Result<&Block, EditorError> {
        self.blocks.get(index).ok_or(EditorError::BlockOutOfRange {
            index,
            len: self.blocks.len(),
        })
    }

    pub(crate) fn block_mut(&mut self, index: usize) -> Result<&mut Block, EditorError> {
        let len = self.blocks.len();
        self.blocks
            .get_mut(index)
            .ok_or(EditorError::BlockOutOfRange { index, len })
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Inserts a block after the caret block, or appends when there is no
    /// caret or the caret is past the end. Returns the new block's index.
    pub fn insert(&mut self, caret: Option<usize>, block: Block) -> usize {
        let index = match caret {
            Some(caret) if caret < self.blocks.len() => caret + 1,
            _ => self.blocks.len(),
        };
        self.blocks.insert(index, block);
        index
    }

    /// Removes and returns the block at `index`.
    pub fn remove(&mut self, index: usize) -> Result<Block, EditorError> {
        self.block(index)?;
        Ok(self.blocks.remove(index))
    }

    /// Dispatches an interactive control against the block at `index`.
    pub fn apply(&mut self, index: usize, action: EditorAction) -> Result<(), EditorError> {
        action.apply(self, index)
    }

    /// Text covered by a selection.
    pub fn selected_text(&self, selection: &Selection) -> Result<String, EditorError> {
        selection.text_in(self)
    }

    /// Wraps the selected range in a highlight and returns the text that was
    /// marked.
    pub fn highlight(&mut self, selection: &Selection) -> Result<String, EditorError> {
        selection.highlight_in(self)
    }

    /// Plain text of the whole document, one block per paragraph.
    pub fn plain_text(&self) -> String {
        self.blocks
            .iter()
            .map(Block::plain_text)
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_merges_and_drops_empty() {
        let merged = normalize(vec![
            Inline::text("a"),
            Inline::text(""),
            Inline::text("b"),
            Inline::highlight("c"),
            Inline::highlight("d"),
        ]);
        assert_eq!(merged, vec![Inline::text("ab"), Inline::highlight("cd")]);
    }

    #[test]
    fn links_with_different_targets_stay_apart() {
        let merged = normalize(vec![
            Inline::Link {
                href: "a".into(),
                text: "x".into(),
            },
            Inline::Link {
                href: "b".into(),
                text: "y".into(),
            },
        ]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn insert_after_caret_or_append() {
        let mut doc = Document::from_blocks(vec![Block::paragraph("a"), Block::paragraph("b")]);

        assert_eq!(doc.insert(Some(0), Block::paragraph("x")), 1);
        assert_eq!(doc.insert(None, Block::paragraph("end")), 3);
        assert_eq!(doc.insert(Some(42), Block::paragraph("far")), 4);

        let texts: Vec<String> = doc.blocks().iter().map(Block::plain_text).collect();
        assert_eq!(texts, vec!["a", "x", "b", "end", "far"]);
    }

    #[test]
    fn remove_out_of_range_is_error() {
        let mut doc = Document::new();
        assert_eq!(
            doc.remove(0),
            Err(EditorError::BlockOutOfRange { index: 0, len: 0 })
        );
    }

    #[test]
    fn heading_rejects_level_four() {
        assert_eq!(
            Block::heading(4, "x"),
            Err(EditorError::InvalidHeadingLevel(4))
        );
        assert!(Block::heading(2, "x").is_ok());
    }

    #[test]
    fn block_json_is_tagged() {
        let json = serde_json::to_value(Block::Pdf {
            name: "a.pdf".into(),
            size_bytes: 10,
        })
        .unwrap();
        assert_eq!(json["type"], "pdf");
        assert_eq!(json["sizeBytes"], 10);

        let block: Block = serde_json::from_str(r#"{"type":"paragraph"}"#).unwrap();
        assert_eq!(block, Block::Paragraph { inlines: vec![] });
    }

    #[test]
    fn plain_text_skips_media() {
        let doc = Document::from_blocks(vec![
            Block::paragraph("one"),
            Block::image("data:x"),
            Block::List {
                ordered: false,
                items: vec![vec![Inline::text("a")], vec![Inline::text("b")]],
            },
        ]);
        assert_eq!(doc.plain_text(), "one\n\na\nb");
    }
}
