use serde::{Deserialize, Serialize};

use super::{Block, Document, EditorError};

/// Widest image or drawing the resize control accepts.
pub const MAX_WIDTH: u32 = 4096;

/// A control attached to a rendered block.
///
/// Serialized as `{"action": "resize", "width": 320}` so the value can be
/// flattened into a request body next to the block index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum EditorAction {
    /// Remove a code, image, drawing, pdf or quote block.
    Delete,
    /// Turn a quote back into a paragraph.
    Unwrap,
    /// Set the display width of an image or drawing.
    Resize { width: u32 },
    /// Rotate an image clockwise by 90 degrees.
    Rotate,
}

impl EditorAction {
    pub fn name(self) -> &'static str {
        match self {
            Self::Delete => "delete",
            Self::Unwrap => "unwrap",
            Self::Resize { .. } => "resize",
            Self::Rotate => "rotate",
        }
    }

    pub(crate) fn apply(self, doc: &mut Document, index: usize) -> Result<(), EditorError> {
        let unsupported = |kind: &'static str| EditorError::UnsupportedAction {
            action: self.name(),
            kind,
        };

        match self {
            Self::Delete => {
                let block = doc.block(index)?;
                if !matches!(
                    block,
                    Block::Code { .. }
                        | Block::Image { .. }
                        | Block::Drawing { .. }
                        | Block::Pdf { .. }
                        | Block::Quote { .. }
                ) {
                    return Err(unsupported(block.kind()));
                }
                doc.remove(index)?;
                Ok(())
            }
            Self::Unwrap => {
                let block = doc.block_mut(index)?;
                match block {
                    Block::Quote { inlines } => {
                        let inlines = std::mem::take(inlines);
                        *block = Block::Paragraph { inlines };
                        Ok(())
                    }
                    other => Err(unsupported(other.kind())),
                }
            }
            Self::Resize { width } => {
                if width == 0 || width > MAX_WIDTH {
                    return Err(EditorError::InvalidWidth {
                        width,
                        max: MAX_WIDTH,
                    });
                }
                match doc.block_mut(index)? {
                    Block::Image { width: current, .. } | Block::Drawing { width: current, .. } => {
                        *current = Some(width);
                        Ok(())
                    }
                    other => Err(unsupported(other.kind())),
                }
            }
            Self::Rotate => match doc.block_mut(index)? {
                Block::Image { rotation, .. } => {
                    *rotation = (*rotation + 90) % 360;
                    Ok(())
                }
                other => Err(unsupported(other.kind())),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::Inline;

    fn doc() -> Document {
        Document::from_blocks(vec![
            Block::paragraph("intro"),
            Block::image("data:image/png;base64,AAA"),
            Block::quote("wise words"),
            Block::Code {
                title: None,
                language: Some("rust".into()),
                code: "fn main() {}".into(),
            },
        ])
    }

    #[test]
    fn rotate_four_times_returns_to_zero() {
        let mut doc = doc();
        let mut seen = Vec::new();
        for _ in 0..4 {
            doc.apply(1, EditorAction::Rotate).unwrap();
            if let Block::Image { rotation, .. } = doc.block(1).unwrap() {
                seen.push(*rotation);
            }
        }
        assert_eq!(seen, vec![90, 180, 270, 0]);
    }

    #[test]
    fn resize_sets_width() {
        let mut doc = doc();
        doc.apply(1, EditorAction::Resize { width: 320 }).unwrap();
        assert!(matches!(
            doc.block(1).unwrap(),
            Block::Image {
                width: Some(320),
                ..
            }
        ));
    }

    #[test]
    fn resize_rejects_zero_width() {
        let mut doc = doc();
        assert_eq!(
            doc.apply(1, EditorAction::Resize { width: 0 }),
            Err(EditorError::InvalidWidth {
                width: 0,
                max: MAX_WIDTH
            })
        );
    }

    #[test]
    fn unwrap_quote_keeps_text() {
        let mut doc = doc();
        doc.apply(2, EditorAction::Unwrap).unwrap();
        assert_eq!(
            doc.block(2).unwrap(),
            &Block::Paragraph {
                inlines: vec![Inline::text("wise words")]
            }
        );
    }

    #[test]
    fn delete_removes_code_block() {
        let mut doc = doc();
        doc.apply(3, EditorAction::Delete).unwrap();
        assert_eq!(doc.len(), 3);
    }

    #[test]
    fn delete_paragraph_is_unsupported() {
        let mut doc = doc();
        assert_eq!(
            doc.apply(0, EditorAction::Delete),
            Err(EditorError::UnsupportedAction {
                action: "delete",
                kind: "paragraph"
            })
        );
        assert_eq!(doc.len(), 4);
    }

    #[test]
    fn rotate_on_quote_is_unsupported() {
        let mut doc = doc();
        assert!(matches!(
            doc.apply(2, EditorAction::Rotate),
            Err(EditorError::UnsupportedAction { .. })
        ));
    }

    #[test]
    fn action_json_shape() {
        let action: EditorAction = serde_json::from_str(r#"{"action":"resize","width":200}"#).unwrap();
        assert_eq!(action, EditorAction::Resize { width: 200 });
        let action: EditorAction = serde_json::from_str(r#"{"action":"rotate"}"#).unwrap();
        assert_eq!(action, EditorAction::Rotate);
    }
}
