//! Conversion between [`Block`] trees and the markup stored in notes.
//!
//! Rendering emits well-formed fragments with `data-block` attributes on
//! interactive containers. Parsing accepts that output back along with the
//! looser markup browsers produce (unclosed void elements such as `<br>` and
//! HTML named entities such as `&nbsp;`), keeps unknown top-level elements as
//! [`Block::Raw`] and falls back to a single raw block when the input cannot
//! be read.

use std::fmt::Write as _;

use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::events::attributes::AttrError;
use quick_xml::events::{BytesStart, BytesText, Event};
use thiserror::Error;

use super::document::normalize;
use super::{Block, Inline};

#[derive(Debug, Error)]
enum MarkupError {
    #[error(transparent)]
    Xml(#[from] quick_xml::Error),
    #[error(transparent)]
    Attr(#[from] AttrError),
    #[error("unexpected end of markup")]
    Unbalanced,
    #[error("unsupported element <{0}>")]
    Unsupported(String),
}

type Parse<T> = Result<T, MarkupError>;

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

pub(crate) fn render_blocks(blocks: &[Block]) -> String {
    let mut out = String::new();
    for block in blocks {
        render_block(&mut out, block);
    }
    out
}

fn render_block(out: &mut String, block: &Block) {
    match block {
        Block::Heading { level, inlines } => {
            let _ = write!(out, "<h{level}>");
            render_inlines(out, inlines);
            let _ = write!(out, "</h{level}>");
        }
        Block::Paragraph { inlines } => {
            out.push_str("<p>");
            if inlines.is_empty() {
                out.push_str("<br/>");
            } else {
                render_inlines(out, inlines);
            }
            out.push_str("</p>");
        }
        Block::List { ordered, items } => {
            let tag = if *ordered { "ol" } else { "ul" };
            let _ = write!(out, "<{tag}>");
            for item in items {
                out.push_str("<li>");
                render_inlines(out, item);
                out.push_str("</li>");
            }
            let _ = write!(out, "</{tag}>");
        }
        Block::Quote { inlines } => {
            out.push_str(r#"<blockquote data-block="quote">"#);
            render_inlines(out, inlines);
            out.push_str("</blockquote>");
        }
        Block::Code {
            title,
            language,
            code,
        } => {
            out.push_str(r#"<div class="code-block" data-block="code">"#);
            if let Some(title) = title {
                let _ = write!(out, "<h4>{}</h4>", escape(title.as_str()));
            }
            if let Some(language) = language {
                let _ = write!(
                    out,
                    r#"<div class="code-language">{}</div>"#,
                    escape(language.as_str())
                );
            }
            let _ = write!(out, "<pre><code>{}</code></pre></div>", escape(code.as_str()));
        }
        Block::Image {
            src,
            width,
            rotation,
        } => {
            out.push_str(r#"<div class="image-container" data-block="image""#);
            if let Some(width) = width {
                let _ = write!(out, r#" data-width="{width}""#);
            }
            if *rotation != 0 {
                let _ = write!(out, r#" data-rotation="{rotation}""#);
            }
            let _ = write!(out, r#"><img src="{}" alt="Inserted image""#, escape(src.as_str()));
            let mut style = String::new();
            if let Some(width) = width {
                let _ = write!(style, "width: {width}px;");
            }
            if *rotation != 0 {
                if !style.is_empty() {
                    style.push(' ');
                }
                let _ = write!(style, "transform: rotate({rotation}deg);");
            }
            if !style.is_empty() {
                let _ = write!(out, r#" style="{style}""#);
            }
            out.push_str("/></div>");
        }
        Block::Drawing { src, width } => {
            out.push_str(r#"<div class="drawing-container" data-block="drawing""#);
            if let Some(width) = width {
                let _ = write!(out, r#" data-width="{width}""#);
            }
            let _ = write!(out, r#"><img src="{}" alt="Drawing""#, escape(src.as_str()));
            if let Some(width) = width {
                let _ = write!(out, r#" style="width: {width}px;""#);
            }
            out.push_str("/></div>");
        }
        Block::Pdf { name, size_bytes } => {
            let name = escape(name.as_str());
            let _ = write!(
                out,
                r#"<div class="pdf-container" data-block="pdf" data-name="{name}" data-size="{size_bytes}"><span>{name}</span><p>PDF attachment - {} KB</p></div>"#,
                kilobytes(*size_bytes)
            );
        }
        Block::Raw { html } => out.push_str(html),
    }
}

fn kilobytes(bytes: u64) -> u64 {
    (bytes + 512) / 1024
}

fn render_inlines(out: &mut String, inlines: &[Inline]) {
    for inline in inlines {
        let (open, close) = match inline {
            Inline::Text { .. } => (String::new(), ""),
            Inline::Bold { .. } => ("<strong>".to_string(), "</strong>"),
            Inline::Italic { .. } => ("<em>".to_string(), "</em>"),
            Inline::Underline { .. } => ("<u>".to_string(), "</u>"),
            Inline::Link { href, .. } => (format!(r#"<a href="{}">"#, escape(href.as_str())), "</a>"),
            Inline::Highlight { .. } => (r#"<mark class="important">"#.to_string(), "</mark>"),
        };
        out.push_str(&open);
        render_text(out, inline.as_str());
        out.push_str(close);
    }
}

fn render_text(out: &mut String, text: &str) {
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push_str("<br/>");
        }
        out.push_str(&escape(line));
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

pub(crate) fn parse_blocks(markup: &str) -> Vec<Block> {
    if markup.trim().is_empty() {
        return Vec::new();
    }
    match try_parse(markup) {
        Ok(blocks) => blocks,
        Err(err) => {
            tracing::debug!(error = %err, "note markup kept as a raw block");
            vec![Block::Raw {
                html: markup.to_string(),
            }]
        }
    }
}

fn try_parse(markup: &str) -> Parse<Vec<Block>> {
    let mut reader = Reader::from_str(markup);
    // Void elements never get an end tag, so `</p>` may close past a `<br>`.
    reader.config_mut().check_end_names = false;
    let mut blocks = Vec::new();
    // Inline content found between blocks, gathered into a paragraph.
    let mut loose: Vec<Inline> = Vec::new();

    loop {
        let before = reader.buffer_position() as usize;
        match reader.read_event()? {
            Event::Start(e) if !is_void(&element_name(&e)) => {
                let name = element_name(&e);
                if let Some(mark) = Mark::from_inline_start(&name, &e)? {
                    loose.extend(read_inlines(&mut reader, Some(mark))?);
                    continue;
                }
                flush_paragraph(&mut loose, &mut blocks);
                let block = match name.as_str() {
                    "h1" | "h2" | "h3" => Block::Heading {
                        level: name.as_bytes()[1] - b'0',
                        inlines: read_inlines(&mut reader, None)?,
                    },
                    "p" => {
                        let inlines = read_inlines(&mut reader, None)?;
                        // `<p><br/></p>` is the editor's empty line.
                        let blank = inlines.iter().all(|i| i.as_str().chars().all(|c| c == '\n'));
                        Block::Paragraph {
                            inlines: if blank { Vec::new() } else { inlines },
                        }
                    }
                    "ul" | "ol" => Block::List {
                        ordered: name == "ol",
                        items: read_list(&mut reader)?,
                    },
                    "blockquote" => Block::Quote {
                        inlines: read_inlines(&mut reader, None)?,
                    },
                    "div" => match attribute(&e, "data-block")?.as_deref() {
                        Some("code") => read_code(&mut reader)?,
                        Some("image") => {
                            let width = numeric_attribute(&e, "data-width")?;
                            let rotation = numeric_attribute(&e, "data-rotation")?.unwrap_or(0);
                            Block::Image {
                                src: read_image_src(&mut reader)?,
                                width,
                                rotation: rotation % 360,
                            }
                        }
                        Some("drawing") => {
                            let width = numeric_attribute(&e, "data-width")?;
                            Block::Drawing {
                                src: read_image_src(&mut reader)?,
                                width,
                            }
                        }
                        Some("pdf") => {
                            let name = attribute(&e, "data-name")?.unwrap_or_default();
                            let size_bytes = numeric_attribute(&e, "data-size")?.unwrap_or(0);
                            reader.read_to_end(e.name())?;
                            Block::Pdf { name, size_bytes }
                        }
                        _ => raw_element(&mut reader, &e, markup, before)?,
                    },
                    _ => raw_element(&mut reader, &e, markup, before)?,
                };
                blocks.push(block);
            }
            Event::Start(e) | Event::Empty(e) => {
                let name = element_name(&e);
                match name.as_str() {
                    "br" => loose.push(Inline::text("\n")),
                    "img" => {
                        flush_paragraph(&mut loose, &mut blocks);
                        let src = attribute(&e, "src")?.unwrap_or_default();
                        blocks.push(Block::image(src));
                    }
                    _ => {
                        flush_paragraph(&mut loose, &mut blocks);
                        let after = reader.buffer_position() as usize;
                        blocks.push(Block::Raw {
                            html: markup[before..after].to_string(),
                        });
                    }
                }
            }
            Event::Text(t) => {
                let text = unescape_text(&t)?;
                if !text.trim().is_empty() || !loose.is_empty() {
                    loose.push(Inline::text(text));
                }
            }
            Event::CData(c) => loose.push(Inline::text(String::from_utf8_lossy(&c).into_owned())),
            Event::Comment(_) => {
                flush_paragraph(&mut loose, &mut blocks);
                let after = reader.buffer_position() as usize;
                blocks.push(Block::Raw {
                    html: markup[before..after].to_string(),
                });
            }
            Event::End(_) => return Err(MarkupError::Unbalanced),
            Event::Eof => break,
            _ => {}
        }
    }

    flush_paragraph(&mut loose, &mut blocks);
    Ok(blocks)
}

/// HTML elements that never take content or an end tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

/// Resolves the XML entities plus the HTML named entities rich-text editors
/// commonly emit.
fn resolve_entity(name: &str) -> Option<&'static str> {
    Some(match name {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" => "\u{a0}",
        "ensp" => "\u{2002}",
        "emsp" => "\u{2003}",
        "thinsp" => "\u{2009}",
        "shy" => "\u{ad}",
        "ndash" => "\u{2013}",
        "mdash" => "\u{2014}",
        "hellip" => "\u{2026}",
        "lsquo" => "\u{2018}",
        "rsquo" => "\u{2019}",
        "ldquo" => "\u{201c}",
        "rdquo" => "\u{201d}",
        "laquo" => "\u{ab}",
        "raquo" => "\u{bb}",
        "bull" => "\u{2022}",
        "middot" => "\u{b7}",
        "copy" => "\u{a9}",
        "reg" => "\u{ae}",
        "trade" => "\u{2122}",
        "deg" => "\u{b0}",
        "plusmn" => "\u{b1}",
        "times" => "\u{d7}",
        "divide" => "\u{f7}",
        "minus" => "\u{2212}",
        "le" => "\u{2264}",
        "ge" => "\u{2265}",
        "ne" => "\u{2260}",
        "asymp" => "\u{2248}",
        "infin" => "\u{221e}",
        "sum" => "\u{2211}",
        "radic" => "\u{221a}",
        "pi" => "\u{3c0}",
        "larr" => "\u{2190}",
        "rarr" => "\u{2192}",
        "harr" => "\u{2194}",
        "euro" => "\u{20ac}",
        "pound" => "\u{a3}",
        "sect" => "\u{a7}",
        "para" => "\u{b6}",
        _ => return None,
    })
}

fn unescape_text(text: &BytesText<'_>) -> Parse<String> {
    Ok(text.unescape_with(resolve_entity)?.into_owned())
}

fn flush_paragraph(loose: &mut Vec<Inline>, blocks: &mut Vec<Block>) {
    let inlines = normalize(std::mem::take(loose));
    if inlines.iter().any(|inline| !inline.as_str().trim().is_empty()) {
        blocks.push(Block::Paragraph { inlines });
    }
}

fn raw_element(
    reader: &mut Reader<&[u8]>,
    start: &BytesStart<'_>,
    markup: &str,
    before: usize,
) -> Parse<Block> {
    reader.read_to_end(start.name())?;
    let after = reader.buffer_position() as usize;
    Ok(Block::Raw {
        html: markup[before..after].to_string(),
    })
}

fn element_name(e: &BytesStart<'_>) -> String {
    lowercase(e.local_name().as_ref())
}

fn lowercase(name: &[u8]) -> String {
    String::from_utf8_lossy(name).to_ascii_lowercase()
}

fn attribute(e: &BytesStart<'_>, key: &str) -> Parse<Option<String>> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.as_ref().eq_ignore_ascii_case(key.as_bytes()) {
            return Ok(Some(attr.unescape_value_with(resolve_entity)?.into_owned()));
        }
    }
    Ok(None)
}

fn numeric_attribute<T: std::str::FromStr>(e: &BytesStart<'_>, key: &str) -> Parse<Option<T>> {
    Ok(attribute(e, key)?.and_then(|value| value.trim().parse().ok()))
}

/// Inline formatting element currently open.
#[derive(Debug, Clone)]
enum Mark {
    Bold,
    Italic,
    Underline,
    Link(String),
    Highlight,
    /// Element that carries no formatting of its own (`span`).
    Plain,
}

impl Mark {
    fn from_inline_start(name: &str, e: &BytesStart<'_>) -> Parse<Option<Self>> {
        Ok(Some(match name {
            "strong" | "b" => Self::Bold,
            "em" | "i" => Self::Italic,
            "u" => Self::Underline,
            "a" => Self::Link(attribute(e, "href")?.unwrap_or_default()),
            "mark" => Self::Highlight,
            "span" => Self::Plain,
            _ => return Ok(None),
        }))
    }

    fn wrap(&self, text: String) -> Inline {
        match self {
            Self::Bold => Inline::Bold { text },
            Self::Italic => Inline::Italic { text },
            Self::Underline => Inline::Underline { text },
            Self::Link(href) => Inline::Link {
                href: href.clone(),
                text,
            },
            Self::Highlight => Inline::Highlight { text },
            Self::Plain => Inline::Text { text },
        }
    }
}

/// Reads inline content up to the end tag of the element already opened.
///
/// The innermost formatting mark wins; `base` applies when no inner mark is
/// open.
fn read_inlines(reader: &mut Reader<&[u8]>, base: Option<Mark>) -> Parse<Vec<Inline>> {
    let mut inlines = Vec::new();
    let mut open: Vec<Mark> = Vec::new();

    let current = |open: &[Mark]| -> Option<Mark> {
        open.iter()
            .rev()
            .find(|mark| !matches!(mark, Mark::Plain))
            .cloned()
            .or_else(|| base.clone())
    };

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if is_void(&element_name(&e)) => {
                if element_name(&e) == "br" {
                    inlines.push(styled(current(&open), "\n".to_string()));
                }
            }
            Event::Start(e) => {
                let name = element_name(&e);
                match Mark::from_inline_start(&name, &e)? {
                    Some(mark) => open.push(mark),
                    None => return Err(MarkupError::Unsupported(name)),
                }
            }
            Event::End(_) => {
                if open.pop().is_none() {
                    return Ok(normalize(inlines));
                }
            }
            Event::Text(t) => {
                let text = unescape_text(&t)?;
                inlines.push(styled(current(&open), text));
            }
            Event::CData(c) => {
                let text = String::from_utf8_lossy(&c).into_owned();
                inlines.push(styled(current(&open), text));
            }
            Event::Eof => return Err(MarkupError::Unbalanced),
            _ => {}
        }
    }
}

fn styled(mark: Option<Mark>, text: String) -> Inline {
    match mark {
        Some(mark) => mark.wrap(text),
        None => Inline::Text { text },
    }
}

fn read_list(reader: &mut Reader<&[u8]>) -> Parse<Vec<Vec<Inline>>> {
    let mut items = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = element_name(&e);
                if is_void(&name) {
                    continue;
                }
                if name != "li" {
                    return Err(MarkupError::Unsupported(name));
                }
                items.push(read_inlines(reader, None)?);
            }
            Event::End(_) => return Ok(items),
            Event::Eof => return Err(MarkupError::Unbalanced),
            _ => {}
        }
    }
}

/// Reads a code block container: optional `h4` title, optional language
/// label, then `pre > code`.
fn read_code(reader: &mut Reader<&[u8]>) -> Parse<Block> {
    let mut title = None;
    let mut language = None;
    let mut code = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => match element_name(&e).as_str() {
                "h4" => title = Some(read_text(reader)?),
                "div" => language = Some(read_text(reader)?),
                "pre" => {}
                "code" => code = read_text(reader)?,
                name if is_void(name) => {}
                _ => {
                    reader.read_to_end(e.name())?;
                }
            },
            Event::End(e) => {
                if lowercase(e.local_name().as_ref()) == "div" {
                    return Ok(Block::Code {
                        title,
                        language,
                        code,
                    });
                }
            }
            Event::Eof => return Err(MarkupError::Unbalanced),
            _ => {}
        }
    }
}

/// Collects all text up to the end of the current element.
fn read_text(reader: &mut Reader<&[u8]>) -> Parse<String> {
    let mut depth = 0usize;
    let mut out = String::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if element_name(&e) == "br" => out.push('\n'),
            Event::Start(e) if !is_void(&element_name(&e)) => depth += 1,
            Event::End(_) => {
                if depth == 0 {
                    return Ok(out);
                }
                depth -= 1;
            }
            Event::Text(t) => out.push_str(&unescape_text(&t)?),
            Event::CData(c) => out.push_str(&String::from_utf8_lossy(&c)),
            Event::Eof => return Err(MarkupError::Unbalanced),
            _ => {}
        }
    }
}

/// Finds the `src` of the first `img` inside a media container and consumes
/// the container.
fn read_image_src(reader: &mut Reader<&[u8]>) -> Parse<String> {
    let mut src = String::new();
    let mut depth = 0usize;
    loop {
        match reader.read_event()? {
            Event::Empty(e) => {
                if src.is_empty() && element_name(&e) == "img" {
                    src = attribute(&e, "src")?.unwrap_or_default();
                }
            }
            Event::Start(e) => {
                let name = element_name(&e);
                if src.is_empty() && name == "img" {
                    src = attribute(&e, "src")?.unwrap_or_default();
                }
                if !is_void(&name) {
                    depth += 1;
                }
            }
            Event::End(_) => {
                if depth == 0 {
                    return Ok(src);
                }
                depth -= 1;
            }
            Event::Eof => return Err(MarkupError::Unbalanced),
            _ => {}
        }
    }
}
