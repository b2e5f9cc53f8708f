//! UI rendering functions for the TUI.
//!
//! Layout: filter input on top, entry list and detail side by side, then a
//! status line and the shortcut bar.

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block as Panel, Borders, List, ListItem, ListState, Paragraph, Wrap},
};

use super::app::{App, Entry, Focus};
use crate::editor::{Block, Document, Inline};
use crate::utils::format_date;
use crate::views::View;

/// Main rendering function for the TUI.
pub fn draw(frame: &mut Frame, app: &App) {
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Filter input
            Constraint::Min(0),    // Content area
            Constraint::Length(1), // Status line
            Constraint::Length(1), // Shortcut bar
        ])
        .split(frame.area());

    let content_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(main_chunks[1]);

    render_filter_input(frame, app, main_chunks[0]);
    render_list(frame, app, content_chunks[0]);
    render_detail_view(frame, app, content_chunks[1]);
    render_status_line(frame, app, main_chunks[2]);
    render_shortcut_bar(frame, app, main_chunks[3]);
}

fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    }
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim() -> Style {
    Style::default().fg(Color::DarkGray)
}

fn render_filter_input(frame: &mut Frame, app: &App, area: Rect) {
    let is_focused = app.focus() == Focus::FilterInput;
    let panel = Panel::default()
        .borders(Borders::ALL)
        .title("Filter")
        .border_style(border_style(is_focused));

    let mut content = app.filter_input().to_string();
    if is_focused {
        content.push('█');
    }
    frame.render_widget(Paragraph::new(content).block(panel), area);
}

fn list_title(view: View) -> &'static str {
    match view {
        View::Dashboard => "Subjects",
        View::Subject(_) => "Notebooks",
        View::Notebook { .. } => "Notes",
    }
}

/// One list row: label plus a dimmed count or date.
pub(crate) fn entry_line(entry: &Entry) -> Line<'static> {
    let suffix = match entry {
        Entry::Subject(subject) => format!("[{} notebooks]", subject.notebook_count),
        Entry::Notebook(notebook) => format!("[{} notes]", notebook.note_count),
        Entry::Note(note) => match note.important_snippet_count {
            0 => format!("[{}]", format_date(note.updated_at)),
            n => format!("[{} | {n} ★]", format_date(note.updated_at)),
        },
    };
    Line::from(vec![
        Span::raw(entry.label().to_string()),
        Span::raw(" "),
        Span::styled(suffix, dim().add_modifier(Modifier::ITALIC)),
    ])
}

fn render_list(frame: &mut Frame, app: &App, area: Rect) {
    let panel = Panel::default()
        .borders(Borders::ALL)
        .title(list_title(app.view()))
        .border_style(border_style(app.focus() == Focus::List));

    let items: Vec<ListItem> = app
        .entries()
        .iter()
        .map(|entry| ListItem::new(entry_line(entry)))
        .collect();

    let list = List::new(items).block(panel).highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::REVERSED),
    );

    let mut list_state = ListState::default();
    list_state.select(app.selected_index());
    frame.render_stateful_widget(list, area, &mut list_state);
}

fn labelled(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{label}: "), bold()),
        Span::raw(value),
    ])
}

fn inline_span(inline: &Inline) -> Span<'static> {
    let style = match inline {
        Inline::Text { .. } => Style::default(),
        Inline::Bold { .. } => bold(),
        Inline::Italic { .. } => Style::default().add_modifier(Modifier::ITALIC),
        Inline::Underline { .. } => Style::default().add_modifier(Modifier::UNDERLINED),
        Inline::Link { .. } => Style::default()
            .fg(Color::Blue)
            .add_modifier(Modifier::UNDERLINED),
        Inline::Highlight { .. } => Style::default().fg(Color::Black).bg(Color::Yellow),
    };
    Span::styled(inline.as_str().to_string(), style)
}

/// Splits inline runs into lines at embedded newlines.
fn inline_lines(prefix: Vec<Span<'static>>, inlines: &[Inline], base: Style) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let mut current = prefix;
    for inline in inlines {
        let span = inline_span(inline);
        let style = base.patch(span.style);
        let mut parts = span.content.split('\n');
        if let Some(first) = parts.next() {
            current.push(Span::styled(first.to_string(), style));
        }
        for part in parts {
            lines.push(Line::from(std::mem::take(&mut current)));
            current.push(Span::styled(part.to_string(), style));
        }
    }
    lines.push(Line::from(current));
    lines
}

/// Renders a document as styled terminal text. Important snippets show on a
/// yellow background.
pub(crate) fn document_text(doc: &Document) -> Text<'static> {
    let mut text = Text::default();
    for (index, block) in doc.blocks().iter().enumerate() {
        if index > 0 {
            text.lines.push(Line::default());
        }
        match block {
            Block::Heading { level, inlines } => {
                let marker = Span::styled(format!("{} ", "#".repeat(usize::from(*level))), dim());
                let style = bold().fg(Color::Cyan);
                text.lines.extend(inline_lines(vec![marker], inlines, style));
            }
            Block::Paragraph { inlines } => {
                text.lines.extend(inline_lines(Vec::new(), inlines, Style::default()));
            }
            Block::Quote { inlines } => {
                let bar = Span::styled("│ ", dim());
                let style = Style::default().add_modifier(Modifier::ITALIC);
                text.lines.extend(inline_lines(vec![bar], inlines, style));
            }
            Block::List { ordered, items } => {
                for (i, item) in items.iter().enumerate() {
                    let bullet = if *ordered {
                        format!("{}. ", i + 1)
                    } else {
                        "• ".to_string()
                    };
                    text.lines
                        .extend(inline_lines(vec![Span::raw(bullet)], item, Style::default()));
                }
            }
            Block::Code {
                title,
                language,
                code,
            } => {
                let header = match (title, language) {
                    (Some(title), Some(language)) => format!("┌ {title} ({language})"),
                    (Some(title), None) => format!("┌ {title}"),
                    (None, Some(language)) => format!("┌ {language}"),
                    (None, None) => "┌ code".to_string(),
                };
                text.lines.push(Line::from(Span::styled(header, dim())));
                for line in code.lines() {
                    text.lines.push(Line::from(vec![
                        Span::styled("│ ", dim()),
                        Span::styled(line.to_string(), Style::default().fg(Color::Green)),
                    ]));
                }
            }
            Block::Image {
                width, rotation, ..
            } => {
                let mut label = "[image".to_string();
                if let Some(width) = width {
                    label.push_str(&format!(", {width}px"));
                }
                if *rotation != 0 {
                    label.push_str(&format!(", rotated {rotation}°"));
                }
                label.push(']');
                text.lines.push(Line::from(Span::styled(label, dim())));
            }
            Block::Drawing { .. } => {
                text.lines.push(Line::from(Span::styled("[drawing]", dim())));
            }
            Block::Pdf { name, size_bytes } => {
                text.lines.push(Line::from(Span::styled(
                    format!("[PDF] {name} ({} KB)", (size_bytes + 512) / 1024),
                    dim(),
                )));
            }
            Block::Raw { html } => {
                text.lines.push(Line::from(Span::styled(
                    html.clone(),
                    dim().add_modifier(Modifier::ITALIC),
                )));
            }
        }
    }
    text
}

fn detail_text(app: &App) -> Text<'static> {
    let Some(entry) = app.selected_entry() else {
        return Text::from("Nothing selected");
    };

    match entry {
        Entry::Subject(subject) => {
            let mut lines = vec![Line::from(Span::styled(
                format!("{} {}", subject.icon.as_deref().unwrap_or("📘"), subject.name),
                bold(),
            ))];
            if let Some(description) = &subject.description {
                lines.push(Line::from(description.clone()));
            }
            lines.push(Line::default());
            lines.push(labelled("Color", subject.color.clone()));
            lines.push(labelled("Notebooks", subject.notebook_count.to_string()));
            lines.push(labelled("Created", format_date(subject.created_at)));
            Text::from(lines)
        }
        Entry::Notebook(notebook) => {
            let mut lines = vec![Line::from(Span::styled(notebook.title.clone(), bold()))];
            if let Some(description) = &notebook.description {
                lines.push(Line::from(description.clone()));
            }
            lines.push(Line::default());
            lines.push(labelled("Theme", notebook.theme.to_string()));
            lines.push(labelled("Notes", notebook.note_count.to_string()));
            lines.push(labelled("Updated", format_date(notebook.updated_at)));
            Text::from(lines)
        }
        Entry::Note(note) => {
            let mut text = Text::from(vec![
                Line::from(Span::styled(note.title.clone(), bold())),
                Line::from(Span::styled(
                    format!(
                        "{} important · updated {}",
                        note.important_snippet_count,
                        format_date(note.updated_at)
                    ),
                    dim(),
                )),
                Line::default(),
            ]);
            let doc = Document::parse(&note.content);
            if doc.is_empty() {
                text.lines.push(Line::from(Span::styled("(empty note)", dim())));
            } else {
                text.lines.extend(document_text(&doc).lines);
            }
            text
        }
    }
}

fn render_detail_view(frame: &mut Frame, app: &App, area: Rect) {
    let panel = Panel::default()
        .borders(Borders::ALL)
        .title("Detail")
        .border_style(border_style(app.focus() == Focus::DetailView));

    let paragraph = Paragraph::new(detail_text(app))
        .block(panel)
        .wrap(Wrap { trim: false })
        .scroll((app.detail_scroll(), 0));
    frame.render_widget(paragraph, area);
}

fn render_status_line(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = Vec::new();
    if let Some(stats) = app.stats() {
        spans.push(Span::styled(
            format!(
                "🔥 {} day streak · {} notes · {} important",
                stats.current_streak, stats.total_notes, stats.total_important_snippets
            ),
            dim(),
        ));
    }
    if let Some(status) = app.status() {
        if !spans.is_empty() {
            spans.push(Span::styled(" | ", dim()));
        }
        spans.push(Span::styled(status.to_string(), Style::default().fg(Color::Yellow)));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Shortcut bar; keys highlighted in cyan, depending on focus.
fn render_shortcut_bar(frame: &mut Frame, app: &App, area: Rect) {
    let key_style = Style::default().fg(Color::Cyan);
    let sep_style = dim();

    let mut shortcuts = vec![("Tab", "next panel"), ("Esc", "back")];
    match app.focus() {
        Focus::List => {
            shortcuts.insert(0, ("q", "quit"));
            shortcuts.extend([("j/k", "navigate"), ("Enter", "open"), ("d", "delete")]);
        }
        Focus::DetailView => {
            shortcuts.insert(0, ("q", "quit"));
            shortcuts.push(("j/k", "scroll"));
        }
        Focus::FilterInput => shortcuts.push(("Enter", "done")),
    }

    let mut spans = Vec::new();
    for (i, (key, action)) in shortcuts.into_iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", sep_style));
        }
        spans.push(Span::styled(key, key_style));
        spans.push(Span::raw(format!(": {action}")));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
