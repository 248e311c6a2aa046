use anyhow::Result;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph};
use ratatui::{Frame, Terminal};
// Use Popup from tui-widgets to render the help modal
use tui_widgets::popup::Popup;

use super::app::{App, Focus};

const FORM_HELP: &str = "Tab: next field  Enter: apply  F2: apply  F5: reset  F1: help";
const SELECT_FIELD_HELP: &str = "Tab: next field  Enter: choose option  F2: apply  F1: help";
const CHIPS_HELP: &str = "Left/Right: select  x/Del: remove  F2: apply  F1: help";
const SELECT_MODAL_HELP: &str = "j/k: nav  Enter: choose  q/Esc: close";
const HELP_MODAL_FOOTER: &str = "j/k: scroll  Esc/q: close";

pub fn render<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    terminal.draw(|frame| draw_frame(frame, app))?;
    Ok(())
}

fn draw_frame(frame: &mut Frame<'_>, app: &mut App) {
    let size = frame.area();
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(4),
            Constraint::Length(1),
        ])
        .split(size);

    draw_header(frame, layout[0]);
    draw_form(frame, layout[1], app);
    draw_chips(frame, layout[2], app);
    draw_footer(frame, layout[3], app);
    draw_select_modal(frame, size, app);
    draw_help_modal(frame, size, app);
}

fn header_text_style() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn selection_style() -> Style {
    Style::default().add_modifier(Modifier::REVERSED)
}

fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

fn placeholder_style() -> Style {
    Style::default().fg(Color::DarkGray)
}

fn draw_header(frame: &mut Frame<'_>, area: Rect) {
    let buttons = " F1: HELP  F2: APPLY  F5: RESET ";
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(buttons.len() as u16),
        ])
        .split(area);

    frame.render_widget(
        Paragraph::new(Span::styled("QTILES", header_text_style())),
        chunks[0],
    );
    frame.render_widget(Paragraph::new(buttons), chunks[1]);
}

fn draw_form(frame: &mut Frame<'_>, area: Rect, app: &mut App) {
    // Two columns, five controls each, mirroring the form's two sections
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let per_column = app.fields.len().div_ceil(2);
    for (column_index, column) in columns.iter().enumerate() {
        let start = column_index * per_column;
        let end = (start + per_column).min(app.fields.len());
        let constraints: Vec<Constraint> =
            (start..end).map(|_| Constraint::Length(3)).collect();
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(*column);

        for (row, field_index) in (start..end).enumerate() {
            draw_field(frame, rows[row], app, field_index);
        }
    }
}

fn draw_field(frame: &mut Frame<'_>, area: Rect, app: &App, field_index: usize) {
    let field = &app.fields[field_index];
    let focused = app.focus == Focus::Field(field_index);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(focused))
        .title(field.id.label());
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let value = field.display_value();
    let line = if value.is_empty() && !field.is_select() {
        Line::from(Span::styled(field.id.placeholder(), placeholder_style()))
    } else if field.is_select() {
        Line::from(vec![
            Span::raw(value),
            Span::styled(" \u{25be}", placeholder_style()),
        ])
    } else {
        Line::from(Span::raw(value))
    };
    frame.render_widget(Paragraph::new(line), inner);

    if focused {
        if let Some(cursor) = field.visual_cursor() {
            let x = inner.x + (cursor as u16).min(inner.width.saturating_sub(1));
            frame.set_cursor_position((x, inner.y));
        }
    }
}

fn draw_chips(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let focused = app.focus == Focus::Chips;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(focused))
        .title("TILES");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if app.tiles.is_empty() {
        frame.render_widget(
            Paragraph::new(Span::styled("No parameters applied", placeholder_style())),
            inner,
        );
        return;
    }

    let mut spans: Vec<Span> = Vec::new();
    for (index, tile) in app.tiles.iter().enumerate() {
        if index > 0 {
            spans.push(Span::raw(" "));
        }
        let text = format!("[x {}]", tile.label);
        if focused && index == app.chip_index {
            spans.push(Span::styled(text, selection_style()));
        } else {
            spans.push(Span::raw(text));
        }
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), inner);
}

fn draw_footer(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let text = if let Some(status) = &app.status {
        status.clone()
    } else if app.select_modal.is_some() {
        SELECT_MODAL_HELP.to_string()
    } else {
        match app.focus {
            // Show the selected chip's fragment, the tooltip analog
            Focus::Chips => match app.tiles.get(app.chip_index) {
                Some(tile) => format!("{}  {}", CHIPS_HELP, tile.value),
                None => CHIPS_HELP.to_string(),
            },
            Focus::Field(_) => {
                if app.focused_field().is_some_and(|f| f.is_select()) {
                    SELECT_FIELD_HELP.to_string()
                } else {
                    FORM_HELP.to_string()
                }
            }
        }
    };
    frame.render_widget(Paragraph::new(text), area);
}

fn draw_select_modal(frame: &mut Frame<'_>, area: Rect, app: &mut App) {
    let Some(modal) = app.select_modal.as_ref() else {
        return;
    };
    let Some(field) = app.fields.get(modal.field_index) else {
        return;
    };
    let Some(spec) = field.id.select_spec() else {
        return;
    };

    let width = (area.width.saturating_mul(2) / 3).clamp(area.width.min(24), area.width);
    let height = (spec.options.len() as u16 + 2).min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    let modal_area = Rect::new(x, y, width, height);

    frame.render_widget(Clear, modal_area);

    let items: Vec<ListItem> = spec
        .options
        .iter()
        .map(|opt| ListItem::new(opt.label))
        .collect();
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style(true))
                .title(field.id.label()),
        )
        .highlight_style(selection_style());

    let mut state = ListState::default();
    state.select(Some(modal.selected));
    frame.render_stateful_widget(list, modal_area, &mut state);
}

fn draw_help_modal(frame: &mut Frame<'_>, area: Rect, app: &mut App) {
    let Some(modal) = app.help_modal.as_ref() else {
        return;
    };

    let key_width = 16;
    let mut lines: Vec<Line> = app
        .help_entries()
        .iter()
        .map(|entry| {
            Line::from(vec![
                Span::styled(
                    format!("{:<key_width$}", entry.keys),
                    header_text_style(),
                ),
                Span::raw(entry.action),
            ])
        })
        .collect();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        HELP_MODAL_FOOTER,
        placeholder_style(),
    )));

    let visible: Vec<Line> = lines.into_iter().skip(modal.scroll).collect();
    let body_text = Text::from(visible);

    let title_line = Line::from(Span::styled("HELP", header_text_style()));
    let popup = Popup::new(body_text)
        .title(title_line)
        .border_style(border_style(true));

    frame.render_stateful_widget_ref(popup, area, &mut app.modal_popup);
}
