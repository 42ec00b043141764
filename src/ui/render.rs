use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::core::{Column, GridRow, SortOrder};
use crate::ui::app::{App, InputMode};

const COLUMN_WIDTHS: [Constraint; 6] = [
    Constraint::Length(68),
    Constraint::Length(12),
    Constraint::Length(44),
    Constraint::Length(44),
    Constraint::Length(8),
    Constraint::Length(8),
];

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),  // title
            Constraint::Length(3),  // block number input
            Constraint::Length(1),  // selected block + status
            Constraint::Length(3),  // search panel
            Constraint::Min(6),     // grid
            Constraint::Length(1),  // pager
            Constraint::Length(14), // details
            Constraint::Length(1),  // help
        ])
        .split(f.area());

    let title = Paragraph::new(Line::from(Span::styled(
        "Block Explorer",
        Style::default().add_modifier(Modifier::BOLD),
    )))
    .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    block_input(f, chunks[1], app);
    status(f, chunks[2], app);
    search_panel(f, chunks[3], app);
    grid(f, chunks[4], app);
    pager(f, chunks[5], app);

    let details = Paragraph::new(app.detail_text())
        .block(Block::default().borders(Borders::ALL).title(" Transaction Details "));
    f.render_widget(details, chunks[6]);

    let help = Paragraph::new(
        "b block  / search  c case  s sort  o order  g group  enter expand  +/- page size  r refresh  q quit",
    )
    .style(Style::default().fg(Color::DarkGray));
    f.render_widget(help, chunks[7]);
}

fn edit_box<'a>(text: &'a str, placeholder: &'a str, title: &'a str, focused: bool) -> Paragraph<'a> {
    let border = if focused { Color::Cyan } else { Color::Gray };
    let content = if text.is_empty() && !focused {
        Span::styled(placeholder, Style::default().fg(Color::DarkGray))
    } else {
        Span::raw(text)
    };
    Paragraph::new(Line::from(content)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title(title),
    )
}

fn block_input(f: &mut Frame, area: Rect, app: &App) {
    let focused = app.mode() == InputMode::BlockNumber;
    let text = if focused { app.input() } else { "" };
    f.render_widget(
        edit_box(text, "Enter blocknumber here...", " Block ", focused),
        area,
    );
}

fn search_panel(f: &mut Frame, area: Rect, app: &App) {
    let focused = app.mode() == InputMode::Search;
    let text = if focused { app.input() } else { app.grid().search() };
    let title = if app.grid().case_sensitive() {
        " Search (Aa) "
    } else {
        " Search (aa) "
    };
    f.render_widget(edit_box(text, "Search...", title, focused), area);
}

fn status(f: &mut Frame, area: Rect, app: &App) {
    let selected = app
        .browser()
        .controller()
        .key()
        .map(|k| k.to_string())
        .unwrap_or_default();
    let line = Line::from(vec![
        Span::raw(format!("Selected Block Number: {selected}")),
        Span::raw("   "),
        Span::styled(app.status_line(), Style::default().fg(Color::Yellow)),
    ]);
    f.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
}

fn grid(f: &mut Frame, area: Rect, app: &App) {
    let records = app.records();
    let all_rows = app.rows();
    let (offset, visible) = app.grid().visible(&all_rows);
    let cursor_style = Style::default().add_modifier(Modifier::REVERSED);

    let rows = visible.iter().enumerate().map(|(i, row)| {
        let style = if offset + i == app.grid().cursor() {
            cursor_style
        } else {
            Style::default()
        };
        match row {
            GridRow::Record { index } => {
                let record = &records[*index];
                Row::new(Column::ALL.iter().map(|c| Cell::from(c.cell(record)))).style(style)
            }
            GridRow::Group {
                label,
                count,
                expanded,
            } => {
                let marker = if *expanded { "v" } else { ">" };
                let column = app.grid().group_by().map(Column::title).unwrap_or_default();
                let shown = if label.is_empty() { "(blank)" } else { label };
                Row::new(vec![Cell::from(format!("{marker} {column}: {shown} ({count})"))])
                    .style(style.add_modifier(Modifier::BOLD))
            }
        }
    });

    let header = Row::new(Column::ALL.iter().map(|c| {
        let mark = match app.grid().sort() {
            Some((col, SortOrder::Ascending)) if col == *c => " ^",
            Some((col, SortOrder::Descending)) if col == *c => " v",
            _ => "",
        };
        Cell::from(format!("{}{}", c.title(), mark))
    }))
    .style(Style::default().add_modifier(Modifier::BOLD));

    let title = match app.grid().group_by() {
        Some(col) => format!(" Transactions, grouped by {} ", col.title()),
        None => " Transactions ".to_string(),
    };
    let table = Table::new(rows, COLUMN_WIDTHS)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(table, area);
}

fn pager(f: &mut Frame, area: Rect, app: &App) {
    let row_count = app.rows().len();
    let grid = app.grid();
    let text = format!(
        "Page {} of {} ({} rows, {} per page)",
        grid.page() + 1,
        grid.page_count(row_count),
        row_count,
        grid.page_size()
    );
    f.render_widget(Paragraph::new(text).alignment(Alignment::Right), area);
}
