use chrono::Utc;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Margin, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        Block, Borders, Cell, Clear, Paragraph, Row, Scrollbar, ScrollbarOrientation, Table, Wrap,
    },
};

use super::app::App;
use super::models::InputMode;
use super::utils::{centered_line_rect, centered_rect};
use crate::format::{format_elapsed, rating_label, status_label, updated_label};
use crate::tracker::NotificationKind;

pub fn ui(f: &mut Frame, app: &mut App) {
    let size = f.area();
    render_main_screen(f, size, app);

    if app.input_mode != InputMode::Normal {
        render_input_popup(f, app);
    }

    if app.show_help {
        render_help_popup(f);
    }
}

pub fn render_main_screen(f: &mut Frame, area: Rect, app: &mut App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(3),
        ])
        .split(area);

    render_header(f, rows[0], app);

    if app.show_episodes {
        let body = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(rows[1]);
        render_item_table(f, body[0], app);
        render_episode_table(f, body[1], app);
    } else {
        render_item_table(f, rows[1], app);
    }

    render_status_bar(f, rows[2], app);
}

pub fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![Span::styled(
        "watch-tracker  ",
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    )];
    for name in &app.list_names {
        let style = if *name == app.list_name {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        spans.push(Span::styled(format!(" {name} "), style));
        spans.push(Span::raw(" "));
    }

    let header = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );
    f.render_widget(header, area);
}

pub fn render_item_table(f: &mut Frame, area: Rect, app: &mut App) {
    let now = Utc::now();

    let rows: Vec<Row> = app
        .records
        .iter()
        .map(|record| {
            let status_color = if record.all_watched() {
                Color::Green
            } else {
                Color::Yellow
            };
            Row::new(vec![
                Cell::from(record.title.clone()),
                Cell::from(status_label(record)).style(Style::default().fg(status_color)),
                Cell::from(updated_label(record, now)),
                Cell::from(record.season_tag.clone()),
                Cell::from(rating_label(record)).style(Style::default().fg(Color::Yellow)),
            ])
        })
        .collect();

    let title = format!("{} ({} items)", app.list_name, app.records.len());
    let table = Table::new(
        rows,
        [
            Constraint::Min(20),
            Constraint::Length(14),
            Constraint::Length(9),
            Constraint::Length(9),
            Constraint::Length(7),
        ],
    )
    .header(
        Row::new(vec!["Title", "Status", "Updated", "Season", "Rating"])
            .style(Style::default().add_modifier(Modifier::BOLD)),
    )
    .block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Blue)),
    )
    .row_highlight_style(
        Style::default()
            .bg(Color::Blue)
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("> ");

    f.render_stateful_widget(table, area, &mut app.table_state);

    // Header row and borders take three lines.
    if app.records.len() + 3 > area.height as usize {
        let scrollbar = Scrollbar::default()
            .orientation(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("^"))
            .end_symbol(Some("v"));

        f.render_stateful_widget(
            scrollbar,
            area.inner(Margin {
                vertical: 1,
                horizontal: 0,
            }),
            &mut app.scroll_state,
        );
    }
}

pub fn render_episode_table(f: &mut Frame, area: Rect, app: &App) {
    let Some(record) = app.selected_record() else {
        let empty = Paragraph::new("No item selected")
            .style(Style::default().fg(Color::Gray))
            .block(Block::default().title("Episodes").borders(Borders::ALL));
        f.render_widget(empty, area);
        return;
    };

    let now = Utc::now();
    let rows: Vec<Row> = record
        .episodes
        .iter()
        .map(|episode| {
            let (label, color) = if episode.watched {
                ("watched", Color::Green)
            } else {
                ("unwatched", Color::Yellow)
            };
            Row::new(vec![
                Cell::from(episode.number.to_string()),
                Cell::from(episode.title.clone()),
                Cell::from(label).style(Style::default().fg(color)),
                Cell::from(format_elapsed(episode.created_at, now)),
                Cell::from(episode.url.clone()).style(Style::default().fg(Color::DarkGray)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(4),
            Constraint::Percentage(40),
            Constraint::Length(10),
            Constraint::Length(9),
            Constraint::Min(10),
        ],
    )
    .header(
        Row::new(vec!["#", "Title", "Status", "Added", "Link"])
            .style(Style::default().add_modifier(Modifier::BOLD)),
    )
    .block(
        Block::default()
            .title(format!("Episodes - {}", record.title))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta)),
    );

    f.render_widget(table, area);
}

pub fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(area);

    let (message, style) = match &app.status {
        Some(notification) => {
            let color = match notification.kind {
                NotificationKind::Success => Color::Green,
                NotificationKind::Failure => Color::Red,
            };
            (notification.message.clone(), Style::default().fg(color))
        }
        None => (
            format!("{} item(s) in '{}'", app.records.len(), app.list_name),
            Style::default().fg(Color::Gray),
        ),
    };

    let status = Paragraph::new(message)
        .style(style)
        .block(Block::default().borders(Borders::ALL).title("Status"));
    f.render_widget(status, chunks[0]);

    let controls = Paragraph::new("h for help, q to quit")
        .style(Style::default().fg(Color::Gray))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Controls"));
    f.render_widget(controls, chunks[1]);
}

pub fn render_input_popup(f: &mut Frame, app: &App) {
    let popup_area = centered_line_rect(50, 3, f.area());

    let text = if app.input_mode.takes_text() {
        Line::from(vec![
            Span::raw(app.input.clone()),
            Span::styled("_", Style::default().fg(Color::Yellow)),
        ])
    } else {
        Line::from(Span::styled(
            format!("'{}'", app.list_name),
            Style::default().add_modifier(Modifier::BOLD),
        ))
    };

    let input = Paragraph::new(text).block(
        Block::default()
            .title(app.input_mode.prompt())
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow)),
    );

    f.render_widget(Clear, popup_area);
    f.render_widget(input, popup_area);
}

pub fn render_help_popup(f: &mut Frame) {
    let popup_area = centered_rect(60, 70, f.area());

    let help_text = vec![
        Line::from(vec![Span::styled(
            "watch-tracker - Help",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from(""),
        Line::from("Navigation:"),
        Line::from("  Up/k    - Move up"),
        Line::from("  Down/j  - Move down"),
        Line::from("  [ / ]   - Previous / next list"),
        Line::from("  Enter   - Show or hide episodes"),
        Line::from(""),
        Line::from("Items:"),
        Line::from("  a       - Add an item by workId"),
        Line::from("  d       - Remove the selected item"),
        Line::from("  1-5     - Rate the selected item"),
        Line::from("  0       - Clear its rating"),
        Line::from("  o       - Show where to continue watching"),
        Line::from("  r       - Refresh every item in the list"),
        Line::from("  i       - Import the viewing history"),
        Line::from(""),
        Line::from("Lists:"),
        Line::from("  n       - Create a list"),
        Line::from("  R       - Rename the active list"),
        Line::from("  m       - Merge another list into this one"),
        Line::from("  x       - Delete the active list"),
        Line::from(""),
        Line::from("  h/?     - Toggle this help"),
        Line::from("  q/Esc   - Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press Esc or h to close",
            Style::default().fg(Color::Gray),
        )]),
    ];

    let paragraph = Paragraph::new(help_text)
        .block(
            Block::default()
                .title("Help")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow)),
        )
        .wrap(Wrap { trim: true });

    f.render_widget(Clear, popup_area);
    f.render_widget(paragraph, popup_area);
}
