use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, BorderType, Paragraph, Row, Table, Wrap},
    Frame,
};
use taskdeck_core::{format_deadline, Field, Task, TaskApi, TaskForm};
use unicode_width::UnicodeWidthStr;

use crate::tui::app::App;

// Widest label plus ": "
const LABEL_WIDTH: usize = 13;

pub fn draw<A: TaskApi>(f: &mut Frame, app: &mut App<A>) {
    let size = f.area();
    // One row per field plus the border
    let form_height = if app.form.is_some() { Field::ALL.len() as u16 + 2 } else { 0 };

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(0)
        .constraints([
            Constraint::Length(4),           // Header
            Constraint::Min(1),              // Content
            Constraint::Length(form_height), // Form
            Constraint::Length(1),           // Footer/Help
        ])
        .split(size);

    draw_header(f, app, main_chunks[0]);

    let content_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(55),
            Constraint::Percentage(45),
        ])
        .split(main_chunks[1]);

    draw_task_list(f, app, content_chunks[0]);
    draw_task_card(f, app.selected_task(), content_chunks[1]);

    if let Some(form) = &app.form {
        draw_form(f, form, main_chunks[2]);
    }

    draw_footer(f, app, main_chunks[3]);
}

fn rounded(title: &str) -> Block<'_> {
    Block::default().title(title).borders(Borders::ALL).border_type(BorderType::Rounded)
}

fn draw_header<A: TaskApi>(f: &mut Frame, app: &App<A>, area: Rect) {
    let session_style = match app.session_label() {
        "signed in" => Style::default().fg(Color::Green),
        "anonymous" => Style::default().fg(Color::Red),
        _ => Style::default().fg(Color::DarkGray),
    };

    let lines = vec![
        Line::from(Span::styled(
            "Task Management System",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled(
                "Organize your tasks effectively and efficiently",
                Style::default().fg(Color::Gray),
            ),
            Span::raw("  "),
            Span::styled(format!("[{}]", app.session_label()), session_style),
            Span::styled("  L: logout", Style::default().fg(Color::DarkGray)),
        ]),
    ];

    let header = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).border_type(BorderType::Rounded));
    f.render_widget(header, area);
}

fn draw_task_list<A: TaskApi>(f: &mut Frame, app: &mut App<A>, area: Rect) {
    let rows: Vec<Row> = app.tasks().iter().map(|task| {
        let status_icon = if task.completed { "✔" } else { "☐" };

        let title_style = if task.completed {
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::CROSSED_OUT)
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        };

        let deadline = match task.deadline {
            Some(d) => d.format("%m-%d").to_string(),
            None => "-".to_string(),
        };

        Row::new(vec![
            Span::raw(status_icon),
            Span::raw(deadline),
            Span::raw(task.status_label()),
            Span::styled(task.title.clone(), title_style),
        ])
    }).collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(3),  // Done
            Constraint::Length(6),  // Deadline
            Constraint::Length(12), // Status
            Constraint::Min(10),    // Title
        ]
    )
    .header(
        Row::new(vec!["", "Due", "Status", "Task"]).style(Style::default().fg(Color::Yellow)),
    )
    .block(rounded(" Tasks "))
    .row_highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol(">> ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn draw_task_card(f: &mut Frame, task: Option<&Task>, area: Rect) {
    let Some(task) = task else {
        f.render_widget(rounded(" Detail "), area);
        return;
    };

    let deadline = format_deadline(task.deadline);
    let mut detail_text = vec![
        Line::from(vec![
            Span::styled("Title: ", Style::default().fg(Color::Blue)),
            Span::styled(&task.title, Style::default().add_modifier(Modifier::BOLD)),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("ID: ", Style::default().fg(Color::DarkGray)),
            Span::raw(task.id.as_str()),
        ]),
        Line::from(vec![
            Span::styled("Status: ", Style::default().fg(Color::Blue)),
            Span::raw(task.status_label()),
        ]),
        Line::from(vec![
            Span::styled("Deadline: ", Style::default().fg(Color::Blue)),
            Span::raw(if deadline.is_empty() { "None".to_string() } else { deadline }),
        ]),
        Line::from(""),
    ];

    if !task.description.is_empty() {
        detail_text.push(Line::from(Span::styled(
            "Description:",
            Style::default().fg(Color::Blue),
        )));
        detail_text.push(Line::from(task.description.as_str()));
    }

    let detail_block = Paragraph::new(detail_text)
        .block(rounded(" Detail "))
        .wrap(Wrap { trim: true });
    f.render_widget(detail_block, area);
}

fn draw_form(f: &mut Frame, form: &TaskForm, area: Rect) {
    let title = if form.is_editing() { " Edit Task " } else { " New Task " };

    let lines: Vec<Line> = Field::ALL.iter().map(|field| {
        let label = format!("{:<width$}", format!("{}: ", field.label()), width = LABEL_WIDTH);
        let label_style = if *field == form.focus() {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Blue)
        };
        let value = if field.is_text() {
            Span::raw(form.value(*field))
        } else {
            let shown = match form.value(*field) {
                "" => "(server default)",
                label => label,
            };
            Span::styled(format!("< {} >", shown), Style::default().fg(Color::Cyan))
        };
        Line::from(vec![Span::styled(label, label_style), value])
    }).collect();

    f.render_widget(Paragraph::new(lines).block(rounded(title)), area);

    // The status picker has no cursor
    if !form.focus().is_text() {
        return;
    }
    // Cursor sits after the typed prefix of the focused field
    let row = Field::ALL.iter().position(|field| *field == form.focus()).unwrap_or(0);
    let value = form.value(form.focus());
    let prefix: String = value.chars().take(form.cursor()).collect();
    let x = area.x + 1 + (LABEL_WIDTH + prefix.width()) as u16;
    let y = area.y + 1 + row as u16;
    f.set_cursor_position((x.min(area.right().saturating_sub(2)), y));
}

fn draw_footer<A: TaskApi>(f: &mut Frame, app: &App<A>, area: Rect) {
    let footer = if let Some(op) = &app.busy {
        Paragraph::new(format!("Working: {}…", op)).style(Style::default().fg(Color::Yellow))
    } else if let Some(notice) = &app.notice {
        Paragraph::new(format!("{}  (any key to dismiss)", notice))
            .style(Style::default().fg(Color::Red))
    } else if let Some(form) = &app.form {
        let help = if form.focus().is_text() {
            "Tab: Next field | Enter: Save | Esc: Cancel"
        } else {
            "Left/Right: Change status | Tab: Next field | Enter: Save | Esc: Cancel"
        };
        Paragraph::new(help).style(Style::default().fg(Color::DarkGray))
    } else {
        Paragraph::new(
            "j/k: Navigate | Space: Toggle | a: Add | e: Edit | d: Delete | r: Reload | q: Quit",
        )
        .style(Style::default().fg(Color::DarkGray))
    };
    f.render_widget(footer.alignment(Alignment::Center), area);
}
