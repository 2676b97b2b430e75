use chrono::Local;
use crossterm::{
    event::{self, Event, KeyCode},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame, Terminal,
};
use std::io;

use crate::stats::compute_statistics;
use crate::storage::Storage;
use crate::store::{SortKey, TaskStore, SORT_KEYS};
use crate::task::{Task, TaskPatch, TIMESTAMP_FORMAT};
use crate::validate::{canonicalize, DIFFICULTIES, STATUSES, VISIBLE_CAP};

const HELP: &str =
    "a add  e edit  d delete  s sort  t stats  o overdue  r related  / search  enter advance  q quit";

/// Full-screen query output shown instead of the board until a key is
/// pressed.
struct Overlay {
    title: String,
    lines: Vec<String>,
}

pub fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    store: &mut TaskStore,
    storage: &Storage,
) -> io::Result<()> {
    let mut selected_status = 0;
    let mut selected_task = 0;
    let mut next_sort = 0;
    let mut overlay: Option<Overlay> = None;
    let mut message: Option<String> = None;

    loop {
        terminal.draw(|f| {
            draw(
                f,
                store,
                selected_status,
                selected_task,
                overlay.as_ref(),
                message.as_deref(),
            )
        })?;

        if let Event::Key(key) = event::read()? {
            if overlay.is_some() {
                overlay = None;
                continue;
            }
            message = None;
            match key.code {
                KeyCode::Char('q') => return Ok(()),
                KeyCode::Char('a') => {
                    message = Some(add_task_flow(store));
                    storage.save(store.all());
                }
                KeyCode::Char('e') => {
                    message = Some(edit_task_flow(store));
                    storage.save(store.all());
                }
                KeyCode::Char('d') => {
                    message = Some(delete_task_flow(store));
                    storage.save(store.all());
                }
                KeyCode::Char('s') => {
                    let key = SORT_KEYS[next_sort];
                    next_sort = (next_sort + 1) % SORT_KEYS.len();
                    overlay = Some(Overlay {
                        title: format!("Sorted by {}", key.label()),
                        lines: task_lines(&store.sort_by(key)),
                    });
                }
                KeyCode::Char('t') => {
                    overlay = Some(Overlay {
                        title: "Statistics".to_string(),
                        lines: stats_lines(store),
                    });
                }
                KeyCode::Char('o') => {
                    overlay = Some(Overlay {
                        title: "Overdue tasks".to_string(),
                        lines: task_lines(&store.overdue(Local::now().date_naive())),
                    });
                }
                KeyCode::Char('r') => match prompt_id("Id of the reference task") {
                    Some(id) => {
                        overlay = Some(Overlay {
                            title: format!("Tasks related to #{id}"),
                            lines: task_lines(&store.related_to(id)),
                        });
                    }
                    None => message = Some("Invalid id".to_string()),
                },
                KeyCode::Char('/') => {
                    if let Some(term) = prompt("Search term") {
                        overlay = Some(Overlay {
                            title: format!("Search results for \"{term}\""),
                            lines: task_lines(&store.search(&term)),
                        });
                    }
                }
                KeyCode::Left => {
                    if selected_status > 0 {
                        selected_status -= 1;
                        selected_task = 0;
                    }
                }
                KeyCode::Right => {
                    if selected_status < STATUSES.len() - 1 {
                        selected_status += 1;
                        selected_task = 0;
                    }
                }
                KeyCode::Up => {
                    if selected_task > 0 {
                        selected_task -= 1;
                    }
                }
                KeyCode::Down => {
                    let column_len = store.filter_by_status(STATUSES[selected_status]).len();
                    if selected_task + 1 < column_len {
                        selected_task += 1;
                    }
                }
                KeyCode::Enter => {
                    if let Some(msg) = advance_status(store, selected_status, selected_task) {
                        message = Some(msg);
                        storage.save(store.all());
                    }
                }
                _ => {}
            }
        }
    }
}

fn draw(
    f: &mut Frame,
    store: &TaskStore,
    selected_status: usize,
    selected_task: usize,
    overlay: Option<&Overlay>,
    message: Option<&str>,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Min(1), Constraint::Length(1)])
        .split(f.area());

    if let Some(overlay) = overlay {
        let items: Vec<ListItem> = overlay
            .lines
            .iter()
            .map(|line| ListItem::new(line.as_str()))
            .collect();
        let list = List::new(items).block(
            Block::default()
                .title(overlay.title.as_str())
                .borders(Borders::ALL),
        );
        f.render_widget(list, chunks[0]);
    } else {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![
                Constraint::Percentage(33),
                Constraint::Percentage(33),
                Constraint::Percentage(34),
            ])
            .split(chunks[0]);

        for (i, status) in STATUSES.iter().enumerate() {
            let tasks = store.filter_by_status(status);
            let items: Vec<ListItem> = tasks
                .iter()
                .enumerate()
                .map(|(row, t)| {
                    let style = if i == selected_status && row == selected_task {
                        Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
                    } else {
                        Style::default().fg(Color::White)
                    };
                    ListItem::new(Line::from(vec![
                        Span::raw(format!("[#{}] ", t.id)),
                        Span::styled(t.title.as_str(), style),
                        Span::raw(format!(" (due: {})", display_due(&t.due_date))),
                    ]))
                })
                .collect();

            let list = List::new(items).block(
                Block::default()
                    .title(*status)
                    .borders(Borders::ALL)
                    .border_style(if selected_status == i {
                        Style::default().fg(Color::Cyan)
                    } else {
                        Style::default()
                    }),
            );

            f.render_widget(list, columns[i]);
        }
    }

    f.render_widget(Paragraph::new(message.unwrap_or(HELP)), chunks[1]);
}

fn display_due(due: &str) -> &str {
    if due.trim().is_empty() {
        "-"
    } else {
        due
    }
}

fn task_lines(tasks: &[&Task]) -> Vec<String> {
    if tasks.is_empty() {
        return vec!["Nothing to show".to_string()];
    }
    tasks
        .iter()
        .map(|t| {
            format!(
                "#{} [{}] {} (due: {}, {})",
                t.id,
                t.status,
                t.title,
                display_due(&t.due_date),
                t.difficulty
            )
        })
        .collect()
}

fn stats_lines(store: &TaskStore) -> Vec<String> {
    let visible = store.visible();
    let stats = compute_statistics(&visible);
    let mut lines = vec![
        format!("Visible tasks: {}", stats.total_visible),
        String::new(),
        "By status:".to_string(),
    ];
    for entry in &stats.by_status {
        lines.push(format!(
            "  {:<12} {:>3}  {}",
            entry.label, entry.count, entry.percentage
        ));
    }
    lines.push(String::new());
    lines.push("By difficulty:".to_string());
    for entry in &stats.by_difficulty {
        lines.push(format!(
            "  {:<12} {:>3}  {}",
            entry.label, entry.count, entry.percentage
        ));
    }
    lines
}

fn add_task_flow(store: &mut TaskStore) -> String {
    // The cap is a policy of this layer, counted over visible tasks only.
    if store.visible().len() >= VISIBLE_CAP {
        return format!("Cannot add more tasks: limit of {VISIBLE_CAP} reached");
    }
    let Some(title) = prompt("Title") else {
        return "Input aborted".to_string();
    };
    let Some(description) = prompt("Description") else {
        return "Input aborted".to_string();
    };
    let Some(status_raw) = prompt("Status (Pending, In progress, Done)") else {
        return "Input aborted".to_string();
    };
    let Some(status) = canonicalize(&status_raw, &STATUSES) else {
        return format!("Invalid status: {status_raw}");
    };
    let Some(due_date) = prompt("Due date (YYYY-MM-DD, blank for none)") else {
        return "Input aborted".to_string();
    };
    let Some(difficulty_raw) = prompt("Difficulty (easy, medium, hard)") else {
        return "Input aborted".to_string();
    };
    let Some(difficulty) = canonicalize(&difficulty_raw, &DIFFICULTIES) else {
        return format!("Invalid difficulty: {difficulty_raw}");
    };

    let id = store.next_id();
    let created_at = Local::now().format(TIMESTAMP_FORMAT).to_string();
    store.add(Task::new(
        id, title, description, status, created_at, due_date, difficulty,
    ));
    format!("Task #{id} added")
}

fn edit_task_flow(store: &mut TaskStore) -> String {
    let Some(id) = prompt_id("Id of the task to edit") else {
        return "Invalid id".to_string();
    };
    if store.find_by_id(id).is_none() {
        return format!("No task with id {id}");
    }

    let mut patch = TaskPatch::default();
    patch.title = non_blank(prompt("New title (blank to keep)"));
    patch.description = non_blank(prompt("New description (blank to keep)"));
    if let Some(status_raw) = non_blank(prompt("New status (blank to keep)")) {
        match canonicalize(&status_raw, &STATUSES) {
            Some(status) => patch.status = Some(status.to_string()),
            None => return format!("Invalid status: {status_raw}"),
        }
    }
    // "-" clears the due date, blank keeps it
    patch.due_date = match non_blank(prompt("New due date (blank to keep, - to clear)")) {
        Some(input) if input == "-" => Some(String::new()),
        other => other,
    };
    if let Some(difficulty_raw) = non_blank(prompt("New difficulty (blank to keep)")) {
        match canonicalize(&difficulty_raw, &DIFFICULTIES) {
            Some(difficulty) => patch.difficulty = Some(difficulty.to_string()),
            None => return format!("Invalid difficulty: {difficulty_raw}"),
        }
    }

    let edited_at = Local::now().format(TIMESTAMP_FORMAT).to_string();
    store.edit(id, &patch, &edited_at);
    format!("Task #{id} updated")
}

fn delete_task_flow(store: &mut TaskStore) -> String {
    let Some(id) = prompt_id("Id of the task to delete") else {
        return "Invalid id".to_string();
    };
    let already_deleted = match store.find_by_id(id) {
        None => return format!("No task with id {id}"),
        Some(task) => task.is_deleted(),
    };
    if already_deleted {
        format!("Task #{id} is already deleted")
    } else {
        store.soft_delete(id);
        format!("Task #{id} marked as deleted")
    }
}

/// Move the selected task to the next status column.
fn advance_status(
    store: &mut TaskStore,
    selected_status: usize,
    selected_task: usize,
) -> Option<String> {
    let id = store
        .filter_by_status(STATUSES[selected_status])
        .get(selected_task)
        .map(|t| t.id)?;
    if selected_status + 1 >= STATUSES.len() {
        return Some(format!("Task #{id} is already done"));
    }
    let next = STATUSES[selected_status + 1];
    let patch = TaskPatch {
        status: Some(next.to_string()),
        ..Default::default()
    };
    let edited_at = Local::now().format(TIMESTAMP_FORMAT).to_string();
    store.edit(id, &patch, &edited_at);
    Some(format!("Task #{id} moved to {next}"))
}

fn non_blank(input: Option<String>) -> Option<String> {
    input.filter(|value| !value.is_empty())
}

fn prompt_id(message: &str) -> Option<u32> {
    prompt(message)?.parse().ok()
}

fn prompt(message: &str) -> Option<String> {
    disable_raw_mode().ok();
    println!("{}", message);
    let mut input = String::new();
    if io::stdin().read_line(&mut input).is_ok() {
        enable_raw_mode().ok();
        Some(input.trim().to_string())
    } else {
        enable_raw_mode().ok();
        None
    }
}
