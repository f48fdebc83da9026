use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::todo::{Priority, Todo};
use crate::ops::age::relative_age;
use crate::ops::edit::EditSession;
use crate::ops::stats::{Stats, summary};
use crate::util::unicode::{display_width, pad_to_width};

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoJson {
    pub id: u64,
    pub text: String,
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    pub created_at: DateTime<Utc>,
    pub age: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsJson {
    pub total: usize,
    pub active: usize,
    pub completed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent_complete: Option<u8>,
}

#[derive(Serialize)]
pub struct ListJson {
    pub todos: Vec<TodoJson>,
    pub stats: StatsJson,
    /// Set only when `todos` is empty
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

// ---------------------------------------------------------------------------
// Conversion
// ---------------------------------------------------------------------------

pub fn todo_to_json(todo: &Todo, now: &DateTime<Utc>) -> TodoJson {
    TodoJson {
        id: todo.id.0,
        text: todo.text.clone(),
        completed: todo.completed,
        priority: todo.priority,
        created_at: todo.created_at,
        age: relative_age(&todo.created_at, now),
    }
}

pub fn stats_to_json(stats: &Stats) -> StatsJson {
    StatsJson {
        total: stats.total,
        active: stats.active,
        completed: stats.completed,
        percent_complete: stats.percent_complete,
    }
}

// ---------------------------------------------------------------------------
// Text formatting
// ---------------------------------------------------------------------------

const BAR_CELLS: usize = 20;

/// One listing row: `   3 [x] text  !high   5m ago`.
///
/// `text` is what to show (the draft while editing), padded or truncated to
/// `text_cells` terminal cells.
pub fn format_todo_line(
    todo: &Todo,
    text: &str,
    text_cells: usize,
    editing: bool,
    now: &DateTime<Utc>,
) -> String {
    let mark = if todo.completed { 'x' } else { ' ' };
    let priority = todo
        .priority
        .map(|p| format!("!{}", p))
        .unwrap_or_default();
    let mut line = format!(
        "{:>4} [{}] {}  {:<7} {}",
        todo.id.0,
        mark,
        pad_to_width(text, text_cells),
        priority,
        relative_age(&todo.created_at, now)
    );
    if editing {
        line.push_str("  (editing)");
    }
    line
}

/// Rows for a composed view, or the empty-state message.
pub fn format_listing(
    view: &[&Todo],
    edit: &EditSession,
    empty_message: &str,
    now: &DateTime<Utc>,
    max_width: usize,
) -> Vec<String> {
    if view.is_empty() {
        return vec![empty_message.to_string()];
    }
    let shown: Vec<&str> = view
        .iter()
        .map(|todo| match edit.draft() {
            Some(draft) if edit.is_editing(todo.id) => draft,
            _ => todo.text.as_str(),
        })
        .collect();
    let text_cells = shown
        .iter()
        .map(|s| display_width(s))
        .max()
        .unwrap_or(0)
        .min(max_width);

    view.iter()
        .zip(shown)
        .map(|(todo, text)| {
            format_todo_line(todo, text, text_cells, edit.is_editing(todo.id), now)
                .trim_end()
                .to_string()
        })
        .collect()
}

/// `[#####...............] 25% completed`
pub fn progress_bar(percent: u8) -> String {
    let filled = (usize::from(percent) / 5).min(BAR_CELLS);
    format!(
        "[{}{}] {}% completed",
        "#".repeat(filled),
        ".".repeat(BAR_CELLS - filled),
        percent
    )
}

/// Summary and progress lines; nothing for an empty collection.
pub fn format_stats(stats: &Stats) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some((left, total)) = summary(stats) {
        lines.push(format!("{} {}", left, total));
    }
    if let Some(percent) = stats.percent_complete {
        lines.push(progress_bar(percent));
    }
    lines
}

/// Listing followed by a blank line and the stats footer.
pub fn format_view(
    view: &[&Todo],
    edit: &EditSession,
    empty_message: &str,
    stats: &Stats,
    now: &DateTime<Utc>,
    max_width: usize,
) -> Vec<String> {
    let mut lines = format_listing(view, edit, empty_message, now, max_width);
    let footer = format_stats(stats);
    if !footer.is_empty() {
        lines.push(String::new());
        lines.extend(footer);
    }
    lines
}
