use crate::model::todo::Todo;

/// Completion counts for a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stats {
    pub total: usize,
    pub active: usize,
    pub completed: usize,
    /// Rounded to the nearest whole percent; `None` for an empty collection
    pub percent_complete: Option<u8>,
}

pub fn stats<'a>(todos: impl IntoIterator<Item = &'a Todo>) -> Stats {
    let mut total = 0;
    let mut completed = 0;
    for todo in todos {
        total += 1;
        if todo.completed {
            completed += 1;
        }
    }
    Stats {
        total,
        active: total - completed,
        completed,
        percent_complete: percent(completed, total),
    }
}

/// Round-half-up percentage without going through floats
fn percent(part: usize, whole: usize) -> Option<u8> {
    if whole == 0 {
        return None;
    }
    let rounded = (200 * part + whole) / (2 * whole);
    u8::try_from(rounded).ok()
}

/// "3 tasks left" / "out of 4 total", or `None` when there is nothing
pub fn summary(stats: &Stats) -> Option<(String, String)> {
    if stats.total == 0 {
        return None;
    }
    let noun = if stats.active == 1 { "task" } else { "tasks" };
    Some((
        format!("{} {} left", stats.active, noun),
        format!("out of {} total", stats.total),
    ))
}

/// "1 todo" / "5 todos", or `None` for zero
pub fn count_label(count: usize) -> Option<String> {
    match count {
        0 => None,
        1 => Some("1 todo".to_string()),
        n => Some(format!("{n} todos")),
    }
}
