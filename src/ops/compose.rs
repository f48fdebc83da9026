use std::cmp::Ordering;

use regex::Regex;

use crate::model::todo::{Priority, Todo};
use crate::model::view::{Filter, SortKey, ViewPrefs};

/// Case-insensitive literal substring matcher for the search box.
enum SearchMatcher {
    Any,
    Pattern(Regex),
    Lowercase(String),
}

impl SearchMatcher {
    fn new(term: &str) -> Self {
        let term = term.trim();
        if term.is_empty() {
            return SearchMatcher::Any;
        }
        // An escaped literal only fails to compile past the regex size limit
        Regex::new(&format!("(?i){}", regex::escape(term)))
            .map(SearchMatcher::Pattern)
            .unwrap_or_else(|_| SearchMatcher::Lowercase(term.to_lowercase()))
    }

    fn matches(&self, text: &str) -> bool {
        match self {
            SearchMatcher::Any => true,
            SearchMatcher::Pattern(re) => re.is_match(text),
            SearchMatcher::Lowercase(term) => text.to_lowercase().contains(term.as_str()),
        }
    }
}

/// Compute the displayed list: filter, then search, then a stable sort.
///
/// `todos` must be in insertion order; that order breaks timestamp ties.
/// Nothing is mutated.
pub fn compose<'a>(todos: impl IntoIterator<Item = &'a Todo>, prefs: &ViewPrefs) -> Vec<&'a Todo> {
    let matcher = SearchMatcher::new(&prefs.search);
    let mut view: Vec<(usize, &Todo)> = todos
        .into_iter()
        .enumerate()
        .filter(|(_, t)| prefs.filter.admits(t.completed))
        .filter(|(_, t)| matcher.matches(&t.text))
        .collect();

    match prefs.sort {
        SortKey::Newest => view.sort_by(newest_first),
        SortKey::Oldest => view.sort_by(|(_, a), (_, b)| a.created_at.cmp(&b.created_at)),
        SortKey::Alphabetical => view.sort_by(|(_, a), (_, b)| alphabetical(&a.text, &b.text)),
        SortKey::Priority => view.sort_by(|a, b| {
            Priority::rank(b.1.priority)
                .cmp(&Priority::rank(a.1.priority))
                .then_with(|| newest_first(a, b))
        }),
    }

    view.into_iter().map(|(_, t)| t).collect()
}

/// `createdAt` descending, later insertions first on ties
fn newest_first(a: &(usize, &Todo), b: &(usize, &Todo)) -> Ordering {
    b.1.created_at
        .cmp(&a.1.created_at)
        .then_with(|| b.0.cmp(&a.0))
}

/// Case-insensitive first, lowercase before uppercase on otherwise equal text
fn alphabetical(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| b.cmp(a))
}

/// Message shown when the composed view is empty
pub fn empty_message(total: usize, filter: Filter) -> &'static str {
    const NOTHING_YET: &str = "No todos yet. Add one above!";
    if total == 0 {
        return NOTHING_YET;
    }
    match filter {
        Filter::Active => "No active todos!",
        Filter::Completed => "No completed todos!",
        Filter::All => NOTHING_YET,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::todo::TodoId;
    use chrono::{Duration, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn todo(id: u64, text: &str, completed: bool, priority: Option<Priority>, minute: i64) -> Todo {
        let base = Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0).unwrap();
        let mut t = Todo::new(TodoId(id), text.into(), priority, base + Duration::minutes(minute));
        t.completed = completed;
        t
    }

    fn texts<'a>(view: &[&'a Todo]) -> Vec<&'a str> {
        view.iter().map(|t| t.text.as_str()).collect()
    }

    fn prefs(filter: Filter, search: &str, sort: SortKey) -> ViewPrefs {
        ViewPrefs::new(filter, search, sort)
    }

    #[test]
    fn newest_and_oldest() {
        let todos = vec![
            todo(1, "A", false, None, 0),
            todo(2, "B", false, None, 1),
            todo(3, "C", false, None, 2),
        ];
        let newest = compose(&todos, &prefs(Filter::All, "", SortKey::Newest));
        assert_eq!(texts(&newest), vec!["C", "B", "A"]);
        let oldest = compose(&todos, &prefs(Filter::All, "", SortKey::Oldest));
        assert_eq!(texts(&oldest), vec!["A", "B", "C"]);
    }

    #[test]
    fn equal_timestamps_fall_back_to_insertion_order() {
        let todos = vec![
            todo(1, "A", false, None, 0),
            todo(2, "B", false, None, 0),
            todo(3, "C", false, None, 0),
        ];
        let newest = compose(&todos, &prefs(Filter::All, "", SortKey::Newest));
        assert_eq!(texts(&newest), vec!["C", "B", "A"]);
        let oldest = compose(&todos, &prefs(Filter::All, "", SortKey::Oldest));
        assert_eq!(texts(&oldest), vec!["A", "B", "C"]);
    }

    #[test]
    fn alphabetical_ignores_case() {
        let todos = vec![
            todo(1, "Zeta", false, None, 0),
            todo(2, "alpha", false, None, 1),
            todo(3, "Beta", false, None, 2),
            todo(4, "Alpha", false, None, 3),
        ];
        let view = compose(&todos, &prefs(Filter::All, "", SortKey::Alphabetical));
        assert_eq!(texts(&view), vec!["alpha", "Alpha", "Beta", "Zeta"]);
    }

    #[test]
    fn priority_ranks_then_newest() {
        let todos = vec![
            todo(1, "low", false, Some(Priority::Low), 0),
            todo(2, "none", false, None, 1),
            todo(3, "high old", false, Some(Priority::High), 2),
            todo(4, "medium", false, Some(Priority::Medium), 3),
            todo(5, "high new", false, Some(Priority::High), 4),
        ];
        let view = compose(&todos, &prefs(Filter::All, "", SortKey::Priority));
        assert_eq!(
            texts(&view),
            vec!["high new", "high old", "medium", "low", "none"]
        );
    }

    #[test]
    fn priority_with_no_priorities_matches_newest() {
        let todos = vec![
            todo(1, "A", false, None, 0),
            todo(2, "B", false, None, 1),
            todo(3, "C", false, None, 2),
        ];
        let by_priority = compose(&todos, &prefs(Filter::All, "", SortKey::Priority));
        let newest = compose(&todos, &prefs(Filter::All, "", SortKey::Newest));
        assert_eq!(texts(&by_priority), texts(&newest));
    }

    #[test]
    fn filter_and_search_compose() {
        let todos = vec![
            todo(1, "Buy milk", false, None, 0),
            todo(2, "Walk the dog", true, None, 1),
        ];
        let active = compose(&todos, &prefs(Filter::Active, "", SortKey::Oldest));
        assert_eq!(texts(&active), vec!["Buy milk"]);

        let dog = compose(&todos, &prefs(Filter::All, "dog", SortKey::Oldest));
        assert_eq!(texts(&dog), vec!["Walk the dog"]);

        let done = compose(&todos, &prefs(Filter::Completed, "", SortKey::Oldest));
        assert_eq!(texts(&done), vec!["Walk the dog"]);
    }

    #[test]
    fn search_is_case_insensitive_and_literal() {
        let todos = vec![
            todo(1, "Buy MILK", false, None, 0),
            todo(2, "Fix a.b", false, None, 1),
            todo(3, "Fix axb", false, None, 2),
        ];
        let milk = compose(&todos, &prefs(Filter::All, "milk", SortKey::Oldest));
        assert_eq!(texts(&milk), vec!["Buy MILK"]);
        let dot = compose(&todos, &prefs(Filter::All, "a.b", SortKey::Oldest));
        assert_eq!(texts(&dot), vec!["Fix a.b"]);
    }

    #[test]
    fn blank_search_passes_everything() {
        let todos = vec![todo(1, "a", false, None, 0), todo(2, "b", true, None, 1)];
        let view = compose(&todos, &prefs(Filter::All, "   ", SortKey::Oldest));
        assert_eq!(view.len(), 2);
    }

    #[test]
    fn empty_messages() {
        assert_eq!(empty_message(0, Filter::Active), "No todos yet. Add one above!");
        assert_eq!(empty_message(3, Filter::Active), "No active todos!");
        assert_eq!(empty_message(3, Filter::Completed), "No completed todos!");
        assert_eq!(empty_message(3, Filter::All), "No todos yet. Add one above!");
    }
}
