use crate::io::storage::Storage;
use crate::model::todo::Todo;
use crate::model::view::{Filter, SortKey, ViewPrefs};
use crate::ops::compose::{compose, empty_message};
use crate::ops::stats::{Stats, stats};
use crate::ops::store::TodoStore;

/// The store plus the view preferences a front end holds for it.
///
/// Preferences live only here and are never persisted.
pub struct App<S: Storage> {
    pub store: TodoStore<S>,
    pub prefs: ViewPrefs,
}

impl<S: Storage> App<S> {
    pub fn new(store: TodoStore<S>, prefs: ViewPrefs) -> Self {
        App { store, prefs }
    }

    pub fn set_filter(&mut self, filter: Filter) {
        self.prefs.filter = filter;
    }

    pub fn set_search(&mut self, term: &str) {
        self.prefs.search = term.to_string();
    }

    pub fn set_sort(&mut self, sort: SortKey) {
        self.prefs.sort = sort;
    }

    /// Todos to display under the current preferences
    pub fn view(&self) -> Vec<&Todo> {
        compose(self.store.todos(), &self.prefs)
    }

    /// Counts over the whole collection, regardless of filter and search
    pub fn stats(&self) -> Stats {
        stats(self.store.todos())
    }

    pub fn empty_message(&self) -> &'static str {
        empty_message(self.store.len(), self.prefs.filter)
    }
}
