use indexmap::IndexMap;

use crate::io::storage::Storage;
use crate::model::todo::{Priority, Todo, TodoId, normalize_text};
use crate::ops::edit::{EditSession, EditTrigger};
use crate::parse::{parse_collection, serialize_collection};
use crate::util::clock::{Clock, SystemClock};

/// The single authoritative todo collection.
///
/// Owns the records, the edit session, and the storage handle. Every accepted
/// mutation writes the full collection exactly once; rejected or no-op calls
/// never write. Persistence failures are logged and in-memory state wins.
pub struct TodoStore<S: Storage> {
    storage: S,
    key: String,
    todos: IndexMap<TodoId, Todo>,
    edit: EditSession,
    next_id: u64,
    clock: Box<dyn Clock>,
}

impl<S: Storage> TodoStore<S> {
    /// Load the collection stored under `key`, using wall-clock time.
    pub fn open(storage: S, key: impl Into<String>) -> Self {
        Self::open_with_clock(storage, key, Box::new(SystemClock))
    }

    /// Load the collection stored under `key`.
    ///
    /// A missing value starts empty. An unreadable or malformed value also
    /// starts empty, with a warning; the next accepted mutation overwrites it.
    pub fn open_with_clock(storage: S, key: impl Into<String>, clock: Box<dyn Clock>) -> Self {
        let key = key.into();
        let mut store = TodoStore {
            storage,
            key,
            todos: IndexMap::new(),
            edit: EditSession::Idle,
            next_id: 1,
            clock,
        };

        match store.storage.read(&store.key) {
            Ok(Some(payload)) => match parse_collection(&payload) {
                Ok(todos) => store.replace_all(todos),
                Err(e) => tracing::warn!(key = %store.key, "ignoring stored todos: {e}"),
            },
            Ok(None) => tracing::debug!(key = %store.key, "no stored todos, starting empty"),
            Err(e) => tracing::warn!(key = %store.key, "could not read stored todos: {e}"),
        }
        store
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Todos in insertion order
    pub fn todos(&self) -> impl ExactSizeIterator<Item = &Todo> + Clone {
        self.todos.values()
    }

    pub fn get(&self, id: TodoId) -> Option<&Todo> {
        self.todos.get(&id)
    }

    pub fn len(&self) -> usize {
        self.todos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.todos.is_empty()
    }

    pub fn edit_session(&self) -> &EditSession {
        &self.edit
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Append a new todo. Blank text is ignored and returns `None`, as does
    /// an add after the id space is used up.
    pub fn add(&mut self, text: &str, priority: Option<Priority>) -> Option<Todo> {
        let text = normalize_text(text)?;
        let id = TodoId(self.next_id);
        if id == TodoId::MAX {
            tracing::warn!(key = %self.key, "todo ids exhausted; not adding");
            return None;
        }
        self.next_id += 1;
        let todo = Todo::new(id, text, priority, self.clock.now());
        self.todos.insert(id, todo.clone());
        tracing::debug!(%id, "added todo");
        self.persist();
        Some(todo)
    }

    /// Flip completion. Suppressed while `id` is being edited.
    pub fn toggle(&mut self, id: TodoId) -> bool {
        if self.edit.is_editing(id) {
            tracing::debug!(%id, "toggle suppressed during edit");
            return false;
        }
        let Some(todo) = self.todos.get_mut(&id) else {
            return false;
        };
        todo.completed = !todo.completed;
        tracing::debug!(%id, completed = todo.completed, "toggled todo");
        self.persist();
        true
    }

    /// Remove a todo, keeping the order of the rest. Abandons its edit.
    pub fn delete(&mut self, id: TodoId) -> bool {
        if self.todos.shift_remove(&id).is_none() {
            return false;
        }
        if self.edit.is_editing(id) {
            self.edit = EditSession::Idle;
        }
        tracing::debug!(%id, "deleted todo");
        self.persist();
        true
    }

    /// Replace a todo's text. Blank text is rejected and the old text kept.
    pub fn rename(&mut self, id: TodoId, text: &str) -> bool {
        let Some(text) = normalize_text(text) else {
            return false;
        };
        let Some(todo) = self.todos.get_mut(&id) else {
            return false;
        };
        if todo.text != text {
            todo.text = text;
            tracing::debug!(%id, "renamed todo");
            self.persist();
        }
        true
    }

    /// Remove every completed todo. Returns how many were removed.
    pub fn clear_completed(&mut self) -> usize {
        let before = self.todos.len();
        self.todos.retain(|_, todo| !todo.completed);
        let removed = before - self.todos.len();
        if removed == 0 {
            return 0;
        }
        if let Some(target) = self.edit.target()
            && !self.todos.contains_key(&target)
        {
            self.edit = EditSession::Idle;
        }
        tracing::debug!(removed, "cleared completed todos");
        self.persist();
        removed
    }

    /// Complete everything, or reopen everything if all are already done.
    /// Ignores the edit session.
    pub fn toggle_all(&mut self) -> bool {
        if self.todos.is_empty() {
            return false;
        }
        let all_done = self.todos.values().all(|t| t.completed);
        for todo in self.todos.values_mut() {
            todo.completed = !all_done;
        }
        tracing::debug!(completed = !all_done, "toggled all todos");
        self.persist();
        true
    }

    // -----------------------------------------------------------------------
    // Edit session
    // -----------------------------------------------------------------------

    /// Start renaming `id` with its current text as the draft. Replaces any
    /// edit in progress without saving it. Unknown ids are ignored.
    pub fn start_edit(&mut self, id: TodoId) -> bool {
        let Some(todo) = self.todos.get(&id) else {
            return false;
        };
        self.edit.start(id, &todo.text);
        true
    }

    pub fn update_draft(&mut self, text: &str) -> bool {
        self.edit.update_draft(text)
    }

    /// Save the draft and leave edit mode. Returns whether the rename was
    /// accepted; a blank draft keeps the original text but still exits.
    pub fn commit_edit(&mut self) -> bool {
        match self.edit.finish() {
            Some((target, draft)) => self.rename(target, &draft),
            None => false,
        }
    }

    /// Leave edit mode without saving. Returns false when idle.
    pub fn cancel_edit(&mut self) -> bool {
        self.edit.finish().is_some()
    }

    /// Route a key or focus event to the matching transition. Blur saves.
    pub fn handle_edit_trigger(&mut self, trigger: EditTrigger) -> bool {
        match trigger {
            EditTrigger::Enter | EditTrigger::Blur => self.commit_edit(),
            EditTrigger::Escape => self.cancel_edit(),
        }
    }

    // -----------------------------------------------------------------------
    // External changes
    // -----------------------------------------------------------------------

    /// Ask the storage to report changes made by other writers.
    pub fn subscribe(&mut self) {
        if let Err(e) = self.storage.watch(&self.key) {
            tracing::warn!(key = %self.key, "external changes will not be seen: {e}");
        }
    }

    /// Apply any pending external changes. Returns how many were applied.
    pub fn sync_external(&mut self) -> usize {
        let mut applied = 0;
        for change in self.storage.poll_changes() {
            if change.key == self.key && self.apply_external(change.payload.as_deref()) {
                applied += 1;
            }
        }
        applied
    }

    /// Replace the collection with an external snapshot.
    ///
    /// The todo under edit is kept exactly as held here: it takes its slot
    /// in the snapshot, or is re-inserted at its old position if the snapshot
    /// dropped it. The edit session itself is never touched. Nothing is
    /// written back.
    pub fn apply_external(&mut self, payload: Option<&str>) -> bool {
        let Some(payload) = payload else {
            tracing::warn!(key = %self.key, "stored todos were removed externally; keeping in-memory copy");
            return false;
        };
        let incoming = match parse_collection(payload) {
            Ok(todos) => todos,
            Err(e) => {
                tracing::warn!(key = %self.key, "ignoring external change: {e}");
                return false;
            }
        };

        let editing = self.edit.target().and_then(|target| {
            let index = self.todos.get_index_of(&target)?;
            let todo = self.todos.get(&target)?.clone();
            Some((index, todo))
        });

        self.replace_all(incoming);

        if let Some((index, local)) = editing {
            match self.todos.get_mut(&local.id) {
                Some(slot) => *slot = local,
                None => {
                    let index = index.min(self.todos.len());
                    self.todos.shift_insert(index, local.id, local);
                }
            }
        }
        tracing::debug!(count = self.todos.len(), "applied external change");
        true
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn replace_all(&mut self, todos: Vec<Todo>) {
        self.todos = todos.into_iter().map(|t| (t.id, t)).collect();
        let highest = self.todos.keys().map(|id| id.0).max().unwrap_or(0);
        self.next_id = self.next_id.max(highest.saturating_add(1));
    }

    fn persist(&mut self) {
        let payload = match serialize_collection(self.todos.values()) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(key = %self.key, "could not serialize todos: {e}");
                return;
            }
        };
        if let Err(e) = self.storage.write(&self.key, &payload) {
            tracing::warn!(key = %self.key, "todos not saved: {e}");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::storage::MemoryStorage;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use std::cell::Cell;

    /// Clock that advances one second per reading
    struct StepClock(Cell<DateTime<Utc>>);

    impl Clock for StepClock {
        fn now(&self) -> DateTime<Utc> {
            let now = self.0.get();
            self.0.set(now + Duration::seconds(1));
            now
        }
    }

    fn store_with(storage: MemoryStorage) -> TodoStore<MemoryStorage> {
        let start = Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0).unwrap();
        TodoStore::open_with_clock(storage, "todos", Box::new(StepClock(Cell::new(start))))
    }

    fn store() -> (TodoStore<MemoryStorage>, MemoryStorage) {
        let storage = MemoryStorage::new();
        (store_with(storage.clone()), storage)
    }

    fn texts(store: &TodoStore<MemoryStorage>) -> Vec<&str> {
        store.todos().map(|t| t.text.as_str()).collect()
    }

    // --- add ---

    #[test]
    fn add_appends_trimmed_open_todo() {
        let (mut store, storage) = store();
        let first = store.add("  Buy milk  ", Some(Priority::High)).unwrap();
        let second = store.add("Walk the dog", None).unwrap();

        assert_eq!(first.text, "Buy milk");
        assert!(!first.completed);
        assert_eq!(first.priority, Some(Priority::High));
        assert_ne!(first.id, second.id);
        assert!(second.created_at > first.created_at);
        assert_eq!(texts(&store), vec!["Buy milk", "Walk the dog"]);
        assert_eq!(storage.write_count(), 2);
    }

    #[test]
    fn add_blank_is_silently_ignored() {
        let (mut store, storage) = store();
        assert!(store.add("   ", None).is_none());
        assert!(store.add("", None).is_none());
        assert!(store.is_empty());
        assert_eq!(storage.write_count(), 0);
    }

    #[test]
    fn ids_are_not_reused_after_delete() {
        let (mut store, _) = store();
        let a = store.add("a", None).unwrap();
        let b = store.add("b", None).unwrap();
        store.delete(b.id);
        let c = store.add("c", None).unwrap();
        assert_ne!(c.id, a.id);
        assert_ne!(c.id, b.id);
    }

    // --- toggle / delete ---

    #[test]
    fn toggle_twice_restores_state() {
        let (mut store, storage) = store();
        let id = store.add("Buy milk", None).unwrap().id;
        assert!(store.toggle(id));
        assert!(store.get(id).unwrap().completed);
        assert!(store.toggle(id));
        assert!(!store.get(id).unwrap().completed);
        assert_eq!(storage.write_count(), 3);
    }

    #[test]
    fn toggle_and_delete_missing_are_noops() {
        let (mut store, storage) = store();
        store.add("Buy milk", None);
        assert!(!store.toggle(TodoId(99)));
        assert!(!store.delete(TodoId(99)));
        assert_eq!(store.len(), 1);
        assert_eq!(storage.write_count(), 1);
    }

    #[test]
    fn delete_preserves_order() {
        let (mut store, _) = store();
        store.add("a", None);
        let b = store.add("b", None).unwrap();
        store.add("c", None);
        assert!(store.delete(b.id));
        assert_eq!(texts(&store), vec!["a", "c"]);
    }

    // --- rename ---

    #[test]
    fn rename_trims_and_rejects_blank() {
        let (mut store, _) = store();
        let id = store.add("Buy milk", None).unwrap().id;
        assert!(store.rename(id, "  Buy oat milk "));
        assert_eq!(store.get(id).unwrap().text, "Buy oat milk");
        assert!(!store.rename(id, "   "));
        assert_eq!(store.get(id).unwrap().text, "Buy oat milk");
        assert!(!store.rename(TodoId(42), "ghost"));
    }

    // --- bulk ---

    #[test]
    fn clear_completed_removes_only_done() {
        let (mut store, storage) = store();
        let a = store.add("a", None).unwrap().id;
        store.add("b", None);
        store.toggle(a);
        let writes = storage.write_count();

        assert_eq!(store.clear_completed(), 1);
        assert_eq!(texts(&store), vec!["b"]);
        assert_eq!(storage.write_count(), writes + 1);

        assert_eq!(store.clear_completed(), 0);
        assert_eq!(storage.write_count(), writes + 1);
    }

    #[test]
    fn toggle_all_completes_then_reopens() {
        let (mut store, _) = store();
        let a = store.add("a", None).unwrap().id;
        store.add("b", None);
        store.toggle(a);

        assert!(store.toggle_all());
        assert!(store.todos().all(|t| t.completed));
        assert!(store.toggle_all());
        assert!(store.todos().all(|t| !t.completed));
    }

    #[test]
    fn toggle_all_on_empty_is_noop() {
        let (mut store, storage) = store();
        assert!(!store.toggle_all());
        assert_eq!(storage.write_count(), 0);
    }

    #[test]
    fn toggle_all_ignores_edit_session() {
        let (mut store, _) = store();
        let id = store.add("a", None).unwrap().id;
        store.start_edit(id);
        assert!(store.toggle_all());
        assert!(store.get(id).unwrap().completed);
        assert_eq!(store.edit_session().target(), Some(id));
    }

    // --- edit session ---

    #[test]
    fn edit_suppresses_toggle_until_cancel() {
        let (mut store, _) = store();
        let id = store.add("Buy milk", None).unwrap().id;
        assert!(store.start_edit(id));
        assert!(!store.toggle(id));
        assert!(!store.get(id).unwrap().completed);

        assert!(store.cancel_edit());
        assert!(store.toggle(id));
        assert!(store.get(id).unwrap().completed);
    }

    #[test]
    fn edit_only_suppresses_its_own_target() {
        let (mut store, _) = store();
        let a = store.add("a", None).unwrap().id;
        let b = store.add("b", None).unwrap().id;
        store.start_edit(a);
        assert!(store.toggle(b));
    }

    #[test]
    fn commit_saves_trimmed_draft() {
        let (mut store, _) = store();
        let id = store.add("Buy milk", None).unwrap().id;
        store.start_edit(id);
        assert_eq!(store.edit_session().draft(), Some("Buy milk"));
        store.update_draft("  Buy bread ");
        assert!(store.commit_edit());
        assert_eq!(store.get(id).unwrap().text, "Buy bread");
        assert!(store.edit_session().is_idle());
    }

    #[test]
    fn blank_commit_keeps_text_and_exits() {
        let (mut store, storage) = store();
        let id = store.add("Buy milk", None).unwrap().id;
        store.start_edit(id);
        store.update_draft("   ");
        assert!(!store.commit_edit());
        assert_eq!(store.get(id).unwrap().text, "Buy milk");
        assert!(store.edit_session().is_idle());
        assert_eq!(storage.write_count(), 1);
    }

    #[test]
    fn cancel_discards_draft() {
        let (mut store, _) = store();
        let id = store.add("Buy milk", None).unwrap().id;
        store.start_edit(id);
        store.update_draft("Buy bread");
        assert!(store.handle_edit_trigger(EditTrigger::Escape));
        assert_eq!(store.get(id).unwrap().text, "Buy milk");
        assert!(store.edit_session().is_idle());
    }

    #[test]
    fn blur_commits() {
        let (mut store, _) = store();
        let id = store.add("Buy milk", None).unwrap().id;
        store.start_edit(id);
        store.update_draft("Buy bread");
        assert!(store.handle_edit_trigger(EditTrigger::Blur));
        assert_eq!(store.get(id).unwrap().text, "Buy bread");
    }

    #[test]
    fn starting_new_edit_abandons_previous_draft() {
        let (mut store, _) = store();
        let a = store.add("a", None).unwrap().id;
        let b = store.add("b", None).unwrap().id;
        store.start_edit(a);
        store.update_draft("changed");
        store.start_edit(b);
        assert!(store.commit_edit());
        assert_eq!(texts(&store), vec!["a", "b"]);
    }

    #[test]
    fn start_edit_on_missing_id_stays_idle() {
        let (mut store, _) = store();
        assert!(!store.start_edit(TodoId(5)));
        assert!(store.edit_session().is_idle());
        assert!(!store.update_draft("x"));
        assert!(!store.commit_edit());
        assert!(!store.cancel_edit());
    }

    #[test]
    fn delete_during_edit_clears_session() {
        let (mut store, _) = store();
        let id = store.add("Buy milk", None).unwrap().id;
        store.start_edit(id);
        assert!(store.delete(id));
        assert!(store.edit_session().is_idle());
        assert!(store.get(id).is_none());
    }

    #[test]
    fn clear_completed_clears_session_of_removed_target() {
        let (mut store, _) = store();
        let id = store.add("Buy milk", None).unwrap().id;
        store.toggle(id);
        store.start_edit(id);
        store.clear_completed();
        assert!(store.edit_session().is_idle());
    }

    // --- persistence ---

    #[test]
    fn reopen_restores_collection_and_id_sequence() {
        let (mut store, storage) = store();
        store.add("a", Some(Priority::Low));
        let b = store.add("b", None).unwrap();
        store.toggle(b.id);
        drop(store);

        let mut reopened = store_with(storage);
        assert_eq!(texts(&reopened), vec!["a", "b"]);
        assert!(reopened.get(b.id).unwrap().completed);
        let c = reopened.add("c", None).unwrap();
        assert!(c.id > b.id);
    }

    #[test]
    fn largest_stored_id_is_rejected_not_wrapped() {
        let payload = r#"[
  {"id": 1, "text": "keep me", "createdAt": "2025-05-01T08:00:00Z"},
  {"id": 18446744073709551615, "text": "max", "createdAt": "2025-05-01T08:00:00Z"}
]"#;
        let mut store = store_with(MemoryStorage::with_value("todos", payload));
        assert!(store.is_empty());
        let added = store.add("new", None).unwrap();
        assert_eq!(added.id, TodoId(1));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn add_is_a_noop_once_ids_run_out() {
        let payload = r#"[{"id": 18446744073709551614, "text": "edge", "createdAt": "2025-05-01T08:00:00Z"}]"#;
        let storage = MemoryStorage::with_value("todos", payload);
        let mut store = store_with(storage.clone());
        assert_eq!(store.len(), 1);

        assert!(store.add("one more", None).is_none());
        assert_eq!(texts(&store), vec!["edge"]);
        assert_eq!(storage.write_count(), 0);
    }

    #[test]
    fn external_snapshot_with_largest_id_is_ignored() {
        let (mut store, storage) = store();
        store.subscribe();
        let a = store.add("a", None).unwrap().id;
        storage.external_write(
            "todos",
            r#"[{"id": 18446744073709551615, "text": "max", "createdAt": "2025-05-01T08:00:00Z"}]"#,
        );
        assert_eq!(store.sync_external(), 0);
        let b = store.add("b", None).unwrap().id;
        assert_ne!(a, b);
        assert_eq!(texts(&store), vec!["a", "b"]);
    }

    #[test]
    fn malformed_stored_value_starts_empty() {
        let store = store_with(MemoryStorage::with_value("todos", "not json {{{"));
        assert!(store.is_empty());
    }

    #[test]
    fn unreadable_storage_starts_empty() {
        let storage = MemoryStorage::with_value("todos", "[]");
        storage.set_fail_reads(true);
        assert!(store_with(storage).is_empty());
    }

    #[test]
    fn write_failure_keeps_in_memory_state() {
        let (mut store, storage) = store();
        storage.set_fail_writes(true);
        let id = store.add("Buy milk", None).unwrap().id;
        assert!(store.toggle(id));
        assert!(store.get(id).unwrap().completed);
        assert_eq!(storage.write_count(), 0);
        assert_eq!(storage.value("todos"), None);
    }

    #[test]
    fn written_payload_is_ordered_array() {
        let (mut store, storage) = store();
        store.add("a", None);
        store.add("b", Some(Priority::Medium));
        let payload: serde_json::Value =
            serde_json::from_str(&storage.value("todos").unwrap()).unwrap();
        let arr = payload.as_array().unwrap();
        assert_eq!(arr.len(), 2);
        assert_eq!(arr[0]["text"], "a");
        assert_eq!(arr[1]["priority"], "medium");
        assert!(arr[0].get("createdAt").is_some());
    }

    // --- external changes ---

    fn snapshot(items: &[(u64, &str, bool)]) -> String {
        let records: Vec<serde_json::Value> = items
            .iter()
            .map(|(id, text, completed)| {
                serde_json::json!({
                    "id": id,
                    "text": text,
                    "completed": completed,
                    "createdAt": "2025-05-01T09:00:00Z",
                })
            })
            .collect();
        serde_json::Value::Array(records).to_string()
    }

    #[test]
    fn external_change_replaces_collection_without_writing() {
        let (mut store, storage) = store();
        store.subscribe();
        store.add("a", None);
        let writes = storage.write_count();

        storage.external_write("todos", &snapshot(&[(10, "x", false), (11, "y", true)]));
        assert_eq!(store.sync_external(), 1);
        assert_eq!(texts(&store), vec!["x", "y"]);
        assert_eq!(storage.write_count(), writes);

        let next = store.add("z", None).unwrap();
        assert!(next.id > TodoId(11));
    }

    #[test]
    fn malformed_external_change_is_ignored() {
        let (mut store, storage) = store();
        store.subscribe();
        store.add("a", None);
        storage.external_write("todos", "garbage");
        assert_eq!(store.sync_external(), 0);
        assert_eq!(texts(&store), vec!["a"]);
    }

    #[test]
    fn external_removal_is_ignored() {
        let (mut store, storage) = store();
        store.subscribe();
        store.add("a", None);
        storage.external_remove("todos");
        assert_eq!(store.sync_external(), 0);
        assert_eq!(texts(&store), vec!["a"]);
    }

    #[test]
    fn unwatched_store_sees_no_external_changes() {
        let (mut store, storage) = store();
        storage.external_write("todos", &snapshot(&[(10, "x", false)]));
        assert_eq!(store.sync_external(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn external_change_keeps_record_under_edit() {
        let (mut store, storage) = store();
        store.subscribe();
        let a = store.add("a", None).unwrap().id;
        store.add("b", None);
        store.start_edit(a);
        store.update_draft("a edited");

        // other writer renamed and completed `a`, and added `c`
        storage.external_write(
            "todos",
            &snapshot(&[(a.0, "a remote", true), (2, "b", false), (3, "c", false)]),
        );
        store.sync_external();

        assert_eq!(texts(&store), vec!["a", "b", "c"]);
        assert!(!store.get(a).unwrap().completed);
        assert_eq!(store.edit_session().draft(), Some("a edited"));

        assert!(store.commit_edit());
        assert_eq!(store.get(a).unwrap().text, "a edited");
    }

    #[test]
    fn external_delete_of_edited_record_keeps_it_in_place() {
        let (mut store, storage) = store();
        store.subscribe();
        store.add("a", None);
        let b = store.add("b", None).unwrap().id;
        store.add("c", None);
        store.start_edit(b);

        storage.external_write("todos", &snapshot(&[(1, "a", false), (3, "c", false)]));
        store.sync_external();

        assert_eq!(texts(&store), vec!["a", "b", "c"]);
        assert_eq!(store.edit_session().target(), Some(b));
    }
}
