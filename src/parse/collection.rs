use std::collections::HashSet;

use crate::model::todo::{Todo, TodoId, normalize_text};

/// Why a persisted payload could not be used
#[derive(Debug, thiserror::Error)]
pub enum CollectionError {
    #[error("invalid todo payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("todo {0} has empty text")]
    EmptyText(TodoId),
    #[error("duplicate todo id {0}")]
    DuplicateId(TodoId),
    #[error("todo id {0} is out of range")]
    IdOutOfRange(TodoId),
}

/// Parse a serialized collection (ordered JSON array of todo records).
///
/// The whole payload is rejected if any record is unusable; callers keep
/// whatever state they already had.
pub fn parse_collection(text: &str) -> Result<Vec<Todo>, CollectionError> {
    let raw: Vec<Todo> = serde_json::from_str(text)?;
    let mut seen = HashSet::with_capacity(raw.len());
    let mut todos = Vec::with_capacity(raw.len());
    for mut todo in raw {
        // The largest id leaves no successor to allocate
        if todo.id == TodoId::MAX {
            return Err(CollectionError::IdOutOfRange(todo.id));
        }
        if !seen.insert(todo.id) {
            return Err(CollectionError::DuplicateId(todo.id));
        }
        todo.text = normalize_text(&todo.text).ok_or(CollectionError::EmptyText(todo.id))?;
        todos.push(todo);
    }
    Ok(todos)
}

/// Serialize a collection in order, as written to storage.
pub fn serialize_collection<'a>(
    todos: impl IntoIterator<Item = &'a Todo>,
) -> Result<String, serde_json::Error> {
    let records: Vec<&Todo> = todos.into_iter().collect();
    serde_json::to_string_pretty(&records)
}
