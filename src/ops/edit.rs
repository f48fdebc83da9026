use crate::model::todo::TodoId;

/// Single-slot rename state machine.
///
/// The session only tracks the target and draft; the store decides what the
/// transitions mean for the collection (see `TodoStore::commit_edit`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EditSession {
    #[default]
    Idle,
    Editing { target: TodoId, draft: String },
}

/// Input events that end or continue an edit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditTrigger {
    /// Commit key
    Enter,
    /// Cancel key
    Escape,
    /// Input lost focus: saves, same as Enter
    Blur,
}

impl EditSession {
    /// Begin editing `target`. Any previous draft is discarded unsaved.
    pub fn start(&mut self, target: TodoId, current_text: &str) {
        *self = EditSession::Editing {
            target,
            draft: current_text.to_string(),
        };
    }

    /// Replace the draft verbatim. Returns false when idle.
    pub fn update_draft(&mut self, text: &str) -> bool {
        match self {
            EditSession::Editing { draft, .. } => {
                *draft = text.to_string();
                true
            }
            EditSession::Idle => false,
        }
    }

    /// End the session, handing back the target and draft if one was active.
    pub fn finish(&mut self) -> Option<(TodoId, String)> {
        match std::mem::take(self) {
            EditSession::Editing { target, draft } => Some((target, draft)),
            EditSession::Idle => None,
        }
    }

    pub fn target(&self) -> Option<TodoId> {
        match self {
            EditSession::Editing { target, .. } => Some(*target),
            EditSession::Idle => None,
        }
    }

    pub fn draft(&self) -> Option<&str> {
        match self {
            EditSession::Editing { draft, .. } => Some(draft),
            EditSession::Idle => None,
        }
    }

    pub fn is_editing(&self, id: TodoId) -> bool {
        self.target() == Some(id)
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, EditSession::Idle)
    }
}
