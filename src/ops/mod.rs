pub mod age;
pub mod compose;
pub mod edit;
pub mod stats;
pub mod store;

pub use compose::{compose, empty_message};
pub use edit::{EditSession, EditTrigger};
pub use stats::{Stats, stats};
pub use store::TodoStore;
