pub mod config;
pub mod todo;
pub mod view;

pub use config::*;
pub use todo::*;
pub use view::*;

/// Error for an unrecognized name given for an enumerated value
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: {value}")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

impl ParseEnumError {
    pub fn new(kind: &'static str, value: &str) -> Self {
        ParseEnumError {
            kind,
            value: value.to_string(),
        }
    }
}
