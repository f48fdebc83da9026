pub mod collection;

pub use collection::{CollectionError, parse_collection, serialize_collection};
