pub mod library;
pub mod store;

pub use library::{REPRESENTATIONS_KEY, RepresentationLibrary};
pub use store::{KeyValueStore, MemoryStore, SqliteStore};
