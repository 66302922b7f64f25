//! Vector index: exact cosine search and persistence

mod flat;
mod persist;

pub use flat::{IndexEntry, VectorIndex};
pub use persist::{INDEX_FILE, PASSAGES_FILE};
