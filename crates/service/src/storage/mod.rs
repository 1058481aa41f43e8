//! Storage backends for the service layer that need no external database.

pub mod memory;

pub use memory::{InMemoryRepository, Sortable};
