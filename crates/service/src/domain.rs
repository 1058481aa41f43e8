//! Identity contract shared by every entity managed through a CRUD service.

use std::fmt::Debug;

/// A persisted record identified by an orderable key.
pub trait Entity: Send + Sync + 'static {
    /// Unique within the collection and never changed after creation.
    type Key: Clone + Ord + Debug + Send + Sync + 'static;

    /// Human-readable name used in error messages and log fields.
    const NAME: &'static str;

    /// Property name of the key, used for the default ordering.
    const KEY_FIELD: &'static str = "id";

    fn key(&self) -> &Self::Key;

    /// Optimistic concurrency counter; `None` for unversioned entities.
    fn version(&self) -> Option<i64> { None }

    fn set_version(&mut self, _version: i64) {}
}
