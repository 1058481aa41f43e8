use async_trait::async_trait;

use crate::domain::Entity;
use crate::errors::ServiceError;
use crate::pagination::{Page, PageRequest};

/// Persistence contract consumed by CRUD services.
///
/// Implementations report concurrent modification as
/// `ServiceError::Conflict` and any other storage failure as
/// `ServiceError::Db`.
#[async_trait]
pub trait Repository<E: Entity>: Send + Sync {
    /// Filter representation understood by `find_page`.
    type Filter: Send;

    async fn find_by_key(&self, key: &E::Key) -> Result<Option<E>, ServiceError>;

    /// Insert or update; returns the stored state including generated fields.
    async fn save(&self, entity: E) -> Result<E, ServiceError>;

    /// Returns whether an entity was removed.
    async fn delete_by_key(&self, key: &E::Key) -> Result<bool, ServiceError>;

    async fn find_page(&self, filter: Self::Filter, page: &PageRequest) -> Result<Page<E>, ServiceError>;
}
