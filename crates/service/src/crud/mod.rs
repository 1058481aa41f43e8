//! Generic CRUD application service.
//!
//! `CrudService` wires a repository, a mapper and a filter builder into the
//! five standard operations. Entity-specific services are instantiations of
//! it (see `simple` for the common narrowings).

pub mod simple;

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, instrument};

use crate::domain::Entity;
use crate::errors::ServiceError;
use crate::filter::FilterBuilder;
use crate::mapper::Mapper;
use crate::pagination::{ListInput, Page, PageResolver};
use crate::repository::Repository;

pub use simple::{SimpleCrudService, SingleDtoCrudService};

/// Uniform contract of a CRUD application service.
#[async_trait]
pub trait CrudAppService: Send + Sync {
    type Key: Send;
    type GetOutput: Send;
    type ListOutput: Send;
    type ListInput: Send;
    type CreateInput: Send;
    type UpdateInput: Send;

    /// Fails with `NotFound` when no entity has `key`.
    async fn get(&self, key: Self::Key) -> Result<Self::GetOutput, ServiceError>;

    async fn create(&self, input: Self::CreateInput) -> Result<Self::GetOutput, ServiceError>;

    /// Merges `input` into the stored entity; fails with `NotFound` when no
    /// entity has `key`.
    async fn update(&self, key: Self::Key, input: Self::UpdateInput) -> Result<Self::GetOutput, ServiceError>;

    /// Deleting a key that does not exist succeeds without effect.
    async fn delete(&self, key: Self::Key) -> Result<(), ServiceError>;

    async fn list(&self, input: Self::ListInput) -> Result<Page<Self::ListOutput>, ServiceError>;
}

/// Generic engine behind every CRUD service.
///
/// Holds only shared, immutable collaborators; each call is an independent
/// unit of work against the repository.
pub struct CrudService<E, R, M, F, L> {
    repo: Arc<R>,
    mapper: M,
    filter: F,
    resolver: PageResolver,
    _types: PhantomData<fn(&L) -> E>,
}

impl<E, R, M, F, L> CrudService<E, R, M, F, L>
where
    E: Entity,
    R: Repository<E>,
    M: Mapper<E>,
    F: FilterBuilder<L, Filter = R::Filter>,
    L: ListInput + Send + Sync + 'static,
{
    pub fn new(repo: Arc<R>, mapper: M, filter: F) -> Self {
        Self { repo, mapper, filter, resolver: PageResolver::default(), _types: PhantomData }
    }

    pub fn with_resolver(mut self, resolver: PageResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn repository(&self) -> &Arc<R> { &self.repo }

    pub fn mapper(&self) -> &M { &self.mapper }

    pub fn resolver(&self) -> &PageResolver { &self.resolver }

    async fn find_existing(&self, key: &E::Key) -> Result<E, ServiceError> {
        self.repo
            .find_by_key(key)
            .await?
            .ok_or_else(|| ServiceError::not_found(&format!("{} {:?}", E::NAME, key)))
    }
}

#[async_trait]
impl<E, R, M, F, L> CrudAppService for CrudService<E, R, M, F, L>
where
    E: Entity,
    R: Repository<E>,
    M: Mapper<E>,
    F: FilterBuilder<L, Filter = R::Filter>,
    L: ListInput + Send + Sync + 'static,
{
    type Key = E::Key;
    type GetOutput = M::GetOutput;
    type ListOutput = M::ListOutput;
    type ListInput = L;
    type CreateInput = M::CreateInput;
    type UpdateInput = M::UpdateInput;

    #[instrument(skip_all, fields(entity = E::NAME, key = ?key))]
    async fn get(&self, key: E::Key) -> Result<M::GetOutput, ServiceError> {
        let entity = self.find_existing(&key).await?;
        Ok(self.mapper.to_get_output(&entity))
    }

    #[instrument(skip_all, fields(entity = E::NAME))]
    async fn create(&self, input: M::CreateInput) -> Result<M::GetOutput, ServiceError> {
        let entity = self.mapper.to_entity(input)?;
        let saved = self.repo.save(entity).await?;
        info!(key = ?saved.key(), "entity_created");
        Ok(self.mapper.to_get_output(&saved))
    }

    #[instrument(skip_all, fields(entity = E::NAME, key = ?key))]
    async fn update(&self, key: E::Key, input: M::UpdateInput) -> Result<M::GetOutput, ServiceError> {
        let mut entity = self.find_existing(&key).await?;
        self.mapper.merge_into_entity(input, &mut entity)?;
        if entity.key() != &key {
            return Err(ServiceError::validation(format!("{} key cannot be changed by an update", E::NAME)));
        }
        let saved = self.repo.save(entity).await?;
        info!(version = ?saved.version(), "entity_updated");
        Ok(self.mapper.to_get_output(&saved))
    }

    #[instrument(skip_all, fields(entity = E::NAME, key = ?key))]
    async fn delete(&self, key: E::Key) -> Result<(), ServiceError> {
        if self.repo.delete_by_key(&key).await? {
            info!("entity_deleted");
        } else {
            debug!("delete_of_absent_key_ignored");
        }
        Ok(())
    }

    #[instrument(skip_all, fields(entity = E::NAME))]
    async fn list(&self, input: L) -> Result<Page<M::ListOutput>, ServiceError> {
        let filter = self.filter.build_filter(&input);
        let request = self.resolver.resolve::<E, L>(&input)?;
        debug!(page_index = request.page_index, page_size = request.page_size, sort = ?request.sort, "list_page_resolved");
        let page = self.repo.find_page(filter, &request).await?;
        debug!(total = page.total, returned = page.items.len(), "list_page_fetched");
        Ok(page.map(|entity| self.mapper.to_list_output(&entity)))
    }
}
