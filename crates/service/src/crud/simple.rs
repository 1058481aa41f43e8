//! Narrowed forms of `CrudService` for the common shapes.

use std::sync::Arc;

use crate::crud::CrudService;
use crate::domain::Entity;
use crate::filter::FilterBuilder;
use crate::mapper::{SimpleMapper, SimpleMapperAdapter};
use crate::pagination::{ListInput, PagedAndSortedResultRequest};
use crate::repository::Repository;

/// One DTO for get, list, create and update.
pub type SingleDtoCrudService<E, R, M, F, L> = CrudService<E, R, SimpleMapperAdapter<E, M>, F, L>;

/// Single DTO with the standard paged and sorted list input.
pub type SimpleCrudService<E, R, M, F> = SingleDtoCrudService<E, R, M, F, PagedAndSortedResultRequest>;

impl<E, R, M, F, L> CrudService<E, R, SimpleMapperAdapter<E, M>, F, L>
where
    E: Entity,
    R: Repository<E>,
    M: SimpleMapper<E>,
    F: FilterBuilder<L, Filter = R::Filter>,
    L: ListInput + Send + Sync + 'static,
{
    pub fn with_simple_mapper(repo: Arc<R>, mapper: M, filter: F) -> Self {
        Self::new(repo, SimpleMapperAdapter::new(mapper), filter)
    }
}
