//! Service layer providing generic CRUD application services.
//! - `crud` holds the service contract and the generic engine.
//! - Persistence and DTO translation are delegated to `Repository` and `Mapper`.
//! - List calls combine a per-entity `FilterBuilder` with the paging/sorting
//!   policy in `pagination`.

pub mod errors;
pub mod domain;
pub mod pagination;
pub mod filter;
pub mod mapper;
pub mod repository;
pub mod crud;
pub mod storage;
pub mod upstream;
#[cfg(test)]
pub mod test_support;

pub use crud::{CrudAppService, CrudService, SimpleCrudService, SingleDtoCrudService};
pub use domain::Entity;
pub use errors::{ErrorKind, ServiceError};
pub use filter::{FilterBuilder, FilterFn, MatchAll, MatchAllFilter, Predicate};
pub use mapper::{Mapper, SimpleMapper, SimpleMapperAdapter};
pub use pagination::{
    Direction, ListInput, Page, PageRequest, PageResolver, PagedAndSortedResultRequest, PagedInput,
    PagedResultRequest, Sort, SortOrder, SortedInput, MAX_ROW_SPAN,
};
pub use repository::Repository;
