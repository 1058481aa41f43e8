//! Upstream registry exposed through the generic CRUD service over SeaORM.

pub mod repository;
pub mod service;

pub use repository::SeaOrmUpstreamRepository;
pub use service::{
    upstream_app_service, CreateUpstream, UpdateUpstream, UpstreamAppService, UpstreamDto, UpstreamFilter,
    UpstreamListInput, UpstreamListItem, UpstreamMapper,
};
