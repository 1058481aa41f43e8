use std::sync::Arc;

use chrono::Utc;
use configs::PagingConfig;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{ColumnTrait, Condition, DatabaseConnection};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use models::upstream;

use crate::crud::CrudService;
use crate::errors::ServiceError;
use crate::filter::FilterBuilder;
use crate::mapper::Mapper;
use crate::pagination::{ListInput, PageResolver, PagedInput, Sort, SortedInput, DEFAULT_PAGE_SIZE};
use crate::upstream::repository::SeaOrmUpstreamRepository;

/// Full view returned by get, create and update.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpstreamDto {
    pub id: Uuid,
    pub name: String,
    pub base_url: String,
    pub health_url: Option<String>,
    pub active: bool,
    pub version: i64,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

/// Row shape for list results.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpstreamListItem {
    pub id: Uuid,
    pub name: String,
    pub base_url: String,
    pub active: bool,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CreateUpstream {
    pub name: String,
    pub base_url: String,
    #[serde(default)]
    pub health_url: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool { true }

/// Partial update; absent fields keep their stored values.
///
/// An empty `health_url` clears it. When `version` is given it must match
/// the stored version or the update fails with a conflict.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateUpstream {
    pub name: Option<String>,
    pub base_url: Option<String>,
    pub health_url: Option<String>,
    pub active: Option<bool>,
    pub version: Option<i64>,
}

/// Paged, sorted list query with optional name / active filters.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct UpstreamListInput {
    pub page_index: u64,
    pub page_size: u64,
    pub sorting: Option<String>,
    /// Substring match on the name.
    pub name: Option<String>,
    pub active: Option<bool>,
}

impl Default for UpstreamListInput {
    fn default() -> Self {
        Self { page_index: 0, page_size: DEFAULT_PAGE_SIZE, sorting: None, name: None, active: None }
    }
}

impl PagedInput for UpstreamListInput {
    fn page_index(&self) -> u64 { self.page_index }
    fn page_size(&self) -> u64 { self.page_size }
}

impl SortedInput for UpstreamListInput {
    fn build_sort(&self) -> Result<Option<Sort>, ServiceError> { Sort::from_text(self.sorting.as_deref()) }
}

impl ListInput for UpstreamListInput {
    fn as_paged(&self) -> Option<&dyn PagedInput> { Some(self) }
    fn as_sorted(&self) -> Option<&dyn SortedInput> { Some(self) }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct UpstreamMapper;

impl Mapper<upstream::Model> for UpstreamMapper {
    type GetOutput = UpstreamDto;
    type ListOutput = UpstreamListItem;
    type CreateInput = CreateUpstream;
    type UpdateInput = UpdateUpstream;

    fn to_entity(&self, input: CreateUpstream) -> Result<upstream::Model, ServiceError> {
        upstream::validate_name(&input.name)?;
        upstream::validate_base_url(&input.base_url)?;
        let now: DateTimeWithTimeZone = Utc::now().into();
        Ok(upstream::Model {
            id: Uuid::now_v7(),
            name: input.name.trim().to_string(),
            base_url: input.base_url,
            health_url: input.health_url.filter(|h| !h.is_empty()),
            active: input.active,
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    fn merge_into_entity(&self, input: UpdateUpstream, entity: &mut upstream::Model) -> Result<(), ServiceError> {
        if let Some(n) = input.name {
            upstream::validate_name(&n)?;
            entity.name = n.trim().to_string();
        }
        if let Some(b) = input.base_url {
            upstream::validate_base_url(&b)?;
            entity.base_url = b;
        }
        if let Some(h) = input.health_url {
            entity.health_url = if h.is_empty() { None } else { Some(h) };
        }
        if let Some(a) = input.active { entity.active = a; }
        if let Some(v) = input.version { entity.version = v; }
        Ok(())
    }

    fn to_get_output(&self, m: &upstream::Model) -> UpstreamDto {
        UpstreamDto {
            id: m.id,
            name: m.name.clone(),
            base_url: m.base_url.clone(),
            health_url: m.health_url.clone(),
            active: m.active,
            version: m.version,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }

    fn to_list_output(&self, m: &upstream::Model) -> UpstreamListItem {
        UpstreamListItem { id: m.id, name: m.name.clone(), base_url: m.base_url.clone(), active: m.active }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct UpstreamFilter;

impl FilterBuilder<UpstreamListInput> for UpstreamFilter {
    type Filter = Condition;

    fn build_filter(&self, input: &UpstreamListInput) -> Condition {
        let name = input.name.as_deref().map(str::trim).filter(|n| !n.is_empty());
        Condition::all()
            .add_option(name.map(|n| upstream::Column::Name.contains(n)))
            .add_option(input.active.map(|a| upstream::Column::Active.eq(a)))
    }
}

pub type UpstreamAppService =
    CrudService<upstream::Model, SeaOrmUpstreamRepository, UpstreamMapper, UpstreamFilter, UpstreamListInput>;

/// Assemble the upstream service over `db` with the configured paging limits.
pub fn upstream_app_service(db: DatabaseConnection, paging: &PagingConfig) -> UpstreamAppService {
    CrudService::new(Arc::new(SeaOrmUpstreamRepository::new(db)), UpstreamMapper, UpstreamFilter)
        .with_resolver(PageResolver::from(paging))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crud::CrudAppService;
    use crate::test_support::get_db;

    async fn service() -> Result<UpstreamAppService, anyhow::Error> {
        let db = get_db().await?;
        Ok(upstream_app_service(db, &PagingConfig::default()))
    }

    fn create_input(name: &str) -> CreateUpstream {
        CreateUpstream {
            name: name.to_string(),
            base_url: format!("https://{}.example.com", name),
            health_url: None,
            active: true,
        }
    }

    #[tokio::test]
    async fn upstream_crud_service() -> Result<(), anyhow::Error> {
        let svc = service().await?;

        let created = svc.create(create_input("billing")).await?;
        assert_eq!(created.version, 1);
        let found = svc.get(created.id).await?;
        assert_eq!(found, created);

        let updated = svc
            .update(created.id, UpdateUpstream { name: Some("billing-v2".into()), ..Default::default() })
            .await?;
        assert_eq!(updated.name, "billing-v2");
        assert_eq!(updated.base_url, "https://billing.example.com");
        assert!(updated.active);
        assert_eq!(updated.version, 2);
        assert_eq!(updated.created_at, created.created_at);

        svc.delete(created.id).await?;
        assert!(svc.get(created.id).await.unwrap_err().is_not_found());
        // Second delete is a no-op.
        svc.delete(created.id).await?;
        Ok(())
    }

    #[tokio::test]
    async fn stale_version_is_a_conflict() -> Result<(), anyhow::Error> {
        let svc = service().await?;
        let created = svc.create(create_input("search")).await?;

        svc.update(created.id, UpdateUpstream { active: Some(false), version: Some(1), ..Default::default() })
            .await?;
        let err = svc
            .update(created.id, UpdateUpstream { active: Some(true), version: Some(1), ..Default::default() })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
        assert!(!svc.get(created.id).await?.active);
        Ok(())
    }

    #[tokio::test]
    async fn invalid_input_is_a_validation_failure() -> Result<(), anyhow::Error> {
        let svc = service().await?;
        let bad = CreateUpstream { base_url: "ftp://files".into(), ..create_input("files") };
        assert!(matches!(svc.create(bad).await, Err(ServiceError::Validation(_))));

        let created = svc.create(create_input("files")).await?;
        let err = svc
            .update(created.id, UpdateUpstream { base_url: Some("nope".into()), ..Default::default() })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        Ok(())
    }

    #[tokio::test]
    async fn update_of_missing_upstream_is_not_found() -> Result<(), anyhow::Error> {
        let svc = service().await?;
        let err = svc.update(Uuid::new_v4(), UpdateUpstream::default()).await.unwrap_err();
        assert!(err.is_not_found());
        Ok(())
    }

    #[tokio::test]
    async fn list_filters_sorts_and_pages() -> Result<(), anyhow::Error> {
        let svc = service().await?;
        for name in ["alpha", "beta", "gamma", "delta-api", "epsilon-api"] {
            svc.create(create_input(name)).await?;
        }
        let created = svc.create(create_input("zeta-api")).await?;
        svc.update(created.id, UpdateUpstream { active: Some(false), ..Default::default() }).await?;

        let page = svc
            .list(UpstreamListInput {
                name: Some("api".into()),
                active: Some(true),
                sorting: Some("name asc".into()),
                ..Default::default()
            })
            .await?;
        let names: Vec<&str> = page.items.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["delta-api", "epsilon-api"]);
        assert_eq!(page.total, 2);

        let first = svc
            .list(UpstreamListInput { page_size: 4, sorting: Some("name desc".into()), ..Default::default() })
            .await?;
        assert_eq!(first.total, 6);
        assert_eq!(first.items.len(), 4);
        assert!(first.has_next());
        assert_eq!(first.items[0].name, "zeta-api");

        let second = svc
            .list(UpstreamListInput { page_index: 1, page_size: 4, sorting: Some("name desc".into()), ..Default::default() })
            .await?;
        let names: Vec<&str> = second.items.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["beta", "alpha"]);
        Ok(())
    }

    #[tokio::test]
    async fn unknown_sort_column_is_rejected() -> Result<(), anyhow::Error> {
        let svc = service().await?;
        let err = svc
            .list(UpstreamListInput { sorting: Some("password".into()), ..Default::default() })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        Ok(())
    }

    #[tokio::test]
    async fn huge_paging_values_are_validation_failures() -> Result<(), anyhow::Error> {
        let svc = service().await?;
        svc.create(create_input("billing")).await?;

        for (page_index, page_size) in [(u64::MAX / 2, 10), (0, u64::MAX), (u64::MAX, u64::MAX)] {
            let err = svc
                .list(UpstreamListInput { page_index, page_size, ..Default::default() })
                .await
                .unwrap_err();
            assert!(matches!(err, ServiceError::Validation(_)), "{page_index} x {page_size}");
        }

        // Far past the end but still addressable: empty page, real total.
        let page = svc
            .list(UpstreamListInput { page_index: 1 << 40, page_size: 1 << 20, ..Default::default() })
            .await?;
        assert!(page.items.is_empty());
        assert_eq!(page.total, 1);
        assert!(!page.has_next());
        Ok(())
    }

    #[tokio::test]
    async fn default_order_is_newest_key_first() -> Result<(), anyhow::Error> {
        let svc = service().await?;
        let mut ids = Vec::new();
        for name in ["one", "two", "three"] {
            ids.push(svc.create(create_input(name)).await?.id);
        }
        let page = svc.list(UpstreamListInput::default()).await?;
        let listed: Vec<Uuid> = page.items.iter().map(|u| u.id).collect();
        let mut expected = ids.clone();
        expected.sort();
        expected.reverse();
        assert_eq!(listed, expected);
        Ok(())
    }
}
