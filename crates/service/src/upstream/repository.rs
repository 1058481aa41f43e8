use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, Order, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use models::upstream;

use crate::domain::Entity;
use crate::errors::ServiceError;
use crate::pagination::{Direction, Page, PageRequest};
use crate::repository::Repository;

impl Entity for upstream::Model {
    type Key = Uuid;
    const NAME: &'static str = "upstream";

    fn key(&self) -> &Uuid { &self.id }

    fn version(&self) -> Option<i64> { Some(self.version) }

    fn set_version(&mut self, version: i64) { self.version = version; }
}

fn active_model(m: &upstream::Model) -> upstream::ActiveModel {
    upstream::ActiveModel {
        id: Set(m.id),
        name: Set(m.name.clone()),
        base_url: Set(m.base_url.clone()),
        health_url: Set(m.health_url.clone()),
        active: Set(m.active),
        version: Set(m.version),
        created_at: Set(m.created_at),
        updated_at: Set(m.updated_at),
    }
}

fn stale(id: Uuid, expected: i64) -> ServiceError {
    ServiceError::conflict(format!("upstream {} was modified concurrently (expected version {})", id, expected))
}

/// SeaORM-backed repository implementation.
///
/// Updates are guarded by the `version` column, so a save based on a stale
/// read fails with `ServiceError::Conflict` instead of overwriting.
pub struct SeaOrmUpstreamRepository {
    pub db: DatabaseConnection,
}

impl SeaOrmUpstreamRepository {
    pub fn new(db: DatabaseConnection) -> Self { Self { db } }
}

#[async_trait]
impl Repository<upstream::Model> for SeaOrmUpstreamRepository {
    type Filter = Condition;

    async fn find_by_key(&self, key: &Uuid) -> Result<Option<upstream::Model>, ServiceError> {
        Ok(upstream::Entity::find_by_id(*key).one(&self.db).await?)
    }

    async fn save(&self, mut entity: upstream::Model) -> Result<upstream::Model, ServiceError> {
        let now: DateTimeWithTimeZone = Utc::now().into();
        let existing = upstream::Entity::find_by_id(entity.id).one(&self.db).await?;
        match existing {
            None => {
                entity.version = 1;
                entity.created_at = now;
                entity.updated_at = now;
                Ok(active_model(&entity).insert(&self.db).await?)
            }
            Some(current) => {
                let expected = entity.version;
                if current.version != expected {
                    return Err(stale(entity.id, expected));
                }
                entity.version = expected + 1;
                entity.created_at = current.created_at;
                entity.updated_at = now;
                let result = upstream::Entity::update_many()
                    .set(active_model(&entity))
                    .filter(upstream::Column::Id.eq(entity.id))
                    .filter(upstream::Column::Version.eq(expected))
                    .exec(&self.db)
                    .await?;
                // Another writer got in between the read above and this update.
                if result.rows_affected == 0 {
                    return Err(stale(entity.id, expected));
                }
                Ok(entity)
            }
        }
    }

    async fn delete_by_key(&self, key: &Uuid) -> Result<bool, ServiceError> {
        let result = upstream::Entity::delete_by_id(*key).exec(&self.db).await?;
        Ok(result.rows_affected > 0)
    }

    async fn find_page(&self, filter: Condition, page: &PageRequest) -> Result<Page<upstream::Model>, ServiceError> {
        let mut select = upstream::Entity::find().filter(filter);
        for order in page.sort.orders() {
            let column = upstream::Column::from_str(&order.property)
                .map_err(|_| ServiceError::validation(format!("upstream cannot be sorted by '{}'", order.property)))?;
            let direction = match order.direction {
                Direction::Asc => Order::Asc,
                Direction::Desc => Order::Desc,
            };
            select = select.order_by(column, direction);
        }
        let total = select.clone().count(&self.db).await?;
        let items = select.offset(page.offset()).limit(page.page_size).all(&self.db).await?;
        Ok(Page::new(items, total, page))
    }
}
