use std::{cmp::Ordering, collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::Entity;
use crate::errors::ServiceError;
use crate::filter::Predicate;
use crate::pagination::{Direction, Page, PageRequest, Sort};
use crate::repository::Repository;

/// Field-level ordering for entities kept in an `InMemoryRepository`.
pub trait Sortable: Entity {
    /// Properties accepted in a sort, besides `KEY_FIELD`.
    const SORT_FIELDS: &'static [&'static str];

    /// Only called with properties listed in `SORT_FIELDS`.
    fn compare_by(&self, other: &Self, property: &str) -> Ordering;
}

/// Process-local repository over a key-ordered map.
///
/// Filters are `Predicate`s. Versioned entities are checked on save: a stale
/// version is a conflict, and every successful save bumps the version.
pub struct InMemoryRepository<E: Entity> {
    inner: Arc<RwLock<BTreeMap<E::Key, E>>>,
}

impl<E: Entity> Clone for InMemoryRepository<E> {
    fn clone(&self) -> Self { Self { inner: Arc::clone(&self.inner) } }
}

impl<E: Entity> Default for InMemoryRepository<E> {
    fn default() -> Self { Self { inner: Arc::new(RwLock::new(BTreeMap::new())) } }
}

impl<E: Entity> InMemoryRepository<E> {
    pub fn new() -> Self { Self::default() }

    pub async fn len(&self) -> usize { self.inner.read().await.len() }

    pub async fn is_empty(&self) -> bool { self.inner.read().await.is_empty() }
}

fn compare<E: Sortable>(a: &E, b: &E, sort: &Sort) -> Ordering {
    for order in sort.orders() {
        let ord = if order.property == E::KEY_FIELD {
            a.key().cmp(b.key())
        } else {
            a.compare_by(b, &order.property)
        };
        let ord = match order.direction {
            Direction::Asc => ord,
            Direction::Desc => ord.reverse(),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

#[async_trait]
impl<E: Sortable + Clone> Repository<E> for InMemoryRepository<E> {
    type Filter = Predicate<E>;

    async fn find_by_key(&self, key: &E::Key) -> Result<Option<E>, ServiceError> {
        Ok(self.inner.read().await.get(key).cloned())
    }

    async fn save(&self, mut entity: E) -> Result<E, ServiceError> {
        let mut map = self.inner.write().await;
        if let Some(incoming) = entity.version() {
            let stored = map.get(entity.key()).and_then(|e| e.version());
            if let Some(current) = stored {
                if current != incoming {
                    return Err(ServiceError::conflict(format!(
                        "{} {:?} was modified concurrently (expected version {}, found {})",
                        E::NAME,
                        entity.key(),
                        incoming,
                        current
                    )));
                }
            }
            entity.set_version(stored.map_or(1, |v| v + 1));
        }
        map.insert(entity.key().clone(), entity.clone());
        Ok(entity)
    }

    async fn delete_by_key(&self, key: &E::Key) -> Result<bool, ServiceError> {
        Ok(self.inner.write().await.remove(key).is_some())
    }

    async fn find_page(&self, filter: Predicate<E>, page: &PageRequest) -> Result<Page<E>, ServiceError> {
        if let Some(order) = page
            .sort
            .orders()
            .iter()
            .find(|o| o.property != E::KEY_FIELD && !E::SORT_FIELDS.contains(&o.property.as_str()))
        {
            return Err(ServiceError::validation(format!("{} cannot be sorted by '{}'", E::NAME, order.property)));
        }

        let mut matched: Vec<E> = {
            let map = self.inner.read().await;
            map.values().filter(|e| filter.test(e)).cloned().collect()
        };
        matched.sort_by(|a, b| compare(a, b, &page.sort));

        let total = matched.len() as u64;
        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let size = usize::try_from(page.page_size).unwrap_or(usize::MAX);
        let items = matched.into_iter().skip(offset).take(size).collect();
        Ok(Page::new(items, total, page))
    }
}
