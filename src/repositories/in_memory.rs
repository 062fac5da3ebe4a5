use crate::entities::order::Order;
use crate::errors::StoreError;
use crate::repositories::{ListOrdersQuery, OrderRepository};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone, Default)]
struct Table {
    rows: BTreeMap<i32, Order>,
    last_id: i32,
}

impl Table {
    fn save(&mut self, mut order: Order) -> Result<Order, StoreError> {
        let id = match order.id.filter(|id| self.rows.contains_key(id)) {
            Some(id) => id,
            None => {
                let id = self.last_id.checked_add(1).ok_or(StoreError::IdExhausted)?;
                self.last_id = id;
                id
            }
        };
        order.id = Some(id);
        self.rows.insert(id, order.clone());
        Ok(order)
    }
}

/// Process-local store with the same id semantics as the `orders` table:
/// ids count up from 1 and are never reused.
#[derive(Clone, Default)]
pub struct InMemoryOrderRepository {
    inner: Arc<RwLock<Table>>,
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn save(&self, order: Order) -> Result<Order, StoreError> {
        let mut table = self.inner.write().await;
        table.save(order)
    }

    async fn save_all(&self, orders: Vec<Order>) -> Result<Vec<Order>, StoreError> {
        let mut table = self.inner.write().await;
        // all or nothing, like the SQL backend's transaction
        let mut staged = table.clone();
        let saved = orders
            .into_iter()
            .map(|o| staged.save(o))
            .collect::<Result<Vec<_>, _>>()?;
        *table = staged;
        Ok(saved)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Order>, StoreError> {
        let table = self.inner.read().await;
        Ok(table.rows.get(&id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Order>, StoreError> {
        let table = self.inner.read().await;
        Ok(table.rows.values().cloned().collect())
    }

    async fn find_all_by_id(&self, ids: &[i32]) -> Result<Vec<Order>, StoreError> {
        let table = self.inner.read().await;
        Ok(table
            .rows
            .values()
            .filter(|o| o.id.is_some_and(|id| ids.contains(&id)))
            .cloned()
            .collect())
    }

    async fn find_page(&self, q: ListOrdersQuery) -> Result<Vec<Order>, StoreError> {
        let table = self.inner.read().await;
        let start = q.offset.unwrap_or(0).max(0) as usize;
        let items = table.rows.values().skip(start);
        Ok(match q.limit.filter(|&l| l > 0) {
            Some(l) => items.take(l as usize).cloned().collect(),
            None => items.cloned().collect(),
        })
    }

    async fn exists_by_id(&self, id: i32) -> Result<bool, StoreError> {
        let table = self.inner.read().await;
        Ok(table.rows.contains_key(&id))
    }

    async fn count(&self) -> Result<i64, StoreError> {
        let table = self.inner.read().await;
        Ok(table.rows.len() as i64)
    }

    async fn delete_by_id(&self, id: i32) -> Result<(), StoreError> {
        let mut table = self.inner.write().await;
        table.rows.remove(&id);
        Ok(())
    }

    async fn delete_all_by_id(&self, ids: &[i32]) -> Result<(), StoreError> {
        let mut table = self.inner.write().await;
        for id in ids {
            table.rows.remove(id);
        }
        Ok(())
    }

    async fn delete_all(&self) -> Result<(), StoreError> {
        let mut table = self.inner.write().await;
        table.rows.clear();
        Ok(())
    }
}
