pub mod in_memory;
pub mod sql;

use async_trait::async_trait;

use crate::{entities::order::Order, errors::StoreError};

/// A page over the id-ordered table. A missing or non-positive `limit` means
/// no limit; a negative `offset` counts as 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListOrdersQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// CRUD access to stored orders, keyed by the integer id storage assigns.
///
/// `save` covers both create and update. An order whose id matches a stored
/// row replaces that row in full. Any other order (no id, or an id with no
/// row) is inserted under a fresh storage-assigned id; the caller's id is
/// never written.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn save(&self, order: Order) -> Result<Order, StoreError>;
    async fn save_all(&self, orders: Vec<Order>) -> Result<Vec<Order>, StoreError>;
    /// Missing rows are `Ok(None)`, not an error.
    async fn find_by_id(&self, id: i32) -> Result<Option<Order>, StoreError>;
    async fn find_all(&self) -> Result<Vec<Order>, StoreError>;
    /// Ids with no row are skipped.
    async fn find_all_by_id(&self, ids: &[i32]) -> Result<Vec<Order>, StoreError>;
    async fn find_page(&self, q: ListOrdersQuery) -> Result<Vec<Order>, StoreError>;
    async fn exists_by_id(&self, id: i32) -> Result<bool, StoreError>;
    async fn count(&self) -> Result<i64, StoreError>;
    /// Deleting an id that was never stored is a no-op.
    async fn delete_by_id(&self, id: i32) -> Result<(), StoreError>;
    async fn delete_all_by_id(&self, ids: &[i32]) -> Result<(), StoreError>;
    async fn delete_all(&self) -> Result<(), StoreError>;
}
