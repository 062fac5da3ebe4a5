use async_trait::async_trait;
use futures_util::TryStreamExt;
use sqlx::sqlite::{Sqlite, SqliteConnection, SqlitePool, SqlitePoolOptions};
use sqlx::{Executor, QueryBuilder};

use crate::config::Config;
use crate::entities::order::Order;
use crate::errors::StoreError;
use crate::repositories::{ListOrdersQuery, OrderRepository};

// ids are `i32` in memory; the CHECK stops AUTOINCREMENT from handing out
// one that would not decode.
const CREATE_ORDERS: &str = r"
    CREATE TABLE IF NOT EXISTS orders (
        id        INTEGER PRIMARY KEY AUTOINCREMENT CHECK (id <= 2147483647),
        product   TEXT    NOT NULL,
        quantity  INTEGER NOT NULL,
        amount    INTEGER NOT NULL,
        processed BOOLEAN NOT NULL DEFAULT 0,
        total     INTEGER NOT NULL
    )
";

const ORDER_COLUMNS: &str = "id, product, quantity, amount, processed, total";

const INSERT_ORDER: &str = r"
    INSERT INTO orders (product, quantity, amount, processed, total)
    VALUES (?, ?, ?, ?, ?)
    RETURNING id, product, quantity, amount, processed, total
";

const UPDATE_ORDER: &str = r"
    UPDATE orders
    SET product = ?, quantity = ?, amount = ?, processed = ?, total = ?
    WHERE id = ?
    RETURNING id, product, quantity, amount, processed, total
";

/// `orders` table backed store over a SQLite pool.
#[derive(Clone)]
pub struct SqlOrderRepository {
    pool: SqlitePool,
}

impl SqlOrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &Config) -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await?;
        tracing::info!(
            max_connections = config.max_connections,
            "order store connected"
        );
        Ok(Self::new(pool))
    }

    /// Creates the `orders` table if it does not exist yet.
    pub async fn init_schema(&self) -> Result<(), StoreError> {
        self.pool.execute(CREATE_ORDERS).await?;
        tracing::info!("orders schema ready");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn insert_error(e: sqlx::Error) -> StoreError {
    match e.as_database_error() {
        Some(db) if db.is_check_violation() => StoreError::IdExhausted,
        _ => StoreError::Database(e),
    }
}

/// Overwrites the row `order.id` names, or inserts under a fresh id when
/// there is no such row.
async fn save_with(conn: &mut SqliteConnection, order: Order) -> Result<Order, StoreError> {
    let updated = match order.id {
        Some(id) => {
            sqlx::query_as::<Sqlite, Order>(UPDATE_ORDER)
                .bind(&order.product)
                .bind(order.quantity)
                .bind(order.amount)
                .bind(order.processed)
                .bind(order.total)
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?
        }
        None => None,
    };

    let saved = match updated {
        Some(saved) => saved,
        None => sqlx::query_as::<Sqlite, Order>(INSERT_ORDER)
            .bind(&order.product)
            .bind(order.quantity)
            .bind(order.amount)
            .bind(order.processed)
            .bind(order.total)
            .fetch_one(&mut *conn)
            .await
            .map_err(insert_error)?,
    };

    tracing::debug!(order_id = ?saved.id, requested_id = ?order.id, "order saved");
    Ok(saved)
}

#[async_trait]
impl OrderRepository for SqlOrderRepository {
    async fn save(&self, order: Order) -> Result<Order, StoreError> {
        let mut conn = self.pool.acquire().await?;
        save_with(&mut conn, order).await
    }

    async fn save_all(&self, orders: Vec<Order>) -> Result<Vec<Order>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let mut saved = Vec::with_capacity(orders.len());
        for order in orders {
            // an early return drops `tx`, which rolls the batch back
            saved.push(save_with(&mut tx, order).await?);
        }
        tx.commit().await?;
        Ok(saved)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Order>, StoreError> {
        let order = sqlx::query_as::<Sqlite, Order>(
            "SELECT id, product, quantity, amount, processed, total FROM orders WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        if order.is_none() {
            tracing::debug!(order_id = id, "order not found");
        }
        Ok(order)
    }

    async fn find_all(&self) -> Result<Vec<Order>, StoreError> {
        let orders: Vec<Order> = sqlx::query_as::<Sqlite, Order>(
            "SELECT id, product, quantity, amount, processed, total FROM orders ORDER BY id",
        )
        .fetch(&self.pool)
        .try_collect()
        .await?;
        Ok(orders)
    }

    async fn find_all_by_id(&self, ids: &[i32]) -> Result<Vec<Order>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id IN ("
        ));
        let mut list = qb.separated(", ");
        for id in ids {
            list.push_bind(*id);
        }
        list.push_unseparated(") ORDER BY id");

        let orders = qb.build_query_as::<Order>().fetch_all(&self.pool).await?;
        Ok(orders)
    }

    async fn find_page(&self, q: ListOrdersQuery) -> Result<Vec<Order>, StoreError> {
        // SQLite reads a negative LIMIT as unbounded
        let limit = q.limit.filter(|&l| l > 0).unwrap_or(-1);
        let offset = q.offset.unwrap_or(0).max(0);

        let orders = sqlx::query_as::<Sqlite, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY id LIMIT ? OFFSET ?"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(orders)
    }

    async fn exists_by_id(&self, id: i32) -> Result<bool, StoreError> {
        let found =
            sqlx::query_scalar::<Sqlite, i64>("SELECT EXISTS(SELECT 1 FROM orders WHERE id = ?)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        Ok(found != 0)
    }

    async fn count(&self) -> Result<i64, StoreError> {
        let n = sqlx::query_scalar::<Sqlite, i64>("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }

    async fn delete_by_id(&self, id: i32) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM orders WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        tracing::debug!(
            order_id = id,
            rows = result.rows_affected(),
            "order delete"
        );
        Ok(())
    }

    async fn delete_all_by_id(&self, ids: &[i32]) -> Result<(), StoreError> {
        if ids.is_empty() {
            return Ok(());
        }
        let mut qb = QueryBuilder::<Sqlite>::new("DELETE FROM orders WHERE id IN (");
        let mut list = qb.separated(", ");
        for id in ids {
            list.push_bind(*id);
        }
        list.push_unseparated(")");

        let result = qb.build().execute(&self.pool).await?;
        tracing::debug!(
            requested = ids.len(),
            rows = result.rows_affected(),
            "orders delete"
        );
        Ok(())
    }

    async fn delete_all(&self) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM orders")
            .execute(&self.pool)
            .await?;
        tracing::info!(rows = result.rows_affected(), "orders cleared");
        Ok(())
    }
}
