use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One purchase order, stored as one row of the `orders` table.
///
/// `amount`, `quantity` and `total` are independent values supplied by the
/// caller; nothing ties them together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Order {
    /// Assigned by storage on first save, `None` before that.
    pub id: Option<i32>,
    pub product: String,
    pub quantity: i32,
    pub amount: i32,
    pub processed: bool,
    pub total: i32,
}

impl Order {
    pub fn new(
        product: impl Into<String>,
        quantity: i32,
        amount: i32,
        processed: bool,
        total: i32,
    ) -> Self {
        Self {
            id: None,
            product: product.into(),
            quantity,
            amount,
            processed,
            total,
        }
    }

    /// Reference stub carrying only an identifier.
    pub fn with_id(id: i32) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }
}
