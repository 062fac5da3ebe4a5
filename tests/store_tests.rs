use std::collections::HashSet;
use std::sync::Arc;

use order_service::{
    config::Config,
    entities::order::Order,
    repositories::{
        in_memory::InMemoryOrderRepository, sql::SqlOrderRepository, ListOrdersQuery,
        OrderRepository,
    },
};

async fn sql_store() -> Arc<dyn OrderRepository> {
    let repo = SqlOrderRepository::connect(&Config {
        database_url: "sqlite::memory:".into(),
        max_connections: 1,
    })
    .await
    .unwrap();
    repo.init_schema().await.unwrap();
    Arc::new(repo)
}

fn memory_store() -> Arc<dyn OrderRepository> {
    Arc::new(InMemoryOrderRepository::default())
}

async fn stores() -> Vec<(&'static str, Arc<dyn OrderRepository>)> {
    vec![("sql", sql_store().await), ("in_memory", memory_store())]
}

#[tokio::test]
async fn widget_lifecycle() {
    for (name, orders) in stores().await {
        let created = orders
            .save(Order::new("Widget", 3, 10, false, 30))
            .await
            .unwrap();
        assert_eq!(created.id, Some(1), "{name}");

        let fetched = orders.find_by_id(1).await.unwrap();
        assert_eq!(
            fetched,
            Some(Order {
                id: Some(1),
                product: "Widget".into(),
                quantity: 3,
                amount: 10,
                processed: false,
                total: 30,
            }),
            "{name}"
        );

        let mut update = created.clone();
        update.processed = true;
        let updated = orders.save(update).await.unwrap();
        assert_eq!(updated.id, Some(1), "{name}");

        let fetched = orders.find_by_id(1).await.unwrap().unwrap();
        assert!(fetched.processed, "{name}");
        assert_eq!(fetched.product, "Widget", "{name}");
        assert_eq!(fetched.total, 30, "{name}");

        orders.delete_by_id(1).await.unwrap();
        assert_eq!(orders.find_by_id(1).await.unwrap(), None, "{name}");
    }
}

#[tokio::test]
async fn save_assigns_unique_ids_and_keeps_them() {
    for (name, orders) in stores().await {
        let mut seen = HashSet::new();
        for i in 0..5 {
            let o = orders
                .save(Order::new(format!("item-{i}"), i, i, false, i))
                .await
                .unwrap();
            let id = o.id.unwrap();
            assert!(seen.insert(id), "{name}: id {id} reused");

            let again = orders.save(o.clone()).await.unwrap();
            assert_eq!(again.id, Some(id), "{name}");
        }
        assert_eq!(orders.count().await.unwrap(), 5, "{name}");
    }
}

#[tokio::test]
async fn find_missing_is_none_not_error() {
    for (name, orders) in stores().await {
        assert_eq!(orders.find_by_id(999).await.unwrap(), None, "{name}");
        assert!(!orders.exists_by_id(999).await.unwrap(), "{name}");
    }
}

#[tokio::test]
async fn delete_missing_leaves_rows_alone() {
    for (name, orders) in stores().await {
        let kept = orders
            .save(Order::new("Widget", 1, 2, false, 2))
            .await
            .unwrap();

        orders.delete_by_id(999).await.unwrap();

        assert_eq!(orders.find_all().await.unwrap(), vec![kept], "{name}");
    }
}

#[tokio::test]
async fn find_all_returns_every_saved_order() {
    for (name, orders) in stores().await {
        let input = vec![
            Order::new("Widget", 3, 10, false, 30),
            Order::new("Gadget", 2, 7, true, 14),
            Order::new("Sprocket", 0, 0, false, 0),
        ];
        let mut saved = Vec::new();
        for o in input {
            saved.push(orders.save(o).await.unwrap());
        }

        let mut all = orders.find_all().await.unwrap();
        all.sort_by_key(|o| o.id);
        saved.sort_by_key(|o| o.id);
        assert_eq!(all, saved, "{name}");
    }
}

#[tokio::test]
async fn fields_round_trip_through_storage() {
    for (name, orders) in stores().await {
        // total is stored as given, never recomputed from quantity and amount
        let saved = orders
            .save(Order::new("Odd lot", 4, 25, true, 1))
            .await
            .unwrap();
        let fetched = orders.find_by_id(saved.id.unwrap()).await.unwrap();
        assert_eq!(fetched, Some(saved), "{name}");
    }
}

#[tokio::test]
async fn save_all_keeps_input_order() {
    for (name, orders) in stores().await {
        let saved = orders
            .save_all(vec![
                Order::new("a", 1, 1, false, 1),
                Order::new("b", 2, 2, false, 4),
            ])
            .await
            .unwrap();

        let products: Vec<_> = saved.iter().map(|o| o.product.as_str()).collect();
        assert_eq!(products, ["a", "b"], "{name}");
        assert!(saved.iter().all(|o| o.id.is_some()), "{name}");
        assert_eq!(orders.count().await.unwrap(), 2, "{name}");
    }
}

#[tokio::test]
async fn delete_all_empties_store() {
    for (name, orders) in stores().await {
        orders
            .save_all(vec![
                Order::new("a", 1, 1, false, 1),
                Order::new("b", 1, 1, false, 1),
            ])
            .await
            .unwrap();

        orders.delete_all().await.unwrap();

        assert!(orders.find_all().await.unwrap().is_empty(), "{name}");
        assert_eq!(orders.count().await.unwrap(), 0, "{name}");
    }
}

#[tokio::test]
async fn reference_stub_for_missing_row_gets_storage_id() {
    for (name, orders) in stores().await {
        let saved = orders.save(Order::with_id(5)).await.unwrap();
        assert_eq!(saved.id, Some(1), "{name}");
        assert!(!orders.exists_by_id(5).await.unwrap(), "{name}");
    }
}

#[tokio::test]
async fn find_and_delete_by_id_lists() {
    for (name, orders) in stores().await {
        orders
            .save_all(vec![
                Order::new("a", 1, 1, false, 1),
                Order::new("b", 1, 1, false, 1),
                Order::new("c", 1, 1, false, 1),
            ])
            .await
            .unwrap();

        let found = orders.find_all_by_id(&[3, 1, 42]).await.unwrap();
        let mut ids: Vec<_> = found.iter().filter_map(|o| o.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, [1, 3], "{name}");
        assert!(orders.find_all_by_id(&[]).await.unwrap().is_empty(), "{name}");

        orders.delete_all_by_id(&[1, 3, 42]).await.unwrap();
        orders.delete_all_by_id(&[]).await.unwrap();
        let left: Vec<_> = orders
            .find_all()
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.product)
            .collect();
        assert_eq!(left, ["b"], "{name}");
    }
}

#[tokio::test]
async fn find_page_walks_id_order() {
    for (name, orders) in stores().await {
        for p in ["a", "b", "c", "d", "e"] {
            orders.save(Order::new(p, 1, 1, false, 1)).await.unwrap();
        }
        let page = |limit, offset| ListOrdersQuery { limit, offset };
        let products = |v: Vec<Order>| v.into_iter().map(|o| o.product).collect::<Vec<_>>();

        let first = orders.find_page(page(Some(2), None)).await.unwrap();
        assert_eq!(products(first), ["a", "b"], "{name}");

        let second = orders.find_page(page(Some(2), Some(2))).await.unwrap();
        assert_eq!(products(second), ["c", "d"], "{name}");

        let rest = orders.find_page(page(None, Some(3))).await.unwrap();
        assert_eq!(products(rest), ["d", "e"], "{name}");

        let unbounded = orders.find_page(page(Some(0), Some(-4))).await.unwrap();
        assert_eq!(unbounded.len(), 5, "{name}");

        let past_end = orders.find_page(page(Some(2), Some(10))).await.unwrap();
        assert!(past_end.is_empty(), "{name}");
    }
}
