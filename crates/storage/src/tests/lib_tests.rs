use super::super::*;

async fn memory_storage() -> Storage {
    Storage::new("sqlite::memory:").await.expect("db")
}

#[tokio::test]
async fn inserted_product_round_trips_through_list() {
    let storage = memory_storage().await;
    let stored = storage
        .insert_product("Widget", 9.99, "w.png")
        .await
        .expect("insert");

    let products = storage.list_products().await.expect("list");
    assert_eq!(products, vec![stored]);
}

#[tokio::test]
async fn list_is_ordered_by_id() {
    let storage = memory_storage().await;
    for name in ["first", "second", "third"] {
        storage
            .insert_product(name, 1.0, "img.png")
            .await
            .expect("insert");
    }

    let products = storage.list_products().await.expect("list");
    let names: Vec<&str> = products.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["first", "second", "third"]);
    assert!(products.windows(2).all(|w| w[0].product_id.0 < w[1].product_id.0));
}

#[tokio::test]
async fn ids_keep_increasing_after_a_delete() {
    let storage = memory_storage().await;
    let first = storage
        .insert_product("first", 1.0, "a.png")
        .await
        .expect("insert");
    let second = storage
        .insert_product("second", 2.0, "b.png")
        .await
        .expect("insert");

    assert!(storage
        .delete_product(second.product_id)
        .await
        .expect("delete"));

    let third = storage
        .insert_product("third", 3.0, "c.png")
        .await
        .expect("insert");
    assert!(third.product_id.0 > second.product_id.0);
    assert!(second.product_id.0 > first.product_id.0);
}

#[tokio::test]
async fn delete_reports_missing_rows() {
    let storage = memory_storage().await;
    let stored = storage
        .insert_product("Widget", 9.99, "w.png")
        .await
        .expect("insert");

    assert!(storage
        .delete_product(stored.product_id)
        .await
        .expect("delete"));
    assert!(!storage
        .delete_product(stored.product_id)
        .await
        .expect("second delete"));
    assert!(storage.list_products().await.expect("list").is_empty());
}

#[tokio::test]
async fn load_product_returns_none_for_unknown_id() {
    let storage = memory_storage().await;
    let loaded = storage
        .load_product(ProductId(42))
        .await
        .expect("load");
    assert!(loaded.is_none());
}

#[tokio::test]
async fn file_backed_database_persists_across_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("data").join("catalog.db");
    let url = format!("sqlite://{}", db_path.display());

    {
        let storage = Storage::new(&url).await.expect("first open");
        storage
            .insert_product("Widget", 9.99, "w.png")
            .await
            .expect("insert");
    }

    let reopened = Storage::new(&url).await.expect("reopen");
    let products = reopened.list_products().await.expect("list");
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].name, "Widget");
}

#[tokio::test]
async fn health_check_pings_the_pool() {
    let storage = memory_storage().await;
    storage.health_check().await.expect("ping");
}
