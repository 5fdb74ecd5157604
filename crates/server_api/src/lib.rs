use shared::{
    domain::ProductId,
    error::{ApiError, ErrorCode},
    protocol::{NewProduct, ProductRecord},
};
use storage::{Storage, StoredProduct};
use tracing::info;

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
}

/// Validates and stores a draft, returning the created record. The draft
/// is revalidated here: the client-side check is a courtesy, not a gate.
pub async fn add_product(ctx: &ApiContext, draft: &NewProduct) -> Result<ProductRecord, ApiError> {
    draft.validate()?;

    let stored = ctx
        .storage
        .insert_product(draft.name.trim(), draft.price, draft.image.trim())
        .await
        .map_err(internal)?;
    info!(product_id = stored.product_id.0, name = %stored.name, "product added");
    Ok(record_from(stored))
}

pub async fn list_products(ctx: &ApiContext) -> Result<Vec<ProductRecord>, ApiError> {
    let products = ctx.storage.list_products().await.map_err(internal)?;
    Ok(products.into_iter().map(record_from).collect())
}

pub async fn get_product(ctx: &ApiContext, product_id: ProductId) -> Result<ProductRecord, ApiError> {
    let stored = ctx
        .storage
        .load_product(product_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| ApiError::new(ErrorCode::NotFound, "product not found"))?;
    Ok(record_from(stored))
}

pub async fn remove_product(ctx: &ApiContext, product_id: ProductId) -> Result<(), ApiError> {
    let deleted = ctx
        .storage
        .delete_product(product_id)
        .await
        .map_err(internal)?;
    if !deleted {
        return Err(ApiError::new(ErrorCode::NotFound, "product not found"));
    }
    info!(product_id = product_id.0, "product removed");
    Ok(())
}

fn record_from(stored: StoredProduct) -> ProductRecord {
    ProductRecord {
        product_id: stored.product_id,
        name: stored.name,
        price: stored.price,
        image: stored.image,
        created_at: stored.created_at,
    }
}

fn internal(err: anyhow::Error) -> ApiError {
    ApiError::new(ErrorCode::Internal, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup() -> ApiContext {
        let storage = Storage::new("sqlite::memory:").await.expect("db");
        ApiContext { storage }
    }

    fn draft(name: &str, price: f64, image: &str) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            price,
            image: image.to_string(),
        }
    }

    #[tokio::test]
    async fn added_product_shows_up_in_listing() {
        let ctx = setup().await;
        let record = add_product(&ctx, &draft("Widget", 9.99, "w.png"))
            .await
            .expect("add");

        let products = list_products(&ctx).await.expect("list");
        assert_eq!(products, vec![record]);
    }

    #[tokio::test]
    async fn add_trims_name_and_image() {
        let ctx = setup().await;
        let record = add_product(&ctx, &draft("  Widget ", 9.99, " w.png "))
            .await
            .expect("add");
        assert_eq!(record.name, "Widget");
        assert_eq!(record.image, "w.png");
    }

    #[tokio::test]
    async fn invalid_draft_is_rejected_without_insert() {
        let ctx = setup().await;
        let err = add_product(&ctx, &draft("", 9.99, "w.png"))
            .await
            .expect_err("must fail");
        assert_eq!(err.code, ErrorCode::Validation);
        assert!(list_products(&ctx).await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn get_product_reports_not_found() {
        let ctx = setup().await;
        let err = get_product(&ctx, ProductId(7))
            .await
            .expect_err("must fail");
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn removed_product_leaves_the_listing() {
        let ctx = setup().await;
        let record = add_product(&ctx, &draft("Widget", 9.99, "w.png"))
            .await
            .expect("add");

        remove_product(&ctx, record.product_id).await.expect("remove");
        assert!(list_products(&ctx).await.expect("list").is_empty());

        let err = remove_product(&ctx, record.product_id)
            .await
            .expect_err("second remove must fail");
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
