use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use server_api::{add_product, get_product, list_products, remove_product, ApiContext};
use shared::{
    domain::ProductId,
    error::{ApiError, ErrorCode},
    protocol::{NewProduct, ProductRecord},
};
use storage::Storage;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{error, info};

mod config;

use config::{load_settings, prepare_database_url};

#[derive(Clone)]
struct AppState {
    api: ApiContext,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let settings = load_settings();
    let database_url = prepare_database_url(&settings.database_url)?;
    let storage = Storage::new(&database_url).await.map_err(|err| {
        error!(
            %database_url,
            %err,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        err
    })?;
    let api = ApiContext { storage };

    let state = AppState { api };
    let app = build_router(Arc::new(state), settings.static_dir.as_deref());

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "catalog server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>, static_dir: Option<&str>) -> Router {
    let router = Router::new()
        .route("/healthz", get(healthz))
        .route("/product/add", post(http_add_product))
        .route("/product/allProducts", get(http_list_products))
        .route(
            "/product/:product_id",
            get(http_get_product).delete(http_delete_product),
        );

    // Unmatched paths fall through to the static catalog page, when configured.
    let router = match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    };

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

async fn healthz(
    State(state): State<Arc<AppState>>,
) -> Result<&'static str, (StatusCode, Json<ApiError>)> {
    state
        .api
        .storage
        .health_check()
        .await
        .map_err(|e| reject(ApiError::new(ErrorCode::Internal, e.to_string())))?;
    Ok("ok")
}

async fn http_add_product(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewProduct>,
) -> Result<Json<ProductRecord>, (StatusCode, Json<ApiError>)> {
    let record = add_product(&state.api, &req).await.map_err(reject)?;
    Ok(Json(record))
}

async fn http_list_products(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ProductRecord>>, (StatusCode, Json<ApiError>)> {
    let products = list_products(&state.api).await.map_err(reject)?;
    Ok(Json(products))
}

async fn http_get_product(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<i64>,
) -> Result<Json<ProductRecord>, (StatusCode, Json<ApiError>)> {
    let record = get_product(&state.api, ProductId(product_id))
        .await
        .map_err(reject)?;
    Ok(Json(record))
}

async fn http_delete_product(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<i64>,
) -> Result<StatusCode, (StatusCode, Json<ApiError>)> {
    remove_product(&state.api, ProductId(product_id))
        .await
        .map_err(reject)?;
    Ok(StatusCode::NO_CONTENT)
}

fn reject(err: ApiError) -> (StatusCode, Json<ApiError>) {
    let status = match &err.code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(err))
}
