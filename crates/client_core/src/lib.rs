use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::StatusCode;
use shared::{
    domain::ProductId,
    error::{ApiError, ErrorCode, ValidationError},
    protocol::{NewProduct, ProductRecord},
};
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tracing::{error, warn};
use url::Url;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid server url: {0}")]
    InvalidServerUrl(#[from] url::ParseError),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server rejected request ({code:?}): {message}")]
    Api { code: ErrorCode, message: String },
    #[error("unexpected server status {0}")]
    UnexpectedStatus(StatusCode),
}

/// Typed HTTP client for the catalog server endpoints.
pub struct CatalogClient {
    http: reqwest::Client,
    server_url: String,
}

impl CatalogClient {
    pub fn new(server_url: impl AsRef<str>) -> std::result::Result<Self, ClientError> {
        let parsed = Url::parse(server_url.as_ref())?;
        Ok(Self {
            http: reqwest::Client::new(),
            server_url: parsed.as_str().trim_end_matches('/').to_string(),
        })
    }

    pub async fn add_product(
        &self,
        draft: &NewProduct,
    ) -> std::result::Result<ProductRecord, ClientError> {
        let response = self
            .http
            .post(format!("{}/product/add", self.server_url))
            .json(draft)
            .send()
            .await?;
        decode_json(response).await
    }

    pub async fn list_products(&self) -> std::result::Result<Vec<ProductRecord>, ClientError> {
        let response = self
            .http
            .get(format!("{}/product/allProducts", self.server_url))
            .send()
            .await?;
        decode_json(response).await
    }

    pub async fn remove_product(
        &self,
        product_id: ProductId,
    ) -> std::result::Result<(), ClientError> {
        let response = self
            .http
            .delete(format!("{}/product/{}", self.server_url, product_id.0))
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }
}

async fn decode_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> std::result::Result<T, ClientError> {
    let response = check_status(response).await?;
    Ok(response.json().await?)
}

/// Non-2xx responses carry the `ApiError` envelope; surface it as a typed
/// error rather than a bare status.
async fn check_status(
    response: reqwest::Response,
) -> std::result::Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    match response.json::<ApiError>().await {
        Ok(api) => Err(ClientError::Api {
            code: api.code,
            message: api.message,
        }),
        Err(_) => Err(ClientError::UnexpectedStatus(status)),
    }
}

/// Seam between the form controller and the catalog server, so tests can
/// substitute a double for the HTTP client.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn add_product(&self, draft: &NewProduct) -> Result<ProductRecord>;
    async fn list_products(&self) -> Result<Vec<ProductRecord>>;
    async fn remove_product(&self, product_id: ProductId) -> Result<()>;
}

#[async_trait]
impl CatalogApi for CatalogClient {
    async fn add_product(&self, draft: &NewProduct) -> Result<ProductRecord> {
        Ok(CatalogClient::add_product(self, draft).await?)
    }

    async fn list_products(&self) -> Result<Vec<ProductRecord>> {
        Ok(CatalogClient::list_products(self).await?)
    }

    async fn remove_product(&self, product_id: ProductId) -> Result<()> {
        Ok(CatalogClient::remove_product(self, product_id).await?)
    }
}

/// The three text controls of the add-product form, as entered by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub name: String,
    pub price: String,
    pub image: String,
}

impl FormState {
    /// Trims every field and applies the draft validity rules, in form
    /// order: name, price numeric and finite, price positive, image.
    pub fn parse(&self) -> std::result::Result<NewProduct, ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        let price: f64 = self
            .price
            .trim()
            .parse()
            .map_err(|_| ValidationError::InvalidPrice)?;
        let draft = NewProduct {
            name: name.to_string(),
            price,
            image: self.image.trim().to_string(),
        };
        draft.validate()?;
        Ok(draft)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone)]
pub enum ControllerEvent {
    /// A submission was blocked before any request was issued; the reason
    /// is the user-facing message.
    ValidationRejected { reason: String },
    ProductSubmitted { product: ProductRecord },
    ProductRemoved { product_id: ProductId },
    /// The rendered list was rebuilt from a fresh server fetch.
    ListRefreshed { products: Vec<ProductRecord> },
}

#[derive(Default)]
struct ControllerState {
    form: FormState,
    products: Vec<ProductRecord>,
}

/// Drives the add/list/delete flows of the product form. The server is the
/// sole source of truth: every mutation is followed by a full re-fetch, and
/// the rendered snapshot is replaced wholesale. Network failures are
/// diagnostic-only; validation failures surface as `ValidationRejected`.
pub struct ProductFormController {
    api: Arc<dyn CatalogApi>,
    inner: Mutex<ControllerState>,
    events: broadcast::Sender<ControllerEvent>,
}

impl ProductFormController {
    pub fn new(api: Arc<dyn CatalogApi>) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            api,
            inner: Mutex::new(ControllerState::default()),
            events,
        }
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events.subscribe()
    }

    pub async fn fill_form(&self, name: &str, price: &str, image: &str) {
        let mut guard = self.inner.lock().await;
        guard.form.name = name.to_string();
        guard.form.price = price.to_string();
        guard.form.image = image.to_string();
    }

    pub async fn form_snapshot(&self) -> FormState {
        self.inner.lock().await.form.clone()
    }

    /// The currently rendered list: one entry per fetched record, in fetch
    /// order.
    pub async fn products_snapshot(&self) -> Vec<ProductRecord> {
        self.inner.lock().await.products.clone()
    }

    /// Submits the current form. An invalid form emits `ValidationRejected`
    /// and issues no request. The form is cleared only once the server has
    /// confirmed the create, after which the list is refreshed exactly once.
    pub async fn submit_form(&self) {
        let parsed = {
            let guard = self.inner.lock().await;
            guard.form.parse()
        };
        let draft = match parsed {
            Ok(draft) => draft,
            Err(reason) => {
                warn!(%reason, "rejecting product submission");
                let _ = self.events.send(ControllerEvent::ValidationRejected {
                    reason: reason.to_string(),
                });
                return;
            }
        };

        match self.api.add_product(&draft).await {
            Ok(product) => {
                self.inner.lock().await.form.reset();
                let _ = self
                    .events
                    .send(ControllerEvent::ProductSubmitted { product });
                self.refresh_list().await;
            }
            Err(err) => {
                // Failed submissions keep the form contents for retry.
                error!(%err, "product submission failed");
            }
        }
    }

    /// Clears all form fields. Wired to the dedicated reset control; the
    /// post-submit clear goes through `FormState::reset` as well.
    pub async fn reset_form(&self) {
        self.inner.lock().await.form.reset();
    }

    /// Fetches the current collection; degrades to an empty collection on
    /// any failure instead of propagating the error.
    pub async fn fetch_all_products(&self) -> Vec<ProductRecord> {
        match self.api.list_products().await {
            Ok(products) => products,
            Err(err) => {
                error!(%err, "failed to fetch product list");
                Vec::new()
            }
        }
    }

    /// Rebuilds the rendered list from a fresh fetch and announces it.
    pub async fn refresh_list(&self) {
        let products = self.fetch_all_products().await;
        {
            let mut guard = self.inner.lock().await;
            guard.products = products.clone();
        }
        let _ = self.events.send(ControllerEvent::ListRefreshed { products });
    }

    /// Removes a product by its stable id and refreshes the list. The
    /// rendered position of an entry is never used as identity.
    pub async fn remove_product(&self, product_id: ProductId) {
        match self.api.remove_product(product_id).await {
            Ok(()) => {
                let _ = self
                    .events
                    .send(ControllerEvent::ProductRemoved { product_id });
                self.refresh_list().await;
            }
            Err(err) => {
                error!(%err, product_id = product_id.0, "failed to remove product");
            }
        }
    }
}

#[cfg(test)]
mod tests;
