use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::Client;

use kaleido_core::error::AppError;
use kaleido_core::retry::{RetryConfig, retry_transient};
use kaleido_core::traits::{ImageOrigin, ImageStore};

use crate::config::render;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Hot entries kept in process; the blob store below has no bound.
const HOT_CACHE_CAPACITY: u64 = 256;

/// Read-through image cache: moka hot layer, then blob store, then origin.
///
/// On a full miss the origin body is buffered once and that same buffer is
/// both persisted and returned, so the caller never races the store writer
/// for the response bytes.
#[derive(Clone)]
pub struct ImageService<S, O> {
    store: S,
    origin: O,
    /// URL template with an `{id}` placeholder.
    image_url: String,
    hot: Cache<String, Arc<Vec<u8>>>,
    retry: RetryConfig,
}

impl<S: ImageStore, O: ImageOrigin> ImageService<S, O> {
    pub fn new(store: S, origin: O, image_url: impl Into<String>) -> Self {
        Self {
            store,
            origin,
            image_url: image_url.into(),
            hot: Cache::new(HOT_CACHE_CAPACITY),
            retry: RetryConfig::default(),
        }
    }

    /// Cached bytes for an effect image, fetching and persisting on first use.
    pub async fn get_image(&self, id: &str) -> Result<Arc<Vec<u8>>, AppError> {
        if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(AppError::InvalidInput(format!("invalid effect id: {id:?}")));
        }

        let key = format!("images/{id}.jpg");

        if let Some(bytes) = self.hot.get(&key).await {
            return Ok(bytes);
        }

        if let Some(bytes) = self.store.get(&key).await? {
            let bytes = Arc::new(bytes);
            self.hot.insert(key, bytes.clone()).await;
            return Ok(bytes);
        }

        let url = render(&self.image_url, &[("id", id)]);
        let bytes = retry_transient(&self.retry, "image origin fetch", || {
            self.origin.fetch(&url)
        })
        .await?;

        self.store.put(&key, &bytes).await?;
        tracing::info!(id, size = bytes.len(), "cached origin image");

        let bytes = Arc::new(bytes);
        self.hot.insert(key, bytes.clone()).await;
        Ok(bytes)
    }
}

/// Origin fetcher for portal CDN images, using reqwest.
#[derive(Clone)]
pub struct ReqwestImageOrigin {
    client: Client,
    timeout_secs: u64,
}

impl ReqwestImageOrigin {
    pub fn new() -> Result<Self, AppError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::HttpError(e.to_string()))?;

        Ok(Self {
            client,
            timeout_secs: timeout.as_secs(),
        })
    }
}

impl ImageOrigin for ReqwestImageOrigin {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, AppError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                AppError::Timeout(self.timeout_secs)
            } else if e.is_connect() {
                AppError::NetworkError(format!("Connection failed: {e}"))
            } else {
                AppError::HttpError(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::HttpError(format!(
                "HTTP {} for {url}",
                status.as_u16()
            )));
        }

        response
            .bytes()
            .await
            .map(|bytes| bytes.to_vec())
            .map_err(|e| AppError::HttpError(format!("Failed to read image body: {e}")))
    }
}
