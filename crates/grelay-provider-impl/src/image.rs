use std::sync::Arc;

use grelay_protocol::openai::ChatCompletionRequest;
use grelay_provider_core::{RelayError, RelayResult};
use grelay_transform::image::{ImageData, ResolvedImages, remote_image_urls, sniff_media_type};
use tracing::debug;

use crate::http_client::{ClientKind, HttpClientPool};

/// Downloads remote images so they can be inlined as base64.
#[derive(Debug, Clone)]
pub struct ImageFetcher {
    pool: Arc<HttpClientPool>,
}

impl ImageFetcher {
    pub fn new(pool: Arc<HttpClientPool>) -> Self {
        Self { pool }
    }

    /// Fetches every remote image the request references. Any failure fails
    /// the whole request.
    pub async fn resolve_all(
        &self,
        request: &ChatCompletionRequest,
        proxy: Option<&str>,
    ) -> RelayResult<ResolvedImages> {
        let mut images = ResolvedImages::new();
        for url in remote_image_urls(request) {
            let image = self.fetch(&url, proxy).await?;
            images.insert(url, image);
        }
        Ok(images)
    }

    pub async fn fetch(&self, url: &str, proxy: Option<&str>) -> RelayResult<ImageData> {
        let client = self.pool.client(ClientKind::Impatient, proxy)?;
        let fetch_failed = |err: wreq::Error| {
            RelayError::transport("image_fetch_failed", format!("fetch {url}: {err}"))
        };
        let resp = client.get(url).send().await.map_err(fetch_failed)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(RelayError::transport(
                "image_fetch_failed",
                format!("fetch {url}: status {status}"),
            ));
        }
        let declared = resp
            .headers()
            .get("content-type")
            .and_then(|value| value.to_str().ok())
            .map(media_type_of);
        let bytes = resp.bytes().await.map_err(fetch_failed)?;

        let media_type = declared
            .filter(|mime| mime.starts_with("image/"))
            .or_else(|| sniff_media_type(&bytes).map(str::to_string))
            .ok_or_else(|| {
                RelayError::invalid_request(
                    "invalid_image_data",
                    format!("{url} is not a recognised image"),
                )
            })?;
        debug!(event = "image_fetched", url = %url, media_type = %media_type, size = bytes.len());
        Ok(ImageData::from_bytes(media_type, &bytes))
    }
}

/// `image/png; charset=binary` → `image/png`.
fn media_type_of(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}
