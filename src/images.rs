//! Preview image lookup for dishes and places

use anyhow::Result;
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::cache::Cache;
use crate::config::ImageConfig;
use crate::http::{USER_AGENT, build_client, trim_base_url};

/// Finds a thumbnail URL for a free-text query
#[async_trait]
pub trait ImageSearch: Send + Sync {
    async fn thumbnail(&self, query: &str) -> Option<String>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<Photo>,
}

#[derive(Debug, Deserialize)]
struct Photo {
    urls: PhotoUrls,
}

#[derive(Debug, Deserialize)]
struct PhotoUrls {
    small: String,
}

/// Unsplash photo search client
pub struct UnsplashClient {
    client: ClientWithMiddleware,
    base_url: String,
    api_key: Option<String>,
    cache: Cache,
    cache_ttl: Duration,
}

impl UnsplashClient {
    pub fn new(config: &ImageConfig, cache: Cache) -> Result<Self> {
        let client = build_client(
            Duration::from_secs(config.timeout_seconds.into()),
            0,
            USER_AGENT,
        )?;
        Ok(Self {
            client,
            base_url: trim_base_url(&config.base_url),
            api_key: config.api_key.clone(),
            cache,
            cache_ttl: config.cache_ttl(),
        })
    }

    async fn search(&self, api_key: &str, query: &str) -> Result<Option<String>> {
        let url = format!(
            "{}/search/photos?query={}&per_page=1",
            self.base_url,
            urlencoding::encode(query)
        );
        let response: SearchResponse = self
            .client
            .get(&url)
            .header("Authorization", format!("Client-ID {api_key}"))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response.results.into_iter().next().map(|photo| photo.urls.small))
    }
}

#[async_trait]
impl ImageSearch for UnsplashClient {
    #[instrument(skip(self))]
    async fn thumbnail(&self, query: &str) -> Option<String> {
        let api_key = self.api_key.as_deref()?;
        let key = format!("image:{}", query.trim().to_lowercase());

        match self.cache.get::<Option<String>>(&key).await {
            Ok(Some(cached)) => return cached,
            Ok(None) => {}
            Err(e) => warn!("Image cache read failed: {:#}", e),
        }

        // Timeouts land here too
        match self.search(api_key, query).await {
            Ok(url) => {
                if let Err(e) = self.cache.put(&key, url.clone(), self.cache_ttl).await {
                    warn!("Image cache write failed: {:#}", e);
                }
                url
            }
            Err(e) => {
                debug!("No image for '{}': {:#}", query, e);
                None
            }
        }
    }
}

/// Image search that never finds anything
pub struct NoImages;

#[async_trait]
impl ImageSearch for NoImages {
    async fn thumbnail(&self, _query: &str) -> Option<String> {
        None
    }
}
