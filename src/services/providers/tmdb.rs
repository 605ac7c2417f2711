//! TMDB metadata provider
//!
//! API Flow:
//! 1. Movies: /3/movie/{id} → genres + runtime
//! 2. Shows: /3/tv/{id} → genres + episode_run_time

use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{MediaType, TitleMetadata, TmdbTitleDetails},
    services::providers::MetadataProvider,
};
use reqwest::Client as HttpClient;

const METADATA_CACHE_TTL: u64 = 2_592_000; // 30 days

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    cache: Cache,
}

impl TmdbProvider {
    pub fn new(cache: Cache, api_key: String, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
            cache,
        }
    }

    fn details_url(&self, catalog_id: &str, media_type: MediaType) -> String {
        let segment = match media_type {
            MediaType::Movie => "movie",
            MediaType::Show => "tv",
        };
        format!(
            "{}/3/{}/{}",
            self.api_url.trim_end_matches('/'),
            segment,
            catalog_id
        )
    }
}

#[async_trait::async_trait]
impl MetadataProvider for TmdbProvider {
    async fn fetch_metadata(
        &self,
        catalog_id: &str,
        media_type: MediaType,
    ) -> AppResult<TitleMetadata> {
        if catalog_id.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Catalog id cannot be empty".to_string(),
            ));
        }

        let key = CacheKey::Metadata {
            media_type,
            catalog_id: catalog_id.to_string(),
        };

        cached!(
            self.cache,
            key,
            METADATA_CACHE_TTL,
            async move {
                let url = self.details_url(catalog_id, media_type);

                let response = self
                    .http_client
                    .get(&url)
                    .query(&[("api_key", self.api_key.as_str())])
                    .send()
                    .await?;

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    tracing::error!(
                        catalog_id = %catalog_id,
                        media_type = %media_type,
                        status = %status,
                        "TMDB request failed"
                    );
                    return Err(AppError::ExternalApi(format!(
                        "TMDB API returned status {}: {}",
                        status, body
                    )));
                }

                let details: TmdbTitleDetails = response.json().await?;
                let metadata = TitleMetadata::from(details);

                tracing::info!(
                    catalog_id = %catalog_id,
                    media_type = %media_type,
                    genres = metadata.genre_names.len(),
                    runtime_minutes = metadata.runtime_minutes,
                    provider = "tmdb",
                    "Metadata fetched"
                );

                Ok(metadata)
            }
        )
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}
