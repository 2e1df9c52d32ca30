use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{
    CuratorSource, SourceError, SourceResult,
    models::{AppDetailsResponse, GameDetails, ListingEnvelope},
};
use crate::{config::CuratorConfig, dao::models::AppId};

/// [`CuratorSource`] backed by the Steam store endpoints.
#[derive(Clone)]
pub struct SteamSource {
    client: Client,
    listing_url: Arc<str>,
    details_url: Arc<str>,
}

impl SteamSource {
    /// Build a client honouring the configured endpoints and request timeout.
    pub fn new(config: &CuratorConfig) -> SourceResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|source| SourceError::ClientBuilder { source })?;

        Ok(Self {
            client,
            listing_url: Arc::from(config.listing_url.as_str()),
            details_url: Arc::from(config.details_url.trim_end_matches('?')),
        })
    }

    async fn get_json<T>(&self, url: &str) -> SourceResult<T>
    where
        T: DeserializeOwned,
    {
        let response =
            self.client
                .get(url)
                .send()
                .await
                .map_err(|source| SourceError::RequestSend {
                    url: url.to_owned(),
                    source,
                })?;

        match response.status() {
            StatusCode::OK => {
                response
                    .json::<T>()
                    .await
                    .map_err(|source| SourceError::DecodeResponse {
                        url: url.to_owned(),
                        source,
                    })
            }
            status => Err(SourceError::RequestStatus {
                url: url.to_owned(),
                status,
            }),
        }
    }

    async fn listing(&self) -> SourceResult<String> {
        let url = self.listing_url.to_string();
        let envelope: ListingEnvelope = self.get_json(&url).await?;
        let markup = envelope
            .results_html
            .filter(|markup| !markup.trim().is_empty())
            .ok_or(SourceError::MissingListing { url })?;
        debug!(bytes = markup.len(), "fetched curator listing");
        Ok(markup)
    }

    async fn details(&self, app_id: AppId) -> SourceResult<GameDetails> {
        let url = self.details_url(app_id);
        let mut response: AppDetailsResponse = self.get_json(&url).await?;
        response
            .remove(&app_id.to_string())
            .filter(|envelope| envelope.success)
            .and_then(|envelope| envelope.data)
            .map(GameDetails::from)
            .ok_or(SourceError::MissingDetails { app_id })
    }
}

impl CuratorSource for SteamSource {
    fn fetch_listing(&self) -> BoxFuture<'static, SourceResult<String>> {
        let source = self.clone();
        Box::pin(async move { source.listing().await })
    }

    fn fetch_details(&self, app_id: AppId) -> BoxFuture<'static, SourceResult<GameDetails>> {
        let source = self.clone();
        Box::pin(async move { source.details(app_id).await })
    }

    fn details_url(&self, app_id: AppId) -> String {
        format!("{}?appids={app_id}", self.details_url)
    }
}
