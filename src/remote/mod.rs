//! Clients for the third-party store the curated catalog is scraped from.

pub mod models;
pub mod steam;

use futures::future::BoxFuture;
use reqwest::StatusCode;
use thiserror::Error;

use crate::dao::models::AppId;

pub use models::GameDetails;
pub use steam::SteamSource;

/// Result alias for remote fetches.
pub type SourceResult<T> = Result<T, SourceError>;

/// Failures raised while talking to the remote store.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Building the HTTP client failed.
    #[error("failed to build HTTP client")]
    ClientBuilder {
        #[source]
        source: reqwest::Error,
    },
    /// The request could not be sent or timed out.
    #[error("failed to send request to `{url}`")]
    RequestSend {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    /// The remote answered with a non-success status.
    #[error("unexpected response status {status} for `{url}`")]
    RequestStatus { url: String, status: StatusCode },
    /// The body could not be decoded into the expected JSON shape.
    #[error("failed to decode response from `{url}`")]
    DecodeResponse {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    /// The listing envelope carried no markup.
    #[error("listing response from `{url}` has no markup")]
    MissingListing { url: String },
    /// The details endpoint reported no data for the game.
    #[error("no details available for game `{app_id}`")]
    MissingDetails { app_id: AppId },
}

/// Remote catalog consumed by the curated-game synchronizer.
pub trait CuratorSource: Send + Sync {
    /// Fetch the raw markup of the curated listing page.
    fn fetch_listing(&self) -> BoxFuture<'static, SourceResult<String>>;
    /// Fetch store details of a single game.
    fn fetch_details(&self, app_id: AppId) -> BoxFuture<'static, SourceResult<GameDetails>>;
    /// URL the details of `app_id` are fetched from, recorded on the stored game.
    fn details_url(&self, app_id: AppId) -> String;
}
