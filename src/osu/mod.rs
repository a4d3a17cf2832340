//! Minimal client for the osu! v1 web API.
//!
//! Only `get_user` and `get_beatmaps` are implemented, which is all the
//! relay needs to describe a player and their `/np` beatmap.

mod cache;
mod deserialize;
mod models;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::instrument;

use crate::error::OsuApiError;

pub use cache::CachedLookup;
pub use models::{Beatmap, OsuUser, RankStatus};

/// Base of every v1 endpoint.
const API_BASE: &str = "https://osu.ppy.sh/api/";

static USER_AGENT: &str = env!("CARGO_PKG_NAME");

/// What a beatmap link points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BeatmapQuery {
    /// A single difficulty.
    Beatmap(u32),
    /// A whole mapset, the first difficulty returned is used.
    Set(u32),
}

/// Lookups the relay needs, abstracted so it can run against fakes.
#[async_trait]
pub trait OsuLookup: Send + Sync {
    /// Find a user by name. `Ok(None)` if there is no such user.
    async fn user(&self, name: &str) -> Result<Option<OsuUser>, OsuApiError>;

    /// Every difficulty a link points at, in the order the API lists them.
    async fn beatmaps(&self, query: BeatmapQuery) -> Result<Vec<Beatmap>, OsuApiError>;
}

/// Client for the osu! v1 API.
pub struct OsuApi {
    client: Client,
    base: String,
    api_key: String,
}

impl std::fmt::Debug for OsuApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OsuApi").finish_non_exhaustive()
    }
}

impl OsuApi {
    pub fn new(api_key: impl Into<String>) -> Result<Self, OsuApiError> {
        Self::with_base(API_BASE, api_key)
    }

    fn with_base(base: impl Into<String>, api_key: impl Into<String>) -> Result<Self, OsuApiError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            base: base.into(),
            api_key: api_key.into(),
        })
    }

    /// `GET get_user` for an osu!standard profile.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_user(&self, name: &str) -> Result<Option<OsuUser>, OsuApiError> {
        let users: Vec<OsuUser> = self
            .request("get_user", &[("u", name), ("type", "string"), ("m", "0")])
            .await?;

        Ok(users.into_iter().next())
    }

    /// `GET get_beatmaps` for a difficulty or a whole set.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_beatmaps(&self, query: BeatmapQuery) -> Result<Vec<Beatmap>, OsuApiError> {
        let (key, id) = match query {
            BeatmapQuery::Beatmap(id) => ("b", id),
            BeatmapQuery::Set(id) => ("s", id),
        };
        let id = id.to_string();

        self.request("get_beatmaps", &[(key, id.as_str())]).await
    }

    async fn request<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<T, OsuApiError> {
        // The key is part of the url, so urls never make it into errors.
        let response = self
            .client
            .get(format!("{}{endpoint}", self.base))
            .query(&[("k", self.api_key.as_str())])
            .query(query)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;

        match response.status() {
            StatusCode::UNAUTHORIZED => Err(OsuApiError::InvalidKey),
            status if !status.is_success() => Err(OsuApiError::Status { status }),
            _ => Ok(response.json().await.map_err(reqwest::Error::without_url)?),
        }
    }
}

#[async_trait]
impl OsuLookup for OsuApi {
    async fn user(&self, name: &str) -> Result<Option<OsuUser>, OsuApiError> {
        self.get_user(name).await
    }

    async fn beatmaps(&self, query: BeatmapQuery) -> Result<Vec<Beatmap>, OsuApiError> {
        self.get_beatmaps(query).await
    }
}
