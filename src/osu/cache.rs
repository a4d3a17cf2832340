//! Short-lived cache of user lookups.
//!
//! Busy channels like `#osu` see the same players over and over, so each
//! user is only fetched once per TTL. Misses are cached too, otherwise
//! every message from an unknown name would cost a request.

use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;

use super::{Beatmap, BeatmapQuery, OsuLookup, OsuUser};
use crate::error::OsuApiError;

/// Expired entries are only swept once the map grows past this.
const SWEEP_THRESHOLD: usize = 1024;

/// A lookup result and when it was fetched.
#[derive(Debug)]
struct Cached {
    fetched: Instant,
    user: Option<OsuUser>,
}

/// Wraps an [OsuLookup] and remembers user lookups for `ttl`.
#[derive(Debug)]
pub struct CachedLookup<L> {
    inner: L,
    ttl: Duration,
    users: DashMap<String, Cached>,
}

impl<L> CachedLookup<L> {
    pub fn new(inner: L, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            users: DashMap::new(),
        }
    }

    fn fresh(&self, key: &str) -> Option<Option<OsuUser>> {
        let cached = self.users.get(key)?;
        if cached.fetched.elapsed() < self.ttl {
            Some(cached.user.clone())
        } else {
            None
        }
    }
}

/// osu! treats names case-insensitively and spaces like underscores.
fn cache_key(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

#[async_trait]
impl<L: OsuLookup> OsuLookup for CachedLookup<L> {
    async fn user(&self, name: &str) -> Result<Option<OsuUser>, OsuApiError> {
        let key = cache_key(name);

        if let Some(user) = self.fresh(&key) {
            tracing::trace!("Cache hit for {name}");
            return Ok(user);
        }

        let user = self.inner.user(name).await?;

        if self.users.len() >= SWEEP_THRESHOLD {
            let ttl = self.ttl;
            self.users.retain(|_, cached| cached.fetched.elapsed() < ttl);
        }
        let cached = Cached {
            fetched: Instant::now(),
            user: user.clone(),
        };
        self.users.insert(key, cached);

        Ok(user)
    }

    async fn beatmaps(&self, query: BeatmapQuery) -> Result<Vec<Beatmap>, OsuApiError> {
        self.inner.beatmaps(query).await
    }
}

#[cfg(test)]
mod test {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[derive(Default)]
    struct Counting {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl OsuLookup for Counting {
        async fn user(&self, name: &str) -> Result<Option<OsuUser>, OsuApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if name.eq_ignore_ascii_case("nobody") {
                return Ok(None);
            }
            Ok(Some(OsuUser {
                user_id: 1,
                username: name.to_string(),
                country: "NL".to_string(),
                pp_raw: 1000.0,
                pp_rank: 10,
                pp_country_rank: 1,
            }))
        }

        async fn beatmaps(&self, _query: BeatmapQuery) -> Result<Vec<Beatmap>, OsuApiError> {
            Ok(vec![])
        }
    }

    #[tokio::test(start_paused = true)]
    async fn caches_until_ttl_expires() {
        let cache = CachedLookup::new(Counting::default(), Duration::from_secs(60));

        let first = cache.user("Some User").await.unwrap();
        let second = cache.user("some_user").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(cache.inner.calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(61)).await;

        cache.user("SOME USER").await.unwrap();
        assert_eq!(cache.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn caches_misses() {
        let cache = CachedLookup::new(Counting::default(), Duration::from_secs(60));

        assert!(cache.user("nobody").await.unwrap().is_none());
        assert!(cache.user("Nobody").await.unwrap().is_none());
        assert_eq!(cache.inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn sweeps_expired_entries_when_full() {
        let cache = CachedLookup::new(Counting::default(), Duration::from_secs(60));

        for i in 0..SWEEP_THRESHOLD {
            cache.user(&format!("player{i}")).await.unwrap();
        }
        assert_eq!(cache.users.len(), SWEEP_THRESHOLD);

        tokio::time::advance(Duration::from_secs(61)).await;
        cache.user("latecomer").await.unwrap();

        assert_eq!(cache.users.len(), 1);
        assert!(cache.users.contains_key("latecomer"));
    }
}
