//! Client-credentials token cache for the admin API.
//!
//! One instance per upstream client, shared via `Arc`. The lock is held
//! across the refresh so concurrent callers wait for a single fetch.
use std::future::Future;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use super::error::UpstreamResult;

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    refresh_after: Instant,
}

#[derive(Debug)]
pub struct TokenCache {
    skew: Duration,
    slot: Mutex<Option<CachedToken>>,
}

impl TokenCache {
    /// `skew` is subtracted from the token lifetime so a token is never used
    /// right at its expiry. Short-lived tokens get at most half their
    /// lifetime as skew.
    pub fn new(skew: Duration) -> Self {
        Self {
            skew,
            slot: Mutex::new(None),
        }
    }

    /// Return the cached token, or run `fetch` and cache its result.
    ///
    /// `fetch` yields `(access_token, lifetime)`. Errors are not cached.
    pub async fn get_or_refresh<F, Fut>(&self, fetch: F) -> UpstreamResult<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = UpstreamResult<(String, Duration)>>,
    {
        let mut slot = self.slot.lock().await;

        if let Some(cached) = slot.as_ref()
            && Instant::now() < cached.refresh_after
        {
            return Ok(cached.access_token.clone());
        }

        let (access_token, lifetime) = fetch().await?;
        let refresh_after = Instant::now() + self.usable_for(lifetime);
        tracing::debug!(lifetime_secs = lifetime.as_secs(), "admin token refreshed");

        *slot = Some(CachedToken {
            access_token: access_token.clone(),
            refresh_after,
        });
        Ok(access_token)
    }

    fn usable_for(&self, lifetime: Duration) -> Duration {
        lifetime - self.skew.min(lifetime / 2)
    }

    /// Drop the cached token if it is still the one the upstream rejected.
    /// A token another caller refreshed in the meantime is kept.
    pub async fn invalidate_if(&self, rejected: &str) -> bool {
        let mut slot = self.slot.lock().await;
        if slot
            .as_ref()
            .is_some_and(|cached| cached.access_token == rejected)
        {
            slot.take();
            return true;
        }
        false
    }
}

impl Default for TokenCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}
