//! Per-post favorite status and counts for the current viewer.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Duration;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::api::responses::{FavoriteCheck, FavoriteCount, FavoriteEnvelope, FavoriteList};
use crate::api::{endpoints, SharedApi};
use crate::app::Result;
use crate::auth::{Session, SignInRedirect};
use crate::cache::TtlCache;
use crate::clock::Clock;
use crate::domain::{Favorite, FavoriteRecord};
use crate::notify::Notifier;

pub const DEFAULT_FAVORITE_TTL_SECS: i64 = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    Favorited { count: u64 },
    Unfavorited { count: u64 },
    /// A toggle for the same post is still pending; nothing was sent.
    InFlight,
    SignInRequired(SignInRedirect),
}

struct FavoriteState {
    status: TtlCache<String, bool>,
    counts: TtlCache<String, u64>,
    pending: HashSet<String>,
    user_favorites: Vec<Favorite>,
    error: Option<String>,
}

pub struct FavoriteStore {
    api: SharedApi,
    notifier: Arc<dyn Notifier>,
    session: Session,
    clock: Arc<dyn Clock>,
    state: Mutex<FavoriteState>,
}

/// Clears a post's pending mark when the toggle settles or is dropped.
struct PendingGuard<'a> {
    store: &'a FavoriteStore,
    post_id: String,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.store.lock().pending.remove(&self.post_id);
    }
}

impl FavoriteStore {
    pub fn new(
        api: SharedApi,
        notifier: Arc<dyn Notifier>,
        session: Session,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::with_ttl(
            api,
            notifier,
            session,
            clock,
            Duration::seconds(DEFAULT_FAVORITE_TTL_SECS),
        )
    }

    pub fn with_ttl(
        api: SharedApi,
        notifier: Arc<dyn Notifier>,
        session: Session,
        clock: Arc<dyn Clock>,
        ttl: Duration,
    ) -> Self {
        Self {
            api,
            notifier,
            session,
            clock,
            state: Mutex::new(FavoriteState {
                status: TtlCache::new(ttl),
                counts: TtlCache::new(ttl),
                pending: HashSet::new(),
                user_favorites: Vec::new(),
                error: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FavoriteState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// What is known locally, at any age. Unknown counts read 0.
    pub fn record(&self, post_id: &str) -> FavoriteRecord {
        let state = self.lock();
        let key = post_id.to_string();
        FavoriteRecord {
            is_favorited: state.status.get(&key).copied().unwrap_or(false),
            count: state.counts.get(&key).copied().unwrap_or(0),
            post_id: key,
        }
    }

    pub fn is_pending(&self, post_id: &str) -> bool {
        self.lock().pending.contains(post_id)
    }

    pub fn error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    pub fn favorites(&self) -> Vec<Favorite> {
        self.lock().user_favorites.clone()
    }

    fn record_error(&self, message: String) {
        warn!("Favorite request failed: {}", message);
        self.lock().error = Some(message);
    }

    /// Whether the viewer favorited the post. Anonymous viewers get `false` without a request.
    pub async fn check_status(&self, post_id: &str) -> Result<bool> {
        if !self.session.is_authenticated() {
            return Ok(false);
        }

        let key = post_id.to_string();
        if let Some(&cached) = self.lock().status.get_fresh(&key, self.clock.now()) {
            debug!("Favorite status of {} served from cache", post_id);
            return Ok(cached);
        }

        let result = async {
            self.api
                .get(&endpoints::favorite_check(post_id))
                .await?
                .json::<FavoriteCheck>()
        }
        .await;

        match result {
            Ok(check) => {
                let now = self.clock.now();
                self.lock().status.put(key, check.is_favorited, now);
                Ok(check.is_favorited)
            }
            Err(e) => {
                self.record_error(e.to_string());
                Err(e)
            }
        }
    }

    pub async fn fetch_count(&self, post_id: &str) -> Result<u64> {
        let key = post_id.to_string();
        if let Some(&cached) = self.lock().counts.get_fresh(&key, self.clock.now()) {
            debug!("Favorite count of {} served from cache", post_id);
            return Ok(cached);
        }

        let result = async {
            self.api
                .get(&endpoints::favorite_count(post_id))
                .await?
                .json::<FavoriteCount>()
        }
        .await;

        match result {
            Ok(body) => {
                let now = self.clock.now();
                self.lock().counts.put(key, body.count, now);
                Ok(body.count)
            }
            Err(e) => {
                self.record_error(e.to_string());
                Err(e)
            }
        }
    }

    /// Status and count together, as shown next to a post.
    pub async fn load(&self, post_id: &str) -> Result<FavoriteRecord> {
        let (status, count) = futures::join!(self.check_status(post_id), self.fetch_count(post_id));
        Ok(FavoriteRecord {
            post_id: post_id.to_string(),
            is_favorited: status?,
            count: count?,
        })
    }

    /// Flips the viewer's favorite on a post. `origin` is where sign-in should return to.
    pub async fn toggle(&self, post_id: &str, origin: &str) -> Result<ToggleOutcome> {
        if !self.session.is_authenticated() {
            return Ok(ToggleOutcome::SignInRequired(SignInRedirect::new(origin)));
        }

        let key = post_id.to_string();
        let was_favorited = {
            let mut state = self.lock();
            if !state.pending.insert(key.clone()) {
                debug!("Toggle for {} already in flight", post_id);
                return Ok(ToggleOutcome::InFlight);
            }
            state.status.get(&key).copied().unwrap_or(false)
        };
        let _pending = PendingGuard {
            store: self,
            post_id: key.clone(),
        };

        let result = if was_favorited {
            self.api.delete(&endpoints::favorite_by_post(post_id)).await
        } else {
            self.api
                .post(endpoints::FAVORITES, &json!({ "post_id": post_id }))
                .await
        };

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                let e = e.returning_to(origin);
                self.record_error(e.to_string());
                self.notifier.error(&e.to_string());
                return Err(e);
            }
        };

        let now = self.clock.now();
        let mut state = self.lock();
        state.error = None;
        state.status.put(key.clone(), !was_favorited, now);

        let outcome = if was_favorited {
            state.counts.update(&key, now, |count| *count = count.saturating_sub(1));
            state.user_favorites.retain(|f| f.post_id() != post_id);
            ToggleOutcome::Unfavorited {
                count: state.counts.get(&key).copied().unwrap_or(0),
            }
        } else {
            state.counts.update(&key, now, |count| *count += 1);
            match response.json::<FavoriteEnvelope>() {
                Ok(envelope) => state.user_favorites.push(envelope.data),
                Err(e) => debug!("Favorite created without a body: {}", e),
            }
            ToggleOutcome::Favorited {
                count: state.counts.get(&key).copied().unwrap_or(0),
            }
        };
        drop(state);

        if was_favorited {
            info!("Removed favorite on {}", post_id);
            self.notifier.success("Removed from favorites");
        } else {
            info!("Favorited {}", post_id);
            self.notifier.success("Post added to favorites");
        }
        Ok(outcome)
    }

    /// Loads a user's favorites and marks each of their posts as favorited.
    pub async fn user_favorites(&self, user_id: &str) -> Result<Vec<Favorite>> {
        let result = async {
            self.api
                .get(&endpoints::user_favorites(user_id))
                .await?
                .json::<FavoriteList>()
        }
        .await;

        match result {
            Ok(list) => {
                let now = self.clock.now();
                let mut state = self.lock();
                for favorite in &list.data {
                    state.status.put(favorite.post_id().to_string(), true, now);
                }
                state.user_favorites = list.data.clone();
                state.error = None;
                Ok(list.data)
            }
            Err(e) => {
                self.record_error(e.to_string());
                Err(e)
            }
        }
    }

    pub async fn delete_favorite(&self, favorite_id: &str) -> Result<()> {
        if let Err(e) = self.api.delete(&endpoints::favorite(favorite_id)).await {
            self.record_error(e.to_string());
            self.notifier.error(&e.to_string());
            return Err(e);
        }

        {
            let mut state = self.lock();
            let post_id = state
                .user_favorites
                .iter()
                .find(|f| f.id == favorite_id)
                .map(|f| f.post_id().to_string());
            state.user_favorites.retain(|f| f.id != favorite_id);
            if let Some(post_id) = post_id {
                state.status.invalidate(&post_id);
                state.counts.invalidate(&post_id);
            }
            state.error = None;
        }

        self.notifier.success("Removed from favorites");
        Ok(())
    }
}
