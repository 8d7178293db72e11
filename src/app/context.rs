use std::io::IsTerminal;
use std::sync::Arc;

use crate::api::{HttpApiClient, SharedApi};
use crate::app::error::Result;
use crate::auth::{FileTokenStore, Session};
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::coordinator::FetchCoordinator;
use crate::favorites::FavoriteStore;
use crate::notify::{self, Notifier};
use crate::store::ContentStore;
use crate::subscribe::SubscriptionStore;
use crate::user::UserStore;

/// One instance per session; every store is built here and shared from here.
pub struct AppContext {
    pub config: Config,
    pub session: Session,
    pub api: SharedApi,
    pub notifier: Arc<dyn Notifier>,
    pub clock: Arc<dyn Clock>,
    pub content: Arc<ContentStore>,
    pub coordinator: FetchCoordinator,
    pub favorites: FavoriteStore,
    pub subscriptions: SubscriptionStore,
    pub users: UserStore,
}

impl AppContext {
    /// Talks to the configured backend with the token kept in the data directory.
    pub fn new(config: Config) -> Result<Self> {
        let session = Session::new(Arc::new(FileTokenStore::new(FileTokenStore::default_path()?)));
        let api: SharedApi = Arc::new(HttpApiClient::new(&config.api, session.clone())?);

        Ok(Self::with_parts(
            config,
            api,
            session,
            notify::for_output(std::io::stdout().is_terminal()),
            Arc::new(SystemClock),
        ))
    }

    pub fn with_parts(
        config: Config,
        api: SharedApi,
        session: Session,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let content = Arc::new(ContentStore::new(
            api.clone(),
            notifier.clone(),
            session.clone(),
            clock.clone(),
        ));
        let coordinator = FetchCoordinator::with_ttl(
            api.clone(),
            content.clone(),
            clock.clone(),
            config.cache.content_ttl(),
        );
        let favorites = FavoriteStore::with_ttl(
            api.clone(),
            notifier.clone(),
            session.clone(),
            clock.clone(),
            config.cache.favorite_ttl(),
        );
        let subscriptions = SubscriptionStore::new(api.clone(), notifier.clone());
        let users = UserStore::new(api.clone(), notifier.clone());

        Self {
            config,
            session,
            api,
            notifier,
            clock,
            content,
            coordinator,
            favorites,
            subscriptions,
            users,
        }
    }

    pub fn per_page(&self) -> u32 {
        self.config.listing.per_page
    }
}
