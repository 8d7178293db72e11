//! Listing fetches: serve from the content store while it is fresh, otherwise
//! fetch, normalize and hand the page back to the store.

pub mod request;

use std::sync::Arc;

use chrono::Duration;
use futures::future::join_all;
use tracing::{debug, info};

use crate::api::responses::PostListing;
use crate::api::{endpoints, SharedApi};
use crate::app::Result;
use crate::clock::Clock;
use crate::domain::{ContentType, Post};
use crate::store::{ContentStore, Pagination};

pub use request::{cache_is_valid, PageRequest, DEFAULT_PER_PAGE};

pub const DEFAULT_CONTENT_TTL_SECS: i64 = 5 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSource {
    /// Answered from the store; no request was sent.
    CacheHit,
    /// Fetched and applied.
    Network,
    /// Fetched, but a later request had already been applied.
    Superseded,
}

#[derive(Debug, Clone)]
pub struct PageOutcome {
    pub source: PageSource,
    pub posts: Vec<Post>,
    pub pagination: Pagination,
}

pub struct FetchCoordinator {
    api: SharedApi,
    store: Arc<ContentStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl FetchCoordinator {
    pub fn new(api: SharedApi, store: Arc<ContentStore>, clock: Arc<dyn Clock>) -> Self {
        Self::with_ttl(api, store, clock, Duration::seconds(DEFAULT_CONTENT_TTL_SECS))
    }

    pub fn with_ttl(
        api: SharedApi,
        store: Arc<ContentStore>,
        clock: Arc<dyn Clock>,
        ttl: Duration,
    ) -> Self {
        Self {
            api,
            store,
            clock,
            ttl,
        }
    }

    pub fn store(&self) -> &Arc<ContentStore> {
        &self.store
    }

    pub async fn request_page(&self, request: &PageRequest) -> Result<PageOutcome> {
        let content_type = request.content_type;

        if !request.force_fetch {
            let now = self.clock.now();
            let cached = self.store.read(|state| {
                let partition = state.partition(content_type);
                cache_is_valid(partition, request, now, self.ttl)
                    .then(|| (partition.items.clone(), partition.pagination))
            });

            if let Some((posts, pagination)) = cached {
                debug!("Serving {} from cache", content_type);
                return Ok(PageOutcome {
                    source: PageSource::CacheHit,
                    posts,
                    pagination,
                });
            }
        }

        let seq = self.store.begin_fetch(content_type);
        let path = endpoints::posts_with_query(&request.query_string());
        info!("Fetching {} (request #{})", path, seq);

        let result = async { self.api.get(&path).await?.json::<PostListing>() }.await;

        match result {
            Ok(listing) => {
                let count = listing.posts.len();
                let applied = self.store.replace_page(
                    content_type,
                    seq,
                    listing.posts,
                    listing.total_pages,
                    listing.total_count,
                );
                debug!("Received {} {} posts", count, content_type);

                let (posts, pagination) = self.store.read(|state| {
                    (state.posts(content_type).to_vec(), state.pagination(content_type))
                });
                Ok(PageOutcome {
                    source: if applied {
                        PageSource::Network
                    } else {
                        PageSource::Superseded
                    },
                    posts,
                    pagination,
                })
            }
            Err(e) => {
                self.store.fail_fetch(content_type, seq, &e);
                Err(e)
            }
        }
    }

    /// Fetches the partition's current page with its stored filters, bypassing the cache.
    pub async fn reload(&self, content_type: ContentType, per_page: u32) -> Result<PageOutcome> {
        let (filters, pagination) = self.store.read(|state| {
            (state.filters(content_type).clone(), state.pagination(content_type))
        });
        let request = PageRequest::from_filters(content_type, &filters)
            .page(pagination.current_page)
            .per_page(per_page)
            .force(true);
        self.request_page(&request).await
    }

    /// First pages of several partitions at once, cache permitting.
    pub async fn refresh_all(
        &self,
        content_types: &[ContentType],
        per_page: u32,
    ) -> Vec<(ContentType, Result<PageOutcome>)> {
        let requests: Vec<PageRequest> = content_types
            .iter()
            .map(|&content_type| {
                let filters = self.store.select_filters(content_type);
                PageRequest::from_filters(content_type, &filters).per_page(per_page)
            })
            .collect();

        let results = join_all(requests.iter().map(|r| self.request_page(r))).await;

        content_types.iter().copied().zip(results).collect()
    }
}
