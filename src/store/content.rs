use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, warn};

use crate::api::responses::{PostWithRelated, UserPosts};
use crate::api::{endpoints, SharedApi};
use crate::app::{PlazaError, Result};
use crate::auth::Session;
use crate::clock::Clock;
use crate::domain::{ContentType, Post, PostDraft};
use crate::notify::Notifier;

use super::partition::{ContentPartition, Filters, Pagination, SortOption};

pub const NEW_POST_PATH: &str = "/post/new";

pub fn edit_post_path(id: &str) -> String {
    format!("/post/edit/{}", id)
}

/// All server-derived post state.
#[derive(Debug, Clone, Default)]
pub struct ContentState {
    partitions: [ContentPartition; 3],
    pub current_post: Option<Post>,
    pub related_posts: Vec<Post>,
    pub user_posts: Vec<Post>,
    pub user_posts_total_pages: u32,
    pub error: Option<String>,
    pending: u32,
}

impl ContentState {
    pub fn partition(&self, content_type: ContentType) -> &ContentPartition {
        &self.partitions[content_type.index()]
    }

    pub fn partition_mut(&mut self, content_type: ContentType) -> &mut ContentPartition {
        &mut self.partitions[content_type.index()]
    }

    pub fn posts(&self, content_type: ContentType) -> &[Post] {
        &self.partition(content_type).items
    }

    pub fn pagination(&self, content_type: ContentType) -> Pagination {
        self.partition(content_type).pagination
    }

    pub fn filters(&self, content_type: ContentType) -> &Filters {
        &self.partition(content_type).filters
    }

    /// A single-post request is pending.
    pub fn is_loading(&self) -> bool {
        self.pending > 0
    }

    /// Appends a newly created post to its partition.
    pub fn insert_post(&mut self, post: Post) {
        self.partition_mut(post.content_type()).items.push(post);
    }

    /// Replaces every copy of the post by id. A copy sitting in another type's partition
    /// is dropped since the post no longer belongs there.
    pub fn apply_update(&mut self, post: &Post) -> bool {
        let target = post.content_type();
        let mut found = false;

        for content_type in ContentType::ALL {
            let partition = self.partition_mut(content_type);
            if let Some(index) = partition.position_of(&post.id) {
                if content_type == target {
                    partition.items[index] = post.clone();
                } else {
                    partition.items.remove(index);
                }
                found = true;
            }
        }

        if let Some(existing) = self.user_posts.iter_mut().find(|p| p.id == post.id) {
            *existing = post.clone();
            found = true;
        }

        if self.current_post.as_ref().is_some_and(|p| p.id == post.id) {
            self.current_post = Some(post.clone());
            found = true;
        }

        found
    }

    /// Removes the post from every partition and slot. Returns the partitions it was found in.
    pub fn remove_post(&mut self, id: &str) -> Vec<ContentType> {
        let mut removed_from = Vec::new();

        for content_type in ContentType::ALL {
            let partition = self.partition_mut(content_type);
            let before = partition.items.len();
            partition.items.retain(|p| p.id != id);
            if partition.items.len() != before {
                removed_from.push(content_type);
            }
        }

        self.user_posts.retain(|p| p.id != id);
        self.related_posts.retain(|p| p.id != id);
        if self.current_post.as_ref().is_some_and(|p| p.id == id) {
            self.current_post = None;
        }

        removed_from
    }
}

pub struct ContentStore {
    api: SharedApi,
    notifier: Arc<dyn Notifier>,
    session: Session,
    clock: Arc<dyn Clock>,
    state: Mutex<ContentState>,
}

impl ContentStore {
    pub fn new(
        api: SharedApi,
        notifier: Arc<dyn Notifier>,
        session: Session,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            api,
            notifier,
            session,
            clock,
            state: Mutex::new(ContentState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ContentState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Runs `f` against the current state.
    pub fn read<R>(&self, f: impl FnOnce(&ContentState) -> R) -> R {
        f(&self.lock())
    }

    pub fn snapshot(&self) -> ContentState {
        self.lock().clone()
    }

    pub fn select_posts(&self, content_type: ContentType) -> Vec<Post> {
        self.lock().posts(content_type).to_vec()
    }

    pub fn select_pagination(&self, content_type: ContentType) -> Pagination {
        self.lock().pagination(content_type)
    }

    pub fn select_filters(&self, content_type: ContentType) -> Filters {
        self.lock().filters(content_type).clone()
    }

    pub fn current_post(&self) -> Option<Post> {
        self.lock().current_post.clone()
    }

    pub fn set_page(&self, content_type: ContentType, page: u32) {
        self.lock().partition_mut(content_type).set_page(page);
    }

    pub fn set_search_query(&self, content_type: ContentType, query: &str) {
        self.lock().partition_mut(content_type).set_search_query(query);
    }

    pub fn set_filter_option(&self, content_type: ContentType, filter: &str) {
        self.lock().partition_mut(content_type).set_filter_option(filter);
    }

    pub fn set_sort_option(&self, content_type: ContentType, sort: SortOption) {
        self.lock().partition_mut(content_type).set_sort_option(sort);
    }

    pub(crate) fn begin_fetch(&self, content_type: ContentType) -> u64 {
        self.lock().partition_mut(content_type).begin_fetch()
    }

    /// Wholesale replacement after a successful listing fetch.
    pub(crate) fn replace_page(
        &self,
        content_type: ContentType,
        seq: u64,
        items: Vec<Post>,
        total_pages: u32,
        total_count: u64,
    ) -> bool {
        let now = self.clock.now();
        let applied = self
            .lock()
            .partition_mut(content_type)
            .replace_page(seq, items, total_pages, total_count, now);
        if !applied {
            debug!("Discarded stale {} page (request #{})", content_type, seq);
        }
        applied
    }

    pub(crate) fn fail_fetch(&self, content_type: ContentType, seq: u64, error: &PlazaError) {
        let message = error.to_string();
        let recorded = self
            .lock()
            .partition_mut(content_type)
            .fail_fetch(seq, &message);
        if recorded {
            warn!("Fetching {} failed: {}", content_type, message);
            self.notifier.error(&message);
        }
    }

    fn begin(&self) {
        let mut state = self.lock();
        state.pending += 1;
        state.error = None;
    }

    /// Settles a single-post request: success runs `apply` and announces `success`,
    /// failure is stored and announced.
    fn finish<T>(
        &self,
        result: Result<T>,
        success: Option<&str>,
        apply: impl FnOnce(&mut ContentState, &T),
    ) -> Result<T> {
        let mut state = self.lock();
        state.pending = state.pending.saturating_sub(1);

        match result {
            Ok(value) => {
                apply(&mut state, &value);
                drop(state);
                if let Some(message) = success {
                    self.notifier.success(message);
                }
                Ok(value)
            }
            Err(e) => {
                state.error = Some(e.to_string());
                if matches!(e, PlazaError::NotFound(_)) {
                    state.current_post = None;
                    state.related_posts.clear();
                }
                drop(state);
                if !matches!(e, PlazaError::NotFound(_)) {
                    self.notifier.error(&e.to_string());
                }
                Err(e)
            }
        }
    }

    pub async fn create_post(&self, draft: &PostDraft) -> Result<Post> {
        self.session.require(NEW_POST_PATH)?;
        draft.validate().map_err(PlazaError::Validation)?;

        self.begin();
        let result = async {
            let body = serde_json::to_value(draft)?;
            self.api.post(endpoints::POSTS, &body).await?.json::<Post>()
        }
        .await
        .map_err(|e| e.returning_to(NEW_POST_PATH));

        self.finish(result, Some("Post created successfully"), |state, post| {
            info!("Created {} post {}", post.content_type(), post.id);
            state.insert_post(post.clone());
        })
    }

    pub async fn update_post(&self, id: &str, draft: &PostDraft) -> Result<Post> {
        self.session.require(&edit_post_path(id))?;
        draft.validate().map_err(PlazaError::Validation)?;

        self.begin();
        let result = async {
            let body = serde_json::to_value(draft)?;
            self.api.put(&endpoints::post(id), &body).await?.json::<Post>()
        }
        .await
        .map_err(|e| e.returning_to(&edit_post_path(id)));

        self.finish(result, Some("Post updated successfully"), |state, post| {
            if !state.apply_update(post) {
                debug!("Updated post {} was not loaded locally", post.id);
            }
        })
    }

    pub async fn delete_post(&self, id: &str) -> Result<()> {
        self.session.require(&edit_post_path(id))?;

        self.begin();
        let result = self
            .api
            .delete(&endpoints::post(id))
            .await
            .map(|_| ())
            .map_err(|e| e.returning_to(&edit_post_path(id)));

        self.finish(result, Some("Post deleted successfully"), |state, _| {
            let removed_from = state.remove_post(id);
            debug!("Removed post {} from {:?}", id, removed_from);
        })
    }

    pub async fn get_post(&self, id: &str) -> Result<Post> {
        self.begin();
        let result = async { self.api.get(&endpoints::post(id)).await?.json::<Post>() }.await;

        self.finish(result, None, |state, post| {
            state.current_post = Some(post.clone());
            state.related_posts.clear();
        })
    }

    pub async fn get_post_by_slug(&self, slug: &str) -> Result<PostWithRelated> {
        self.begin();
        let result = async {
            self.api
                .get(&endpoints::post_by_slug(slug))
                .await?
                .json::<PostWithRelated>()
        }
        .await;

        self.finish(result, None, |state, found| {
            state.current_post = Some(found.post.clone());
            state.related_posts = found.relevant_posts.clone();
        })
    }

    pub async fn fetch_user_posts(&self, user_id: &str) -> Result<Vec<Post>> {
        self.begin();
        let result = async {
            self.api
                .get(&endpoints::user_posts(user_id))
                .await?
                .json::<UserPosts>()
        }
        .await;

        self.finish(result, None, |state, page| {
            state.user_posts = page.posts.clone();
            state.user_posts_total_pages = page.total_pages;
        })
        .map(|page| page.posts)
    }
}
