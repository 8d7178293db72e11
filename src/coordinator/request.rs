use chrono::{DateTime, Duration, Utc};
use url::form_urlencoded;

use crate::domain::ContentType;
use crate::store::partition::DEFAULT_FILTER;
use crate::store::{ContentPartition, Filters, SortOption};

pub const DEFAULT_PER_PAGE: u32 = 10;

/// Parameters of one listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub content_type: ContentType,
    pub page: u32,
    pub per_page: u32,
    pub search: String,
    pub filter: String,
    pub sort: SortOption,
    /// Skip the cache. Set whenever the user changed page, search, filter or sort.
    pub force_fetch: bool,
}

impl PageRequest {
    pub fn new(content_type: ContentType) -> Self {
        Self {
            content_type,
            page: 1,
            per_page: DEFAULT_PER_PAGE,
            search: String::new(),
            filter: DEFAULT_FILTER.to_string(),
            sort: SortOption::default(),
            force_fetch: false,
        }
    }

    /// Request matching a partition's stored filters.
    pub fn from_filters(content_type: ContentType, filters: &Filters) -> Self {
        Self {
            search: filters.search_query.clone(),
            filter: filters.filter_option.clone(),
            sort: filters.sort_option,
            ..Self::new(content_type)
        }
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page;
        self
    }

    pub fn search(mut self, search: &str) -> Self {
        self.search = search.to_string();
        self
    }

    pub fn filter(mut self, filter: &str) -> Self {
        self.filter = filter.to_string();
        self
    }

    pub fn sort(mut self, sort: SortOption) -> Self {
        self.sort = sort;
        self
    }

    pub fn force(mut self, force_fetch: bool) -> Self {
        self.force_fetch = force_fetch;
        self
    }

    /// Exact comparison, no trimming or case folding.
    pub fn matches_filters(&self, filters: &Filters) -> bool {
        self.search == filters.search_query
            && self.filter == filters.filter_option
            && self.sort == filters.sort_option
    }

    pub fn query_string(&self) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        query
            .append_pair("post_type", self.content_type.as_str())
            .append_pair("page", &self.page.to_string())
            .append_pair("per_page", &self.per_page.to_string());

        if !self.search.is_empty() {
            query.append_pair("search", &self.search);
        }
        if !self.filter.is_empty() {
            query.append_pair("filter", &self.filter);
        }
        query.append_pair("sort", self.sort.as_str());

        query.finish()
    }
}

/// Whether a listing request can be answered from the stored partition.
pub fn cache_is_valid(
    partition: &ContentPartition,
    request: &PageRequest,
    now: DateTime<Utc>,
    ttl: Duration,
) -> bool {
    let Some(fetched_at) = partition.last_fetched_at else {
        return false;
    };

    now - fetched_at < ttl
        && request.matches_filters(&partition.filters)
        && !partition.items.is_empty()
}
