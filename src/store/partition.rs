use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::app::PlazaError;
use crate::domain::Post;

pub const DEFAULT_FILTER: &str = "all";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortOption {
    #[default]
    #[serde(rename = "newest")]
    Newest,
    #[serde(rename = "oldest")]
    Oldest,
    #[serde(rename = "a-z")]
    TitleAsc,
    #[serde(rename = "z-a")]
    TitleDesc,
}

impl SortOption {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOption::Newest => "newest",
            SortOption::Oldest => "oldest",
            SortOption::TitleAsc => "a-z",
            SortOption::TitleDesc => "z-a",
        }
    }
}

impl fmt::Display for SortOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOption {
    type Err = PlazaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "newest" => Ok(SortOption::Newest),
            "oldest" => Ok(SortOption::Oldest),
            "a-z" => Ok(SortOption::TitleAsc),
            "z-a" => Ok(SortOption::TitleDesc),
            other => Err(PlazaError::Other(format!(
                "Unknown sort option: {} (expected newest, oldest, a-z or z-a)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filters {
    pub search_query: String,
    pub filter_option: String,
    pub sort_option: SortOption,
}

impl Default for Filters {
    fn default() -> Self {
        Self {
            search_query: String::new(),
            filter_option: DEFAULT_FILTER.to_string(),
            sort_option: SortOption::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_count: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            current_page: 1,
            total_pages: 1,
            total_count: 0,
        }
    }
}

/// Listing state of one content type.
#[derive(Debug, Clone, Default)]
pub struct ContentPartition {
    /// Server order, replaced wholesale on every applied fetch.
    pub items: Vec<Post>,
    pub pagination: Pagination,
    pub filters: Filters,
    /// Stamped by network fetches only.
    pub last_fetched_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
    in_flight: u32,
    dispatched_seq: u64,
    /// Highest sequence that has settled, by success or failure.
    settled_seq: u64,
}

impl ContentPartition {
    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }

    /// Loading with nothing to show yet.
    pub fn show_loading(&self) -> bool {
        self.is_loading() && self.items.is_empty()
    }

    /// Out-of-range pages are stored as given.
    pub fn set_page(&mut self, page: u32) {
        self.pagination.current_page = page;
    }

    pub fn set_search_query(&mut self, query: &str) {
        self.filters.search_query = query.to_string();
        self.pagination.current_page = 1;
    }

    pub fn set_filter_option(&mut self, filter: &str) {
        self.filters.filter_option = filter.to_string();
        self.pagination.current_page = 1;
    }

    pub fn set_sort_option(&mut self, sort: SortOption) {
        self.filters.sort_option = sort;
        self.pagination.current_page = 1;
    }

    /// Registers an outgoing fetch and returns its sequence number.
    pub fn begin_fetch(&mut self) -> u64 {
        self.dispatched_seq += 1;
        self.in_flight += 1;
        self.dispatched_seq
    }

    /// Applies a fetched page unless a later request has already settled.
    pub fn replace_page(
        &mut self,
        seq: u64,
        items: Vec<Post>,
        total_pages: u32,
        total_count: u64,
        now: DateTime<Utc>,
    ) -> bool {
        self.in_flight = self.in_flight.saturating_sub(1);
        if seq <= self.settled_seq {
            return false;
        }
        self.settled_seq = seq;
        self.items = items;
        self.pagination.total_pages = total_pages;
        self.pagination.total_count = total_count;
        self.last_fetched_at = Some(now);
        self.error = None;
        true
    }

    /// Records a failed fetch. Existing items stay in place.
    /// Returns false when the failure belongs to a superseded request.
    pub fn fail_fetch(&mut self, seq: u64, message: &str) -> bool {
        self.in_flight = self.in_flight.saturating_sub(1);
        if seq <= self.settled_seq {
            return false;
        }
        self.settled_seq = seq;
        self.error = Some(message.to_string());
        true
    }

    pub fn latest_seq(&self) -> u64 {
        self.dispatched_seq
    }

    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|p| p.id == id)
    }
}
