pub mod content;
pub mod partition;

pub use content::{ContentState, ContentStore};
pub use partition::{ContentPartition, Filters, Pagination, SortOption};
