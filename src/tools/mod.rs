pub mod grouping;
pub mod search;

pub use grouping::{group_by_isbn, IsbnGroup};
pub use search::{SearchResponse, SearchTool};
