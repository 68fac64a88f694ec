//! Aggregations over loaded content
//!
//! All functions here are pure and total: they never fail and return empty
//! or zero-valued results for empty input.

mod archive;
mod reading;
mod tags;

pub use archive::{group_by_year, PostsByYear};
pub use reading::{book_tags, books_by_status, books_by_tag, reading_stats, status_counts, ReadingStats, StatusCounts};
pub use tags::{posts_with_tag, tag_counts, TagCount};
