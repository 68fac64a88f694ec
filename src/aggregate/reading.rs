//! Reading list statistics and filters

use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

use super::tags::tag_matches;
use crate::content::{Book, ReadingStatus};

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingStats {
    pub total_books: usize,
    pub completed_books: usize,
    pub reading_books: usize,
    pub want_to_read_books: usize,
    /// Mean rating of rated books, one decimal; 0 when nothing is rated
    pub average_rating: f64,
    /// Pages of completed books that declare a page count
    pub total_pages: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favorite_genre: Option<String>,
}

/// Number of books per status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct StatusCounts {
    pub all: usize,
    pub reading: usize,
    pub completed: usize,
    pub want_to_read: usize,
}

pub fn status_counts(books: &[Book]) -> StatusCounts {
    let mut counts = StatusCounts {
        all: books.len(),
        ..Default::default()
    };
    for book in books {
        match book.status {
            ReadingStatus::Reading => counts.reading += 1,
            ReadingStatus::Completed => counts.completed += 1,
            ReadingStatus::WantToRead => counts.want_to_read += 1,
        }
    }
    counts
}

pub fn reading_stats(books: &[Book]) -> ReadingStats {
    let counts = status_counts(books);

    let ratings: Vec<f64> = books
        .iter()
        .filter_map(|b| b.rating)
        .filter(|r| *r > 0.0)
        .collect();
    let average_rating = if ratings.is_empty() {
        0.0
    } else {
        let mean = ratings.iter().sum::<f64>() / ratings.len() as f64;
        (mean * 10.0).round() / 10.0
    };

    let total_pages = books
        .iter()
        .filter(|b| b.status == ReadingStatus::Completed)
        .filter_map(|b| b.pages)
        .map(u64::from)
        .sum();

    let mut tag_counts: HashMap<&str, usize> = HashMap::new();
    for tag in books.iter().flat_map(|b| &b.tags) {
        *tag_counts.entry(tag.as_str()).or_insert(0) += 1;
    }
    // Most frequent tag; alphabetical among equals
    let favorite_genre = tag_counts
        .into_iter()
        .min_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)))
        .map(|(tag, _)| tag.to_string());

    ReadingStats {
        total_books: counts.all,
        completed_books: counts.completed,
        reading_books: counts.reading,
        want_to_read_books: counts.want_to_read,
        average_rating,
        total_pages,
        favorite_genre,
    }
}

pub fn books_by_status(books: &[Book], status: ReadingStatus) -> Vec<Book> {
    books.iter().filter(|b| b.status == status).cloned().collect()
}

/// Books carrying `tag`, given as the label or its slug
pub fn books_by_tag(books: &[Book], tag: &str) -> Vec<Book> {
    books
        .iter()
        .filter(|b| b.tags.iter().any(|t| tag_matches(t, tag)))
        .cloned()
        .collect()
}

/// Every tag used on the reading list, sorted and unique
pub fn book_tags(books: &[Book]) -> Vec<String> {
    books
        .iter()
        .flat_map(|b| b.tags.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
