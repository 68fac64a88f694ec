//! Book model for the reading list

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::frontmatter::{opt_string, string_or_vec, timestamp};

/// Where a book sits on the reading list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReadingStatus {
    Reading,
    Completed,
    #[default]
    WantToRead,
}

impl ReadingStatus {
    pub const ALL: [ReadingStatus; 3] = [
        ReadingStatus::Reading,
        ReadingStatus::Completed,
        ReadingStatus::WantToRead,
    ];

    /// Map a front-matter status label to a status.
    ///
    /// Accepts the Chinese labels (`在读`, `已读`, `想读`) and their English
    /// equivalents. Anything else, including an empty label, is `WantToRead`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "在读" | "reading" => ReadingStatus::Reading,
            "已读" | "completed" | "read" => ReadingStatus::Completed,
            _ => ReadingStatus::WantToRead,
        }
    }

    /// Machine label, as used in JSON and query strings
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadingStatus::Reading => "reading",
            ReadingStatus::Completed => "completed",
            ReadingStatus::WantToRead => "want-to-read",
        }
    }

    /// Display label
    pub fn label_zh(&self) -> &'static str {
        match self {
            ReadingStatus::Reading => "在读",
            ReadingStatus::Completed => "已读",
            ReadingStatus::WantToRead => "想读",
        }
    }
}

impl fmt::Display for ReadingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A book on the reading list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// File stem of the source file
    pub id: String,
    pub title: String,
    pub author: String,
    pub status: ReadingStatus,
    /// Rating out of 5; unrated books have none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, with = "timestamp::option", skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::option", skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    /// Percent read
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
}

impl Book {
    /// A want-to-read book with only a title and author
    pub fn new(id: impl Into<String>, title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            author: author.into(),
            status: ReadingStatus::default(),
            rating: None,
            start_date: None,
            end_date: None,
            progress: None,
            review: None,
            tags: Vec::new(),
            description: String::new(),
            isbn: None,
            pages: None,
            publisher: None,
            published_year: None,
            cover: None,
        }
    }
}

/// Front-matter accepted in a book file
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct BookMatter {
    #[serde(deserialize_with = "opt_string")]
    pub title: Option<String>,
    #[serde(deserialize_with = "opt_string")]
    pub author: Option<String>,
    #[serde(deserialize_with = "opt_string")]
    pub status: Option<String>,
    pub rating: Option<f64>,
    #[serde(alias = "start_date", deserialize_with = "opt_string")]
    pub start_date: Option<String>,
    #[serde(alias = "end_date", deserialize_with = "opt_string")]
    pub end_date: Option<String>,
    pub progress: Option<u32>,
    #[serde(deserialize_with = "opt_string")]
    pub review: Option<String>,
    #[serde(deserialize_with = "string_or_vec")]
    pub tags: Vec<String>,
    #[serde(deserialize_with = "opt_string")]
    pub description: Option<String>,
    #[serde(deserialize_with = "opt_string")]
    pub isbn: Option<String>,
    pub pages: Option<u32>,
    #[serde(deserialize_with = "opt_string")]
    pub publisher: Option<String>,
    #[serde(alias = "published_year")]
    pub published_year: Option<i32>,
    #[serde(deserialize_with = "opt_string")]
    pub cover: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_label() {
        assert_eq!(ReadingStatus::from_label("在读"), ReadingStatus::Reading);
        assert_eq!(ReadingStatus::from_label("已读"), ReadingStatus::Completed);
        assert_eq!(ReadingStatus::from_label("想读"), ReadingStatus::WantToRead);
        assert_eq!(ReadingStatus::from_label(" Completed "), ReadingStatus::Completed);
        assert_eq!(ReadingStatus::from_label("reading"), ReadingStatus::Reading);
        assert_eq!(ReadingStatus::from_label("搁置"), ReadingStatus::WantToRead);
        assert_eq!(ReadingStatus::from_label(""), ReadingStatus::WantToRead);
    }

    #[test]
    fn test_status_labels_round_trip() {
        for status in ReadingStatus::ALL {
            assert_eq!(ReadingStatus::from_label(status.label_zh()), status);
            assert_eq!(ReadingStatus::from_label(status.as_str()), status);
        }
        assert_eq!(
            serde_json::to_string(&ReadingStatus::WantToRead).unwrap(),
            "\"want-to-read\""
        );
    }

    #[test]
    fn test_book_matter_accepts_numeric_scalars() {
        let yaml = "title: 1984\nauthor: George Orwell\nisbn: 9787530210291\nrating: 5\npublishedYear: 1949\n";
        let m: BookMatter = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(m.title.as_deref(), Some("1984"));
        assert_eq!(m.isbn.as_deref(), Some("9787530210291"));
        assert_eq!(m.rating, Some(5.0));
        assert_eq!(m.published_year, Some(1949));
    }
}
