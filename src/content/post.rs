//! Post model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::frontmatter::{opt_string, string_or_vec, timestamp};
use crate::pagination::Identified;

/// Post metadata, as listed on index, archive and tag pages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// File stem of the source file
    pub id: String,

    pub title: String,

    /// Publication date
    #[serde(with = "timestamp")]
    pub date: DateTime<Utc>,

    /// Plain-text summary shown in lists and feeds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,
}

impl Post {
    pub const UNTITLED: &'static str = "Untitled";

    /// Create a post with no excerpt and no tags
    pub fn new(id: impl Into<String>, title: impl Into<String>, date: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            date,
            excerpt: None,
            tags: Vec::new(),
        }
    }

    /// The post listed before this one (newer), in a newest-first list
    pub fn prev<'a>(&self, posts: &'a [Post]) -> Option<&'a Post> {
        let pos = posts.iter().position(|p| p.id == self.id)?;
        pos.checked_sub(1).map(|i| &posts[i])
    }

    /// The post listed after this one (older), in a newest-first list
    pub fn next<'a>(&self, posts: &'a [Post]) -> Option<&'a Post> {
        let pos = posts.iter().position(|p| p.id == self.id)?;
        posts.get(pos + 1)
    }
}

impl Identified for Post {
    fn id(&self) -> &str {
        &self.id
    }
}

/// A single post with its rendered body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: Post,

    /// Raw markdown body
    #[serde(skip)]
    pub raw: String,

    /// Rendered HTML body
    pub content_html: String,

    /// Newer neighbour
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev: Option<PostLink>,

    /// Older neighbour
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<PostLink>,
}

/// Reference to a neighbouring post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostLink {
    pub id: String,
    pub title: String,
}

impl From<&Post> for PostLink {
    fn from(post: &Post) -> Self {
        Self {
            id: post.id.clone(),
            title: post.title.clone(),
        }
    }
}

/// Front-matter accepted in a post file
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct PostMatter {
    #[serde(deserialize_with = "opt_string")]
    pub title: Option<String>,
    #[serde(deserialize_with = "opt_string")]
    pub date: Option<String>,
    #[serde(deserialize_with = "opt_string")]
    pub excerpt: Option<String>,
    #[serde(deserialize_with = "string_or_vec")]
    pub tags: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn post(id: &str, day: u32) -> Post {
        Post::new(id, id, Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap())
    }

    #[test]
    fn test_neighbours() {
        let posts = vec![post("c", 3), post("b", 2), post("a", 1)];
        assert_eq!(posts[1].prev(&posts).map(|p| p.id.as_str()), Some("c"));
        assert_eq!(posts[1].next(&posts).map(|p| p.id.as_str()), Some("a"));
        assert!(posts[0].prev(&posts).is_none());
        assert!(posts[2].next(&posts).is_none());
    }

    #[test]
    fn test_serializes_canonical_date() {
        let mut p = post("hello", 15);
        p.tags = vec!["rust".to_string()];
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["date"], "2024-01-15T00:00:00.000Z");
        assert!(json.get("excerpt").is_none());

        let back: Post = serde_json::from_value(json).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn test_detail_json_keys() {
        let detail = PostDetail {
            post: post("hello", 15),
            raw: "body".to_string(),
            content_html: "<p>body</p>".to_string(),
            prev: Some(PostLink::from(&post("newer", 16))),
            next: None,
        };
        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["contentHtml"], "<p>body</p>");
        assert!(json.get("content_html").is_none());
        assert!(json.get("raw").is_none());
        assert_eq!(json["id"], "hello");
        assert_eq!(json["prev"]["id"], "newer");
        assert!(json.get("next").is_none());
    }
}
