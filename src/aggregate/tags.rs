//! Tag frequencies

use serde::Serialize;
use std::collections::HashMap;

use crate::content::Post;

/// A tag and the number of posts carrying it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
    /// URL-friendly form of the tag
    pub slug: String,
}

/// Count tag occurrences across `posts`, most used first.
/// Ties are ordered by tag name.
pub fn tag_counts(posts: &[Post]) -> Vec<TagCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for post in posts {
        for tag in &post.tags {
            *counts.entry(tag.as_str()).or_insert(0) += 1;
        }
    }

    let mut tags: Vec<TagCount> = counts
        .into_iter()
        .map(|(tag, count)| TagCount {
            tag: tag.to_string(),
            count,
            slug: slug::slugify(tag),
        })
        .collect();
    tags.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));
    tags
}

/// Posts carrying `tag`, given as the label or its slug, in input order
pub fn posts_with_tag(posts: &[Post], tag: &str) -> Vec<Post> {
    posts
        .iter()
        .filter(|p| p.tags.iter().any(|t| tag_matches(t, tag)))
        .cloned()
        .collect()
}

/// Whether `query` names `tag` by label or by slug
pub(crate) fn tag_matches(tag: &str, query: &str) -> bool {
    tag == query || slug::slugify(tag) == query
}
