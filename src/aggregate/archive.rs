//! Year archive

use chrono::Datelike;
use chrono_tz::Tz;
use indexmap::IndexMap;
use std::collections::BTreeMap;

use crate::content::Post;

/// Posts keyed by year, newest year first; each year's posts newest first
pub type PostsByYear = IndexMap<String, Vec<Post>>;

/// Bucket posts by the year of their date in `tz`.
pub fn group_by_year(posts: &[Post], tz: Tz) -> PostsByYear {
    let mut years: BTreeMap<i32, Vec<Post>> = BTreeMap::new();
    for post in posts {
        let year = post.date.with_timezone(&tz).year();
        years.entry(year).or_default().push(post.clone());
    }

    years
        .into_iter()
        .rev()
        .map(|(year, mut bucket)| {
            bucket.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.id.cmp(&b.id)));
            (year.to_string(), bucket)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::collections::HashSet;

    fn post(id: &str, y: i32, m: u32, d: u32) -> Post {
        Post::new(id, id, Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap())
    }

    #[test]
    fn test_two_years() {
        let mut posts = Vec::new();
        for m in 1..=10 {
            posts.push(post(&format!("a{}", m), 2023, m, 1));
        }
        for m in 1..=5 {
            posts.push(post(&format!("b{}", m), 2024, m, 1));
        }

        let grouped = group_by_year(&posts, Tz::UTC);
        let years: Vec<_> = grouped.keys().cloned().collect();
        assert_eq!(years, vec!["2024", "2023"]);
        assert_eq!(grouped["2024"].len(), 5);
        assert_eq!(grouped["2023"].len(), 10);

        for bucket in grouped.values() {
            assert!(bucket.windows(2).all(|w| w[0].date >= w[1].date));
        }
        assert_eq!(grouped["2024"][0].id, "b5");
        assert_eq!(grouped["2023"][0].id, "a10");
    }

    #[test]
    fn test_buckets_partition_input() {
        let posts = vec![
            post("x", 2021, 12, 31),
            post("y", 2022, 1, 1),
            post("z", 2021, 6, 1),
            post("w", 2020, 2, 29),
        ];
        let grouped = group_by_year(&posts, Tz::UTC);
        let ids: Vec<_> = grouped.values().flatten().map(|p| p.id.clone()).collect();
        assert_eq!(ids.len(), posts.len());
        let unique: HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), posts.len());
    }

    #[test]
    fn test_year_follows_timezone() {
        // 2023-12-31 20:00 UTC is already 2024 in Shanghai
        let p = Post::new("eve", "eve", Utc.with_ymd_and_hms(2023, 12, 31, 20, 0, 0).unwrap());
        assert!(group_by_year(std::slice::from_ref(&p), Tz::UTC).contains_key("2023"));
        assert!(group_by_year(&[p], chrono_tz::Asia::Shanghai).contains_key("2024"));
    }

    #[test]
    fn test_empty() {
        assert!(group_by_year(&[], Tz::UTC).is_empty());
    }
}
