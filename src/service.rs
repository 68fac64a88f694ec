//! Read operations behind the blog's pages
//!
//! [`ContentService`] loads collections through the [`ContentLoader`],
//! keeps them in a [`TtlCache`], and derives the views a page needs
//! (pages, tag cloud, archive, reading statistics) from the cached data.

use anyhow::Result;
use std::future::Future;
use std::sync::Arc;

use crate::aggregate::{self, PostsByYear, ReadingStats, TagCount};
use crate::cache::TtlCache;
use crate::content::{Book, ContentLoader, Friend, Note, Post, PostDetail, PostLink, ReadingStatus};
use crate::pagination::{paginate, FetchError, PageSource, Paginated};
use crate::Site;

const POSTS: &str = "posts";
const NOTES: &str = "notes";
const BOOKS: &str = "books";
const FRIENDS: &str = "friends";

pub struct ContentService {
    site: Site,
    cache: TtlCache,
}

impl ContentService {
    pub fn new(site: Site) -> Self {
        let cache = TtlCache::new(site.config.cache_ttl());
        Self { site, cache }
    }

    pub fn site(&self) -> &Site {
        &self.site
    }

    fn loader(&self) -> ContentLoader<'_> {
        ContentLoader::new(&self.site)
    }

    /// All post metadata, newest first
    pub fn all_posts(&self) -> Result<Arc<Vec<Post>>> {
        self.cache.get_or_fetch(POSTS, || self.loader().load_posts())
    }

    /// All notes, newest first
    pub fn all_notes(&self) -> Result<Arc<Vec<Note>>> {
        self.cache.get_or_fetch(NOTES, || self.loader().load_notes())
    }

    pub fn all_books(&self) -> Result<Arc<Vec<Book>>> {
        self.cache.get_or_fetch(BOOKS, || self.loader().load_books())
    }

    pub fn all_friends(&self) -> Result<Arc<Vec<Friend>>> {
        self.cache.get_or_fetch(FRIENDS, || self.loader().load_friends())
    }

    pub fn paginated_notes(&self, page: usize, page_size: usize) -> Result<Paginated<Note>> {
        Ok(paginate(&self.all_notes()?, page, page_size))
    }

    /// One page of posts, optionally restricted to a tag
    pub fn paginated_posts(
        &self,
        page: usize,
        page_size: usize,
        tag: Option<&str>,
    ) -> Result<Paginated<Post>> {
        let posts = self.all_posts()?;
        Ok(match tag.filter(|t| !t.is_empty()) {
            Some(tag) => paginate(&aggregate::posts_with_tag(&posts, tag), page, page_size),
            None => paginate(&posts, page, page_size),
        })
    }

    pub fn tags(&self) -> Result<Vec<TagCount>> {
        Ok(aggregate::tag_counts(&self.all_posts()?))
    }

    pub fn posts_by_year(&self) -> Result<PostsByYear> {
        Ok(aggregate::group_by_year(&self.all_posts()?, self.site.config.tz()))
    }

    /// A single post with its rendered body and neighbours
    pub fn post(&self, id: &str) -> Result<Option<PostDetail>> {
        let Some(mut detail) = self.loader().load_post(id)? else {
            return Ok(None);
        };
        let posts = self.all_posts()?;
        detail.prev = detail.post.prev(&posts).map(PostLink::from);
        detail.next = detail.post.next(&posts).map(PostLink::from);
        Ok(Some(detail))
    }

    /// Reading list filtered by status and tag; `None` means no filter
    pub fn books(&self, status: Option<ReadingStatus>, tag: Option<&str>) -> Result<Vec<Book>> {
        let books = self.all_books()?;
        let mut selected = match status {
            Some(status) => aggregate::books_by_status(&books, status),
            None => books.to_vec(),
        };
        if let Some(tag) = tag.filter(|t| !t.is_empty()) {
            selected = aggregate::books_by_tag(&selected, tag);
        }
        Ok(selected)
    }

    pub fn reading_stats(&self) -> Result<ReadingStats> {
        Ok(aggregate::reading_stats(&self.all_books()?))
    }

    /// Drop every cached collection
    pub fn invalidate(&self) {
        tracing::debug!("Invalidating content cache");
        self.cache.clear();
    }
}

/// Posts served page by page from a shared service
pub struct PostFeed {
    service: Arc<ContentService>,
    tag: Option<String>,
}

impl PostFeed {
    pub fn new(service: Arc<ContentService>, tag: Option<String>) -> Self {
        Self { service, tag }
    }
}

impl PageSource<Post> for PostFeed {
    fn fetch_page(
        &self,
        page: usize,
        page_size: usize,
    ) -> impl Future<Output = Result<Paginated<Post>, FetchError>> + Send {
        let service = Arc::clone(&self.service);
        let tag = self.tag.clone();
        blocking_page(page, move || {
            service.paginated_posts(page, page_size, tag.as_deref())
        })
    }
}

/// Notes served page by page from a shared service
pub struct NoteFeed {
    service: Arc<ContentService>,
}

impl NoteFeed {
    pub fn new(service: Arc<ContentService>) -> Self {
        Self { service }
    }
}

impl PageSource<Note> for NoteFeed {
    fn fetch_page(
        &self,
        page: usize,
        page_size: usize,
    ) -> impl Future<Output = Result<Paginated<Note>, FetchError>> + Send {
        let service = Arc::clone(&self.service);
        blocking_page(page, move || service.paginated_notes(page, page_size))
    }
}

/// Run a filesystem-bound page load off the async runtime
async fn blocking_page<T, F>(page: usize, load: F) -> Result<Paginated<T>, FetchError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<Paginated<T>> + Send + 'static,
{
    match tokio::task::spawn_blocking(load).await {
        Ok(Ok(paginated)) => Ok(paginated),
        Ok(Err(e)) => Err(FetchError::Source {
            page,
            message: format!("{:#}", e),
        }),
        Err(e) => Err(FetchError::Aborted(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::pagination::{InfiniteScroll, LoadOutcome};
    use std::fs;
    use tempfile::TempDir;

    fn write(site: &Site, rel: &str, content: &str) {
        let path = site.content_dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn fixture() -> (TempDir, Site) {
        let tmp = TempDir::new().unwrap();
        let site = Site::with_config(tmp.path(), SiteConfig::default());
        write(&site, "posts/first.md", "---\ntitle: First\ndate: 2023-03-01\ntags: [rust]\n---\nOne");
        write(&site, "posts/second.md", "---\ntitle: Second\ndate: 2023-08-01\ntags: [rust, life]\n---\nTwo");
        write(&site, "posts/third.md", "---\ntitle: Third\ndate: 2024-02-01\ntags: life\n---\nThree");
        write(&site, "books/dune.md", "---\ntitle: Dune\nauthor: Frank Herbert\nstatus: 已读\nrating: 5\ntags: [科幻]\n---\n");
        write(&site, "books/sapiens.md", "---\ntitle: Sapiens\nstatus: reading\ntags: [历史]\n---\n");
        (tmp, site)
    }

    #[test]
    fn test_posts_and_views() {
        let (_tmp, site) = fixture();
        let service = ContentService::new(site);

        let ids: Vec<_> = service.all_posts().unwrap().iter().map(|p| p.id.clone()).collect();
        assert_eq!(ids, vec!["third", "second", "first"]);

        let page = service.paginated_posts(1, 2, None).unwrap();
        assert_eq!(page.items.len(), 2);
        assert!(page.has_more);

        let tagged = service.paginated_posts(1, 10, Some("life")).unwrap();
        assert_eq!(tagged.total, 2);

        let tags = service.tags().unwrap();
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].count, 2);

        let years: Vec<_> = service.posts_by_year().unwrap().keys().cloned().collect();
        assert_eq!(years, vec!["2024", "2023"]);
    }

    #[test]
    fn test_filter_posts_by_tag_slug() {
        let (_tmp, site) = fixture();
        write(&site, "posts/web.md", "---\ntitle: Web\ndate: 2024-03-01\ntags: [Web Dev]\n---\n");
        let service = ContentService::new(site);

        let tag = service
            .tags()
            .unwrap()
            .into_iter()
            .find(|t| t.tag == "Web Dev")
            .unwrap();
        assert_eq!(tag.slug, "web-dev");

        let by_slug = service.paginated_posts(1, 10, Some(&tag.slug)).unwrap();
        let by_label = service.paginated_posts(1, 10, Some("Web Dev")).unwrap();
        assert_eq!(by_slug.total, 1);
        assert_eq!(by_slug.items[0].id, "web");
        assert_eq!(by_slug, by_label);
    }

    #[test]
    fn test_post_neighbours() {
        let (_tmp, site) = fixture();
        let service = ContentService::new(site);

        let detail = service.post("second").unwrap().unwrap();
        assert_eq!(detail.prev.unwrap().id, "third");
        assert_eq!(detail.next.unwrap().id, "first");
        assert!(detail.content_html.contains("Two"));

        assert!(service.post("missing").unwrap().is_none());
        assert!(service.post("../secret").unwrap().is_none());
    }

    #[test]
    fn test_books() {
        let (_tmp, site) = fixture();
        let service = ContentService::new(site);

        assert_eq!(service.books(None, None).unwrap().len(), 2);
        let completed = service.books(Some(ReadingStatus::Completed), None).unwrap();
        assert_eq!(completed[0].id, "dune");
        assert_eq!(service.books(None, Some("历史")).unwrap()[0].id, "sapiens");

        let stats = service.reading_stats().unwrap();
        assert_eq!(stats.completed_books, 1);
        assert_eq!(stats.average_rating, 5.0);
    }

    #[test]
    fn test_cache_until_invalidated() {
        let (_tmp, site) = fixture();
        let service = ContentService::new(site.clone());
        let before = service.all_posts().unwrap();

        write(&site, "posts/fourth.md", "---\ntitle: Fourth\ndate: 2024-05-01\n---\n");
        let cached = service.all_posts().unwrap();
        assert!(Arc::ptr_eq(&before, &cached));
        assert_eq!(cached.len(), 3);

        service.invalidate();
        assert_eq!(service.all_posts().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_scroll_over_post_feed() {
        let (_tmp, site) = fixture();
        let service = Arc::new(ContentService::new(site));
        let scroll = InfiniteScroll::new(Arc::new(PostFeed::new(service, None)), 2);

        assert_eq!(scroll.load_more().await, LoadOutcome::Loaded { page: 1, added: 2 });
        assert_eq!(scroll.load_more().await, LoadOutcome::Loaded { page: 2, added: 1 });
        assert_eq!(scroll.load_more().await, LoadOutcome::Exhausted);
        let ids: Vec<_> = scroll.items().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["third", "second", "first"]);
    }
}
