//! Content loader - reads posts, notes, books and friends from the content directory

use anyhow::Result;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::book::BookMatter;
use super::frontmatter::parse_date;
use super::friend::FriendMatter;
use super::note::NoteMatter;
use super::post::PostMatter;
use super::{Book, Friend, FrontMatter, MarkdownRenderer, Note, Post, PostDetail, ReadingStatus};
use crate::Site;

/// Loads content records from the site's content directory.
///
/// Every loader is total over a directory: a missing directory is an empty
/// collection, and a file that cannot be read or whose front-matter is
/// malformed is skipped with a warning.
pub struct ContentLoader<'a> {
    site: &'a Site,
    tz: Tz,
    now: DateTime<Utc>,
}

impl<'a> ContentLoader<'a> {
    /// Create a new content loader
    pub fn new(site: &'a Site) -> Self {
        Self {
            site,
            tz: site.config.tz(),
            now: Utc::now(),
        }
    }

    /// Load metadata of all posts, newest first
    pub fn load_posts(&self) -> Result<Vec<Post>> {
        let mut posts: Vec<Post> = load_dir(&self.site.posts_dir(), "post", |id, content| {
            Ok(self.read_post(id, content)?.map(|(post, _)| post))
        });
        sort_newest_first(&mut posts, |p| (&p.date, &p.id));
        Ok(posts)
    }

    /// Load all posts with rendered bodies, newest first
    pub fn load_post_details(&self) -> Result<Vec<PostDetail>> {
        let renderer = self.renderer();
        let mut details: Vec<PostDetail> = load_dir(&self.site.posts_dir(), "post", |id, content| {
            Ok(self
                .read_post(id, content)?
                .map(|(post, body)| detail(&renderer, post, body)))
        });
        sort_newest_first(&mut details, |d| (&d.post.date, &d.post.id));
        Ok(details)
    }

    /// Load a single post by identifier. Unknown identifiers give `None`.
    pub fn load_post(&self, id: &str) -> Result<Option<PostDetail>> {
        if id.is_empty() || id.contains(['/', '\\']) || id.starts_with('.') {
            return Ok(None);
        }

        let dir = self.site.posts_dir();
        let Some(path) = MARKDOWN_EXTENSIONS
            .iter()
            .map(|ext| dir.join(format!("{}.{}", id, ext)))
            .find(|p| p.is_file())
        else {
            return Ok(None);
        };

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("Failed to read post {:?}: {}", path, e);
                return Ok(None);
            }
        };
        let renderer = self.renderer();
        match self.read_post(id, &content) {
            Ok(found) => Ok(found.map(|(post, body)| detail(&renderer, post, body))),
            Err(e) => {
                tracing::warn!("Skipping post {:?}: {:#}", path, e);
                Ok(None)
            }
        }
    }

    fn read_post<'c>(&self, id: &str, content: &'c str) -> Result<Option<(Post, &'c str)>> {
        let (fm, body) = FrontMatter::parse::<PostMatter>(content)?;

        let Some(date) = self.date_or_now(fm.date.as_deref(), id)? else {
            return Ok(None);
        };
        let title = fm
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| Post::UNTITLED.to_string());

        let excerpt = fm
            .excerpt
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .or_else(|| MarkdownRenderer::split_excerpt(body).map(MarkdownRenderer::plain_text));

        let mut post = Post::new(id, title, date);
        post.excerpt = excerpt;
        post.tags = fm.tags;
        Ok(Some((post, body)))
    }

    /// Load all notes, newest first
    pub fn load_notes(&self) -> Result<Vec<Note>> {
        let mut notes: Vec<Note> = load_dir(&self.site.notes_dir(), "note", |id, content| {
            let (fm, body) = FrontMatter::parse::<NoteMatter>(content)?;
            let Some(date) = self.date_or_now(fm.date.as_deref(), id)? else {
                return Ok(None);
            };
            Ok(Some(Note {
                id: id.to_string(),
                content: body.trim().to_string(),
                date,
            }))
        });
        sort_newest_first(&mut notes, |n| (&n.date, &n.id));
        Ok(notes)
    }

    /// Load the reading list, ordered by title
    pub fn load_books(&self) -> Result<Vec<Book>> {
        let mut books: Vec<Book> = load_dir(&self.site.books_dir(), "book", |id, content| {
            let (fm, _) = FrontMatter::parse::<BookMatter>(content)?;

            let title = non_empty(fm.title);
            let Some(title) = title else {
                tracing::warn!("Skipping book {}: missing title", id);
                return Ok(None);
            };

            let start_date = self.optional_date(fm.start_date.as_deref())?;
            let end_date = self.optional_date(fm.end_date.as_deref())?;

            let mut book = Book::new(id, title, non_empty(fm.author).unwrap_or_default());
            book.status = fm
                .status
                .as_deref()
                .map(ReadingStatus::from_label)
                .unwrap_or_default();
            book.rating = fm.rating.filter(|r| *r > 0.0);
            book.start_date = start_date;
            book.end_date = end_date;
            book.progress = fm.progress;
            book.review = non_empty(fm.review);
            book.tags = fm.tags;
            book.description = non_empty(fm.description).unwrap_or_default();
            book.isbn = non_empty(fm.isbn);
            book.pages = fm.pages.filter(|p| *p > 0);
            book.publisher = non_empty(fm.publisher);
            book.published_year = fm.published_year;
            book.cover = non_empty(fm.cover);
            Ok(Some(book))
        });
        books.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.id.cmp(&b.id)));
        Ok(books)
    }

    /// Load friend links, ordered by name
    pub fn load_friends(&self) -> Result<Vec<Friend>> {
        let mut friends: Vec<Friend> = load_dir(&self.site.friends_dir(), "friend", |id, content| {
            let (fm, _) = FrontMatter::parse::<FriendMatter>(content)?;
            match (non_empty(fm.name), non_empty(fm.url)) {
                (Some(name), Some(url)) => Ok(Some(Friend {
                    name,
                    url,
                    description: non_empty(fm.description),
                })),
                _ => {
                    tracing::warn!("Skipping friend {}: name and url are required", id);
                    Ok(None)
                }
            }
        });
        friends.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(friends)
    }

    fn renderer(&self) -> MarkdownRenderer {
        let highlight = &self.site.config.highlight;
        MarkdownRenderer::with_options(&highlight.theme, highlight.line_number)
    }

    /// A missing date means "now"; an unparseable one drops the record.
    fn date_or_now(&self, raw: Option<&str>, id: &str) -> Result<Option<DateTime<Utc>>> {
        match raw.map(str::trim).filter(|s| !s.is_empty()) {
            None => Ok(Some(self.now)),
            Some(s) => match parse_date(s, self.tz) {
                Some(dt) => Ok(Some(dt)),
                None => {
                    tracing::warn!("Skipping {}: unrecognized date {:?}", id, s);
                    Ok(None)
                }
            },
        }
    }

    fn optional_date(&self, raw: Option<&str>) -> Result<Option<DateTime<Utc>>> {
        match raw.map(str::trim).filter(|s| !s.is_empty()) {
            None => Ok(None),
            Some(s) => parse_date(s, self.tz)
                .map(Some)
                .ok_or_else(|| anyhow::anyhow!("unrecognized date {:?}", s)),
        }
    }
}

fn detail(renderer: &MarkdownRenderer, post: Post, body: &str) -> PostDetail {
    PostDetail {
        post,
        raw: body.to_string(),
        content_html: renderer.render(body),
        prev: None,
        next: None,
    }
}

/// Read every markdown file directly inside `dir` and parse it with `parse`.
///
/// `parse` receives the identifier (file stem) and the file content. It
/// returns `Ok(None)` to exclude a record; errors exclude the record too.
/// When two files share a stem (`a.md`, `a.markdown`) only the first in
/// [`markdown_files`] order is read.
fn load_dir<T, F>(dir: &Path, kind: &str, mut parse: F) -> Vec<T>
where
    F: FnMut(&str, &str) -> Result<Option<T>>,
{
    if !dir.is_dir() {
        tracing::debug!("No {} directory at {:?}", kind, dir);
        return Vec::new();
    }

    let mut records = Vec::new();
    let mut seen = HashSet::new();
    for path in markdown_files(dir) {
        let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if !seen.insert(id.to_string()) {
            tracing::warn!("Skipping {} {:?}: duplicate identifier {:?}", kind, path, id);
            continue;
        }
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("Failed to read {} {:?}: {}", kind, path, e);
                continue;
            }
        };
        match parse(id, &content) {
            Ok(Some(record)) => records.push(record),
            Ok(None) => {}
            Err(e) => tracing::warn!("Skipping {} {:?}: {:#}", kind, path, e),
        }
    }

    tracing::debug!("Loaded {} {} records from {:?}", records.len(), kind, dir);
    records
}

/// Markdown files directly inside `dir`, ordered by stem with `.md` before `.markdown`
fn markdown_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| p.is_file() && is_markdown_file(p))
        .collect();
    files.sort_by(|a, b| {
        a.file_stem()
            .cmp(&b.file_stem())
            .then_with(|| extension_rank(a).cmp(&extension_rank(b)))
    });
    files
}

/// Lookup order of markdown extensions, shared with [`ContentLoader::load_post`]
const MARKDOWN_EXTENSIONS: [&str; 2] = ["md", "markdown"];

fn extension_rank(path: &Path) -> usize {
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(|e| MARKDOWN_EXTENSIONS.iter().position(|m| *m == e))
        .unwrap_or(MARKDOWN_EXTENSIONS.len())
}

/// Check if a file is a markdown file
fn is_markdown_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| MARKDOWN_EXTENSIONS.contains(&e))
        .unwrap_or(false)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn sort_newest_first<T, F>(items: &mut [T], key: F)
where
    F: Fn(&T) -> (&DateTime<Utc>, &String),
{
    items.sort_by(|a, b| {
        let (da, ia) = key(a);
        let (db, ib) = key(b);
        db.cmp(da).then_with(|| ia.cmp(ib))
    });
}
