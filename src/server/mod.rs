//! Development server: JSON API over the content service, static files from the public dir

use anyhow::Result;
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use notify_debouncer_mini::{new_debouncer, notify::RecursiveMode};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::aggregate::{PostsByYear, ReadingStats, TagCount};
use crate::content::{Book, ContentLoader, Friend, Note, Post, PostDetail, ReadingStatus};
use crate::feed;
use crate::pagination::Paginated;
use crate::service::ContentService;

type AppState = Arc<ContentService>;

/// Errors returned by API handlers
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0} not found")]
    NotFound(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),

    #[error("request task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) | ApiError::Join(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{:#}", self);
        }
        let body = serde_json::json!({ "error": self.to_string() });
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<usize>,
    pub page_size: Option<usize>,
    pub tag: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BookQuery {
    pub status: Option<String>,
    pub tag: Option<String>,
}

/// Build the application router
pub fn router(service: AppState) -> Router {
    let public_dir = service.site().public_dir.clone();
    let feed_path = format!("/{}", service.site().config.feed.path.trim_start_matches('/'));

    Router::new()
        .route("/api/posts", get(posts))
        .route("/api/posts/all", get(all_posts))
        .route("/api/posts/:id", get(post))
        .route("/api/notes", get(notes))
        .route("/api/notes/all", get(all_notes))
        .route("/api/tags", get(tags))
        .route("/api/archive", get(archive))
        .route("/api/books", get(books))
        .route("/api/reading/stats", get(reading_stats))
        .route("/api/friends", get(friends))
        .route(&feed_path, get(rss))
        .fallback(move |request: Request<Body>| static_file(public_dir.clone(), request))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

/// Start the development server
pub async fn start(service: ContentService, ip: &str, port: u16, watch: bool) -> Result<()> {
    let content_dir = service.site().content_dir.clone();
    let service = Arc::new(service);
    let app = router(Arc::clone(&service));

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    println!("Server running at http://{}:{}", ip, port);
    if watch {
        println!("Watching {} for changes...", content_dir.display());
    }
    println!("Press Ctrl+C to stop.");

    if watch {
        tokio::task::spawn_blocking(move || {
            if let Err(e) = watch_and_invalidate(content_dir, service) {
                tracing::error!("File watcher error: {}", e);
            }
        });
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Drop cached content whenever a file under `content_dir` changes
fn watch_and_invalidate(content_dir: PathBuf, service: AppState) -> Result<()> {
    let (tx, rx) = std::sync::mpsc::channel();

    // Create debouncer to coalesce bursts of writes
    let mut debouncer = new_debouncer(Duration::from_millis(500), tx)?;
    if content_dir.exists() {
        debouncer
            .watcher()
            .watch(&content_dir, RecursiveMode::Recursive)?;
        tracing::debug!("Watching: {:?}", content_dir);
    }

    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                let relevant: Vec<_> = events
                    .iter()
                    .filter(|e| {
                        let path_str = e.path.to_string_lossy();
                        !path_str.contains(".git")
                            && !path_str.contains(".DS_Store")
                            && !path_str.ends_with('~')
                    })
                    .collect();
                if relevant.is_empty() {
                    continue;
                }
                for event in &relevant {
                    tracing::info!("File changed: {}", event.path.display());
                }
                service.invalidate();
            }
            Ok(Err(e)) => {
                tracing::error!("Watch error: {:?}", e);
            }
            Err(e) => {
                tracing::error!("Channel error: {:?}", e);
                break;
            }
        }
    }

    Ok(())
}

/// Run a service call on the blocking pool
async fn blocking<T, F>(service: AppState, f: F) -> std::result::Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&ContentService) -> Result<T> + Send + 'static,
{
    Ok(tokio::task::spawn_blocking(move || f(&service)).await??)
}

pub async fn posts(
    State(service): State<AppState>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Paginated<Post>> {
    let page = query.page.unwrap_or(1);
    let page_size = query
        .page_size
        .unwrap_or(service.site().config.per_page);
    let page = blocking(service, move |s| {
        s.paginated_posts(page, page_size, query.tag.as_deref())
    })
    .await?;
    Ok(Json(page))
}

pub async fn all_posts(State(service): State<AppState>) -> ApiResult<Vec<Post>> {
    let posts = blocking(service, |s| s.all_posts()).await?;
    Ok(Json(posts.to_vec()))
}

pub async fn post(
    State(service): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<PostDetail> {
    let lookup = id.clone();
    match blocking(service, move |s| s.post(&lookup)).await? {
        Some(detail) => Ok(Json(detail)),
        None => Err(ApiError::NotFound(format!("post {:?}", id))),
    }
}

pub async fn notes(
    State(service): State<AppState>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Paginated<Note>> {
    let page = query.page.unwrap_or(1);
    let page_size = query
        .page_size
        .unwrap_or(service.site().config.notes_per_page);
    let page = blocking(service, move |s| s.paginated_notes(page, page_size)).await?;
    Ok(Json(page))
}

pub async fn all_notes(State(service): State<AppState>) -> ApiResult<Vec<Note>> {
    let notes = blocking(service, |s| s.all_notes()).await?;
    Ok(Json(notes.to_vec()))
}

pub async fn tags(State(service): State<AppState>) -> ApiResult<Vec<TagCount>> {
    Ok(Json(blocking(service, |s| s.tags()).await?))
}

pub async fn archive(State(service): State<AppState>) -> ApiResult<PostsByYear> {
    Ok(Json(blocking(service, |s| s.posts_by_year()).await?))
}

pub async fn books(
    State(service): State<AppState>,
    Query(query): Query<BookQuery>,
) -> ApiResult<Vec<Book>> {
    let status = query.status.as_deref().and_then(parse_status);
    let books = blocking(service, move |s| s.books(status, query.tag.as_deref())).await?;
    Ok(Json(books))
}

pub async fn reading_stats(State(service): State<AppState>) -> ApiResult<ReadingStats> {
    Ok(Json(blocking(service, |s| s.reading_stats()).await?))
}

pub async fn friends(State(service): State<AppState>) -> ApiResult<Vec<Friend>> {
    let friends = blocking(service, |s| s.all_friends()).await?;
    Ok(Json(friends.to_vec()))
}

pub async fn rss(State(service): State<AppState>) -> std::result::Result<Response, ApiError> {
    let body = blocking(service, |s| {
        let details = ContentLoader::new(s.site()).load_post_details()?;
        Ok(feed::build_rss(&s.site().config, &details, Utc::now()))
    })
    .await?;
    Ok((
        [(header::CONTENT_TYPE, "application/rss+xml; charset=utf-8")],
        body,
    )
        .into_response())
}

/// `status` query value: `all` or empty means no filter
fn parse_status(value: &str) -> Option<ReadingStatus> {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("all") {
        return None;
    }
    Some(
        ReadingStatus::ALL
            .into_iter()
            .find(|s| s.as_str() == value)
            .unwrap_or_else(|| ReadingStatus::from_label(value)),
    )
}

/// Serve files from the public directory
async fn static_file(public_dir: PathBuf, request: Request<Body>) -> Response {
    let mut service = ServeDir::new(&public_dir).append_index_html_on_directories(true);
    match service.try_call(request).await {
        Ok(response) => response.into_response(),
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::Site;
    use std::fs;
    use tempfile::TempDir;

    fn write(site: &Site, rel: &str, content: &str) {
        let path = site.content_dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn state() -> (TempDir, AppState) {
        let tmp = TempDir::new().unwrap();
        let mut config = SiteConfig::default();
        config.per_page = 1;
        let site = Site::with_config(tmp.path(), config);
        write(&site, "posts/hello.md", "---\ntitle: Hello\ndate: 2024-01-01\ntags: [rust]\n---\nHi");
        write(&site, "posts/older.md", "---\ntitle: Older\ndate: 2023-01-01\n---\nOld");
        write(&site, "books/b.md", "---\ntitle: Book\nstatus: 在读\n---\n");
        (tmp, Arc::new(ContentService::new(site)))
    }

    #[tokio::test]
    async fn test_posts_pages() {
        let (_tmp, service) = state();
        let Json(page) = posts(State(service.clone()), Query(PageQuery::default()))
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id, "hello");
        assert!(page.has_more);

        let query = PageQuery {
            page: Some(5),
            page_size: Some(10),
            tag: None,
        };
        let Json(beyond) = posts(State(service), Query(query)).await.unwrap();
        assert!(beyond.items.is_empty());
        assert!(!beyond.has_more);
    }

    #[tokio::test]
    async fn test_post_not_found() {
        let (_tmp, service) = state();
        let Json(detail) = post(State(service.clone()), Path("hello".to_string()))
            .await
            .unwrap();
        assert_eq!(detail.next.unwrap().id, "older");

        let err = post(State(service), Path("nope".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_books_filter() {
        let (_tmp, service) = state();
        let query = BookQuery {
            status: Some("reading".to_string()),
            tag: None,
        };
        let Json(reading) = books(State(service.clone()), Query(query)).await.unwrap();
        assert_eq!(reading.len(), 1);

        let query = BookQuery {
            status: Some("completed".to_string()),
            tag: None,
        };
        let Json(done) = books(State(service.clone()), Query(query)).await.unwrap();
        assert!(done.is_empty());

        let Json(stats) = reading_stats(State(service)).await.unwrap();
        assert_eq!(stats.reading_books, 1);
    }

    #[tokio::test]
    async fn test_rss() {
        let (_tmp, service) = state();
        let response = rss(State(service)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/rss+xml; charset=utf-8"
        );
    }

    #[test]
    fn test_parse_status() {
        assert_eq!(parse_status("all"), None);
        assert_eq!(parse_status(""), None);
        assert_eq!(parse_status("want-to-read"), Some(ReadingStatus::WantToRead));
        assert_eq!(parse_status("已读"), Some(ReadingStatus::Completed));
    }
}
