//! List site content

use anyhow::Result;
use std::io::{self, Write};

use crate::aggregate;
use crate::service::ContentService;
use crate::Site;

/// List site content by type
pub fn run(site: &Site, content_type: &str) -> Result<()> {
    let stdout = io::stdout();
    write_listing(site, content_type, &mut stdout.lock())
}

pub fn write_listing<W: Write>(site: &Site, content_type: &str, out: &mut W) -> Result<()> {
    let service = ContentService::new(site.clone());
    let tz = site.config.tz();

    match content_type {
        "post" | "posts" => {
            let posts = service.all_posts()?;
            writeln!(out, "Posts ({}):", posts.len())?;
            for post in posts.iter() {
                writeln!(
                    out,
                    "  {} - {} [{}]",
                    post.date.with_timezone(&tz).format("%Y-%m-%d"),
                    post.title,
                    post.id
                )?;
            }
        }
        "note" | "notes" => {
            let notes = service.all_notes()?;
            writeln!(out, "Notes ({}):", notes.len())?;
            for note in notes.iter() {
                let first_line = note.content.lines().next().unwrap_or_default();
                writeln!(
                    out,
                    "  {} - {}",
                    note.date.with_timezone(&tz).format("%Y-%m-%d %H:%M"),
                    first_line
                )?;
            }
        }
        "tag" | "tags" => {
            let tags = service.tags()?;
            writeln!(out, "Tags ({}):", tags.len())?;
            for tag in tags {
                writeln!(out, "  {} ({})", tag.tag, tag.count)?;
            }
        }
        "archive" => {
            let years = service.posts_by_year()?;
            writeln!(out, "Archive ({} years):", years.len())?;
            for (year, posts) in &years {
                writeln!(out, "  {} ({})", year, posts.len())?;
                for post in posts {
                    writeln!(out, "    {} - {}", post.date.with_timezone(&tz).format("%m-%d"), post.title)?;
                }
            }
        }
        "book" | "books" => {
            let books = service.all_books()?;
            let counts = aggregate::status_counts(&books);
            writeln!(
                out,
                "Books ({}: {} reading, {} completed, {} want to read):",
                counts.all, counts.reading, counts.completed, counts.want_to_read
            )?;
            for book in books.iter() {
                let rating = book
                    .rating
                    .map(|r| format!(" ★{}", r))
                    .unwrap_or_default();
                writeln!(
                    out,
                    "  [{}] {} - {}{}",
                    book.status.label_zh(),
                    book.title,
                    book.author,
                    rating
                )?;
            }
        }
        "stats" => {
            let stats = service.reading_stats()?;
            writeln!(out, "Reading stats:")?;
            writeln!(out, "  Total: {}", stats.total_books)?;
            writeln!(out, "  Completed: {}", stats.completed_books)?;
            writeln!(out, "  Reading: {}", stats.reading_books)?;
            writeln!(out, "  Want to read: {}", stats.want_to_read_books)?;
            writeln!(out, "  Average rating: {:.1}", stats.average_rating)?;
            writeln!(out, "  Pages read: {}", stats.total_pages)?;
            if let Some(genre) = &stats.favorite_genre {
                writeln!(out, "  Favorite genre: {}", genre)?;
            }
            let tags = aggregate::book_tags(&service.all_books()?);
            if !tags.is_empty() {
                writeln!(out, "  Tags: {}", tags.join(", "))?;
            }
        }
        "friend" | "friends" => {
            let friends = service.all_friends()?;
            writeln!(out, "Friends ({}):", friends.len())?;
            for friend in friends.iter() {
                writeln!(out, "  {} <{}>", friend.name, friend.url)?;
            }
        }
        _ => {
            anyhow::bail!(
                "Unknown type: {}. Available: posts, notes, tags, archive, books, stats, friends",
                content_type
            );
        }
    }

    Ok(())
}
