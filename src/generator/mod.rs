//! Generator module - writes the feed and JSON data files into the public directory

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::aggregate;
use crate::content::{ContentLoader, Post, PostDetail, PostLink};
use crate::feed;
use crate::pagination::{paginate, total_pages};
use crate::Site;

/// Build artifact generator
pub struct Generator {
    site: Site,
}

impl Generator {
    pub fn new(site: &Site) -> Self {
        Self { site: site.clone() }
    }

    /// Generate every artifact
    pub fn generate(&self) -> Result<()> {
        let public_dir = &self.site.public_dir;
        fs::create_dir_all(public_dir)?;

        let loader = ContentLoader::new(&self.site);
        let mut details = loader.load_post_details()?;
        link_neighbours(&mut details);
        let posts: Vec<Post> = details.iter().map(|d| d.post.clone()).collect();
        let notes = loader.load_notes()?;
        let books = loader.load_books()?;
        let friends = loader.load_friends()?;

        tracing::info!(
            "Loaded {} posts, {} notes, {} books, {} friends",
            posts.len(),
            notes.len(),
            books.len(),
            friends.len()
        );

        self.generate_feed(&details)?;

        let data = public_dir.join("data");
        write_json(&data.join("posts.json"), &posts)?;

        let per_page = self.site.config.per_page;
        let pages = total_pages(posts.len(), per_page).max(1);
        for n in 1..=pages {
            let page = paginate(&posts, n, per_page);
            write_json(&data.join("posts/page").join(format!("{}.json", n)), &page)?;
        }
        for detail in &details {
            write_json(&data.join("posts").join(format!("{}.json", detail.post.id)), detail)?;
        }
        tracing::info!("Generated {} post pages", pages);

        let notes_per_page = self.site.config.notes_per_page;
        let note_pages = total_pages(notes.len(), notes_per_page).max(1);
        for n in 1..=note_pages {
            let page = paginate(&notes, n, notes_per_page);
            write_json(&data.join("notes/page").join(format!("{}.json", n)), &page)?;
        }
        write_json(&data.join("notes.json"), &notes)?;

        write_json(&data.join("tags.json"), &aggregate::tag_counts(&posts))?;
        write_json(
            &data.join("archive.json"),
            &aggregate::group_by_year(&posts, self.site.config.tz()),
        )?;
        write_json(&data.join("books.json"), &books)?;
        write_json(&data.join("reading-stats.json"), &aggregate::reading_stats(&books))?;
        write_json(&data.join("friends.json"), &friends)?;

        tracing::info!("Generated data files in {:?}", data);
        Ok(())
    }

    /// Generate the RSS feed
    fn generate_feed(&self, details: &[PostDetail]) -> Result<()> {
        let rss = feed::build_rss(&self.site.config, details, Utc::now());
        let output_path = self
            .site
            .public_dir
            .join(self.site.config.feed.path.trim_start_matches('/'));
        write_file(&output_path, rss)?;
        tracing::info!("Generated {}", self.site.config.feed.path);
        Ok(())
    }
}

/// Fill `prev`/`next` from list order (newest first)
fn link_neighbours(details: &mut [PostDetail]) {
    let links: Vec<PostLink> = details.iter().map(|d| PostLink::from(&d.post)).collect();
    for (i, detail) in details.iter_mut().enumerate() {
        detail.prev = i.checked_sub(1).map(|p| links[p].clone());
        detail.next = links.get(i + 1).cloned();
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    write_file(path, json)
}

fn write_file(path: &Path, content: String) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content).with_context(|| format!("failed to write {:?}", path))
}
