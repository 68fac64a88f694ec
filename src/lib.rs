//! penlog: content engine for a personal blog
//!
//! Posts, notes, a reading list and friend links live as markdown files
//! with YAML front-matter. This crate loads them, aggregates and paginates
//! them, and publishes the results as an RSS feed, JSON data files and a
//! small JSON API.

pub mod aggregate;
pub mod cache;
pub mod commands;
pub mod config;
pub mod content;
pub mod feed;
pub mod generator;
pub mod pagination;
pub mod server;
pub mod service;

use anyhow::Result;
use std::path::{Path, PathBuf};

/// A blog site rooted at a directory
#[derive(Debug, Clone)]
pub struct Site {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Content directory (holds one sub-directory per content type)
    pub content_dir: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
}

impl Site {
    /// Open a site from a directory, reading `_config.yml` when present
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };

        Ok(Self::with_config(base_dir, config))
    }

    /// Build a site from an already loaded configuration
    pub fn with_config<P: AsRef<Path>>(base_dir: P, config: config::SiteConfig) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        let content_dir = base_dir.join(&config.content_dir);
        let public_dir = base_dir.join(&config.public_dir);

        Self {
            config,
            base_dir,
            content_dir,
            public_dir,
        }
    }

    pub fn posts_dir(&self) -> PathBuf {
        self.content_dir.join(&self.config.posts_dir)
    }

    pub fn notes_dir(&self) -> PathBuf {
        self.content_dir.join(&self.config.notes_dir)
    }

    pub fn books_dir(&self) -> PathBuf {
        self.content_dir.join(&self.config.books_dir)
    }

    pub fn friends_dir(&self) -> PathBuf {
        self.content_dir.join(&self.config.friends_dir)
    }

    /// Generate the feed and data files
    pub fn generate(&self) -> Result<()> {
        commands::generate::run(self)
    }

    /// Clean the public directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }
}
