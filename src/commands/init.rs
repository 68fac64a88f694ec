//! Initialize a new site

use anyhow::Result;
use std::fs;
use std::path::Path;

use crate::config::SiteConfig;

const CONFIG_TEMPLATE: &str = r#"# Site
title: Penlog
description: ''
language: zh-CN
timezone: ''

author:
  name: John Doe
  email: ''
  link: ''

# URL
url: http://example.com

# Directory
content_dir: content
public_dir: public
posts_dir: posts
notes_dir: notes
books_dir: books
friends_dir: friends

# Pagination
per_page: 10
notes_per_page: 15

# Seconds a loaded collection is reused by the server
cache_ttl: 300

feed:
  path: rss.xml
  limit: 0

highlight:
  theme: base16-ocean.dark
  line_number: false
"#;

/// Initialize a new site in the given directory
pub fn init_site(target_dir: &Path) -> Result<()> {
    fs::create_dir_all(target_dir)?;

    let config_path = target_dir.join("_config.yml");
    if config_path.exists() {
        anyhow::bail!("Site already initialized: {:?}", config_path);
    }
    fs::write(&config_path, CONFIG_TEMPLATE)?;

    let config = SiteConfig::default();
    let content_dir = target_dir.join(&config.content_dir);
    for dir in [
        &config.posts_dir,
        &config.notes_dir,
        &config.books_dir,
        &config.friends_dir,
    ] {
        fs::create_dir_all(content_dir.join(dir))?;
    }

    let now = chrono::Local::now();
    let sample_post = format!(
        r#"---
title: Hello World
date: {}
tags: [hello]
---

Welcome to your new blog! This is your very first post.

<!-- more -->

## Quick Start

```bash
$ penlog new post "My New Post"
$ penlog server --watch
$ penlog generate
```
"#,
        now.format("%Y-%m-%d %H:%M:%S")
    );
    fs::write(
        content_dir.join(&config.posts_dir).join("hello-world.md"),
        sample_post,
    )?;

    tracing::info!("Initialized site in {:?}", target_dir);
    Ok(())
}
