//! Create a new post, note, book or friend file

use anyhow::Result;
use chrono::Utc;
use std::fs;
use std::path::PathBuf;

use crate::Site;

/// Content kinds that `new` can scaffold
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Kind {
    Post,
    Note,
    Book,
    Friend,
}

/// Create a new content file and return its path.
///
/// The file name is the slugified title. An existing file is never
/// overwritten.
pub fn create(site: &Site, kind: Kind, title: &str) -> Result<PathBuf> {
    let now = Utc::now().with_timezone(&site.config.tz());
    let date = now.format("%Y-%m-%d %H:%M:%S").to_string();

    let target_dir = match kind {
        Kind::Post => site.posts_dir(),
        Kind::Note => site.notes_dir(),
        Kind::Book => site.books_dir(),
        Kind::Friend => site.friends_dir(),
    };
    fs::create_dir_all(&target_dir)?;

    let slug = slug::slugify(title);
    let stem = if slug.is_empty() {
        now.format("%Y%m%d%H%M%S").to_string()
    } else {
        slug
    };
    let file_path = target_dir.join(format!("{}.md", stem));

    let title = yaml_string(title);
    let content = match kind {
        Kind::Post => format!("---\ntitle: {}\ndate: {}\ntags:\nexcerpt:\n---\n", title, date),
        Kind::Note => format!("---\ndate: {}\n---\n", date),
        Kind::Book => format!(
            "---\ntitle: {}\nauthor:\nstatus: 想读\nrating:\ntags:\ndescription:\ncover:\n---\n",
            title
        ),
        Kind::Friend => format!("---\nname: {}\nurl:\ndescription:\n---\n", title),
    };

    if file_path.exists() {
        anyhow::bail!("File already exists: {:?}", file_path);
    }

    fs::write(&file_path, content)?;
    tracing::info!("Created: {:?}", file_path);

    Ok(file_path)
}

/// Quote a value for a YAML scalar
fn yaml_string(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}
