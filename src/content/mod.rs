//! Content module - posts, notes, books and friends loaded from markdown

mod book;
mod friend;
pub mod frontmatter;
pub mod loader;
mod markdown;
mod note;
mod post;

pub use book::{Book, ReadingStatus};
pub use friend::Friend;
pub use frontmatter::FrontMatter;
pub use loader::ContentLoader;
pub use markdown::MarkdownRenderer;
pub use note::Note;
pub use post::{Post, PostDetail, PostLink};
