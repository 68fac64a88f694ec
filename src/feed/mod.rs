//! RSS 2.0 feed

use chrono::{DateTime, Datelike, Utc};
use lazy_static::lazy_static;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use regex::Regex;

use crate::config::SiteConfig;
use crate::content::{MarkdownRenderer, PostDetail};

lazy_static! {
    /// Root-relative `href`/`src` attributes (protocol-relative `//` excluded)
    static ref RELATIVE_URL: Regex = Regex::new(r#"(href|src)=(["'])/([^/])"#).unwrap();
}

/// Characters escaped in a URL path segment
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Length of the plain-text summary used when a post has no excerpt
const SUMMARY_CHARS: usize = 200;

/// Public URL of a post
pub fn post_url(config: &SiteConfig, id: &str) -> String {
    format!(
        "{}/posts/{}",
        config.base_url(),
        utf8_percent_encode(id, PATH_SEGMENT)
    )
}

/// Render the RSS document for `posts` (newest first).
pub fn build_rss(config: &SiteConfig, posts: &[PostDetail], now: DateTime<Utc>) -> String {
    let base_url = config.base_url();
    let limit = if config.feed.limit == 0 {
        posts.len()
    } else {
        config.feed.limit
    };

    let mut feed = String::new();
    feed.push_str(r#"<?xml version="1.0" encoding="utf-8"?>"#);
    feed.push('\n');
    feed.push_str(r#"<rss version="2.0" xmlns:atom="http://www.w3.org/2005/Atom" xmlns:content="http://purl.org/rss/1.0/modules/content/">"#);
    feed.push('\n');
    feed.push_str("  <channel>\n");
    feed.push_str(&format!("    <title>{}</title>\n", escape_xml(&config.title)));
    feed.push_str(&format!("    <link>{}</link>\n", escape_xml(base_url)));
    feed.push_str(&format!(
        "    <description>{}</description>\n",
        escape_xml(&config.description)
    ));
    feed.push_str(&format!("    <language>{}</language>\n", escape_xml(&config.language)));
    feed.push_str(&format!(
        "    <copyright>All rights reserved {}</copyright>\n",
        now.year()
    ));
    feed.push_str(&format!("    <lastBuildDate>{}</lastBuildDate>\n", now.to_rfc2822()));
    feed.push_str(&format!("    <generator>penlog {}</generator>\n", env!("CARGO_PKG_VERSION")));
    feed.push_str(&format!(
        "    <atom:link href=\"{}/{}\" rel=\"self\" type=\"application/rss+xml\"/>\n",
        escape_xml(base_url),
        escape_xml(config.feed.path.trim_start_matches('/'))
    ));

    let author = if config.author.email.is_empty() {
        escape_xml(&config.author.name)
    } else {
        escape_xml(&format!("{} ({})", config.author.email, config.author.name))
    };

    for detail in posts.iter().take(limit) {
        let post = &detail.post;
        let url = escape_xml(&post_url(config, &post.id));

        feed.push_str("    <item>\n");
        feed.push_str(&format!("      <title>{}</title>\n", escape_xml(&post.title)));
        feed.push_str(&format!("      <link>{}</link>\n", url));
        feed.push_str(&format!("      <guid isPermaLink=\"true\">{}</guid>\n", url));

        let description = post
            .excerpt
            .clone()
            .unwrap_or_else(|| MarkdownRenderer::summary(&detail.raw, SUMMARY_CHARS));
        feed.push_str(&format!(
            "      <description>{}</description>\n",
            escape_xml(&strip_invalid_xml_chars(&description))
        ));

        let content = absolutize_urls(&detail.content_html, base_url);
        feed.push_str(&format!(
            "      <content:encoded><![CDATA[{}]]></content:encoded>\n",
            escape_cdata(&strip_invalid_xml_chars(&content))
        ));
        feed.push_str(&format!("      <author>{}</author>\n", author));
        feed.push_str(&format!("      <pubDate>{}</pubDate>\n", post.date.to_rfc2822()));
        for tag in &post.tags {
            feed.push_str(&format!("      <category>{}</category>\n", escape_xml(tag)));
        }
        feed.push_str("    </item>\n");
    }

    feed.push_str("  </channel>\n");
    feed.push_str("</rss>\n");
    feed
}

/// Escape XML special characters
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Split any `]]>` so the text can sit inside a CDATA section
fn escape_cdata(s: &str) -> String {
    s.replace("]]>", "]]]]><![CDATA[>")
}

/// Rewrite root-relative `href="/..."` and `src="/..."` to absolute URLs
fn absolutize_urls(html: &str, base_url: &str) -> String {
    RELATIVE_URL
        .replace_all(html, |caps: &regex::Captures| {
            format!("{}={}{}/{}", &caps[1], &caps[2], base_url, &caps[3])
        })
        .into_owned()
}

/// Strip invalid XML control characters (except tab, newline, carriage return)
fn strip_invalid_xml_chars(s: &str) -> String {
    s.chars()
        .filter(|&c| {
            c == '\t'
                || c == '\n'
                || c == '\r'
                || ('\u{0020}'..='\u{D7FF}').contains(&c)
                || ('\u{E000}'..='\u{FFFD}').contains(&c)
                || ('\u{10000}'..='\u{10FFFF}').contains(&c)
        })
        .collect()
}
