//! Markdown rendering with syntax highlighting

use lazy_static::lazy_static;
use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};
use syntect::highlighting::ThemeSet;
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

/// Marker separating a post's excerpt from the rest of the body
pub const MORE_MARKER: &str = "<!-- more -->";

lazy_static! {
    static ref SYNTAX_SET: SyntaxSet = SyntaxSet::load_defaults_newlines();
    static ref THEME_SET: ThemeSet = ThemeSet::load_defaults();
}

fn options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_SMART_PUNCTUATION
        | Options::ENABLE_HEADING_ATTRIBUTES
        | Options::ENABLE_GFM
}

/// Markdown renderer with syntax highlighting
#[derive(Debug, Clone)]
pub struct MarkdownRenderer {
    theme_name: String,
    line_numbers: bool,
}

impl MarkdownRenderer {
    pub fn new() -> Self {
        Self::with_options("base16-ocean.dark", false)
    }

    pub fn with_options(theme: &str, line_numbers: bool) -> Self {
        Self {
            theme_name: theme.to_string(),
            line_numbers,
        }
    }

    /// Render markdown to HTML. The excerpt marker is dropped.
    pub fn render(&self, markdown: &str) -> String {
        let markdown = markdown.replace(MORE_MARKER, "");
        let mut events: Vec<Event> = Vec::new();
        // Some(lang) while inside a code block
        let mut code_lang: Option<String> = None;
        let mut code = String::new();

        for event in Parser::new_ext(&markdown, options()) {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    code_lang = Some(match kind {
                        CodeBlockKind::Fenced(lang) => lang.split_whitespace().next().unwrap_or("").to_string(),
                        CodeBlockKind::Indented => String::new(),
                    });
                    code.clear();
                }
                Event::End(TagEnd::CodeBlock) => {
                    let lang = code_lang.take().unwrap_or_default();
                    let highlighted = self.highlight_code(&code, &lang);
                    events.push(Event::Html(CowStr::from(highlighted)));
                }
                Event::Text(text) if code_lang.is_some() => code.push_str(&text),
                other => events.push(other),
            }
        }

        let mut out = String::new();
        html::push_html(&mut out, events.into_iter());
        out
    }

    fn highlight_code(&self, code: &str, lang: &str) -> String {
        let lang = if lang.is_empty() { "text" } else { lang };
        let syntax = SYNTAX_SET
            .find_syntax_by_token(lang)
            .unwrap_or_else(|| SYNTAX_SET.find_syntax_plain_text());

        let theme = THEME_SET
            .themes
            .get(&self.theme_name)
            .or_else(|| THEME_SET.themes.values().next());

        let body = match theme.map(|t| highlighted_html_for_string(code, &SYNTAX_SET, syntax, t)) {
            Some(Ok(highlighted)) => highlighted,
            _ => format!("<pre><code>{}</code></pre>", escape_html(code)),
        };

        let lang = escape_html(lang);
        if self.line_numbers {
            let gutter: Vec<String> = (1..=code.lines().count().max(1))
                .map(|n| format!(r#"<span class="line-number">{}</span>"#, n))
                .collect();
            format!(
                r#"<figure class="highlight {}"><table><tr><td class="gutter"><pre>{}</pre></td><td class="code">{}</td></tr></table></figure>"#,
                lang,
                gutter.join("\n"),
                body
            )
        } else {
            format!(r#"<figure class="highlight {}">{}</figure>"#, lang, body)
        }
    }

    /// The markdown before the excerpt marker, if the body has one
    pub fn split_excerpt(body: &str) -> Option<&str> {
        body.find(MORE_MARKER)
            .map(|pos| body[..pos].trim())
            .filter(|excerpt| !excerpt.is_empty())
    }

    /// Markdown reduced to plain text with whitespace collapsed
    pub fn plain_text(markdown: &str) -> String {
        let mut text = String::new();
        for event in Parser::new_ext(markdown, options()) {
            match event {
                Event::Text(t) | Event::Code(t) => text.push_str(&t),
                Event::SoftBreak | Event::HardBreak | Event::Rule => text.push(' '),
                Event::End(TagEnd::Paragraph)
                | Event::End(TagEnd::Heading(_))
                | Event::End(TagEnd::Item)
                | Event::End(TagEnd::CodeBlock) => text.push(' '),
                _ => {}
            }
        }
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Plain text truncated to `max_chars` characters
    pub fn summary(markdown: &str, max_chars: usize) -> String {
        let text = Self::plain_text(markdown);
        if text.chars().count() <= max_chars {
            return text;
        }
        let mut cut: String = text.chars().take(max_chars).collect();
        cut.truncate(cut.trim_end().len());
        cut.push('…');
        cut
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_basic_markdown() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("# Hello World\n\nThis is a test.");
        assert!(html.contains("<h1>Hello World</h1>"));
        assert!(html.contains("<p>This is a test.</p>"));
    }

    #[test]
    fn test_render_code_block() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("```rust\nfn main() {}\n```");
        assert!(html.contains(r#"class="highlight rust""#));
        assert!(html.contains("main"));
    }

    #[test]
    fn test_code_language_is_escaped() {
        let html = MarkdownRenderer::new().render("```x\"onmouseover=alert(1)\nbody\n```");
        assert!(!html.contains(r#"x"onmouseover"#));
        assert!(html.contains("x&quot;onmouseover=alert(1)"));

        let numbered = MarkdownRenderer::with_options("base16-ocean.dark", true)
            .render("```a<b>\nbody\n```");
        assert!(numbered.contains(r#"class="highlight a&lt;b&gt;""#));
    }

    #[test]
    fn test_render_drops_more_marker() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("Intro\n\n<!-- more -->\n\nRest");
        assert!(!html.contains("more -->"));
        assert!(html.contains("Rest"));
    }

    #[test]
    fn test_split_excerpt() {
        let body = "This is excerpt.\n<!-- more -->\nThis is more content.";
        assert_eq!(MarkdownRenderer::split_excerpt(body), Some("This is excerpt."));
        assert_eq!(MarkdownRenderer::split_excerpt("no marker"), None);
    }

    #[test]
    fn test_plain_text_and_summary() {
        let md = "# Title\n\nSome **bold** and `code`.\n\n- one\n- two";
        assert_eq!(MarkdownRenderer::plain_text(md), "Title Some bold and code. one two");
        assert_eq!(MarkdownRenderer::summary(md, 10), "Title Some…");
        assert_eq!(MarkdownRenderer::summary("短文", 10), "短文");
    }
}
