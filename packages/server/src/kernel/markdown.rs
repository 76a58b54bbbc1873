//! Comment markdown rendering.
//!
//! Raw HTML in the source is shown as text, never passed through, and
//! `javascript:` links are neutralised. Output is wrapped in `<article>`.

use pulldown_cmark::{html, Event, Options, Parser, Tag};

use super::BaseMarkdownRenderer;

#[derive(Debug, Default, Clone, Copy)]
pub struct CommentMarkdownRenderer;

fn is_script_url(url: &str) -> bool {
    url.trim_start().to_ascii_lowercase().starts_with("javascript:")
}

impl BaseMarkdownRenderer for CommentMarkdownRenderer {
    fn render(&self, markdown: &str) -> String {
        let parser = Parser::new_ext(markdown, Options::ENABLE_STRIKETHROUGH).map(|event| match event {
            Event::Html(raw) => Event::Text(raw),
            Event::Start(Tag::Link(kind, url, title)) if is_script_url(&url) => {
                Event::Start(Tag::Link(kind, "#".into(), title))
            }
            Event::End(Tag::Link(kind, url, title)) if is_script_url(&url) => {
                Event::End(Tag::Link(kind, "#".into(), title))
            }
            other => other,
        });

        let mut body = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut body, parser);
        format!("<article>{}</article>", body)
    }
}
