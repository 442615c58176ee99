use ammonia::Builder;
use pulldown_cmark::{html, Event, Options, Parser, Tag, TagEnd};

/// Renders project write-ups to HTML that is safe to embed in a page.
pub struct MarkdownRenderer {
    sanitizer: Builder<'static>,
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownRenderer {
    pub fn new() -> Self {
        let mut tags = Builder::default().clone_tags();
        for tag in ["pre", "code", "table", "thead", "tbody", "tr", "th", "td", "del"] {
            tags.insert(tag);
        }

        let mut sanitizer = Builder::default();
        sanitizer
            .tags(tags)
            .url_schemes(["http", "https", "mailto"].into_iter().collect())
            .link_rel(Some("noopener noreferrer"));

        Self { sanitizer }
    }

    pub fn render(&self, markdown: &str) -> String {
        let options =
            Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
        let parser = Parser::new_ext(markdown, options);

        let mut html_output = String::new();
        html::push_html(&mut html_output, parser);

        self.sanitizer.clean(&html_output).to_string()
    }

    /// Plain text of the first paragraph, cut at a word boundary.
    pub fn summary(&self, markdown: &str, max_chars: usize) -> String {
        let mut text = String::new();
        let mut in_paragraph = false;

        for event in Parser::new(markdown) {
            match event {
                Event::Start(Tag::Paragraph) => in_paragraph = true,
                Event::End(TagEnd::Paragraph) if in_paragraph => break,
                Event::Text(t) | Event::Code(t) if in_paragraph => text.push_str(&t),
                Event::SoftBreak | Event::HardBreak if in_paragraph => text.push(' '),
                _ => {}
            }
        }

        if text.chars().count() <= max_chars {
            return text;
        }
        let cut: String = text.chars().take(max_chars).collect();
        let cut = match cut.rfind(' ') {
            Some(idx) if idx > 0 => &cut[..idx],
            _ => cut.as_str(),
        };
        format!("{}...", cut.trim_end())
    }
}
