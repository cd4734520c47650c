//! Server-side markdown rendering
//!
//! Turns a note's markdown body into HTML with pulldown-cmark. Raw HTML in
//! the source is escaped rather than passed through, so rendered notes are
//! safe to inject into a page.

use pulldown_cmark::{Event, Options, Parser, html};

/// Render markdown source to an HTML fragment
pub fn render_markdown(source: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);

    // Demote raw HTML events to text so push_html escapes them
    let parser = Parser::new_ext(source, options).map(|event| match event {
        Event::Html(raw) => Event::Text(raw),
        Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    });

    let mut output = String::new();
    html::push_html(&mut output, parser);

    output
}
