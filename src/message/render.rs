use pulldown_cmark::{html, Event, Options, Parser};

/// Render Markdown to HTML with tables enabled and every newline inside a
/// paragraph kept as a `<br />`.
#[must_use]
pub fn render_markdown(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, Options::ENABLE_TABLES).map(|event| match event {
        Event::SoftBreak => Event::HardBreak,
        other => other,
    });
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}
