//! Markdown message templates: loading, `{{placeholder}}` substitution and
//! HTML rendering.

mod catalog;
mod placeholder;
mod render;

pub use catalog::{MessageCatalog, RenderedMessage};
pub use placeholder::substitute;
pub use render::render_markdown;
