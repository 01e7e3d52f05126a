//! Built-in page templates using the Tera template engine
//!
//! Templates are embedded in the binary. Autoescaping is off: every value
//! placed in a context is escaped when its view struct is built, and rich
//! text bodies arrive as already serialized HTML.

use anyhow::Result;
use serde::Serialize;
use tera::{Context, Tera};

/// Template renderer with the embedded theme
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all theme templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("theme/layout.html")),
            ("post.html", include_str!("theme/post.html")),
            ("loading.html", include_str!("theme/loading.html")),
            ("not_found.html", include_str!("theme/not_found.html")),
            ("error.html", include_str!("theme/error.html")),
            // Partials
            (
                "partials/head.html",
                include_str!("theme/partials/head.html"),
            ),
            (
                "partials/header.html",
                include_str!("theme/partials/header.html"),
            ),
            (
                "partials/icons/calendar.html",
                include_str!("theme/partials/icons/calendar.html"),
            ),
            (
                "partials/icons/user.html",
                include_str!("theme/partials/icons/user.html"),
            ),
            (
                "partials/icons/clock.html",
                include_str!("theme/partials/icons/clock.html"),
            ),
        ])?;

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct ConfigData {
    pub title: String,
    pub root: String,
    pub language: String,
}

/// Everything the post template shows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostView {
    pub uid: String,
    pub path: String,
    pub title: String,
    /// Banner `<img>` tag, empty when the post has no banner
    pub banner: String,
    pub author: String,
    /// Localized publication date; `None` leaves the item out
    pub date: Option<String>,
    pub date_xml: Option<String>,
    pub reading_time: u32,
    pub blocks: Vec<BlockView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockView {
    pub heading: String,
    pub anchor: String,
    /// Serialized rich text body
    pub html: String,
}
