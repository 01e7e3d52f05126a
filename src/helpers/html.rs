//! HTML helper functions

/// Escape HTML special characters
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Generate an image tag
///
/// # Examples
/// ```ignore
/// image_tag("https://images.prismic.io/banner.png", Some("image"), Some("banner"))
/// ```
pub fn image_tag(src: &str, alt: Option<&str>, class: Option<&str>) -> String {
    let class_attr = class
        .map(|c| format!(r#" class="{}""#, html_escape(c)))
        .unwrap_or_default();

    format!(
        r#"<img src="{}" alt="{}"{}>"#,
        html_escape(src),
        html_escape(alt.unwrap_or("")),
        class_attr
    )
}

/// Turn a heading into an element id
///
/// `seen` tracks ids already handed out in the same document so repeated
/// headings still get distinct anchors.
pub fn heading_anchor(heading: &str, seen: &mut Vec<String>) -> String {
    let mut base = slug::slugify(heading);
    if base.is_empty() {
        base = "section".to_string();
    }

    let mut anchor = base.clone();
    let mut n = 1;
    while seen.contains(&anchor) {
        n += 1;
        anchor = format!("{}-{}", base, n);
    }
    seen.push(anchor.clone());
    anchor
}
