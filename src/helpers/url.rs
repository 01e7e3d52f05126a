//! URL helper functions

use crate::config::SiteConfig;

/// Route prefix for post pages
pub const POST_ROUTE: &str = "post";

/// Generate a URL with the root path
///
/// # Examples
/// ```ignore
/// url_for(&config, "/post/hello/") // -> "/blog/post/hello/"
/// ```
pub fn url_for(config: &SiteConfig, path: &str) -> String {
    let root = config.root.trim_end_matches('/');
    let path = path.trim_start_matches('/');

    if path.is_empty() {
        format!("{}/", root)
    } else {
        format!("{}/{}", root, path)
    }
}

/// Generate a full URL including the domain
pub fn full_url_for(config: &SiteConfig, path: &str) -> String {
    let base = config.url.trim_end_matches('/');
    format!("{}{}", base, url_for(config, path))
}

/// Routable path of a post, relative to the site root
pub fn post_path(uid: &str) -> String {
    format!("/{}/{}", POST_ROUTE, uid)
}

/// Characters that would end or escape a path segment
const UNSAFE_UID_CHARS: &[char] = &['/', '\\', '?', '#', '%', '"', '\'', '<', '>', '&'];

/// Whether a uid is safe to use as a single path segment
///
/// Unsafe uids are rejected rather than rewritten.
pub fn is_valid_uid(uid: &str) -> bool {
    !uid.is_empty()
        && !uid.contains("..")
        && !uid
            .chars()
            .any(|c| c.is_control() || c.is_whitespace() || UNSAFE_UID_CHARS.contains(&c))
}
