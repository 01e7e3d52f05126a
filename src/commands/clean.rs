//! Clean the public directory

use anyhow::Result;
use std::fs;

use crate::helpers::POST_ROUTE;
use crate::Site;

/// Remove generated post pages
///
/// Only the post route is removed; anything else in the public directory
/// (logo, favicon) is left alone.
pub fn run(site: &Site) -> Result<()> {
    let posts_dir = site.public_dir.join(POST_ROUTE);
    if posts_dir.exists() {
        fs::remove_dir_all(&posts_dir)?;
        tracing::info!("Deleted: {:?}", posts_dir);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use tempfile::TempDir;

    #[test]
    fn test_clean_keeps_static_assets() {
        let dir = TempDir::new().unwrap();
        let site = Site::with_config(dir.path(), SiteConfig::default());
        fs::create_dir_all(site.public_dir.join("post/a")).unwrap();
        fs::write(site.public_dir.join("post/a/index.html"), "x").unwrap();
        fs::create_dir_all(site.public_dir.join("images")).unwrap();
        fs::write(site.public_dir.join("images/logo.svg"), "<svg/>").unwrap();

        run(&site).unwrap();
        assert!(!site.public_dir.join("post").exists());
        assert!(site.public_dir.join("images/logo.svg").exists());

        // Nothing to do the second time
        run(&site).unwrap();
    }
}
