//! List site content

use anyhow::Result;

use crate::generator::{Generator, StaticPath};
use crate::Site;

/// Print every post path the repository enumerates
pub async fn run(site: &Site) -> Result<()> {
    let generator = site.generator()?;
    let paths = paths(&generator).await?;

    println!("Posts ({}):", paths.len());
    for path in paths {
        println!("  {} [{}]", path.path, path.uid);
    }

    Ok(())
}

/// Paths that `generate` would build
pub async fn paths(generator: &Generator) -> Result<Vec<StaticPath>> {
    generator.static_paths().await
}
