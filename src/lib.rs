//! spacetraveling: statically generated blog post pages
//!
//! Posts live in a Prismic repository. Each post is fetched, given a
//! reading-time estimate and rendered to HTML with the built-in theme,
//! either ahead of time or on demand by the bundled server, which also
//! regenerates pages once their revalidation window has passed.

pub mod cache;
pub mod commands;
pub mod config;
pub mod content;
pub mod generator;
pub mod helpers;
pub mod richtext;
pub mod server;
pub mod store;
pub mod templates;

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

use crate::generator::{GenerateSummary, Generator};
use crate::store::ContentStore;

/// The site being built
#[derive(Debug, Clone)]
pub struct Site {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: std::path::PathBuf,
    /// Public (output) directory
    pub public_dir: std::path::PathBuf,
}

impl Site {
    /// Load the site in a directory, reading `_config.yml` when present
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let config_path = base_dir.as_ref().join("_config.yml");

        let mut config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            tracing::debug!("No _config.yml in {:?}, using defaults", base_dir.as_ref());
            config::SiteConfig::default()
        };
        config.apply_env();

        Ok(Self::with_config(base_dir, config))
    }

    /// Create a site from an already loaded configuration
    pub fn with_config<P: AsRef<Path>>(base_dir: P, config: config::SiteConfig) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        let public_dir = base_dir.join(&config.public_dir);

        Self {
            config,
            base_dir,
            public_dir,
        }
    }

    /// Content store described by the configuration
    pub fn store(&self) -> Result<Arc<dyn ContentStore>> {
        Ok(store::from_config(&self.config.prismic, &self.base_dir)?)
    }

    /// Generator over the configured content store
    pub fn generator(&self) -> Result<Generator> {
        Generator::new(self, self.store()?)
    }

    /// Generate every post page
    pub async fn generate(&self) -> Result<GenerateSummary> {
        commands::generate::run(self).await
    }

    /// Clean the public directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }
}
