//! Generate static files

use anyhow::Result;

use crate::generator::{GenerateSummary, Generator};
use crate::Site;

/// Generate every post page of the site
pub async fn run(site: &Site) -> Result<GenerateSummary> {
    let generator = site.generator()?;
    run_with(&generator).await
}

/// Generate with an already constructed generator
pub async fn run_with(generator: &Generator) -> Result<GenerateSummary> {
    let start = std::time::Instant::now();

    let summary = generator.generate_all().await?;

    let duration = start.elapsed();
    tracing::info!(
        "Generated {} posts in {:.2}s",
        summary.generated.len(),
        duration.as_secs_f64()
    );
    if !summary.missing.is_empty() {
        tracing::warn!("Skipped {} missing posts", summary.missing.len());
    }

    Ok(summary)
}
