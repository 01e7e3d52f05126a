//! Configuration module

mod site;

pub use site::PrismicConfig;
pub use site::ReadingConfig;
pub use site::SiteConfig;
