//! Content module - posts and what is derived from them

mod post;
pub mod reading;

pub use post::{Banner, ContentBlock, Post};
pub use reading::reading_time;
