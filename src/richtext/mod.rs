//! Rich text documents
//!
//! Post bodies arrive from the content repository as structured text: an
//! ordered list of typed blocks carrying text and inline spans. The rest of
//! the crate only ever needs two things from them, so those two operations
//! are the whole [`RichText`] contract.

mod structured;

pub use structured::{
    Dimensions, EmbedBlock, ImageBlock, LinkData, Node, OEmbed, Span, SpanKind, StructuredText,
    TextBlock,
};

/// A rich-text document that can be flattened to text or serialized to HTML
pub trait RichText {
    /// Plain text of every text-bearing block, joined with a single space
    fn as_text(&self) -> String;

    /// HTML markup for the whole document
    fn as_html(&self) -> String;
}
