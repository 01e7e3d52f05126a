//! Reading time estimation

use super::ContentBlock;
use crate::richtext::RichText;

/// Reading speed used when none is configured
pub const DEFAULT_WORDS_PER_MINUTE: u32 = 200;

/// Number of whitespace-separated words; empty text has none
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Estimated minutes to read a post
///
/// Each block is rounded up to whole minutes on its own and the per-block
/// minutes are summed, so two short blocks count as two minutes.
pub fn reading_time(content: &[ContentBlock], words_per_minute: u32) -> u32 {
    let wpm = match words_per_minute {
        0 => DEFAULT_WORDS_PER_MINUTE as usize,
        n => n as usize,
    };

    content
        .iter()
        .map(|block| word_count(&block.body.as_text()).div_ceil(wpm) as u32)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::richtext::StructuredText;

    fn words(n: usize) -> String {
        vec!["lorem"; n].join(" ")
    }

    fn block(text: String) -> ContentBlock {
        ContentBlock::new(format!("heading {}", text.len()), StructuredText::from_paragraphs([text]))
    }

    #[test]
    fn test_empty_content() {
        assert_eq!(reading_time(&[], 200), 0);
    }

    #[test]
    fn test_ceiling_per_block() {
        assert_eq!(reading_time(&[block(words(200))], 200), 1);
        assert_eq!(reading_time(&[block(words(201))], 200), 2);
        assert_eq!(reading_time(&[block(words(1))], 200), 1);
    }

    #[test]
    fn test_blocks_round_separately() {
        let content = vec![block(words(50)), block(words(150))];
        assert_eq!(reading_time(&content, 200), 2);
    }

    #[test]
    fn test_empty_body_counts_zero() {
        let empty = ContentBlock::new("Empty", StructuredText::default());
        let blank = block("   \n\t ".to_string());
        let blank_paragraphs = ContentBlock::new("Blank", StructuredText::from_paragraphs(["", ""]));
        assert_eq!(word_count(""), 0);
        assert_eq!(reading_time(&[empty.clone()], 200), 0);
        assert_eq!(reading_time(&[blank], 200), 0);
        assert_eq!(reading_time(&[blank_paragraphs], 200), 0);
        assert_eq!(reading_time(&[empty, block(words(10))], 200), 1);
    }

    #[test]
    fn test_words_span_paragraphs() {
        let body = StructuredText::from_paragraphs([words(120), words(120)]);
        let content = vec![ContentBlock::new("Two paragraphs", body)];
        assert_eq!(reading_time(&content, 200), 2);
    }

    #[test]
    fn test_custom_and_zero_speed() {
        let content = vec![block(words(300))];
        assert_eq!(reading_time(&content, 300), 1);
        assert_eq!(reading_time(&content, 0), 2);
    }

    #[test]
    fn test_word_count_collapses_whitespace() {
        assert_eq!(word_count("  one\ttwo \n three  "), 3);
    }
}
