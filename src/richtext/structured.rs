//! Structured text as delivered by the Prismic API

use serde::{Deserialize, Serialize};

use super::RichText;
use crate::helpers::html_escape;

/// An ordered sequence of structured-text blocks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StructuredText(pub Vec<Node>);

impl StructuredText {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self(nodes)
    }

    /// Build a document made of plain paragraphs
    pub fn from_paragraphs<I, S>(paragraphs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(
            paragraphs
                .into_iter()
                .map(|p| Node::Paragraph(TextBlock::plain(p)))
                .collect(),
        )
    }

    pub fn nodes(&self) -> &[Node] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A single structured-text block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Node {
    Paragraph(TextBlock),
    Heading1(TextBlock),
    Heading2(TextBlock),
    Heading3(TextBlock),
    Heading4(TextBlock),
    Heading5(TextBlock),
    Heading6(TextBlock),
    Preformatted(TextBlock),
    ListItem(TextBlock),
    OListItem(TextBlock),
    Image(ImageBlock),
    Embed(EmbedBlock),
    /// Block types this renderer does not know about
    #[serde(other)]
    Unknown,
}

impl Node {
    /// The text block, for text-bearing nodes
    pub fn text_block(&self) -> Option<&TextBlock> {
        match self {
            Node::Paragraph(b)
            | Node::Heading1(b)
            | Node::Heading2(b)
            | Node::Heading3(b)
            | Node::Heading4(b)
            | Node::Heading5(b)
            | Node::Heading6(b)
            | Node::Preformatted(b)
            | Node::ListItem(b)
            | Node::OListItem(b) => Some(b),
            Node::Image(_) | Node::Embed(_) | Node::Unknown => None,
        }
    }

    fn tag(&self) -> Option<&'static str> {
        match self {
            Node::Paragraph(_) => Some("p"),
            Node::Heading1(_) => Some("h1"),
            Node::Heading2(_) => Some("h2"),
            Node::Heading3(_) => Some("h3"),
            Node::Heading4(_) => Some("h4"),
            Node::Heading5(_) => Some("h5"),
            Node::Heading6(_) => Some("h6"),
            Node::Preformatted(_) => Some("pre"),
            Node::ListItem(_) | Node::OListItem(_) => Some("li"),
            Node::Image(_) | Node::Embed(_) | Node::Unknown => None,
        }
    }

    fn list_tag(&self) -> Option<&'static str> {
        match self {
            Node::ListItem(_) => Some("ul"),
            Node::OListItem(_) => Some("ol"),
            _ => None,
        }
    }
}

/// Text plus inline formatting spans
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    pub text: String,
    #[serde(default)]
    pub spans: Vec<Span>,
    /// Custom block label, rendered as a class
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl TextBlock {
    pub fn plain<S: Into<String>>(text: S) -> Self {
        Self {
            text: text.into(),
            spans: Vec::new(),
            label: None,
        }
    }
}

/// Inline formatting over a character range of a text block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    #[serde(rename = "type")]
    pub kind: SpanKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<LinkData>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpanKind {
    Strong,
    Em,
    Hyperlink,
    Label,
    #[serde(other)]
    Unknown,
}

/// Link target or label payload attached to a span or image
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkData {
    #[serde(default)]
    pub link_type: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageBlock {
    pub url: String,
    #[serde(default)]
    pub alt: Option<String>,
    #[serde(default)]
    pub copyright: Option<String>,
    #[serde(default)]
    pub dimensions: Option<Dimensions>,
    #[serde(default, rename = "linkTo")]
    pub link_to: Option<LinkData>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbedBlock {
    pub oembed: OEmbed,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OEmbed {
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub embed_url: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub provider_name: Option<String>,
}

impl RichText for StructuredText {
    fn as_text(&self) -> String {
        self.0
            .iter()
            .filter_map(Node::text_block)
            .map(|b| b.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn as_html(&self) -> String {
        let mut out = String::new();
        let mut open_list: Option<&'static str> = None;

        for node in &self.0 {
            let list = node.list_tag();
            if open_list != list {
                if let Some(tag) = open_list {
                    out.push_str(&format!("</{}>", tag));
                }
                if let Some(tag) = list {
                    out.push_str(&format!("<{}>", tag));
                }
                open_list = list;
            }
            render_node(node, &mut out);
        }

        if let Some(tag) = open_list {
            out.push_str(&format!("</{}>", tag));
        }

        out
    }
}

fn render_node(node: &Node, out: &mut String) {
    match node {
        Node::Image(image) => render_image(image, out),
        Node::Embed(embed) => render_embed(embed, out),
        Node::Unknown => {}
        _ => {
            let (Some(block), Some(tag)) = (node.text_block(), node.tag()) else {
                return;
            };
            match &block.label {
                Some(label) => {
                    out.push_str(&format!(r#"<{} class="{}">"#, tag, html_escape(label)))
                }
                None => out.push_str(&format!("<{}>", tag)),
            }
            render_spans(block, out);
            out.push_str(&format!("</{}>", tag));
        }
    }
}

fn render_image(image: &ImageBlock, out: &mut String) {
    let mut img = format!(
        r#"<img src="{}" alt="{}""#,
        html_escape(&image.url),
        html_escape(image.alt.as_deref().unwrap_or(""))
    );
    if let Some(copyright) = &image.copyright {
        img.push_str(&format!(r#" copyright="{}""#, html_escape(copyright)));
    }
    img.push_str(" />");

    out.push_str(r#"<p class="block-img">"#);
    match image.link_to.as_ref().and_then(|l| l.url.as_deref()) {
        Some(href) => out.push_str(&format!(r#"<a href="{}">{}</a>"#, html_escape(href), img)),
        None => out.push_str(&img),
    }
    out.push_str("</p>");
}

fn render_embed(embed: &EmbedBlock, out: &mut String) {
    let oembed = &embed.oembed;
    out.push_str(&format!(
        r#"<div data-oembed="{}" data-oembed-type="{}" data-oembed-provider="{}">{}</div>"#,
        html_escape(oembed.embed_url.as_deref().unwrap_or("")),
        html_escape(oembed.kind.as_deref().unwrap_or("")),
        html_escape(oembed.provider_name.as_deref().unwrap_or("")),
        oembed.html.as_deref().unwrap_or("")
    ));
}

/// Serialize the text of a block with its spans nested as HTML elements
fn render_spans(block: &TextBlock, out: &mut String) {
    let chars: Vec<char> = block.text.chars().collect();
    let len = chars.len();

    let mut spans: Vec<Span> = block
        .spans
        .iter()
        .filter(|s| s.kind != SpanKind::Unknown)
        .map(|s| Span {
            start: s.start.min(len),
            end: s.end.min(len),
            ..s.clone()
        })
        .filter(|s| s.start < s.end)
        .collect();
    // Outer spans first when two start at the same offset
    spans.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    render_range(&chars, 0, len, &spans, out);
}

fn render_range(chars: &[char], start: usize, end: usize, spans: &[Span], out: &mut String) {
    let mut cursor = start;

    for (i, span) in spans.iter().enumerate() {
        let span_start = span.start.max(cursor);
        let span_end = span.end.min(end);
        if span_start >= span_end {
            continue;
        }

        push_text(&chars[cursor..span_start], out);

        let children_end = spans[i + 1..]
            .iter()
            .position(|s| s.start >= span_end)
            .map(|p| i + 1 + p)
            .unwrap_or(spans.len());

        open_span(span, out);
        render_range(chars, span_start, span_end, &spans[i + 1..children_end], out);
        close_span(span, out);

        cursor = span_end;
    }

    if cursor < end {
        push_text(&chars[cursor..end], out);
    }
}

fn open_span(span: &Span, out: &mut String) {
    match span.kind {
        SpanKind::Strong => out.push_str("<strong>"),
        SpanKind::Em => out.push_str("<em>"),
        SpanKind::Hyperlink => {
            let data = span.data.clone().unwrap_or_default();
            let href = data.url.as_deref().unwrap_or("#");
            match data.target.as_deref() {
                Some(target) => out.push_str(&format!(
                    r#"<a href="{}" target="{}" rel="noopener">"#,
                    html_escape(href),
                    html_escape(target)
                )),
                None => out.push_str(&format!(r#"<a href="{}">"#, html_escape(href))),
            }
        }
        SpanKind::Label => {
            let label = span
                .data
                .as_ref()
                .and_then(|d| d.label.as_deref())
                .unwrap_or("");
            out.push_str(&format!(r#"<span class="{}">"#, html_escape(label)));
        }
        SpanKind::Unknown => {}
    }
}

fn close_span(span: &Span, out: &mut String) {
    match span.kind {
        SpanKind::Strong => out.push_str("</strong>"),
        SpanKind::Em => out.push_str("</em>"),
        SpanKind::Hyperlink => out.push_str("</a>"),
        SpanKind::Label => out.push_str("</span>"),
        SpanKind::Unknown => {}
    }
}

fn push_text(chars: &[char], out: &mut String) {
    let text: String = chars.iter().collect();
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push_str("<br />");
        }
        out.push_str(&html_escape(line));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(start: usize, end: usize, kind: SpanKind) -> Span {
        Span {
            start,
            end,
            kind,
            data: None,
        }
    }

    fn paragraph(text: &str, spans: Vec<Span>) -> Node {
        Node::Paragraph(TextBlock {
            text: text.to_string(),
            spans,
            label: None,
        })
    }

    #[test]
    fn test_deserialize_prismic_blocks() {
        let json = r#"[
            {"type": "heading2", "text": "Intro", "spans": []},
            {"type": "paragraph", "text": "Hello world", "spans": [
                {"start": 0, "end": 5, "type": "strong"},
                {"start": 6, "end": 11, "type": "hyperlink",
                 "data": {"link_type": "Web", "url": "https://example.com", "target": "_blank"}}
            ]},
            {"type": "image", "url": "https://images.prismic.io/a.png", "alt": null,
             "copyright": null, "dimensions": {"width": 10, "height": 20}},
            {"type": "o-list-item", "text": "first", "spans": []},
            {"type": "something-new", "text": "?"}
        ]"#;
        let doc: StructuredText = serde_json::from_str(json).unwrap();
        assert_eq!(doc.nodes().len(), 5);
        assert!(matches!(doc.nodes()[0], Node::Heading2(_)));
        assert!(matches!(doc.nodes()[3], Node::OListItem(_)));
        assert_eq!(doc.nodes()[4], Node::Unknown);

        let Node::Paragraph(p) = &doc.nodes()[1] else {
            panic!("expected paragraph");
        };
        assert_eq!(p.spans[1].kind, SpanKind::Hyperlink);
        assert_eq!(
            p.spans[1].data.as_ref().unwrap().url.as_deref(),
            Some("https://example.com")
        );
    }

    #[test]
    fn test_as_text_joins_text_blocks() {
        let doc = StructuredText::new(vec![
            paragraph("first block", vec![]),
            Node::Image(ImageBlock {
                url: "https://x/y.png".to_string(),
                ..Default::default()
            }),
            Node::ListItem(TextBlock::plain("second")),
        ]);
        assert_eq!(doc.as_text(), "first block second");
        assert_eq!(StructuredText::default().as_text(), "");
    }

    #[test]
    fn test_as_html_basic_blocks() {
        let doc = StructuredText::new(vec![
            Node::Heading3(TextBlock::plain("Title")),
            paragraph("a < b & c\nnext", vec![]),
            Node::Preformatted(TextBlock::plain("let x = 1;")),
        ]);
        assert_eq!(
            doc.as_html(),
            "<h3>Title</h3><p>a &lt; b &amp; c<br />next</p><pre>let x = 1;</pre>"
        );
    }

    #[test]
    fn test_as_html_groups_list_items() {
        let doc = StructuredText::new(vec![
            Node::ListItem(TextBlock::plain("a")),
            Node::ListItem(TextBlock::plain("b")),
            Node::OListItem(TextBlock::plain("one")),
            paragraph("after", vec![]),
        ]);
        assert_eq!(
            doc.as_html(),
            "<ul><li>a</li><li>b</li></ul><ol><li>one</li></ol><p>after</p>"
        );
    }

    #[test]
    fn test_as_html_nested_spans() {
        let doc = StructuredText::new(vec![paragraph(
            "bold and italic",
            vec![span(0, 15, SpanKind::Strong), span(9, 15, SpanKind::Em)],
        )]);
        assert_eq!(
            doc.as_html(),
            "<p><strong>bold and <em>italic</em></strong></p>"
        );
    }

    #[test]
    fn test_as_html_crossing_spans_stay_well_formed() {
        let doc = StructuredText::new(vec![paragraph(
            "abcdef",
            vec![span(0, 4, SpanKind::Strong), span(2, 6, SpanKind::Em)],
        )]);
        assert_eq!(
            doc.as_html(),
            "<p><strong>ab<em>cd</em></strong><em>ef</em></p>"
        );
    }

    #[test]
    fn test_as_html_hyperlink_and_label() {
        let link = Span {
            start: 0,
            end: 4,
            kind: SpanKind::Hyperlink,
            data: Some(LinkData {
                url: Some("https://rust-lang.org".to_string()),
                target: Some("_blank".to_string()),
                ..Default::default()
            }),
        };
        let label = Span {
            start: 5,
            end: 9,
            kind: SpanKind::Label,
            data: Some(LinkData {
                label: Some("codespan".to_string()),
                ..Default::default()
            }),
        };
        let doc = StructuredText::new(vec![paragraph("Rust code", vec![link, label])]);
        assert_eq!(
            doc.as_html(),
            r#"<p><a href="https://rust-lang.org" target="_blank" rel="noopener">Rust</a> <span class="codespan">code</span></p>"#
        );
    }

    #[test]
    fn test_as_html_spans_use_char_offsets() {
        let doc = StructuredText::new(vec![paragraph(
            "ação rápida",
            vec![span(5, 11, SpanKind::Em)],
        )]);
        assert_eq!(doc.as_html(), "<p>ação <em>rápida</em></p>");
    }

    #[test]
    fn test_as_html_image_and_embed() {
        let doc = StructuredText::new(vec![
            Node::Image(ImageBlock {
                url: "https://images.prismic.io/a.png".to_string(),
                alt: Some("A \"quoted\" alt".to_string()),
                ..Default::default()
            }),
            Node::Embed(EmbedBlock {
                oembed: OEmbed {
                    html: Some("<iframe></iframe>".to_string()),
                    embed_url: Some("https://youtu.be/x".to_string()),
                    kind: Some("video".to_string()),
                    provider_name: Some("YouTube".to_string()),
                },
            }),
        ]);
        let html = doc.as_html();
        assert!(html.starts_with(r#"<p class="block-img"><img src="https://images.prismic.io/a.png" alt="A &quot;quoted&quot; alt" /></p>"#));
        assert!(html.contains(r#"data-oembed-provider="YouTube"><iframe></iframe></div>"#));
    }
}
