//! Readable-text renderer: converts a rich-text document tree into
//! Markdown-like plain text for the AI code-generation agent to ingest
//! (spec.md §4.4 C9).
//!
//! The stored document content is structurally opaque `serde_json::Value`
//! (see `studio_domain::DocumentContent`); [`RichNode::from_value`] parses
//! the node kinds this renderer knows about and falls back to a catch-all
//! [`RichNode::Other`] for anything else, so rendering never fails — it just
//! recurses into children. A JSON object with none of the recognised shapes
//! (e.g. a flat `{"title": "x"}`) renders to the empty string; this is
//! documented, unchanged behaviour (spec.md §9).

#![deny(unsafe_code)]
#![warn(missing_docs)]

use serde_json::Value;

/// A parsed node of the rich-text document tree.
///
/// `Other` is the catch-all for any `type` this renderer doesn't know
/// about (including "no type at all"): it still carries along whatever
/// `content` children were present so they're not silently dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum RichNode {
    /// The document root: a plain concatenation of its children.
    Doc(Vec<RichNode>),
    /// A leaf of plain text.
    Text(String),
    /// An inline paragraph block.
    Paragraph(Vec<RichNode>),
    /// A heading at a level clamped to 1..=6.
    Heading {
        /// Heading level, already clamped to 1..=6.
        level: u8,
        /// Inline content.
        content: Vec<RichNode>,
    },
    /// An unordered list of `listItem` children.
    BulletList(Vec<RichNode>),
    /// An ordered (numbered) list of `listItem` children.
    OrderedList(Vec<RichNode>),
    /// A single list item, itself containing block content.
    ListItem(Vec<RichNode>),
    /// A blockquote wrapping block content.
    Blockquote(Vec<RichNode>),
    /// A fenced code block.
    CodeBlock {
        /// Optional language tag from `attrs.language`.
        language: Option<String>,
        /// Text content (children, usually a single text leaf).
        content: Vec<RichNode>,
    },
    /// A horizontal rule.
    HorizontalRule,
    /// An inline hard line break.
    HardBreak,
    /// Any unrecognised node kind; its children still render.
    Other {
        /// The original `type` string, if present.
        node_type: Option<String>,
        /// Child nodes, if a `content` array was present.
        content: Vec<RichNode>,
    },
}

impl RichNode {
    /// Parse a JSON value into a rich-text node tree. Never fails: values
    /// with no recognised shape become [`RichNode::Other`].
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return RichNode::Other {
                node_type: None,
                content: Vec::new(),
            };
        };

        let node_type = obj.get("type").and_then(Value::as_str);
        let content: Vec<RichNode> = obj
            .get("content")
            .and_then(Value::as_array)
            .map(|arr| arr.iter().map(RichNode::from_value).collect())
            .unwrap_or_default();

        match node_type {
            Some("doc") => RichNode::Doc(content),
            Some("text") => RichNode::Text(
                obj.get("text")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            ),
            Some("paragraph") => RichNode::Paragraph(content),
            Some("heading") => {
                let level = obj
                    .get("attrs")
                    .and_then(|a| a.get("level"))
                    .and_then(Value::as_u64)
                    .unwrap_or(1)
                    .clamp(1, 6) as u8;
                RichNode::Heading { level, content }
            }
            Some("bulletList") => RichNode::BulletList(content),
            Some("orderedList") => RichNode::OrderedList(content),
            Some("listItem") => RichNode::ListItem(content),
            Some("blockquote") => RichNode::Blockquote(content),
            Some("codeBlock") => {
                let language = obj
                    .get("attrs")
                    .and_then(|a| a.get("language"))
                    .and_then(Value::as_str)
                    .map(String::from);
                RichNode::CodeBlock { language, content }
            }
            Some("horizontalRule") => RichNode::HorizontalRule,
            Some("hardBreak") => RichNode::HardBreak,
            other => RichNode::Other {
                node_type: other.map(String::from),
                content,
            },
        }
    }

    /// Render this node to Markdown-like plain text.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            RichNode::Doc(children) | RichNode::Other { content: children, .. } => {
                concat_children(children)
            }
            RichNode::Text(text) => text.trim().to_string(),
            RichNode::Paragraph(children) => format!("{}\n", concat_children(children)),
            RichNode::Heading { level, content } => {
                let hashes = "#".repeat(*level as usize);
                format!("{hashes} {}\n", concat_children(content))
            }
            RichNode::BulletList(items) => render_bullet_list(items),
            RichNode::OrderedList(items) => render_ordered_list(items),
            RichNode::ListItem(children) => render_list_item(children),
            RichNode::Blockquote(children) => render_blockquote(children),
            RichNode::CodeBlock { language, content } => {
                let lang = language.clone().unwrap_or_default();
                let body = concat_children(content);
                format!("```{lang}\n{body}\n```\n")
            }
            RichNode::HorizontalRule => "---\n".to_string(),
            RichNode::HardBreak => "\n".to_string(),
        }
    }
}

fn concat_children(children: &[RichNode]) -> String {
    children.iter().map(RichNode::render).collect()
}

fn render_list_item(children: &[RichNode]) -> String {
    let body = concat_children(children);
    let trimmed = body.trim();
    let indented = trimmed.replace('\n', "\n  ");
    format!("{indented}\n")
}

fn strip_one_trailing_newline(s: &str) -> &str {
    s.strip_suffix('\n').unwrap_or(s)
}

fn render_bullet_list(items: &[RichNode]) -> String {
    let lines: Vec<String> = items
        .iter()
        .map(|item| format!("- {}", strip_one_trailing_newline(&item.render())))
        .collect();
    format!("{}\n", lines.join("\n"))
}

fn render_ordered_list(items: &[RichNode]) -> String {
    let lines: Vec<String> = items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {}", i + 1, strip_one_trailing_newline(&item.render())))
        .collect();
    format!("{}\n", lines.join("\n"))
}

fn render_blockquote(children: &[RichNode]) -> String {
    let body = concat_children(children);
    let trimmed = strip_one_trailing_newline(&body);
    let lines: Vec<String> = trimmed.split('\n').map(|l| format!("> {l}")).collect();
    format!("{}\n", lines.join("\n"))
}

/// Render a document's raw JSON content to readable plain text. Equivalent
/// to `RichNode::from_value(value).render()`.
#[must_use]
pub fn render_document(value: &Value) -> String {
    RichNode::from_value(value).render()
}
