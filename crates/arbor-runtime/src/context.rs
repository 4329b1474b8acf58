#![forbid(unsafe_code)]

//! Read-only tree context for content generators, and the shape of what
//! they send back.
//!
//! A generator (an AI service, a template expander) is handed a
//! [`TreeContext`] describing where a node sits: the plain-text path from
//! the root, the parent, the siblings, the depth. The engine never calls a
//! generator itself. When a response arrives the host passes the produced
//! [`GeneratedNode`] tree to
//! [`Session::insert_generated`](crate::session::Session::insert_generated)
//! or rewrites text with
//! [`Session::overwrite_content`](crate::session::Session::overwrite_content).

use serde::{Deserialize, Serialize};

use arbor_core::{GraphStore, NodeId};

/// Where a node sits in its tree, as plain text.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeContext {
    /// Contents from the root down to the node's parent.
    pub ancestry_path: Vec<String>,
    /// Content of the direct parent, empty for roots.
    pub parent_content: String,
    /// Contents of the other children of the same parent, in collection
    /// order.
    pub sibling_contents: Vec<String>,
    /// The node's own content.
    pub content: String,
    pub current_level: u32,
    pub root_content: String,
}

/// One generated node and the subtree to hang below it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GeneratedNode {
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<GeneratedNode>,
}

impl GeneratedNode {
    #[must_use]
    pub fn leaf(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_children(mut self, children: Vec<GeneratedNode>) -> Self {
        self.children = children;
        self
    }

    /// Nodes in this subtree, self included.
    #[must_use]
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(GeneratedNode::count).sum::<usize>()
    }
}

/// Build the context for `id`. `None` when the node is not live.
///
/// A broken parent chain ends the ancestry walk early; the root content is
/// then empty.
#[must_use]
pub fn tree_context(store: &GraphStore, id: &NodeId) -> Option<TreeContext> {
    let node = store.node(id)?;

    let mut ancestry = Vec::new();
    let mut seen = std::collections::HashSet::from([id]);
    let mut cursor = node.parent_id.as_ref();
    while let Some(parent_id) = cursor {
        if !seen.insert(parent_id) {
            break;
        }
        let Some(parent) = store.node(parent_id) else {
            break;
        };
        ancestry.push(strip_markup(&parent.content));
        cursor = parent.parent_id.as_ref();
    }
    ancestry.reverse();

    let sibling_contents = node
        .parent_id
        .as_ref()
        .map(|parent| {
            store
                .children(parent)
                .iter()
                .filter(|sibling| *sibling != id)
                .filter_map(|sibling| store.node(sibling))
                .map(|sibling| strip_markup(&sibling.content))
                .collect()
        })
        .unwrap_or_default();

    let root_content = store
        .get_root_of(id)
        .and_then(|root| store.node(root))
        .map(|root| strip_markup(&root.content))
        .unwrap_or_default();

    Some(TreeContext {
        parent_content: ancestry.last().cloned().unwrap_or_default(),
        ancestry_path: ancestry,
        sibling_contents,
        content: strip_markup(&node.content),
        current_level: node.level,
        root_content,
    })
}

const BLOCK_TAGS: &[&str] = &[
    "p", "br", "div", "li", "ul", "ol", "h1", "h2", "h3", "h4", "h5", "h6", "tr", "td",
    "blockquote",
];

/// Plain text from rich node content: tags dropped (block tags become
/// spaces), common entities decoded, whitespace collapsed.
#[must_use]
pub fn strip_markup(content: &str) -> String {
    let mut text = String::with_capacity(content.len());
    let mut rest = content;
    while let Some(open) = rest.find('<') {
        text.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('>') else {
            // Unterminated tag: keep it as text.
            text.push_str(&rest[open..]);
            rest = "";
            break;
        };
        if is_block_tag(&after[..close]) {
            text.push(' ');
        }
        rest = &after[close + 1..];
    }
    text.push_str(rest);

    let decoded = decode_entities(&text);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_block_tag(tag: &str) -> bool {
    let name = tag
        .trim_start_matches('/')
        .split(|c: char| c.is_whitespace() || c == '/')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    BLOCK_TAGS.contains(&name.as_str())
}

fn decode_entities(text: &str) -> String {
    const ENTITIES: &[(&str, &str)] = &[
        ("&nbsp;", " "),
        ("&lt;", "<"),
        ("&gt;", ">"),
        ("&quot;", "\""),
        ("&#39;", "'"),
        ("&apos;", "'"),
        // Last so that "&amp;lt;" decodes to "&lt;", not "<".
        ("&amp;", "&"),
    ];
    let mut out = text.to_owned();
    for (entity, plain) in ENTITIES {
        if out.contains(entity) {
            out = out.replace(entity, plain);
        }
    }
    out
}
