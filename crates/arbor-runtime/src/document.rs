#![forbid(unsafe_code)]

//! Saved mindmap documents.
//!
//! A [`Document`] is the `{nodes, edges, metadata}` shape exchanged with the
//! persistence layer. Older documents kept the layout mode and the
//! auto-layout switch in `metadata`; [`Document::migrate_legacy`] copies
//! them onto roots that lack their own values. The copy is one-way: saving
//! writes the first root's values back into `metadata` but never clears
//! them from the roots.
//!
//! With the `persistence` feature, documents read and write JSON:
//!
//! ```ignore
//! let doc = Document::load("plan.json")?;
//! let mut session = doc.into_session(EngineConfig::default());
//! // ... edit ...
//! Document::from_session(&session).save("plan.json")?;
//! ```

use serde::{Deserialize, Serialize};

use arbor_core::{Edge, GraphSnapshot, LayoutType, Node};

use crate::config::EngineConfig;
use crate::session::Session;

/// Canvas camera saved alongside the graph.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
        }
    }
}

/// Document-level settings. Per-tree settings live on roots; these are
/// kept for older readers and for migration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_type: Option<LayoutType>,
    #[serde(
        default,
        alias = "forceLayout",
        alias = "autoLayoutEnabled",
        skip_serializing_if = "Option::is_none"
    )]
    pub auto_layout: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewport: Option<Viewport>,
}

/// Nodes, edges, and metadata as stored.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub metadata: Metadata,
    /// Rendered preview supplied by the host on save; opaque here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

impl Document {
    /// Capture a session's graph. Metadata mirrors the first root's
    /// settings so older readers still see a layout mode.
    #[must_use]
    pub fn from_session(session: &Session) -> Self {
        let GraphSnapshot { nodes, edges } = session.snapshot();
        let settings = nodes.iter().find_map(|n| n.kind.settings());
        let metadata = Metadata {
            layout_type: settings.map(|s| s.layout_type()),
            auto_layout: settings.map(|s| s.auto_layout_enabled()),
            viewport: None,
        };
        Self {
            nodes,
            edges,
            metadata,
            thumbnail: None,
        }
    }

    #[must_use]
    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.metadata.viewport = Some(viewport);
        self
    }

    #[must_use]
    pub fn with_thumbnail(mut self, thumbnail: impl Into<String>) -> Self {
        self.thumbnail = Some(thumbnail.into());
        self
    }

    /// Copy legacy metadata settings onto roots that have none. Returns how
    /// many roots were changed.
    pub fn migrate_legacy(&mut self) -> usize {
        let Metadata {
            layout_type,
            auto_layout,
            ..
        } = self.metadata;
        if layout_type.is_none() && auto_layout.is_none() {
            return 0;
        }
        let mut migrated = 0;
        for node in &mut self.nodes {
            let Some(settings) = node.kind.settings_mut() else {
                continue;
            };
            let mut touched = false;
            if settings.layout_type.is_none() && layout_type.is_some() {
                settings.layout_type = layout_type;
                touched = true;
            }
            if settings.auto_layout.is_none() && auto_layout.is_some() {
                settings.auto_layout = auto_layout;
                touched = true;
            }
            if touched {
                migrated += 1;
                tracing::debug!(root = %node.id, "migrated legacy tree settings");
            }
        }
        migrated
    }

    /// Migrate, then open a session over the graph.
    #[must_use]
    pub fn into_session(mut self, config: EngineConfig) -> Session {
        self.migrate_legacy();
        Session::with_graph(
            config,
            GraphSnapshot {
                nodes: self.nodes,
                edges: self.edges,
            },
        )
    }
}

#[cfg(feature = "persistence")]
mod json {
    use std::fmt;
    use std::fs;
    use std::path::Path;

    use super::Document;

    /// Failure to read or write a document.
    #[derive(Debug)]
    pub enum DocumentError {
        /// File could not be read or written.
        Io(std::io::Error),
        /// Content is not a valid document.
        Json(serde_json::Error),
    }

    impl fmt::Display for DocumentError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                DocumentError::Io(e) => write!(f, "I/O error: {e}"),
                DocumentError::Json(e) => write!(f, "invalid document: {e}"),
            }
        }
    }

    impl std::error::Error for DocumentError {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            match self {
                DocumentError::Io(e) => Some(e),
                DocumentError::Json(e) => Some(e),
            }
        }
    }

    impl From<std::io::Error> for DocumentError {
        fn from(e: std::io::Error) -> Self {
            DocumentError::Io(e)
        }
    }

    impl From<serde_json::Error> for DocumentError {
        fn from(e: serde_json::Error) -> Self {
            DocumentError::Json(e)
        }
    }

    impl Document {
        /// Parse a document. Legacy metadata is left as found; call
        /// [`Document::migrate_legacy`] or [`Document::into_session`].
        pub fn from_json(json: &str) -> Result<Self, DocumentError> {
            Ok(serde_json::from_str(json)?)
        }

        pub fn to_json(&self) -> Result<String, DocumentError> {
            Ok(serde_json::to_string_pretty(self)?)
        }

        pub fn load(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
            let path = path.as_ref();
            let raw = fs::read_to_string(path)?;
            let doc = Self::from_json(&raw)?;
            tracing::debug!(
                path = %path.display(),
                nodes = doc.nodes.len(),
                edges = doc.edges.len(),
                "document loaded"
            );
            Ok(doc)
        }

        /// Write atomically: a sibling temp file is renamed over `path`.
        pub fn save(&self, path: impl AsRef<Path>) -> Result<(), DocumentError> {
            let path = path.as_ref();
            let json = self.to_json()?;
            let tmp = path.with_extension("json.tmp");
            fs::write(&tmp, json)?;
            fs::rename(&tmp, path)?;
            tracing::debug!(path = %path.display(), nodes = self.nodes.len(), "document saved");
            Ok(())
        }
    }
}

#[cfg(feature = "persistence")]
pub use json::DocumentError;

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_core::{NodeKind, Point, TreeSettings};

    fn legacy() -> Document {
        Document {
            nodes: vec![
                Node::root("r"),
                Node::branch("a", "r").with_level(1),
                Node::root("s").with_layout_type(LayoutType::LeftOnly),
            ],
            edges: vec![Edge::new("e", "r", "a")],
            metadata: Metadata {
                layout_type: Some(LayoutType::TopOnly),
                auto_layout: Some(true),
                viewport: Some(Viewport::default()),
            },
            thumbnail: None,
        }
    }

    fn settings(doc: &Document, id: &str) -> TreeSettings {
        doc.nodes
            .iter()
            .find(|n| n.id.as_str() == id)
            .and_then(|n| n.kind.settings())
            .cloned()
            .unwrap()
    }

    #[test]
    fn migration_fills_only_missing_fields() {
        let mut doc = legacy();
        assert_eq!(doc.migrate_legacy(), 2);
        assert_eq!(settings(&doc, "r").layout_type, Some(LayoutType::TopOnly));
        assert_eq!(settings(&doc, "r").auto_layout, Some(true));
        // Own value wins.
        assert_eq!(settings(&doc, "s").layout_type, Some(LayoutType::LeftOnly));
        assert_eq!(settings(&doc, "s").auto_layout, Some(true));
        assert_eq!(doc.nodes[1].kind, NodeKind::Branch);
        // Idempotent.
        assert_eq!(doc.migrate_legacy(), 0);
    }

    #[test]
    fn session_round_trip_keeps_metadata() {
        let session = legacy().into_session(EngineConfig::default());
        assert_eq!(
            session.store().root_layout_type(&"r".into()),
            LayoutType::TopOnly
        );
        let doc = Document::from_session(&session).with_viewport(Viewport {
            x: 10.0,
            y: -4.0,
            zoom: 2.0,
        });
        assert_eq!(doc.metadata.layout_type, Some(LayoutType::TopOnly));
        assert_eq!(doc.metadata.auto_layout, Some(true));
        assert_eq!(doc.nodes.len(), 3);
    }

    #[test]
    fn empty_session_has_no_metadata() {
        let doc = Document::from_session(&Session::default());
        assert_eq!(doc.metadata, Metadata::default());
        let mut session = Session::default();
        session.add_root("x", Point::ZERO);
        assert!(Document::from_session(&session).metadata.layout_type.is_some());
    }

    #[cfg(feature = "persistence")]
    #[test]
    fn legacy_json_aliases() {
        let json = r#"{
            "nodes": [{"id": "r", "kind": {"type": "root"}, "position": {"x": 0, "y": 0}}],
            "edges": [],
            "metadata": {"layoutType": "right-only", "forceLayout": true}
        }"#;
        let doc = Document::from_json(json).unwrap();
        assert_eq!(doc.metadata.auto_layout, Some(true));
        assert_eq!(doc.metadata.layout_type, Some(LayoutType::RightOnly));
        let session = doc.into_session(EngineConfig::default());
        let root = session.node(&"r".into()).unwrap();
        assert!(root.kind.settings().unwrap().auto_layout_enabled());
    }

    #[cfg(feature = "persistence")]
    #[test]
    fn malformed_json_is_an_error() {
        let err = Document::from_json("{\"nodes\": 3}").unwrap_err();
        assert!(matches!(err, DocumentError::Json(_)));
        assert!(err.to_string().starts_with("invalid document"));
    }
}
