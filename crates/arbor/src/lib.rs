#![forbid(unsafe_code)]

//! Arbor public facade crate.
//!
//! Re-exports the graph model, the layout strategies, and the editing
//! session, with one error type and a prelude for hosts.
//!
//! ```ignore
//! use arbor::prelude::*;
//!
//! let mut session = Session::new(EngineConfig::from_env()?);
//! let root = session.add_root("Plan", Point::ZERO);
//! let child = session.add_child(&root, None);
//! session.tick(std::time::Duration::from_millis(16));
//! ```

use std::fmt;

// --- Model re-exports ------------------------------------------------------

pub use arbor_core::{
    Bounds, CollapsedSlot, CollapsedSubtree, Edge, EdgeFlags, EdgeId, Flow, GraphSnapshot,
    GraphStore, LayoutType, Node, NodeFlags, NodeId, NodeKind, PathType, Point, Side, Size,
    TreeSettings,
};

// --- Layout re-exports -----------------------------------------------------

pub use arbor_layout::{
    FALLBACK_NODE_SIZE, ForestLayout, LayoutOptions, LayoutResult, LayoutStrategy,
    SpacingProfile, layout_forest, layout_tree, strategy_for,
};

// --- Runtime re-exports ----------------------------------------------------

pub use arbor_runtime::{
    AnimationStatus, ConfigError, Document, EditError, EditOutcome, EngineConfig, GeneratedNode,
    Metadata, Session, SkipReason, TickReport, TreeContext, Viewport,
};

#[cfg(feature = "tracing-json")]
pub use arbor_core::logging::init_json as init_logging;

// --- Errors ---------------------------------------------------------------

/// Top-level error type for Arbor hosts.
#[derive(Debug)]
pub enum Error {
    /// A structural edit was rejected.
    Edit(EditError),
    /// Configuration could not be read.
    Config(ConfigError),
    /// A document could not be loaded or saved.
    #[cfg(feature = "persistence")]
    Document(arbor_runtime::DocumentError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Edit(err) => write!(f, "{err}"),
            Self::Config(err) => write!(f, "{err}"),
            #[cfg(feature = "persistence")]
            Self::Document(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Edit(err) => Some(err),
            Self::Config(err) => Some(err),
            #[cfg(feature = "persistence")]
            Self::Document(err) => Some(err),
        }
    }
}

impl From<EditError> for Error {
    fn from(err: EditError) -> Self {
        Self::Edit(err)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

#[cfg(feature = "persistence")]
impl From<arbor_runtime::DocumentError> for Error {
    fn from(err: arbor_runtime::DocumentError) -> Self {
        Self::Document(err)
    }
}

/// Standard result type for Arbor APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Document, EditOutcome, EngineConfig, Error, LayoutType, Node, NodeId, Point, Result,
        Session, Side, Size, TickReport,
    };

    pub use crate::{core, layout, runtime};
}

pub use arbor_core as core;
pub use arbor_layout as layout;
pub use arbor_runtime as runtime;
