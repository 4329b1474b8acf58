#![forbid(unsafe_code)]

//! Core: mindmap data model, graph state store, geometry, and animation
//! primitives.

pub mod animation;
pub mod geometry;
pub mod id;
pub mod logging;
pub mod model;
pub mod store;

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{
    debug, debug_span, error, error_span, info, info_span, trace, trace_span, warn, warn_span,
};

pub use geometry::{Bounds, Point, Size};
pub use id::{EdgeId, IdAllocator, NodeId};
pub use model::{
    CollapsedSlot, CollapsedSubtree, Edge, EdgeFlags, Flow, LayoutType, Node, NodeFlags, NodeKind,
    PathType, Side, TreeSettings,
};
pub use store::{GraphSnapshot, GraphStore};
