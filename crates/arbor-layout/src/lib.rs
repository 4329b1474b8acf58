#![forbid(unsafe_code)]

//! Tree layout for mindmap forests.
//!
//! ```text
//!   nodes ──► sibling_order::resolve ──► strategy_for(layout).calculate ──► positions
//! ```
//!
//! Six strategies are provided, one per [`LayoutType`](arbor_core::LayoutType):
//! four single-direction ones and two balanced ones. [`transition`] holds the
//! side reassignment a caller runs when a tree switches modes.

pub mod balanced;
pub mod directional;
pub mod engine;
pub mod options;
pub mod sibling_order;
pub mod strategy;
pub mod transition;
mod tree;

pub use balanced::Balanced;
pub use directional::Directional;
pub use engine::{ForestLayout, layout_forest, layout_tree, layout_type_of};
pub use options::{FALLBACK_NODE_SIZE, LayoutOptions, SpacingProfile, UnknownProfile};
pub use strategy::{LayoutResult, LayoutStrategy, strategy_for};
pub use transition::{assign_sides, next_child_side, refresh_anchors};
pub use tree::Direction;
