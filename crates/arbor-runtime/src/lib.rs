#![forbid(unsafe_code)]

//! Runtime: the editing session over a mindmap forest.
//!
//! # Role in Arbor
//! `arbor-runtime` owns live state. A [`Session`] holds the graph store,
//! the undo history, the transition animator, and the deferred task queue,
//! and exposes every structural edit (add, collapse, expand, move, delete,
//! layout-mode change) as one synchronous call.
//!
//! # Driving a session
//! The host feeds renderer measurements in with
//! [`Session::report_measured`] and calls [`Session::tick`] once per frame.
//! Nothing in this crate reads a clock or spawns a thread.
//!
//! # How it fits in the system
//! Layout math lives in `arbor-layout`, the data model and store in
//! `arbor-core`. The `arbor` facade re-exports all three.

pub mod animator;
pub mod config;
pub mod context;
pub mod document;
pub mod error;
pub mod history;
pub mod scheduler;
pub mod session;

pub use animator::{AnimationStatus, TransitionAnimator, TransitionToken};
pub use config::{ConfigError, EngineConfig};
pub use context::{GeneratedNode, TreeContext, strip_markup, tree_context};
#[cfg(feature = "persistence")]
pub use document::DocumentError;
pub use document::{Document, Metadata, Viewport};
pub use error::{EditError, EditOutcome, SkipReason};
pub use history::{HistoryConfig, HistoryManager};
pub use scheduler::{DeferredTasks, DueTask};
pub use session::{Session, TickReport};
