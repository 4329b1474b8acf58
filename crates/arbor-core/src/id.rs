#![forbid(unsafe_code)]

//! Opaque node and edge identifiers.
//!
//! Identifiers arrive from the persistence layer as arbitrary strings, so
//! they are kept as strings rather than integers. Ids minted locally come
//! from an [`IdAllocator`], which skips any id already in use so that
//! freshly loaded documents never collide with new nodes.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            #[must_use]
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self(raw.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                Self(raw)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id! {
    /// Identifier of a node.
    NodeId
}

string_id! {
    /// Identifier of an edge.
    EdgeId
}

/// Monotonic id source.
///
/// `in_use` callbacks let the caller veto ids that already exist anywhere
/// (live collections or collapsed snapshots).
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    #[must_use]
    pub const fn new() -> Self {
        Self { next: 1 }
    }

    /// Peek at the next sequence number without consuming it.
    #[must_use]
    pub const fn peek(&self) -> u64 {
        self.next
    }

    fn bump(&mut self) -> u64 {
        let seq = self.next.max(1);
        self.next = seq.wrapping_add(1);
        seq
    }

    /// Allocate a node id of the form `node-{seq}` that `in_use` rejects.
    pub fn node(&mut self, in_use: impl Fn(&str) -> bool) -> NodeId {
        loop {
            let candidate = format!("node-{}", self.bump());
            if !in_use(&candidate) {
                return NodeId(candidate);
            }
        }
    }

    /// Allocate an edge id of the form `edge-{seq}` that `in_use` rejects.
    pub fn edge(&mut self, in_use: impl Fn(&str) -> bool) -> EdgeId {
        loop {
            let candidate = format!("edge-{}", self.bump());
            if !in_use(&candidate) {
                return EdgeId(candidate);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocator_skips_taken_ids() {
        let mut ids = IdAllocator::new();
        let taken = ["node-1", "node-2"];
        let id = ids.node(|c| taken.contains(&c));
        assert_eq!(id.as_str(), "node-3");
        assert_eq!(ids.peek(), 4);
    }

    #[test]
    fn node_and_edge_share_a_sequence() {
        let mut ids = IdAllocator::default();
        assert_eq!(ids.node(|_| false).as_str(), "node-1");
        assert_eq!(ids.edge(|_| false).as_str(), "edge-2");
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = NodeId::from("abc");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");
        assert_eq!(id.to_string(), "abc");
    }
}
