//! Handles and value types shared by every range operation

use dom::NodeId;
use std::fmt;

/// Handle to a range stored in a [`Document`](crate::Document)
///
/// Ranges are never freed, so a handle stays valid for the lifetime of the
/// document that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RangeId(pub(crate) u32);

impl RangeId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for RangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "range#{}", self.0)
    }
}

/// Logical key of a member
///
/// Caller-supplied keys are `Named`. Members added without a key get an
/// `Auto` key, sequential per range and starting at 1, so the two never
/// collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Named(String),
    Auto(u32),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Named(name) => f.write_str(name),
            Key::Auto(n) => write!(f, "#{}", n),
        }
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::Named(name.to_string())
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Key::Named(name)
    }
}

impl From<&Key> for Key {
    fn from(key: &Key) -> Self {
        key.clone()
    }
}

/// What a key refers to: a bare node or a nested range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Member {
    Node(NodeId),
    Range(RangeId),
}

impl From<NodeId> for Member {
    fn from(node: NodeId) -> Self {
        Member::Node(node)
    }
}

impl From<RangeId> for Member {
    fn from(range: RangeId) -> Self {
        Member::Range(range)
    }
}

impl<H: RangeHost> From<&H> for Member {
    fn from(host: &H) -> Self {
        Member::Range(host.dom())
    }
}

/// Which boundary of its range a marker node is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Start,
    End,
}

/// An object that owns exactly one range, e.g. a UI component
///
/// Anything implementing this can be passed to `add` in place of the range
/// itself. Build hosts with [`Document::create_host`](crate::Document::create_host)
/// so the pairing is fixed at construction.
pub trait RangeHost {
    fn dom(&self) -> RangeId;
}
