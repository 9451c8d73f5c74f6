//! Managed DOM ranges
//!
//! A range is a span of sibling nodes bounded by two empty text markers.
//! It owns an ordered, keyed set of members: plain nodes or other ranges.
//! Ranges nest, move as a unit and survive external code rearranging the
//! nodes they manage.
//!
//! ## Core Design
//!
//! ```text
//! Document::create_range → RangeId ──range(id)──→ RangeMut
//!                                                  ├─ add / add_nodes / remove / remove_all
//!                                                  ├─ move_before
//!                                                  ├─ refresh / prune
//!                                                  └─ attach_to / detach
//! ```
//!
//! Every placement decision reads the live tree. Nothing about sibling
//! positions is cached between operations.
//!
//! ## Example
//!
//! ```
//! use domrange::{Document, Key};
//!
//! let mut doc = Document::new();
//! let list = doc.create_range().unwrap();
//! let a = doc.dom_mut().create_element("li");
//! let b = doc.dom_mut().create_element("li");
//!
//! let mut range = doc.range(list).unwrap();
//! range.add(Some("a".into()), a, None).unwrap();
//! range.add(Some("b".into()), b, None).unwrap();
//! range.move_before("b", Some("a".into())).unwrap();
//! assert_eq!(range.keys(), vec![Key::from("b"), Key::from("a")]);
//! ```

mod document;
mod error;
mod range;
mod refresh;
mod reorder;
mod types;

#[cfg(test)]
mod testing;

pub use document::{Document, DocumentConfig};
pub use error::{DomRangeError, Result};
pub use range::RangeMut;
pub use types::{Key, Marker, Member, RangeHost, RangeId};

pub use dom::{DomArena, NodeId};
