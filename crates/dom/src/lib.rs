//! Live DOM tree
//!
//! Arena-backed node storage with the mutation surface a browser exposes:
//! parent/sibling queries, `insert_before`, `append_child`, `remove_child`.
//!
//! ## Philosophy (Linus Torvalds Style)
//!
//! - **Good taste**: Data structures first, algorithms follow naturally
//! - **No special cases**: Type system eliminates branches
//! - **Cache friendly**: Arena allocation, sequential access patterns
//!
//! ## Core Design
//!
//! ```text
//! create_* → DomArena (owned) → insert_before / detach → Serialized
//!                 ↓
//!            NodeId (u32)
//! ```

pub mod arena;
pub mod error;
pub mod serializer;
pub mod types;
pub mod utils;

pub use arena::DomArena;
pub use error::{DomError, Result};
pub use serializer::{DomSerializer, NodeSnapshot, SerializerConfig};
pub use types::*;
