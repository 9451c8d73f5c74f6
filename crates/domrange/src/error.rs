//! Error types for range operations
//!
//! Key errors are programmer errors in the calling code. Physical drift
//! caused by external mutation is never an error; `refresh` repairs it.

use dom::DomError;
use thiserror::Error;

use crate::types::{Key, RangeId};

pub type Result<T> = std::result::Result<T, DomRangeError>;

#[derive(Debug, Error)]
pub enum DomRangeError {
    #[error("Member already exists: {0}")]
    DuplicateKey(Key),

    #[error("No such member: {0}")]
    UnknownKey(Key),

    #[error("Invalid member: {0}")]
    InvalidMember(String),

    #[error("Range not found: {0}")]
    RangeNotFound(RangeId),

    #[error("DOM error: {0}")]
    Dom(#[from] DomError),
}
