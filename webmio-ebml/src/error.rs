//! EBML-specific error types.

use crate::element::Lacing;
use thiserror::Error;

/// Errors produced while decoding or encoding EBML structures.
///
/// Running out of input is *not* an error: the decoding entry points report
/// it through their return shape (`Ok(None)` / `Decoded::NeedMore`) so the
/// caller can buffer more bytes and retry without re-parsing.
#[derive(Error, Debug)]
pub enum EbmlError {
    /// A VINT started with a zero byte (width greater than eight).
    #[error("invalid VINT leading byte")]
    InvalidVint,

    /// A value does not fit into the widest (eight-byte) VINT form.
    #[error("VINT overflow: value exceeds the eight-byte range")]
    VintOverflow,

    /// An element other than Segment declared the reserved unknown size.
    #[error("element {id:#010X} has unknown size, which is not streamable")]
    UnknownSize {
        /// Raw element ID.
        id: u32,
    },

    /// An element declared a payload too large to buffer.
    #[error("element {id:#010X} declares an oversized payload of {size} bytes")]
    Oversized {
        /// Raw element ID.
        id: u32,
        /// Declared payload size.
        size: u64,
    },

    /// Structurally invalid EBML inside a fully-buffered element.
    #[error("malformed EBML: {0}")]
    Malformed(String),

    /// A UTF-8 element contained invalid UTF-8.
    #[error("invalid UTF-8 in element {id:#010X}")]
    InvalidUtf8 {
        /// Raw element ID.
        id: u32,
    },

    /// Master elements nested deeper than the parser allows.
    #[error("recursion limit exceeded at depth {depth}")]
    RecursionLimit {
        /// The depth at which parsing stopped.
        depth: u32,
    },

    /// Only lacing-free SimpleBlocks can be serialized.
    #[error("cannot serialize a block with {0:?} lacing")]
    UnsupportedLacing(Lacing),
}

/// Result type for EBML operations.
pub type Result<T> = std::result::Result<T, EbmlError>;
