//! # webmio-ebml
//!
//! Incremental EBML parsing and serialization for WebM byte streams.
//!
//! EBML (RFC 8794) is the tagged binary tree format underlying Matroska and
//! WebM. This crate provides the container-agnostic layer of the webmio
//! stack:
//!
//! - Variable-length integer (VINT) decoding and encoding
//! - A closed, schema-directed type system for WebM elements
//! - A pure slice-based element decoder that reports `NeedMore` instead of
//!   blocking on I/O
//! - A push-driven [`StreamingParser`] that accepts arbitrarily chunked
//!   input and yields completed top-level elements in file order
//! - A serializer that encodes typed element trees back to bytes
//!
//! ## Example: parsing a chunked stream
//!
//! ```no_run
//! use webmio_ebml::StreamingParser;
//!
//! let mut parser = StreamingParser::new();
//!
//! for chunk in [&b"..."[..], &b"..."[..]] {
//!     parser.push(chunk);
//!     while let Some(element) = parser.poll().unwrap() {
//!         println!("{}: {:?}", element.name(), element.value);
//!     }
//! }
//! ```

#![warn(missing_docs)]

pub mod element;
pub mod error;
pub mod parse;
pub mod schema;
pub mod stream;
pub mod vint;
pub mod write;

pub use element::{
    BlockFlags, Child, ChromaSiting, CodecId, Element, FlagInterlaced, Lacing, SimpleBlock,
    TrackType, Value,
};
pub use error::{EbmlError, Result};
pub use parse::{decode_element, parse_value, Decoded};
pub use schema::{ids, ElementKind};
pub use stream::StreamingParser;
pub use vint::{encode_vint, encode_vint_fixed, read_vint, vint_length, Vint};
pub use write::encode_element;
