//! `courier-core`: envelope foundation building blocks.
//!
//! This crate contains **transport-free** primitives shared by the codecs:
//! the error model, header value types, and the value objects used for
//! URI-like and content-type attributes.

pub mod error;
pub mod header;
pub mod id;
pub mod time;
pub mod value_object;

pub use error::{EnvelopeError, EnvelopeResult};
pub use header::HeaderValue;
pub use id::new_event_id;
pub use time::{format_round_trip, parse_instant};
pub use value_object::{ContentType, Uri, ValueObject};
