//! Core domain entities.
//!
//! - [`ShortLink`] - A stored short code binding with its click statistics
//! - [`NewLink`] - Input for creating a link

pub mod link;

pub use link::{NewLink, ShortLink};
