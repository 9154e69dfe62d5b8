//! Data Transfer Objects for API requests and responses.
//!
//! All DTOs use Serde for JSON serialization/deserialization. Input
//! validation happens in the service layer.

pub mod health;
pub mod link_info;
pub mod shorten;
