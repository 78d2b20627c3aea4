//! Data Transfer Objects for REST request/response serialization.
//!
//! Ingress request bodies are the domain records themselves (see
//! [`crate::domain::records`]); only the responses need their own types.

pub mod notify_dto;

pub use notify_dto::*;
