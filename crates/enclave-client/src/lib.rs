//! HTTP client for the Enclave management API.
//!
//! [`Client`] holds the credentials and answers account-level questions
//! (which organisations can this token act in?); [`OrgClient`] binds one
//! organisation and exposes the resource endpoints beneath it. Wire shapes
//! live in [`types`].

pub mod client;
pub mod error;
pub mod types;

pub use client::{Client, OrgClient, DEFAULT_BASE_URL};
pub use error::ApiError;
