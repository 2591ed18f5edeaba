//! Backend REST client.

mod client;
mod error;

pub use client::{ChatMessage, HttpBackendClient};
pub use error::ApiError;
