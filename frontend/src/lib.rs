//! Session, permission and route-gating core of the medical assistant web
//! client.
//!
//! The [`domain`] module decides what a visitor may see; [`outbound`] holds
//! the storage and HTTP adapters it talks through.

#[cfg(not(target_arch = "wasm32"))]
pub mod config;
pub mod domain;
pub mod outbound;
