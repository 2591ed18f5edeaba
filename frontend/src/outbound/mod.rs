//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **storage**: key-value adapters behind the session store (memory,
//!   directory, browser `localStorage`)
//! - **api**: reqwest-backed client for the medical assistant REST backend
//!   (native builds)
//!
//! Adapters are thin translators that convert between domain types and
//! infrastructure-specific representations. They contain no business logic.

#[cfg(not(target_arch = "wasm32"))]
pub mod api;
pub mod storage;
