//! Key-value storage adapters.

#[cfg(target_arch = "wasm32")]
mod browser;
#[cfg(not(target_arch = "wasm32"))]
mod dir;
mod memory;

#[cfg(target_arch = "wasm32")]
pub use browser::BrowserKeyValueStore;
#[cfg(not(target_arch = "wasm32"))]
pub use dir::DirKeyValueStore;
pub use memory::MemoryKeyValueStore;
