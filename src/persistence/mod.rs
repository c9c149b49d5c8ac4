//! Key-value persistence
//!
//! Features:
//! - Versioned JSON envelope around every stored value
//! - In-memory, file-backed (native) and LocalStorage (web) backends
//! - Failures surface as [`PersistError`]; callers decide whether to care

pub mod envelope;
pub mod error;
pub mod storage;

pub use envelope::{ENVELOPE_VERSION, load, store};
pub use error::PersistError;
#[cfg(not(target_arch = "wasm32"))]
pub use storage::FileStorage;
#[cfg(target_arch = "wasm32")]
pub use storage::LocalStorage;
pub use storage::{MemoryStorage, Storage};
