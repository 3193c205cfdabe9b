//! `aesd-net` — the socket server: a TCP frontend that writes newline-framed
//! client messages through to a backing store (a plain file or the
//! simulated `/dev/aesdchar`) and streams the store's full contents back
//! after each write.

pub mod backing_store;
pub mod cli;
pub mod error;
pub mod supervisor;
pub mod timestamp;
pub mod worker;

pub use error::{ServerError, StoreError};
pub use supervisor::{Backing, ServerConfig, ShutdownSignal};
