//! Error types for the backing store abstraction and the server supervisor.

use thiserror::Error;

/// Errors surfaced by a [`crate::backing_store::BackingStore`] operation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("backing store io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("device error: {0}")]
    Device(#[from] aesd_core::DeviceError),

    #[error("framing error: {0}")]
    Frame(#[from] aesd_proto::FrameError),

    /// Returned by operations the active backing store variant does not
    /// implement, e.g. an in-band seek command against the local-file store.
    #[error("operation not supported by this backing store")]
    Unsupported,
}

/// Errors surfaced while standing up or running the server supervisor.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind listening socket: {0}")]
    Bind(#[source] std::io::Error),

    #[error("failed to open backing store: {0}")]
    Store(#[from] StoreError),

    #[error("failed to install signal handler: {0}")]
    Signal(#[source] std::io::Error),
}
