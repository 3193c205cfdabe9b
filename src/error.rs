//! Error types for the device store.

use thiserror::Error;

/// Errors surfaced by [`crate::device::DeviceStore`], mirroring the errno
/// categories the kernel driver would return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DeviceError {
    /// Allocation failed while committing a write; committed state is
    /// left unchanged.
    #[error("out of memory")]
    OutOfMemory,
    /// A seek coordinate (either a raw offset or a `(cmd, cmd_offset)`
    /// pair) named a position outside the retained commands.
    #[error("invalid seek coordinate")]
    InvalidSeek,
    /// Decoding the ioctl argument from the caller failed.
    #[error("bad address")]
    BadAddress,
    /// An unrecognized ioctl command was requested.
    #[error("operation not supported")]
    Unsupported,
}
