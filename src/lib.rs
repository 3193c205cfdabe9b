//! `aesd-core` — the bounded command ring and device store behind
//! `/dev/aesdchar`.
//!
//! This crate implements the kernel-module-free logic of the AESD
//! character device: a 10-slot FIFO of retained newline-terminated
//! commands ([`ring::Ring`]), and the serialized read/write/seek/ioctl
//! surface on top of it ([`device::DeviceStore`]). It consumes no kernel
//! APIs — registering `/dev/aesdchar` itself, and copying to/from user
//! memory, are external collaborators that a real deployment layers on
//! top of this logic (see `aesd-net::backing_store::CharDeviceStore`).
//!
//! # Example
//!
//! ```
//! use aesd_core::{DeviceStore, RingConfig};
//!
//! let store = DeviceStore::new(RingConfig::default());
//! store.write(b"hello\n").unwrap();
//! store.write(b"world\n").unwrap();
//!
//! let mut buf = [0u8; 64];
//! let n = store.read_at(0, &mut buf);
//! assert_eq!(&buf[..n], b"hello\nworld\n");
//! ```

mod config;
mod device;
mod entry;
mod error;
mod ring;

pub use config::{RingConfig, AESD_RING_CAPACITY};
pub use device::{DeviceStore, OpenMode, SeekCoordinate, Whence};
pub use entry::Entry;
pub use error::DeviceError;
pub use ring::{Cursor, Ring};
