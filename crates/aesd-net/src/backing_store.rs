//! The backing store abstraction (C7): the local file and the character
//! device both satisfy the same small surface the connection worker and the
//! timestamp producer drive, so the server is written once against
//! [`BackingStore`] regardless of which one is active.
//!
//! The two stores don't share an implementation, only an interface, so this
//! is modeled as a sum type rather than a trait object: one `Arc<Mutex<..>>`
//! is shared across every connection and the timestamp producer, and the
//! lock itself is what gives the server its ordering guarantee.

use std::path::{Path, PathBuf};

use aesd_core::{DeviceStore, OpenMode, SeekCoordinate};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};

use crate::error::StoreError;

/// Default path for the local-file backing store, matching the reference
/// server.
pub const DEFAULT_DATA_FILE: &str = "/var/tmp/aesdsocketdata";

/// A plain append-only file played back from the start on every write.
pub struct LocalFileStore {
    path: PathBuf,
    file: File,
}

impl LocalFileStore {
    /// Opens (creating and truncating) the file at `path`. Writes always
    /// land at end-of-file regardless of the file's current read position,
    /// since the handle is opened in append mode.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .append(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .await?;
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn append(&mut self, bytes: &[u8]) -> Result<(), StoreError> {
        self.file.write_all(bytes).await?;
        Ok(())
    }

    async fn rewind(&mut self) -> Result<(), StoreError> {
        self.file.seek(std::io::SeekFrom::Start(0)).await?;
        Ok(())
    }

    async fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize, StoreError> {
        let n = self.file.read(buf).await?;
        Ok(n)
    }
}

/// Adapts the in-process [`DeviceStore`] to the backing-store surface,
/// owning the per-handle read position the real `struct file::f_pos` would
/// hold.
pub struct CharDeviceStore {
    store: std::sync::Arc<DeviceStore>,
    position: u64,
}

impl CharDeviceStore {
    pub fn new(store: std::sync::Arc<DeviceStore>) -> Self {
        Self { store, position: 0 }
    }

    async fn append(&mut self, bytes: &[u8]) -> Result<(), StoreError> {
        self.store.write(bytes).map_err(StoreError::from)
    }

    async fn rewind(&mut self) -> Result<(), StoreError> {
        self.position = 0;
        Ok(())
    }

    async fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize, StoreError> {
        let n = self.store.read_at(self.position, buf);
        self.position += n as u64;
        Ok(n)
    }

    async fn ioctl_seek_to(&mut self, write_cmd: u32, write_cmd_offset: u32) -> Result<(), StoreError> {
        let coord = SeekCoordinate {
            write_cmd,
            write_cmd_offset,
        };
        self.position = self.store.ioctl_seek_to(coord)?;
        Ok(())
    }
}

/// The active backing store: either a local file or the simulated character
/// device, selected once at startup and shared for the lifetime of the
/// server.
pub enum BackingStore {
    LocalFile(LocalFileStore),
    CharDevice(CharDeviceStore),
}

impl BackingStore {
    /// Whether the active variant is the character device. The in-band
    /// seek command is only recognized against this variant; against the
    /// local file it is ordinary data, per spec.
    pub fn is_char_device(&self) -> bool {
        matches!(self, BackingStore::CharDevice(_))
    }

    /// Per-connection hook mirroring the device's open-mode semantics. The
    /// socket server always opens for read+write, so on the character
    /// device this never clears the ring (only a write-only open does);
    /// on the local file it is a no-op.
    pub async fn open_append_read(&mut self) -> Result<(), StoreError> {
        if let BackingStore::CharDevice(dev) = self {
            dev.store.on_open(OpenMode::ReadWrite);
        }
        Ok(())
    }

    pub async fn append(&mut self, bytes: &[u8]) -> Result<(), StoreError> {
        match self {
            BackingStore::LocalFile(f) => f.append(bytes).await,
            BackingStore::CharDevice(d) => d.append(bytes).await,
        }
    }

    /// Rewinds the read position to the start of the store. Called after an
    /// ordinary write, before streaming the store back to the client.
    pub async fn rewind(&mut self) -> Result<(), StoreError> {
        match self {
            BackingStore::LocalFile(f) => f.rewind().await,
            BackingStore::CharDevice(d) => d.rewind().await,
        }
    }

    /// Executes the in-band seek command. Only meaningful on the character
    /// device; the local-file store has no ioctl equivalent.
    pub async fn ioctl_seek_to(&mut self, write_cmd: u32, write_cmd_offset: u32) -> Result<(), StoreError> {
        match self {
            BackingStore::LocalFile(_) => Err(StoreError::Unsupported),
            BackingStore::CharDevice(d) => d.ioctl_seek_to(write_cmd, write_cmd_offset).await,
        }
    }

    pub async fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize, StoreError> {
        match self {
            BackingStore::LocalFile(f) => f.read_chunk(buf).await,
            BackingStore::CharDevice(d) => d.read_chunk(buf).await,
        }
    }

    /// Ends the per-connection session. Neither variant holds anything that
    /// needs releasing here; the hook exists so the worker's lifecycle
    /// reads the same regardless of which store is active.
    pub async fn close(&mut self) -> Result<(), StoreError> {
        Ok(())
    }
}
