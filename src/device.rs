//! Device store (C2): a serialized wrapper over the ring plus the
//! pending-write accumulator, implementing the semantics a `/dev/aesdchar`
//! read/write/llseek/ioctl file-operations table would dispatch to.
//!
//! The actual character-device registration (`cdev`, `file_operations`,
//! `copy_to_user`/`copy_from_user`) is an external collaborator and lives
//! outside this crate; see `aesd-net::backing_store::CharDeviceStore` for
//! the narrow adapter that sits in front of this store.

use std::sync::Mutex;

use crate::config::RingConfig;
use crate::entry::Entry;
use crate::error::DeviceError;
use crate::ring::Ring;

/// Mirrors `O_ACCMODE` without the precedence bug noted in the design
/// notes: callers state their intended access mode directly rather than
/// a flag the store has to mask and compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

/// `lseek`-style origin for [`DeviceStore::seek`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whence {
    Set,
    Cur,
    End,
}

/// The `(write_cmd, write_cmd_offset)` payload of `AESDCHAR_IOCSEEKTO`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeekCoordinate {
    pub write_cmd: u32,
    pub write_cmd_offset: u32,
}

struct Inner {
    ring: Ring,
    /// Pending bytes of an incomplete command awaiting its `\n`.
    /// Non-empty iff the last committed byte sequence did not end in `\n`.
    accumulator: Vec<u8>,
}

/// Serialized wrapper over the bounded ring. One instance models the
/// entire in-kernel state of `/dev/aesdchar`; read position is tracked
/// per open handle by the caller, matching `struct file`'s `f_pos`.
pub struct DeviceStore {
    inner: Mutex<Inner>,
}

impl DeviceStore {
    pub fn new(config: RingConfig) -> Self {
        Self {
            inner: Mutex::new(Inner {
                ring: Ring::new(config),
                accumulator: Vec::new(),
            }),
        }
    }

    /// Appends `bytes` to the pending accumulator, committing it to the
    /// ring the moment it ends in `\n`. Returns [`DeviceError::OutOfMemory`]
    /// without mutating committed state if growing the accumulator fails.
    pub fn write(&self, bytes: &[u8]) -> Result<(), DeviceError> {
        let mut inner = self.inner.lock().expect("device store mutex poisoned");

        inner
            .accumulator
            .try_reserve(bytes.len())
            .map_err(|_| DeviceError::OutOfMemory)?;
        inner.accumulator.extend_from_slice(bytes);

        if inner.accumulator.last() == Some(&b'\n') {
            let committed = std::mem::take(&mut inner.accumulator);
            let evicted = inner.ring.append(Entry::new(committed));
            drop(evicted); // released to the allocator, as the caller would via kfree
        }

        Ok(())
    }

    /// Copies up to `buf.len()` bytes of the logical stream starting at
    /// `pos`, stopping at the first entry boundary where `buf` is full or
    /// the ring is exhausted. Returns the number of bytes copied (0 when
    /// `pos` is at or past the end of the stream).
    pub fn read_at(&self, pos: u64, buf: &mut [u8]) -> usize {
        let inner = self.inner.lock().expect("device store mutex poisoned");

        let Some(mut cursor) = inner.ring.locate(pos as usize) else {
            return 0;
        };

        let mut copied = 0;
        loop {
            let chunk = inner.ring.slice_at(&cursor);
            let take = chunk.len().min(buf.len() - copied);
            buf[copied..copied + take].copy_from_slice(&chunk[..take]);
            copied += take;

            if copied == buf.len() {
                break;
            }
            match inner.ring.next(&cursor) {
                Some(next) => cursor = next,
                None => break,
            }
        }
        copied
    }

    /// Total length of the logical stream (committed entries only; the
    /// in-flight accumulator does not count until it is terminated).
    pub fn total_size(&self) -> u64 {
        let inner = self.inner.lock().expect("device store mutex poisoned");
        inner.ring.total_size() as u64
    }

    /// Computes a new absolute position from `whence`/`offset` relative to
    /// `current`, rejecting positions outside `[0, total_size()]`.
    pub fn seek(&self, whence: Whence, offset: i64, current: u64) -> Result<u64, DeviceError> {
        let len = self.total_size() as i64;
        let base = match whence {
            Whence::Set => 0,
            Whence::Cur => current as i64,
            Whence::End => len,
        };
        let candidate = base.checked_add(offset).ok_or(DeviceError::InvalidSeek)?;
        if candidate < 0 || candidate > len {
            return Err(DeviceError::InvalidSeek);
        }
        Ok(candidate as u64)
    }

    /// Resolves `(write_cmd, write_cmd_offset)` into an absolute byte
    /// position and validates it against the live ring contents.
    pub fn adjust_to_command(&self, coord: SeekCoordinate) -> Result<u64, DeviceError> {
        let inner = self.inner.lock().expect("device store mutex poisoned");

        if inner.ring.is_empty() {
            return Err(DeviceError::InvalidSeek);
        }
        let cmd = coord.write_cmd as usize;
        let this_size = inner.ring.entry_size(cmd).ok_or(DeviceError::InvalidSeek)?;
        if coord.write_cmd_offset as usize >= this_size {
            return Err(DeviceError::InvalidSeek);
        }

        let mut position: u64 = 0;
        for i in 0..cmd {
            position += inner.ring.entry_size(i).expect("validated above") as u64;
        }
        Ok(position + u64::from(coord.write_cmd_offset))
    }

    /// Dispatches the sole recognized ioctl, `AESDCHAR_IOCSEEKTO`.
    pub fn ioctl_seek_to(&self, coord: SeekCoordinate) -> Result<u64, DeviceError> {
        self.adjust_to_command(coord)
    }

    /// Models the `open()` file operation: a write-only open clears the
    /// ring and discards the accumulator, as a fresh write session should
    /// not see stale retained commands. Any other mode is a no-op.
    pub fn on_open(&self, mode: OpenMode) {
        if mode == OpenMode::WriteOnly {
            let mut inner = self.inner.lock().expect("device store mutex poisoned");
            inner.ring.clear();
            inner.accumulator.clear();
        }
    }
}
