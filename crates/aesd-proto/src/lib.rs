//! `aesd-proto` — the boundary protocol the socket server speaks: newline-
//! framed message accumulation across partial reads, and the in-band
//! `AESDCHAR_IOCSEEKTO` command.
//!
//! # Example
//!
//! ```
//! use aesd_proto::seek_command;
//!
//! assert_eq!(seek_command::parse(b"AESDCHAR_IOCSEEKTO:3,0\n"), Some((3, 0)));
//! assert_eq!(seek_command::parse(b"regular command\n"), None);
//! ```

mod error;
mod framer;
pub mod seek_command;

pub use error::FrameError;
pub use framer::{MessageFramer, READ_CHUNK_SIZE};
