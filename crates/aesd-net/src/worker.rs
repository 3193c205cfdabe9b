//! Connection worker (C4): one task per accepted client, driving the
//! read-frame / dispatch / stream-back lifecycle against the shared
//! backing store.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use aesd_proto::{seek_command, MessageFramer};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::Mutex;

use crate::backing_store::BackingStore;
use crate::error::StoreError;

/// Runs one client connection to completion, always publishing its
/// completion flag on the way out so the supervisor can reap it.
///
/// The store lock is held for the entire connection, including while
/// waiting on the client's socket — this is what gives the server its
/// lock-acquisition-order write ordering across concurrent clients.
pub async fn handle_connection(
    mut socket: TcpStream,
    peer: SocketAddr,
    store: Arc<Mutex<BackingStore>>,
    complete: Arc<AtomicBool>,
) {
    if let Err(err) = run(&mut socket, store).await {
        log::warn!("connection from {peer} ended with an error: {err}");
    }
    complete.store(true, Ordering::Release);
}

async fn run(socket: &mut TcpStream, store: Arc<Mutex<BackingStore>>) -> Result<(), StoreError> {
    let mut guard = store.lock().await;
    guard.open_append_read().await?;

    let mut framer = MessageFramer::new();
    let message = match framer.next_message(socket).await.map_err(StoreError::from)? {
        Some(message) => message,
        None => {
            guard.close().await?;
            return Ok(());
        }
    };

    // The in-band seek command is only recognized against the character
    // device; against the local file it is ordinary data and is written
    // through like any other message.
    let seek = guard.is_char_device().then(|| seek_command::parse(&message)).flatten();

    let performed_seek = match seek {
        Some((write_cmd, write_cmd_offset)) => {
            match guard.ioctl_seek_to(u32::from(write_cmd), u32::from(write_cmd_offset)).await {
                Ok(()) => true,
                Err(err) => {
                    log::warn!("seek command rejected: {err}");
                    false
                }
            }
        }
        None => {
            guard.append(&message).await?;
            false
        }
    };

    if !performed_seek {
        guard.rewind().await?;
    }

    let mut buf = [0u8; aesd_proto::READ_CHUNK_SIZE];
    loop {
        let n = guard.read_chunk(&mut buf).await?;
        if n == 0 {
            break;
        }
        // Rust sockets never raise SIGPIPE; a write failure here just
        // surfaces as an io::Error, matching the non-fatal-send intent of
        // the reference server's MSG_NOSIGNAL without needing the flag.
        socket.write_all(&buf[..n]).await?;
    }

    guard.close().await?;
    drop(guard);
    let _ = socket.shutdown().await;
    Ok(())
}
