//! Server supervisor (C6): owns the listening socket, the shared backing
//! store, and the connection list. Workers publish completion through an
//! atomic flag rather than touching the list themselves, so the list is
//! only ever mutated from the supervisor's own task.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use socket2::{Domain, Socket, Type};
use tokio::net::TcpListener;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;

use crate::backing_store::{BackingStore, CharDeviceStore, LocalFileStore};
use crate::error::ServerError;
use crate::worker;

/// Which persistence target is in play. The character device never runs
/// the timestamp producer; the local file always does.
pub enum Backing {
    LocalFile(PathBuf),
    CharDevice,
}

pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub backlog: i32,
    pub backing: Backing,
}

struct ConnectionRecord {
    complete: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// A cloneable handle for triggering shutdown without a process signal.
/// Idempotent: only the first call has any effect. Exists mainly so
/// integration tests can stop a server they started in-process; the
/// `aesdsocket` binary relies on SIGINT/SIGTERM instead.
#[derive(Clone)]
pub struct ShutdownSignal {
    triggered: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self {
            triggered: Arc::new(AtomicBool::new(false)),
            notify: Arc::new(Notify::new()),
        }
    }

    pub fn trigger(&self) {
        if !self.triggered.swap(true, Ordering::AcqRel) {
            self.notify.notify_waiters();
        }
    }

    async fn notified(&self) {
        if !self.triggered.load(Ordering::Acquire) {
            self.notify.notified().await;
        }
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Binds and configures the listening socket synchronously, before the
/// tokio runtime exists. Forking a live runtime (to daemonize) is unsound,
/// so the bind has to happen first and the resulting fd carried across the
/// fork by the caller.
pub fn bind_listener(addr: SocketAddr, backlog: i32) -> Result<std::net::TcpListener, ServerError> {
    let domain = if addr.is_ipv6() { Domain::IPV6 } else { Domain::IPV4 };
    let socket = Socket::new(domain, Type::STREAM, None).map_err(ServerError::Bind)?;
    socket.set_reuse_address(true).map_err(ServerError::Bind)?;
    socket.set_reuse_port(true).map_err(ServerError::Bind)?;
    socket.set_nonblocking(true).map_err(ServerError::Bind)?;
    socket.bind(&addr.into()).map_err(ServerError::Bind)?;
    socket.listen(backlog).map_err(ServerError::Bind)?;
    Ok(socket.into())
}

/// Runs the accept loop until SIGINT, SIGTERM, or `shutdown` is triggered,
/// then shuts down every open connection and returns.
pub async fn run(
    config: ServerConfig,
    std_listener: std::net::TcpListener,
    shutdown: ShutdownSignal,
) -> Result<(), ServerError> {
    let listener = TcpListener::from_std(std_listener).map_err(ServerError::Bind)?;

    let cleanup_path = match &config.backing {
        Backing::LocalFile(path) => Some(path.clone()),
        Backing::CharDevice => None,
    };

    let (store, is_local_file) = match config.backing {
        Backing::LocalFile(path) => {
            let store = LocalFileStore::open(&path).await?;
            (BackingStore::LocalFile(store), true)
        }
        Backing::CharDevice => {
            let device = Arc::new(aesd_core::DeviceStore::new(aesd_core::RingConfig::default()));
            (BackingStore::CharDevice(CharDeviceStore::new(device)), false)
        }
    };
    let store = Arc::new(Mutex::new(store));

    let should_close = Arc::new(AtomicBool::new(false));
    let timestamp_shutdown = Arc::new(Notify::new());

    let timestamp_task = is_local_file.then(|| {
        tokio::spawn(crate::timestamp::run(
            Arc::clone(&store),
            Arc::clone(&should_close),
            Arc::clone(&timestamp_shutdown),
        ))
    });

    let mut sigint = signal(SignalKind::interrupt()).map_err(ServerError::Signal)?;
    let mut sigterm = signal(SignalKind::terminate()).map_err(ServerError::Signal)?;

    let mut connections: Vec<ConnectionRecord> = Vec::new();

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                match accepted {
                    Ok((socket, peer)) => {
                        log::info!("accepted connection from {peer}");
                        let complete = Arc::new(AtomicBool::new(false));
                        let handle = tokio::spawn(worker::handle_connection(
                            socket,
                            peer,
                            Arc::clone(&store),
                            Arc::clone(&complete),
                        ));
                        connections.push(ConnectionRecord { complete, handle });
                    }
                    Err(err) => log::error!("accept failed: {err}"),
                }
                reap(&mut connections).await;
            }
            _ = sigint.recv() => {
                log::info!("caught SIGINT, exiting");
                break;
            }
            _ = sigterm.recv() => {
                log::info!("caught SIGTERM, exiting");
                break;
            }
            () = shutdown.notified() => {
                log::info!("shutdown requested, exiting");
                break;
            }
        }
    }

    should_close.store(true, Ordering::Release);
    timestamp_shutdown.notify_waiters();

    for record in connections.drain(..) {
        record.handle.abort();
        let _ = record.handle.await;
    }
    if let Some(task) = timestamp_task {
        let _ = task.await;
    }
    if let Some(path) = cleanup_path {
        let _ = tokio::fs::remove_file(path).await;
    }

    Ok(())
}

/// Opportunistically removes finished connections from the list so it does
/// not grow without bound across a long-lived server.
async fn reap(connections: &mut Vec<ConnectionRecord>) {
    let mut i = 0;
    while i < connections.len() {
        if connections[i].complete.load(Ordering::Acquire) {
            let record = connections.swap_remove(i);
            let _ = record.handle.await;
        } else {
            i += 1;
        }
    }
}
