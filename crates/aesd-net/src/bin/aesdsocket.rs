//! `aesdsocket` — the socket server binary. Foreground by default; `-d`
//! daemonizes, `--device` backs the server with the simulated character
//! device instead of a local file.

use std::net::SocketAddr;

use aesd_net::backing_store::DEFAULT_DATA_FILE;
use aesd_net::supervisor::{self, Backing, ServerConfig};
use aesd_net::cli;

const BIND_ADDR: &str = "0.0.0.0:9000";
const BACKLOG: i32 = 10;

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let parsed = match cli::parse_args(&args) {
        Ok(parsed) => parsed,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    let bind_addr: SocketAddr = BIND_ADDR.parse().expect("hardcoded bind address is valid");

    // Bind before any possible fork: the listening fd must exist in the
    // parent so the daemonized child inherits it already bound.
    let std_listener = match supervisor::bind_listener(bind_addr, BACKLOG) {
        Ok(listener) => listener,
        Err(err) => {
            log::error!("failed to bind {bind_addr}: {err}");
            std::process::exit(1);
        }
    };

    if parsed.daemonize {
        // Safety: runs before any other thread or the tokio runtime exists.
        if let Err(err) = unsafe { cli::daemonize() } {
            log::error!("failed to daemonize: {err}");
            std::process::exit(1);
        }
    }

    let backing = if parsed.use_device {
        Backing::CharDevice
    } else {
        Backing::LocalFile(DEFAULT_DATA_FILE.into())
    };

    let config = ServerConfig {
        bind_addr,
        backlog: BACKLOG,
        backing,
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(err) => {
            log::error!("failed to start the async runtime: {err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = runtime.block_on(supervisor::run(config, std_listener, aesd_net::ShutdownSignal::new())) {
        log::error!("server exited with an error: {err}");
        std::process::exit(1);
    }
}
