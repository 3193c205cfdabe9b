//! Argument parsing and daemonizing (C8). Daemonizing happens before the
//! tokio runtime is constructed: forking a process that already has a live
//! async-io reactor is unsound, so the raw `fork`/`setsid` dance runs on a
//! plain synchronous `main` before any runtime exists.

use thiserror::Error;

#[derive(Debug, Error)]
#[error("usage: aesdsocket [-d] [--device]")]
pub struct UsageError;

#[derive(Debug, Clone, Copy, Default)]
pub struct Args {
    pub daemonize: bool,
    pub use_device: bool,
}

/// Parses the process argument vector (excluding `argv[0]`). Anything other
/// than zero args, `-d`, `--device`, or both together is a usage error.
pub fn parse_args<I, S>(args: I) -> Result<Args, UsageError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut parsed = Args::default();
    let mut count = 0;
    for arg in args {
        count += 1;
        if count > 2 {
            return Err(UsageError);
        }
        match arg.as_ref() {
            "-d" if !parsed.daemonize => parsed.daemonize = true,
            "--device" if !parsed.use_device => parsed.use_device = true,
            _ => return Err(UsageError),
        }
    }
    Ok(parsed)
}

/// Double-forks and detaches from the controlling terminal, matching the
/// reference server's daemonizing sequence. Must be called before any
/// tokio runtime is built in this process.
///
/// # Safety
///
/// Calls `fork`/`setsid` directly. Must run before any threads other than
/// the calling one exist, and before any async runtime is constructed.
pub unsafe fn daemonize() -> std::io::Result<()> {
    match libc::fork() {
        -1 => return Err(std::io::Error::last_os_error()),
        0 => {}
        _ => std::process::exit(0),
    }

    if libc::setsid() == -1 {
        return Err(std::io::Error::last_os_error());
    }

    match libc::fork() {
        -1 => return Err(std::io::Error::last_os_error()),
        0 => {}
        _ => std::process::exit(0),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_args_runs_in_the_foreground() {
        let args = parse_args(std::iter::empty::<&str>()).unwrap();
        assert!(!args.daemonize);
        assert!(!args.use_device);
    }

    #[test]
    fn dash_d_daemonizes() {
        let args = parse_args(["-d"]).unwrap();
        assert!(args.daemonize);
    }

    #[test]
    fn device_flag_selects_the_character_device() {
        let args = parse_args(["--device"]).unwrap();
        assert!(args.use_device);
    }

    #[test]
    fn both_flags_combine_in_either_order() {
        assert!(parse_args(["-d", "--device"]).unwrap().daemonize);
        assert!(parse_args(["--device", "-d"]).unwrap().use_device);
    }

    #[test]
    fn anything_else_is_a_usage_error() {
        assert!(parse_args(["-x"]).is_err());
        assert!(parse_args(["-d", "-d"]).is_err());
        assert!(parse_args(["-d", "--device", "extra"]).is_err());
    }
}
