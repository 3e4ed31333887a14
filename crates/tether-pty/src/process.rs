//! Child-process reaping and signal delivery.
//!
//! The child is reaped exactly once, by pid, and its raw wait status is
//! mapped to a single integer exit code here and nowhere else.

use std::io;

use libc::{c_int, pid_t};

/// Map a raw wait status to the bridge's exit code.
///
/// A normal exit yields the child's own exit code. Death by signal yields
/// `128 + signal` (the POSIX shell convention, so callers can tell the two
/// apart). Anything else maps to 1.
pub fn map_wait_status(status: c_int) -> i32 {
    if libc::WIFEXITED(status) {
        return libc::WEXITSTATUS(status);
    }
    if libc::WIFSIGNALED(status) {
        return 128 + libc::WTERMSIG(status);
    }
    1
}

/// Reap the child, blocking until it terminates.
pub fn blocking_wait(pid: i32) -> i32 {
    let mut status: c_int = 0;
    loop {
        let rc = unsafe { libc::waitpid(pid as pid_t, &mut status, 0) };
        if rc == pid {
            return map_wait_status(status);
        }
        if rc < 0 && errno() == Some(libc::EINTR) {
            continue;
        }
        return 1;
    }
}

/// Non-blocking reap. Returns the mapped exit code once the child has
/// terminated, `None` while it is still running.
pub fn poll_exit(pid: i32) -> Option<i32> {
    let mut status: c_int = 0;
    let rc = unsafe { libc::waitpid(pid as pid_t, &mut status, libc::WNOHANG) };
    if rc == pid {
        return Some(map_wait_status(status));
    }
    if rc < 0 && errno() != Some(libc::EINTR) {
        // ECHILD and friends: nothing left to wait for.
        return Some(1);
    }
    None
}

/// Deliver `sig` to the child, covering its whole process group when the
/// child leads one. Delivery to an already-gone process is silently ignored.
pub fn signal_child(pid: i32, sig: c_int) {
    let pgid = unsafe { libc::getpgid(pid as pid_t) };
    if pgid < 0 {
        return;
    }
    if pgid == pid {
        let _ = unsafe { libc::killpg(pgid, sig) };
    } else {
        let _ = unsafe { libc::kill(pid as pid_t, sig) };
    }
}

/// Ask the child to shut down by hanging up its terminal session.
///
/// Idempotent: signalling a dead process is not an error.
pub fn request_graceful_close(pid: i32) {
    log::debug!("delivering SIGHUP to pid {pid}");
    signal_child(pid, libc::SIGHUP);
}

fn errno() -> Option<i32> {
    io::Error::last_os_error().raw_os_error()
}
