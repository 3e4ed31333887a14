//! Blocking reader pumps feeding the event loop.
//!
//! PTY and control-input reads are blocking, so each source gets its own
//! dedicated OS thread that forwards chunks over a channel. End of stream —
//! and, for the PTY, read errors, which mean the child's terminal is gone —
//! is signalled by dropping the sender, which the loop observes as the
//! channel closing.

use std::io::{ErrorKind, Read};

use tokio::sync::mpsc;

const READ_BUF_SIZE: usize = 65536;

/// Start a pump thread that reads `source` until EOF and forwards chunks
/// into `tx`.
pub fn start_pump(name: &str, mut source: Box<dyn Read + Send>, tx: mpsc::Sender<Vec<u8>>) {
    std::thread::Builder::new()
        .name(name.to_string())
        .spawn(move || {
            let mut buf = [0u8; READ_BUF_SIZE];
            loop {
                let n = match source.read(&mut buf) {
                    Ok(0) => return, // EOF — sender drops, channel closes
                    Ok(n) => n,
                    Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                    Err(_) => return, // treated identically to EOF
                };
                if tx.blocking_send(buf[..n].to_vec()).is_err() {
                    // Loop already returned; nothing left to forward to.
                    return;
                }
            }
        })
        .expect("failed to spawn pump thread");
}
