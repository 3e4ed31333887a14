//! tether-pty: PTY and child-process lifecycle for tether.
//!
//! This crate owns everything between the bridge's event loop and the
//! operating system: opening a PTY, spawning the child attached to its slave
//! side, resizing the terminal, delivering lifecycle signals, and reaping the
//! child into a single mapped exit code.
//!
//! # Architecture
//!
//! - [`PtyHandle`] — low-level PTY management (spawn, read, write, resize).
//! - [`process`] — signal delivery and wait-status reaping/mapping.
//! - [`Session`] — the live child: pid, PTY handle, and the transient
//!   close-requested flag, owned by the event loop.

pub mod process;
pub mod pty;
pub mod session;

pub use pty::{PtyError, PtyHandle};
pub use session::Session;
