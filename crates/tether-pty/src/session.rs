use std::io::Read;

use crate::process;
use crate::pty::{PtyError, PtyHandle};

/// The live child: pid, PTY handle, and the transient close-requested flag.
///
/// Created once at startup, owned by the event loop, passed explicitly into
/// each iteration, and dropped when the loop returns. A CLOSE frame sets the
/// flag; the loop takes it after the read phase and delivers the hangup
/// signal, so a close request never preempts bytes read in the same
/// iteration.
pub struct Session {
    pty: PtyHandle,
    close_requested: bool,
}

impl Session {
    /// Spawn `command` in a fresh PTY of the given dimensions.
    pub fn spawn(command: &[String], cols: u16, rows: u16) -> Result<Self, PtyError> {
        let pty = PtyHandle::spawn(command, cols, rows)?;
        Ok(Self {
            pty,
            close_requested: false,
        })
    }

    pub fn pid(&self) -> i32 {
        self.pty.pid()
    }

    /// Write controller input to the child's terminal.
    pub fn write_input(&mut self, data: &[u8]) -> Result<(), PtyError> {
        self.pty.write(data)
    }

    /// Apply a new terminal size and notify the child.
    pub fn resize(&mut self, cols: u16, rows: u16) -> Result<(), PtyError> {
        self.pty.resize(cols, rows)
    }

    /// Extract the PTY reader for the output pump thread.
    pub fn take_reader(&mut self) -> Box<dyn Read + Send> {
        self.pty.take_reader()
    }

    /// Record a CLOSE frame. The signal is delivered later, when the loop
    /// takes the flag.
    pub fn request_close(&mut self) {
        self.close_requested = true;
    }

    /// Take and clear the close-requested flag.
    pub fn take_close_request(&mut self) -> bool {
        std::mem::take(&mut self.close_requested)
    }

    /// Deliver the hangup signal to the child. Ignored if it is already gone.
    pub fn deliver_close(&self) {
        process::request_graceful_close(self.pid());
    }

    /// Non-blocking reap check. `Some(code)` once the child has exited.
    pub fn poll_exit(&self) -> Option<i32> {
        process::poll_exit(self.pid())
    }

    /// Blocking reap; returns the mapped exit code.
    pub fn blocking_wait(&self) -> i32 {
        process::blocking_wait(self.pid())
    }
}
