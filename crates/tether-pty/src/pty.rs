use std::io::{Read, Write};

use portable_pty::{native_pty_system, CommandBuilder, MasterPty, PtySize};

use crate::process;

/// Errors from PTY operations.
#[derive(Debug)]
pub enum PtyError {
    SpawnFailed(String),
    IoError(std::io::Error),
    ResizeFailed(String),
}

impl std::fmt::Display for PtyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PtyError::SpawnFailed(msg) => write!(f, "PTY spawn failed: {msg}"),
            PtyError::IoError(err) => write!(f, "PTY I/O error: {err}"),
            PtyError::ResizeFailed(msg) => write!(f, "PTY resize failed: {msg}"),
        }
    }
}

impl std::error::Error for PtyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PtyError::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PtyError {
    fn from(err: std::io::Error) -> Self {
        PtyError::IoError(err)
    }
}

/// Owns the PTY master pair, reader, and writer for one child process.
///
/// The child is reaped through [`process`] by pid, not through this handle;
/// the handle only keeps the master side open so the child retains its
/// terminal until the bridge is done with it.
pub struct PtyHandle {
    master: Box<dyn MasterPty + Send>,
    reader: Box<dyn Read + Send>,
    writer: Box<dyn Write + Send>,
    pid: i32,
}

impl PtyHandle {
    /// Spawn `command` attached to the slave side of a fresh PTY.
    ///
    /// `command[0]` is the executable, looked up on `PATH`; the rest are its
    /// arguments. The child inherits the current environment. A bad
    /// executable is not a distinct error here: the child exits immediately
    /// with a failure status and is observed through normal reaping.
    pub fn spawn(command: &[String], cols: u16, rows: u16) -> Result<Self, PtyError> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| PtyError::SpawnFailed("empty command".to_string()))?;

        let pty_system = native_pty_system();

        let pair = pty_system
            .openpty(PtySize {
                rows,
                cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| PtyError::SpawnFailed(format!("failed to open PTY: {e}")))?;

        let mut cmd = CommandBuilder::new(program);
        cmd.args(args);

        let child = pair
            .slave
            .spawn_command(cmd)
            .map_err(|e| PtyError::SpawnFailed(format!("failed to spawn command: {e}")))?;

        // Close our copy of the slave so the master reads EOF once the
        // child's side is gone.
        drop(pair.slave);

        let pid = child
            .process_id()
            .ok_or_else(|| PtyError::SpawnFailed("child has no pid".to_string()))?
            as i32;

        let reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| PtyError::SpawnFailed(format!("failed to clone reader: {e}")))?;

        let writer = pair
            .master
            .take_writer()
            .map_err(|e| PtyError::SpawnFailed(format!("failed to take writer: {e}")))?;

        log::debug!("spawned {program} as pid {pid}");

        Ok(Self {
            master: pair.master,
            reader,
            writer,
            pid,
        })
    }

    /// The child's process id.
    pub fn pid(&self) -> i32 {
        self.pid
    }

    /// Resize the terminal and tell the child about it.
    ///
    /// Sets the window size on the master (pixel fields zeroed) and delivers
    /// SIGWINCH so interactive programs redraw at the new dimensions.
    pub fn resize(&self, cols: u16, rows: u16) -> Result<(), PtyError> {
        self.master
            .resize(PtySize {
                rows,
                cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| PtyError::ResizeFailed(format!("{e}")))?;
        process::signal_child(self.pid, libc::SIGWINCH);
        Ok(())
    }

    /// Write bytes to the PTY master (controller input -> child).
    pub fn write(&mut self, data: &[u8]) -> Result<(), PtyError> {
        self.writer.write_all(data)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Read available bytes from the PTY master (child output -> us).
    ///
    /// This is a blocking read; callers should invoke it from a dedicated
    /// I/O thread. Returns 0 once the child's side of the PTY is closed.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize, PtyError> {
        let n = self.reader.read(buf)?;
        Ok(n)
    }

    /// Extract the PTY reader for use on a dedicated I/O thread.
    ///
    /// After calling this, [`PtyHandle::read`] yields EOF immediately; the
    /// returned reader is the only source of child output.
    pub fn take_reader(&mut self) -> Box<dyn Read + Send> {
        std::mem::replace(&mut self.reader, Box::new(std::io::empty()))
    }
}
