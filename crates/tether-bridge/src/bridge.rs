//! The I/O multiplexing loop at the heart of the bridge.
//!
//! One session, two byte sources: framed control input and raw PTY output.
//! Control frames are decoded and dispatched (DATA to the PTY, RESIZE to the
//! terminal, CLOSE to the close-requested flag); PTY output is forwarded
//! verbatim. The loop is the sole owner of the [`Session`] and the output
//! stream — the pump threads own nothing but their readers.

use std::io::{Read, Write};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;

use tether_proto::{DecodeStep, Frame, FrameDecoder};
use tether_pty::{PtyError, Session};

use crate::io_pump;

/// Bounded wait per loop iteration; also the reap-poll cadence.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Dimensions used until the controller sends its first RESIZE frame.
const INITIAL_COLS: u16 = 80;
const INITIAL_ROWS: u16 = 24;

const CHANNEL_CAPACITY: usize = 256;

/// Run the bridge to completion: spawn `command` in a PTY, multiplex
/// `control` and the PTY against `output`, and return the child's mapped
/// exit code.
pub fn run<R, W>(command: &[String], control: R, output: &mut W) -> Result<i32, PtyError>
where
    R: Read + Send + 'static,
    W: Write,
{
    let mut session = Session::spawn(command, INITIAL_COLS, INITIAL_ROWS)?;
    let pty_reader = session.take_reader();

    let (control_tx, control_rx) = mpsc::channel::<Vec<u8>>(CHANNEL_CAPACITY);
    let (pty_tx, pty_rx) = mpsc::channel::<Vec<u8>>(CHANNEL_CAPACITY);
    io_pump::start_pump("control-pump", Box::new(control), control_tx);
    io_pump::start_pump("pty-pump", pty_reader, pty_tx);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    runtime.block_on(event_loop(session, control_rx, pty_rx, output))
}

/// The reactor: a bounded wait across both sources, then an ordered drain.
///
/// Within one iteration every currently-decodable control frame is
/// dispatched before the PTY side is serviced; the close-requested flag is
/// handled after the read phase; and a non-blocking reap poll runs
/// regardless of readiness so a child that exits without a final readable
/// PTY event still terminates the loop.
async fn event_loop<W: Write>(
    mut session: Session,
    mut control_rx: mpsc::Receiver<Vec<u8>>,
    mut pty_rx: mpsc::Receiver<Vec<u8>>,
    output: &mut W,
) -> Result<i32, PtyError> {
    let mut decoder = FrameDecoder::new();
    let mut control_open = true;

    loop {
        tokio::select! {
            biased;
            chunk = control_rx.recv(), if control_open => match chunk {
                Some(bytes) => decoder.push_bytes(&bytes),
                None => {
                    // Control EOF: the loop continues on the PTY side only.
                    log::debug!("control input closed");
                    control_open = false;
                }
            },
            chunk = pty_rx.recv() => match chunk {
                Some(bytes) => forward_output(output, &bytes)?,
                None => return Ok(session.blocking_wait()),
            },
            _ = tokio::time::sleep(POLL_INTERVAL) => {}
        }

        // Read phase, control first: pick up whatever else is already
        // buffered, then dispatch every complete frame.
        if control_open {
            loop {
                match control_rx.try_recv() {
                    Ok(bytes) => decoder.push_bytes(&bytes),
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        log::debug!("control input closed");
                        control_open = false;
                        break;
                    }
                }
            }
        }
        dispatch_frames(&mut decoder, &mut session)?;

        let mut pty_closed = false;
        loop {
            match pty_rx.try_recv() {
                Ok(bytes) => forward_output(output, &bytes)?,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    pty_closed = true;
                    break;
                }
            }
        }

        // A CLOSE frame is a request, not a termination: deliver the hangup
        // once and keep going until the child actually exits.
        if session.take_close_request() {
            session.deliver_close();
        }

        if pty_closed {
            // The child's terminal is gone; reap and report.
            return Ok(session.blocking_wait());
        }
        if let Some(code) = session.poll_exit() {
            return Ok(code);
        }
    }
}

fn dispatch_frames(decoder: &mut FrameDecoder, session: &mut Session) -> Result<(), PtyError> {
    loop {
        match decoder.decode_next() {
            DecodeStep::Complete(Frame::Data(payload)) => {
                if !payload.is_empty() {
                    session.write_input(&payload)?;
                }
            }
            DecodeStep::Complete(Frame::Resize { cols, rows }) => {
                log::debug!("resizing terminal to {cols}x{rows}");
                session.resize(cols, rows)?;
            }
            DecodeStep::Complete(Frame::Close) => session.request_close(),
            DecodeStep::Skipped => continue,
            DecodeStep::NeedMore => return Ok(()),
        }
    }
}

fn forward_output<W: Write>(output: &mut W, bytes: &[u8]) -> Result<(), PtyError> {
    output.write_all(bytes)?;
    output.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::time::Duration;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    /// Control-input stub that waits before serving its bytes, so a frame
    /// arrives only once the child has had time to start up.
    struct DelayedControl {
        delay: Option<Duration>,
        data: Cursor<Vec<u8>>,
    }

    impl DelayedControl {
        fn new(delay: Duration, data: Vec<u8>) -> Self {
            Self {
                delay: Some(delay),
                data: Cursor::new(data),
            }
        }
    }

    impl Read for DelayedControl {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if let Some(delay) = self.delay.take() {
                std::thread::sleep(delay);
            }
            self.data.read(buf)
        }
    }

    #[test]
    fn test_data_frame_round_trips_through_child() {
        // A line-echoing child: the DATA payload must come back out on the
        // output stream. The trailing sleep keeps the PTY open long enough
        // for the echo to be forwarded before the exit races the reap poll.
        let command = argv(&["/bin/sh", "-c", "read line; echo got:$line; sleep 0.5"]);
        let control = Cursor::new(Frame::Data(b"abc\n".to_vec()).encode());
        let mut output = Vec::new();

        let code = run(&command, control, &mut output).unwrap();

        assert_eq!(code, 0);
        assert!(
            contains(&output, b"got:abc"),
            "expected echoed payload in output, got: {}",
            String::from_utf8_lossy(&output)
        );
    }

    #[test]
    fn test_forwarding_continues_after_control_eof() {
        // Control input ends immediately; output produced later must still
        // be forwarded until the PTY itself closes.
        let command = argv(&["/bin/sh", "-c", "sleep 0.3; echo late-output; sleep 0.5"]);
        let control = Cursor::new(Vec::new());
        let mut output = Vec::new();

        let code = run(&command, control, &mut output).unwrap();

        assert_eq!(code, 0);
        assert!(contains(&output, b"late-output"));
    }

    #[test]
    fn test_child_exit_code_is_reported() {
        let command = argv(&["/bin/sh", "-c", "exit 7"]);
        let code = run(&command, Cursor::new(Vec::new()), &mut Vec::new()).unwrap();
        assert_eq!(code, 7);
    }

    #[test]
    fn test_signal_death_maps_to_128_plus_signo() {
        let command = argv(&["/bin/sh", "-c", "kill -9 $$"]);
        let code = run(&command, Cursor::new(Vec::new()), &mut Vec::new()).unwrap();
        assert_eq!(code, 137);
    }

    #[test]
    fn test_close_frame_hangs_up_child() {
        // cat never exits on its own; the CLOSE frame's SIGHUP ends it.
        let command = argv(&["/bin/cat"]);
        let control =
            DelayedControl::new(Duration::from_millis(300), Frame::Close.encode());
        let code = run(&command, control, &mut Vec::new()).unwrap();
        assert_eq!(code, 128 + libc::SIGHUP);
    }

    #[test]
    fn test_close_does_not_end_loop_when_child_survives() {
        // The child shields itself from the hangup; the loop must keep
        // running until the child exits on its own terms.
        let command = argv(&[
            "/bin/sh",
            "-c",
            "trap '' HUP; sleep 1; echo ALIVE; sleep 0.5",
        ]);
        let control =
            DelayedControl::new(Duration::from_millis(300), Frame::Close.encode());
        let mut output = Vec::new();

        let code = run(&command, control, &mut output).unwrap();

        assert_eq!(code, 0);
        assert!(contains(&output, b"ALIVE"));
    }

    #[test]
    fn test_resize_frame_is_applied_before_child_reads_size() {
        let command = argv(&["/bin/sh", "-c", "sleep 0.3; stty size; sleep 0.5"]);
        let control = Cursor::new(Frame::Resize { cols: 100, rows: 40 }.encode());
        let mut output = Vec::new();

        let code = run(&command, control, &mut output).unwrap();

        assert_eq!(code, 0);
        assert!(
            contains(&output, b"40 100"),
            "expected stty to report 40 100, got: {}",
            String::from_utf8_lossy(&output)
        );
    }

    #[test]
    fn test_unknown_opcode_noise_is_survived() {
        // Garbage before a valid DATA frame: the decoder resynchronizes and
        // the frame still reaches the child.
        let command = argv(&["/bin/sh", "-c", "read line; echo got:$line; sleep 0.5"]);
        let mut wire = vec![0xde, 0xad];
        wire.extend_from_slice(&Frame::Data(b"xyz\n".to_vec()).encode());
        let mut output = Vec::new();

        let code = run(&command, Cursor::new(wire), &mut output).unwrap();

        assert_eq!(code, 0);
        assert!(contains(&output, b"got:xyz"));
    }

    #[test]
    fn test_empty_data_payload_is_not_written() {
        // An empty DATA frame must be consumed without disturbing the child.
        let command = argv(&["/bin/sh", "-c", "read line; echo got:$line; sleep 0.5"]);
        let mut wire = Frame::Data(Vec::new()).encode();
        wire.extend_from_slice(&Frame::Data(b"ok\n".to_vec()).encode());
        let mut output = Vec::new();

        let code = run(&command, Cursor::new(wire), &mut output).unwrap();

        assert_eq!(code, 0);
        assert!(contains(&output, b"got:ok"));
    }
}
