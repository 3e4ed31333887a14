use crate::frame::{Frame, OPCODE_CLOSE, OPCODE_DATA, OPCODE_RESIZE};

/// Outcome of a single decode attempt.
#[derive(Debug, PartialEq, Eq)]
pub enum DecodeStep {
    /// A complete frame was removed from the buffer.
    Complete(Frame),
    /// An unknown opcode byte was dropped; the caller should retry
    /// immediately, more frames may follow.
    Skipped,
    /// The buffer holds no complete frame; the caller must wait for more
    /// input. The buffer is left untouched.
    NeedMore,
}

/// Stateful frame extractor over an accumulating byte buffer.
///
/// Control-stream reads carry no alignment guarantees: a single read may hold
/// several frames, a fraction of one, or bytes from two adjacent frames. The
/// decoder accumulates everything in an internal buffer and removes exactly
/// the bytes of each completed frame from the front, in order.
///
/// Unknown opcode bytes are dropped one at a time rather than aborting the
/// stream, so the decoder resynchronizes on the next valid frame boundary.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    incoming: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append freshly read control-stream bytes to the buffer.
    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.incoming.extend_from_slice(bytes);
    }

    /// Number of buffered bytes not yet attributed to a completed frame.
    pub fn pending(&self) -> usize {
        self.incoming.len()
    }

    /// Attempt to decode the next frame from the front of the buffer.
    pub fn decode_next(&mut self) -> DecodeStep {
        let Some(&opcode) = self.incoming.first() else {
            return DecodeStep::NeedMore;
        };

        match opcode {
            OPCODE_DATA => {
                if self.incoming.len() < 5 {
                    return DecodeStep::NeedMore;
                }
                let len = u32::from_be_bytes([
                    self.incoming[1],
                    self.incoming[2],
                    self.incoming[3],
                    self.incoming[4],
                ]) as usize;
                if self.incoming.len() < 5 + len {
                    return DecodeStep::NeedMore;
                }
                let payload = self.incoming[5..5 + len].to_vec();
                self.incoming.drain(..5 + len);
                DecodeStep::Complete(Frame::Data(payload))
            }
            OPCODE_RESIZE => {
                if self.incoming.len() < 5 {
                    return DecodeStep::NeedMore;
                }
                let cols = u16::from_be_bytes([self.incoming[1], self.incoming[2]]);
                let rows = u16::from_be_bytes([self.incoming[3], self.incoming[4]]);
                self.incoming.drain(..5);
                DecodeStep::Complete(Frame::Resize { cols, rows })
            }
            OPCODE_CLOSE => {
                self.incoming.drain(..1);
                DecodeStep::Complete(Frame::Close)
            }
            other => {
                // Resynchronize: drop exactly this byte and let the caller
                // retry from the next one.
                log::debug!("dropping unknown opcode byte {other:#04x}");
                self.incoming.drain(..1);
                DecodeStep::Skipped
            }
        }
    }
}
