/// Opcode for a DATA frame: raw bytes destined for the PTY.
pub const OPCODE_DATA: u8 = 0x01;
/// Opcode for a RESIZE frame: new terminal dimensions.
pub const OPCODE_RESIZE: u8 = 0x02;
/// Opcode for a CLOSE frame: graceful shutdown request.
pub const OPCODE_CLOSE: u8 = 0x03;

/// A single control-channel frame.
///
/// Frames are ephemeral: the decoder produces them and the event loop
/// consumes them immediately on dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Raw input bytes to write to the PTY master.
    Data(Vec<u8>),
    /// New terminal size for the child.
    Resize { cols: u16, rows: u16 },
    /// Request a graceful shutdown of the child.
    Close,
}

impl Frame {
    /// Encode this frame into its wire representation.
    ///
    /// DATA is `0x01`, a 4-byte big-endian payload length, then the payload.
    /// RESIZE is `0x02`, 2-byte big-endian cols, 2-byte big-endian rows.
    /// CLOSE is the single byte `0x03`.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Frame::Data(payload) => {
                let mut buf = Vec::with_capacity(5 + payload.len());
                buf.push(OPCODE_DATA);
                buf.extend_from_slice(&(payload.len() as u32).to_be_bytes());
                buf.extend_from_slice(payload);
                buf
            }
            Frame::Resize { cols, rows } => {
                let mut buf = Vec::with_capacity(5);
                buf.push(OPCODE_RESIZE);
                buf.extend_from_slice(&cols.to_be_bytes());
                buf.extend_from_slice(&rows.to_be_bytes());
                buf
            }
            Frame::Close => vec![OPCODE_CLOSE],
        }
    }
}
