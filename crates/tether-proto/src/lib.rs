//! tether-proto: the control-channel wire protocol for tether.
//!
//! The control stream is a sequence of binary frames, each starting with a
//! one-byte opcode. This crate defines the frame types and a stateful
//! [`FrameDecoder`] that extracts complete frames from an accumulating byte
//! buffer, tolerating arbitrary chunk boundaries between reads.

pub mod decoder;
pub mod frame;

pub use decoder::{DecodeStep, FrameDecoder};
pub use frame::{Frame, OPCODE_CLOSE, OPCODE_DATA, OPCODE_RESIZE};
