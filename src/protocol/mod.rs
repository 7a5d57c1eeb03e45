//! Protocol Layer: Envelope Framing & Dispatch
//!
//! Prinsip desain:
//! - Kind code selalu field pertama envelope
//! - Fixed-size header: predictable memory layout
//! - No allocation: encode/decode langsung ke/dari buffer
//! - Unknown kind ditolak dengan diagnostic, tidak pernah di-tebak

mod codec;
mod dispatch;
mod envelope;

pub use codec::{Decoder, EncodeError, Encoder};
pub use dispatch::{
    dispatch, dispatch_envelope, serve, HandlerError, HandlerResult, MessageHandler, Outcome,
    Rejection, ServeReport,
};
pub use envelope::{
    checksum, DecodeError, Envelope, EnvelopeHeader, ENVELOPE_VERSION, HEADER_SIZE, MAGIC,
    MAX_PAYLOAD_SIZE,
};
