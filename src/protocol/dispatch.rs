//! Routing envelope ke handler berdasarkan kind.
//!
//! [`MessageHandler`] punya satu method per kind, jadi menambah kind di
//! registry memaksa setiap handler ikut menanganinya. Code yang tidak dikenal
//! tidak pernah panic; hasilnya [`Rejection`] yang bisa dikirim balik ke peer
//! sebagai envelope `Exception`.

use log::{debug, warn};
use thiserror::Error;

use super::codec::{Decoder, EncodeError, Encoder};
use super::envelope::{DecodeError, Envelope, EnvelopeHeader};
use crate::registry::{MessageKind, RegistryError};

pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;
pub type HandlerResult = Result<Outcome, HandlerError>;

/// Hasil dari handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Tidak ada balasan
    Done,
    /// Balasan berupa serialized object untuk sequence yang sama
    Reply(Vec<u8>),
}

/// Handler untuk setiap kind. Payload selalu opaque bytes.
pub trait MessageHandler {
    fn command(&mut self, sequence: u64, payload: &[u8]) -> HandlerResult;
    fn object(&mut self, sequence: u64, payload: &[u8]) -> HandlerResult;
    fn object_request(&mut self, sequence: u64, payload: &[u8]) -> HandlerResult;
    fn object_delete(&mut self, sequence: u64, payload: &[u8]) -> HandlerResult;
    fn exception(&mut self, sequence: u64, payload: &[u8]) -> HandlerResult;
    fn is_none(&mut self, sequence: u64, payload: &[u8]) -> HandlerResult;
    fn get_shape(&mut self, sequence: u64, payload: &[u8]) -> HandlerResult;
}

/// Envelope yang ditolak receiver
#[derive(Debug, Error)]
pub enum Rejection {
    #[error("unsupported message kind {code} (sequence {sequence})")]
    UnsupportedKind { code: u8, sequence: u64 },

    #[error("malformed envelope: {0}")]
    Malformed(DecodeError),

    #[error("{kind} handler failed on sequence {sequence}: {reason}")]
    HandlerFailed {
        kind: MessageKind,
        sequence: u64,
        reason: String,
    },

    #[error(transparent)]
    Registry(RegistryError),
}

impl From<DecodeError> for Rejection {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::UnknownKind { code, sequence } => {
                Rejection::UnsupportedKind { code, sequence }
            }
            other => Rejection::Malformed(other),
        }
    }
}

impl Rejection {
    /// Sequence dari envelope yang ditolak, 0 jika tidak diketahui
    pub fn sequence(&self) -> u64 {
        match self {
            Rejection::UnsupportedKind { sequence, .. }
            | Rejection::HandlerFailed { sequence, .. }
            | Rejection::Malformed(DecodeError::ChecksumMismatch { sequence })
            | Rejection::Malformed(DecodeError::UnknownKind { sequence, .. }) => *sequence,
            Rejection::Malformed(_) | Rejection::Registry(_) => 0,
        }
    }

    /// Encode rejection sebagai envelope `Exception` untuk peer
    pub fn to_envelope<'e>(&self, encoder: &'e mut Encoder) -> Result<&'e [u8], EncodeError> {
        let reason = self.to_string();
        encoder.encode(MessageKind::Exception, self.sequence(), reason.as_bytes())
    }
}

/// Resolve kind dari header lalu route ke handler
pub fn dispatch<H: MessageHandler + ?Sized>(
    handler: &mut H,
    header: &EnvelopeHeader,
    payload: &[u8],
) -> Result<Outcome, Rejection> {
    let sequence = header.sequence;
    let kind = match header.kind() {
        Ok(kind) => kind,
        Err(RegistryError::UnknownMessageKind(code)) => {
            warn!(
                "rejecting envelope {}: unknown message kind {}",
                sequence, code
            );
            return Err(Rejection::UnsupportedKind { code, sequence });
        }
        Err(e) => return Err(Rejection::Registry(e)),
    };
    route(handler, kind, sequence, payload)
}

/// Route envelope yang kind-nya sudah di-resolve
pub fn dispatch_envelope<H: MessageHandler + ?Sized>(
    handler: &mut H,
    envelope: &Envelope<'_>,
) -> Result<Outcome, Rejection> {
    route(handler, envelope.kind, envelope.sequence(), envelope.payload)
}

fn route<H: MessageHandler + ?Sized>(
    handler: &mut H,
    kind: MessageKind,
    sequence: u64,
    payload: &[u8],
) -> Result<Outcome, Rejection> {
    debug!("dispatch {} seq={} len={}", kind, sequence, payload.len());

    let result = match kind {
        MessageKind::Command => handler.command(sequence, payload),
        MessageKind::Object => handler.object(sequence, payload),
        MessageKind::ObjectRequest => handler.object_request(sequence, payload),
        MessageKind::ObjectDelete => handler.object_delete(sequence, payload),
        MessageKind::Exception => handler.exception(sequence, payload),
        MessageKind::IsNone => handler.is_none(sequence, payload),
        MessageKind::GetShape => handler.get_shape(sequence, payload),
    };

    match result {
        Ok(Outcome::Reply(_)) if !kind.expects_reply() => {
            warn!("dropping reply to {} seq={}: kind takes no reply", kind, sequence);
            Ok(Outcome::Done)
        }
        Ok(outcome) => Ok(outcome),
        Err(e) => Err(Rejection::HandlerFailed {
            kind,
            sequence,
            reason: e.to_string(),
        }),
    }
}

/// Ringkasan satu kali [`serve`]
#[derive(Debug, Default)]
pub struct ServeReport {
    pub handled: u64,
    pub replied: u64,
    pub rejected: u64,
    /// Balasan yang tidak muat di output encoder
    pub dropped: u64,
    /// Error framing yang menghentikan decode
    pub stopped: Option<DecodeError>,
}

/// Decode semua envelope di `decoder`, dispatch ke `handler`, dan tulis
/// balasan (`Object`) serta rejection (`Exception`) ke `out`.
pub fn serve<H: MessageHandler + ?Sized>(
    handler: &mut H,
    decoder: &mut Decoder<'_>,
    out: &mut Encoder,
) -> ServeReport {
    let mut report = ServeReport::default();

    loop {
        let rejection = match decoder.next_frame() {
            Ok(None) => break,
            Ok(Some(envelope)) => match dispatch_envelope(handler, &envelope) {
                Ok(Outcome::Done) => {
                    report.handled += 1;
                    continue;
                }
                Ok(Outcome::Reply(payload)) => {
                    report.handled += 1;
                    match out.encode(MessageKind::Object, envelope.sequence(), &payload) {
                        Ok(_) => report.replied += 1,
                        Err(e) => {
                            warn!("reply for seq={} dropped: {}", envelope.sequence(), e);
                            report.dropped += 1;
                        }
                    }
                    continue;
                }
                Err(rejection) => rejection,
            },
            Err(err @ (DecodeError::UnknownKind { .. } | DecodeError::ChecksumMismatch { .. })) => {
                warn!("skipping envelope: {}", err);
                Rejection::from(err)
            }
            Err(err) => {
                warn!("stopping decode at byte {}: {}", decoder.position(), err);
                report.stopped = Some(err);
                break;
            }
        };

        report.rejected += 1;
        if let Err(e) = rejection.to_envelope(out) {
            warn!("rejection for seq={} dropped: {}", rejection.sequence(), e);
            report.dropped += 1;
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::envelope::checksum;
    use std::collections::HashMap;

    /// Object store sederhana di memory
    #[derive(Default)]
    struct MemoryWorker {
        objects: HashMap<Vec<u8>, Vec<u8>>,
        last_error: Option<Vec<u8>>,
        commands: u32,
    }

    impl MessageHandler for MemoryWorker {
        fn command(&mut self, _sequence: u64, payload: &[u8]) -> HandlerResult {
            self.commands += 1;
            if payload.is_empty() {
                return Err("empty command".into());
            }
            Ok(Outcome::Reply(payload.to_ascii_uppercase()))
        }

        fn object(&mut self, _sequence: u64, payload: &[u8]) -> HandlerResult {
            let (id, data) = payload.split_at(payload.len().min(4));
            self.objects.insert(id.to_vec(), data.to_vec());
            Ok(Outcome::Done)
        }

        fn object_request(&mut self, _sequence: u64, payload: &[u8]) -> HandlerResult {
            match self.objects.get(payload) {
                Some(data) => Ok(Outcome::Reply(data.clone())),
                None => Err(format!("no object {:?}", payload).into()),
            }
        }

        fn object_delete(&mut self, _sequence: u64, payload: &[u8]) -> HandlerResult {
            self.objects.remove(payload);
            Ok(Outcome::Done)
        }

        fn exception(&mut self, _sequence: u64, payload: &[u8]) -> HandlerResult {
            self.last_error = Some(payload.to_vec());
            Ok(Outcome::Reply(b"ignored".to_vec()))
        }

        fn is_none(&mut self, _sequence: u64, payload: &[u8]) -> HandlerResult {
            let none = !self.objects.contains_key(payload);
            Ok(Outcome::Reply(vec![none as u8]))
        }

        fn get_shape(&mut self, _sequence: u64, payload: &[u8]) -> HandlerResult {
            let len = self.objects.get(payload).map(|d| d.len()).unwrap_or(0);
            Ok(Outcome::Reply((len as u32).to_le_bytes().to_vec()))
        }
    }

    fn header_with_code(code: u8, sequence: u64, payload: &[u8]) -> EnvelopeHeader {
        let mut header = EnvelopeHeader::new(MessageKind::Command, sequence, payload.len() as u32);
        header.kind = code;
        header.checksum = checksum(payload);
        header
    }

    #[test]
    fn test_dispatch_routes_by_kind() {
        let mut worker = MemoryWorker::default();

        let header = header_with_code(1, 10, b"ls");
        assert_eq!(
            dispatch(&mut worker, &header, b"ls").unwrap(),
            Outcome::Reply(b"LS".to_vec())
        );
        assert_eq!(worker.commands, 1);

        let header = header_with_code(2, 11, b"id01abc");
        assert_eq!(
            dispatch(&mut worker, &header, b"id01abc").unwrap(),
            Outcome::Done
        );
        assert_eq!(worker.objects.get(b"id01".as_slice()), Some(&b"abc".to_vec()));
    }

    #[test]
    fn test_unknown_code_is_rejected() {
        let mut worker = MemoryWorker::default();
        let header = header_with_code(200, 5, b"?");

        let rejection = dispatch(&mut worker, &header, b"?").unwrap_err();
        assert!(matches!(
            rejection,
            Rejection::UnsupportedKind {
                code: 200,
                sequence: 5
            }
        ));
        assert_eq!(worker.commands, 0);
    }

    #[test]
    fn test_handler_failure_becomes_rejection() {
        let mut worker = MemoryWorker::default();
        let header = header_with_code(3, 7, b"nope");

        match dispatch(&mut worker, &header, b"nope").unwrap_err() {
            Rejection::HandlerFailed { kind, sequence, .. } => {
                assert_eq!(kind, MessageKind::ObjectRequest);
                assert_eq!(sequence, 7);
            }
            other => panic!("unexpected rejection: {other}"),
        }
    }

    #[test]
    fn test_reply_dropped_for_fire_and_forget_kind() {
        let mut worker = MemoryWorker::default();
        let header = header_with_code(5, 1, b"KeyError");

        assert_eq!(
            dispatch(&mut worker, &header, b"KeyError").unwrap(),
            Outcome::Done
        );
        assert_eq!(worker.last_error.as_deref(), Some(b"KeyError".as_slice()));
    }

    #[test]
    fn test_rejection_envelope() {
        let mut out = Encoder::new(1024);
        let rejection = Rejection::UnsupportedKind {
            code: 9,
            sequence: 33,
        };
        rejection.to_envelope(&mut out).unwrap();

        let envelope = Envelope::from_bytes(out.as_bytes()).unwrap();
        assert_eq!(envelope.kind, MessageKind::Exception);
        assert_eq!(envelope.sequence(), 33);
        assert_eq!(
            envelope.payload,
            b"unsupported message kind 9 (sequence 33)"
        );
    }

    #[test]
    fn test_serve_stream() {
        let mut input = Encoder::new(4096);
        input.encode(MessageKind::Object, 1, b"obj1data").unwrap();
        input.encode(MessageKind::ObjectRequest, 2, b"obj1").unwrap();
        input.encode(MessageKind::Command, 3, b"x").unwrap();
        input.encode(MessageKind::ObjectDelete, 4, b"obj1").unwrap();
        input.encode(MessageKind::IsNone, 5, b"obj1").unwrap();

        let mut stream = input.as_bytes().to_vec();
        // Command (seq 3) dari peer dengan registry yang lebih baru
        let third = 2 * crate::protocol::HEADER_SIZE + 8 + 4;
        stream[third] = 77;

        let mut worker = MemoryWorker::default();
        let mut decoder = Decoder::new(&stream);
        let mut out = Encoder::new(4096);
        let report = serve(&mut worker, &mut decoder, &mut out);

        assert_eq!(report.handled, 4);
        assert_eq!(report.replied, 2);
        assert_eq!(report.rejected, 1);
        assert!(report.stopped.is_none());
        assert_eq!(worker.commands, 0);

        let mut replies = Decoder::new(out.as_bytes());
        let first = replies.next_frame().unwrap().unwrap();
        assert_eq!(first.kind, MessageKind::Object);
        assert_eq!(first.sequence(), 2);
        assert_eq!(first.payload, b"data");

        let second = replies.next_frame().unwrap().unwrap();
        assert_eq!(second.kind, MessageKind::Exception);
        assert_eq!(second.sequence(), 3);

        let third = replies.next_frame().unwrap().unwrap();
        assert_eq!(third.kind, MessageKind::Object);
        assert_eq!(third.sequence(), 5);
        assert_eq!(third.payload, &[1u8]);
    }

    #[test]
    fn test_serve_stops_on_garbage() {
        let mut worker = MemoryWorker::default();
        let garbage = [0xAAu8; 64];
        let mut decoder = Decoder::new(&garbage);
        let mut out = Encoder::new(256);

        let report = serve(&mut worker, &mut decoder, &mut out);
        assert_eq!(report.handled, 0);
        assert!(matches!(report.stopped, Some(DecodeError::BadMagic(_))));
        assert!(out.as_bytes().is_empty());
    }
}
