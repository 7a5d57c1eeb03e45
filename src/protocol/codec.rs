//! Zero-Allocation Encoder/Decoder
//!
//! Encode langsung ke pre-allocated buffer, decode tanpa copy payload.

use thiserror::Error;

use super::envelope::{
    checksum, DecodeError, Envelope, EnvelopeHeader, HEADER_SIZE, MAX_PAYLOAD_SIZE,
};
use crate::registry::{self, MessageKind, RegistryError};

/// Errors saat menulis envelope
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("encoder full: need {needed} bytes, {available} available")]
    BufferFull { needed: usize, available: usize },

    #[error("payload of {0} bytes exceeds limit")]
    PayloadTooLarge(usize),

    /// Kind tidak terdaftar di registry global
    #[error("message kind {0} is not registered")]
    Unregistered(MessageKind),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Pre-allocated encoder buffer
///
/// Envelope ditulis berurutan ke buffer internal; setelah `new` tidak ada
/// alokasi lagi.
pub struct Encoder {
    buffer: Box<[u8]>,
    len: usize,
}

impl Encoder {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0u8; capacity].into_boxed_slice(),
            len: 0,
        }
    }

    /// Kosongkan buffer untuk reuse
    #[inline(always)]
    pub fn reset(&mut self) {
        self.len = 0;
    }

    /// Tulis satu envelope dan kembalikan bytes-nya.
    ///
    /// Code diambil dari registry global, bukan langsung dari enum, sehingga
    /// kind yang tidak terdaftar tidak pernah sampai ke wire.
    #[inline(always)]
    pub fn encode(
        &mut self,
        kind: MessageKind,
        sequence: u64,
        payload: &[u8],
    ) -> Result<&[u8], EncodeError> {
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(EncodeError::PayloadTooLarge(payload.len()));
        }

        let code = registry::global()?
            .code_of(kind)
            .ok_or(EncodeError::Unregistered(kind))?;

        let needed = HEADER_SIZE + payload.len();
        if needed > self.available() {
            return Err(EncodeError::BufferFull {
                needed,
                available: self.available(),
            });
        }

        let mut header = EnvelopeHeader::with_code(code, sequence, payload.len() as u32);
        header.checksum = checksum(payload);

        let start = self.len;
        let (head, body) = self.buffer[start..start + needed].split_at_mut(HEADER_SIZE);
        head.copy_from_slice(header.as_bytes());
        body.copy_from_slice(payload);
        self.len += needed;

        Ok(&self.buffer[start..self.len])
    }

    /// Semua envelope yang sudah ditulis
    #[inline(always)]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer[..self.len]
    }

    #[inline(always)]
    pub fn available(&self) -> usize {
        self.buffer.len() - self.len
    }
}

/// Zero-copy decoder untuk stream envelope
pub struct Decoder<'a> {
    buffer: &'a [u8],
    read_pos: usize,
    skipped: u64,
}

impl<'a> Decoder<'a> {
    /// Membuat decoder dari buffer
    #[inline(always)]
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            read_pos: 0,
            skipped: 0,
        }
    }

    /// Decode envelope berikutnya.
    ///
    /// `Ok(None)` saat buffer habis. Envelope dengan kind tidak dikenal atau
    /// checksum salah di-skip (framing-nya masih utuh) lalu error dikembalikan,
    /// sehingga panggilan berikutnya membaca envelope setelahnya. Error framing
    /// lain tidak memajukan posisi.
    pub fn next_frame(&mut self) -> Result<Option<Envelope<'a>>, DecodeError> {
        let buffer: &'a [u8] = self.buffer;
        let rest = &buffer[self.read_pos..];
        if rest.is_empty() {
            return Ok(None);
        }

        match Envelope::from_bytes(rest) {
            Ok(envelope) => {
                self.read_pos += envelope.header.total_size();
                Ok(Some(envelope))
            }
            Err(err @ (DecodeError::UnknownKind { .. } | DecodeError::ChecksumMismatch { .. })) => {
                let header = EnvelopeHeader::read(rest)?;
                self.read_pos += header.total_size();
                self.skipped += 1;
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    /// Jumlah envelope yang di-skip
    #[inline(always)]
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    #[inline(always)]
    pub fn position(&self) -> usize {
        self.read_pos
    }

    /// Remaining bytes
    #[inline(always)]
    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.read_pos)
    }
}
