//! Envelope Format
//!
//! Layout:
//! ┌─────────────────────────────────────────────────────┐
//! │ EnvelopeHeader (24 bytes, fixed)                    │
//! │   kind code selalu di byte pertama                  │
//! ├─────────────────────────────────────────────────────┤
//! │ Payload (opaque, max 64KB)                          │
//! └─────────────────────────────────────────────────────┘
//!
//! Isi payload adalah urusan serializer; envelope hanya membawa kind code,
//! sequence, panjang dan checksum.

use std::mem;

use thiserror::Error;

use crate::registry::{self, MessageKind, RegistryError};

/// Envelope Header - fixed 24 bytes, tanpa padding
#[repr(C, packed)]
#[derive(Debug, Clone, Copy)]
pub struct EnvelopeHeader {
    /// Kind code dari registry
    pub kind: u8,
    /// Versi envelope
    pub version: u8,
    /// Flags (reserved)
    pub flags: u16,
    /// Magic number (0x57575250 = "WWRP")
    pub magic: u32,
    /// Sequence number untuk korelasi request/reply
    pub sequence: u64,
    /// Panjang payload dalam bytes
    pub payload_len: u32,
    /// Checksum payload, 0 = tidak dicek
    pub checksum: u32,
}

pub const HEADER_SIZE: usize = mem::size_of::<EnvelopeHeader>();
pub const MAGIC: u32 = 0x5757_5250; // "WWRP"
pub const ENVELOPE_VERSION: u8 = 1;
pub const MAX_PAYLOAD_SIZE: usize = 65536;

/// Errors saat membaca envelope dari buffer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("truncated envelope: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    #[error("bad envelope magic {0:#010x}")]
    BadMagic(u32),

    #[error("unsupported envelope version {0}")]
    VersionMismatch(u8),

    #[error("payload of {0} bytes exceeds limit")]
    PayloadTooLarge(usize),

    #[error("checksum mismatch on sequence {sequence}")]
    ChecksumMismatch { sequence: u64 },

    #[error("unknown message kind {code} on sequence {sequence}")]
    UnknownKind { code: u8, sequence: u64 },

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl EnvelopeHeader {
    /// Membuat header baru untuk kind tertentu
    #[inline(always)]
    pub fn new(kind: MessageKind, sequence: u64, payload_len: u32) -> Self {
        Self::with_code(registry::code_of(kind), sequence, payload_len)
    }

    /// Header dengan wire code yang sudah di-resolve
    #[inline(always)]
    pub fn with_code(code: u8, sequence: u64, payload_len: u32) -> Self {
        Self {
            kind: code,
            version: ENVELOPE_VERSION,
            flags: 0,
            magic: MAGIC,
            sequence,
            payload_len,
            checksum: 0, // Diisi encoder
        }
    }

    /// Baca header dari raw bytes (copy 24 bytes, tanpa parsing field)
    #[inline(always)]
    pub fn read(buf: &[u8]) -> Result<Self, DecodeError> {
        if buf.len() < HEADER_SIZE {
            return Err(DecodeError::Truncated {
                needed: HEADER_SIZE,
                available: buf.len(),
            });
        }
        // SAFETY: panjang sudah dicek, struct packed (align 1) dan semua
        // field adalah integer sehingga setiap bit pattern valid.
        Ok(unsafe { std::ptr::read_unaligned(buf.as_ptr() as *const Self) })
    }

    /// Validasi framing (magic, versi, panjang). Kind dicek terpisah.
    #[inline(always)]
    pub fn check(&self) -> Result<(), DecodeError> {
        let magic = self.magic;
        if magic != MAGIC {
            return Err(DecodeError::BadMagic(magic));
        }
        if self.version != ENVELOPE_VERSION {
            return Err(DecodeError::VersionMismatch(self.version));
        }
        let len = self.payload_len as usize;
        if len > MAX_PAYLOAD_SIZE {
            return Err(DecodeError::PayloadTooLarge(len));
        }
        Ok(())
    }

    /// Resolve kind code lewat registry
    #[inline(always)]
    pub fn kind(&self) -> Result<MessageKind, RegistryError> {
        registry::kind_of(self.kind)
    }

    /// Convert ke bytes (ZERO-COPY!)
    #[inline(always)]
    pub fn as_bytes(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self as *const Self as *const u8, HEADER_SIZE) }
    }

    /// Total envelope size (header + payload)
    #[inline(always)]
    pub fn total_size(&self) -> usize {
        HEADER_SIZE + self.payload_len as usize
    }
}

/// Envelope lengkap dengan kind yang sudah di-resolve
#[derive(Debug, Clone, Copy)]
pub struct Envelope<'a> {
    pub kind: MessageKind,
    pub header: EnvelopeHeader,
    pub payload: &'a [u8],
}

impl<'a> Envelope<'a> {
    /// Parse satu envelope dari awal buffer (zero-copy untuk payload)
    pub fn from_bytes(buf: &'a [u8]) -> Result<Self, DecodeError> {
        let header = EnvelopeHeader::read(buf)?;
        header.check()?;

        let payload_end = header.total_size();
        if buf.len() < payload_end {
            return Err(DecodeError::Truncated {
                needed: payload_end,
                available: buf.len(),
            });
        }
        let payload = &buf[HEADER_SIZE..payload_end];

        let sequence = header.sequence;
        let expected = header.checksum;
        if expected != 0 && checksum(payload) != expected {
            return Err(DecodeError::ChecksumMismatch { sequence });
        }

        let kind = match header.kind() {
            Ok(kind) => kind,
            Err(RegistryError::UnknownMessageKind(code)) => {
                return Err(DecodeError::UnknownKind { code, sequence })
            }
            Err(e) => return Err(DecodeError::Registry(e)),
        };

        Ok(Self {
            kind,
            header,
            payload,
        })
    }

    #[inline(always)]
    pub fn sequence(&self) -> u64 {
        self.header.sequence
    }
}

const ADLER_MOD: u32 = 65_521;
/// Byte maksimum sebelum `b` bisa overflow u32
const ADLER_NMAX: usize = 5_552;

/// Adler-32 atas payload. Tidak pernah 0, jadi 0 aman dipakai sebagai
/// "tidak dicek" di header.
pub fn checksum(data: &[u8]) -> u32 {
    let (mut a, mut b) = (1u32, 0u32);
    for block in data.chunks(ADLER_NMAX) {
        for &byte in block {
            a += u32::from(byte);
            b += a;
        }
        a %= ADLER_MOD;
        b %= ADLER_MOD;
    }
    (b << 16) | a
}
