//! Message kinds yang dikenal oleh protokol worker.
//!
//! Set ini tertutup: menambah kind berarti perubahan source dengan code baru
//! yang belum pernah dipakai. Code yang sudah dipublikasikan tidak boleh
//! di-reassign karena peer lain bisa menjalankan versi registry yang berbeda.

use std::fmt;
use std::str::FromStr;

use super::error::RegistryError;

/// Deklarasi tunggal untuk setiap kind: variant, code, nama simbolik dan
/// apakah receiver membalas. Enum, `ALL`, `KIND_COUNT` dan semua match
/// di-generate dari list yang sama, jadi kind tidak bisa hilang dari `ALL`.
macro_rules! message_kinds {
    ($(
        $(#[$doc:meta])*
        $variant:ident = $code:literal, $name:literal, reply: $reply:literal;
    )*) => {
        /// Kategori pesan yang melintasi batas worker
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum MessageKind {
            $($(#[$doc])* $variant,)*
        }

        /// Jumlah kind dalam registry
        pub const KIND_COUNT: usize = [$(stringify!($variant)),*].len();

        impl MessageKind {
            /// Semua kind, urut sesuai deklarasi
            pub const ALL: [MessageKind; KIND_COUNT] = [$(MessageKind::$variant),*];

            /// Wire code. Stabil; code yang sudah publish tidak di-reassign.
            #[inline(always)]
            pub const fn code(self) -> u8 {
                match self {
                    $(MessageKind::$variant => $code,)*
                }
            }

            /// Symbolic name as published to peers and written to logs
            #[inline(always)]
            pub const fn name(self) -> &'static str {
                match self {
                    $(MessageKind::$variant => $name,)*
                }
            }

            const fn variant_name(self) -> &'static str {
                match self {
                    $(MessageKind::$variant => stringify!($variant),)*
                }
            }

            /// Apakah receiver harus mengirim balasan
            #[inline(always)]
            pub const fn expects_reply(self) -> bool {
                match self {
                    $(MessageKind::$variant => $reply,)*
                }
            }
        }
    };
}

message_kinds! {
    /// Eksekusi operasi bernama di worker remote
    Command = 1, "CMD", reply: true;
    /// Payload object yang sudah di-serialize
    Object = 2, "OBJ", reply: false;
    /// Minta worker remote mengirim balik object tertentu
    ObjectRequest = 3, "OBJ_REQ", reply: true;
    /// Object remote boleh dilepas
    ObjectDelete = 4, "OBJ_DEL", reply: false;
    /// Failure yang terjadi saat memproses pesan sebelumnya
    Exception = 5, "EXCEPTION", reply: false;
    /// Apakah object remote adalah nilai kosong
    IsNone = 6, "IS_NONE", reply: true;
    /// Metadata shape dari tensor remote, tanpa transfer data
    GetShape = 7, "GET_SHAPE", reply: true;
}

// Reference table dicek saat compile: posisi di ALL sama dengan index
// variant, dan tidak ada dua kind dengan code yang sama.
const _: () = {
    let mut i = 0;
    while i < KIND_COUNT {
        assert!(MessageKind::ALL[i].index() == i, "ALL out of declaration order");
        let mut j = i + 1;
        while j < KIND_COUNT {
            assert!(
                MessageKind::ALL[i].code() != MessageKind::ALL[j].code(),
                "duplicate message kind code"
            );
            j += 1;
        }
        i += 1;
    }
};

impl MessageKind {
    /// Posisi variant, 0..KIND_COUNT
    #[inline(always)]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Pasangan (kind, code) untuk membangun [`Registry`](super::Registry)
    pub fn reference_table() -> impl Iterator<Item = (MessageKind, u8)> {
        Self::ALL.into_iter().map(|kind| (kind, kind.code()))
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MessageKind {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s) || kind.variant_name() == s)
            .ok_or_else(|| RegistryError::UnknownKindName(s.to_string()))
    }
}
