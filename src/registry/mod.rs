//! Message Kind Registry
//!
//! Sumber kebenaran tunggal untuk "pesan jenis apa saja yang ada":
//! - Closed set: kind baru hanya lewat perubahan source
//! - Stable codes: code yang sudah publish tidak pernah di-reassign
//! - Init-once: dibangun sekali, read-only dan lock-free setelahnya

mod error;
mod kind;
mod table;

pub use error::RegistryError;
pub use kind::{MessageKind, KIND_COUNT};
pub use table::{all_kinds, code_of, global, global_builds, init, kind_of, name_of, Registry};
