//! Forward dan reverse table untuk message kind.
//!
//! Reverse table berupa array 256 slot yang di-index langsung dengan code,
//! jadi lookup selalu O(1) dan tidak ada hashing di hot path decode.

use std::sync::atomic::{AtomicUsize, Ordering};

use log::{debug, info};
use once_cell::sync::OnceCell;

use super::error::RegistryError;
use super::kind::{MessageKind, KIND_COUNT};

/// Immutable kind <-> code mapping
#[derive(Debug, Clone)]
pub struct Registry {
    /// Urutan deklarasi dipertahankan
    forward: Vec<(MessageKind, u8)>,
    /// Di-index dengan [`MessageKind::index`]
    codes: [Option<u8>; KIND_COUNT],
    reverse: [Option<MessageKind>; 256],
}

impl Registry {
    /// Build registry dari pasangan (kind, code).
    ///
    /// Gagal dengan [`RegistryError::DuplicateCode`] jika dua kind memakai code
    /// yang sama, atau [`RegistryError::DuplicateKind`] jika satu kind muncul
    /// dua kali. Tidak ada entry yang di-overwrite diam-diam.
    pub fn build<I>(entries: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = (MessageKind, u8)>,
    {
        let mut forward: Vec<(MessageKind, u8)> = Vec::new();
        let mut codes = [None; KIND_COUNT];
        let mut reverse = [None; 256];

        for (kind, code) in entries {
            if let Some(first) = codes[kind.index()] {
                return Err(RegistryError::DuplicateKind {
                    kind,
                    first,
                    second: code,
                });
            }

            let slot = &mut reverse[code as usize];
            if let Some(first) = *slot {
                return Err(RegistryError::DuplicateCode {
                    code,
                    first,
                    second: kind,
                });
            }

            *slot = Some(kind);
            codes[kind.index()] = Some(code);
            forward.push((kind, code));
        }

        Ok(Self {
            forward,
            codes,
            reverse,
        })
    }

    /// Registry untuk reference table ([`MessageKind::code`])
    pub fn reference() -> Result<Self, RegistryError> {
        Self::build(MessageKind::reference_table())
    }

    /// Kind pemilik `code`. Tidak pernah menebak atau fallback ke default.
    #[inline(always)]
    pub fn kind_of(&self, code: u8) -> Result<MessageKind, RegistryError> {
        self.reverse[code as usize].ok_or(RegistryError::UnknownMessageKind(code))
    }

    /// Code untuk `kind`, None jika table ini tidak mendeklarasikannya
    #[inline(always)]
    pub fn code_of(&self, kind: MessageKind) -> Option<u8> {
        self.codes[kind.index()]
    }

    /// Apakah `code` dimiliki suatu kind
    #[inline(always)]
    pub fn contains_code(&self, code: u8) -> bool {
        self.reverse[code as usize].is_some()
    }

    /// Semua kind dalam urutan deklarasi
    pub fn kinds(&self) -> impl Iterator<Item = MessageKind> + '_ {
        self.forward.iter().map(|&(kind, _)| kind)
    }

    pub fn entries(&self) -> &[(MessageKind, u8)] {
        &self.forward
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }
}

static GLOBAL: OnceCell<Registry> = OnceCell::new();
static GLOBAL_BUILDS: AtomicUsize = AtomicUsize::new(0);

/// Process-wide registry, dibangun sekali saat first use.
///
/// Concurrent first use tetap hanya membangun satu kali. Setelah itu read
/// tidak memakai lock.
pub fn global() -> Result<&'static Registry, RegistryError> {
    GLOBAL.get_or_try_init(|| {
        GLOBAL_BUILDS.fetch_add(1, Ordering::Relaxed);
        Registry::reference()
    })
}

/// Berapa kali registry global dibangun (0 sebelum first use, lalu 1)
pub fn global_builds() -> usize {
    GLOBAL_BUILDS.load(Ordering::Relaxed)
}

/// Startup hook: paksa konstruksi registry dan log isinya.
///
/// Error di sini fatal; protokol dengan code ambigu tidak boleh jalan.
pub fn init() -> Result<&'static Registry, RegistryError> {
    let registry = global()?;
    for (kind, code) in registry.entries() {
        debug!("message kind {:>2} => {} ({:?})", code, kind, kind);
    }
    info!("message kind registry ready: {} kinds", registry.len());
    Ok(registry)
}

/// Code untuk kind. Total, tidak pernah gagal.
#[inline(always)]
pub fn code_of(kind: MessageKind) -> u8 {
    kind.code()
}

/// Kind untuk code dari wire
#[inline(always)]
pub fn kind_of(code: u8) -> Result<MessageKind, RegistryError> {
    global()?.kind_of(code)
}

/// Symbolic name untuk code dari wire
pub fn name_of(code: u8) -> Result<&'static str, RegistryError> {
    kind_of(code).map(MessageKind::name)
}

/// Seluruh set kind yang tertutup
pub fn all_kinds() -> &'static [MessageKind] {
    &MessageKind::ALL
}
