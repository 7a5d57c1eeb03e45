//! Worker Wire - message kind registry untuk protokol remote execution
//!
//! Arsitektur:
//! - Registry: closed set kind dengan code stabil, reverse lookup O(1)
//! - Envelope: header fixed-size, kind code di byte pertama
//! - Dispatch: satu handler method per kind, unknown code jadi rejection

pub mod config;
pub mod protocol;
pub mod registry;

pub use registry::{all_kinds, code_of, kind_of, name_of, MessageKind, Registry, RegistryError};
