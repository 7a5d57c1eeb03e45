use thiserror::Error;

use super::kind::MessageKind;

/// Errors from building or querying the kind registry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Two kinds claim one code. Fatal at startup.
    #[error("duplicate message code {code}: claimed by {first} and {second}")]
    DuplicateCode {
        code: u8,
        first: MessageKind,
        second: MessageKind,
    },

    /// A kind appears twice in the forward table
    #[error("message kind {kind} declared more than once (codes {first} and {second})")]
    DuplicateKind {
        kind: MessageKind,
        first: u8,
        second: u8,
    },

    /// No kind owns this code, usually a peer on another registry version
    #[error("unknown message kind code {0}")]
    UnknownMessageKind(u8),

    #[error("unknown message kind name {0:?}")]
    UnknownKindName(String),
}
