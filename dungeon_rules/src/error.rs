//! Errors raised while building dungeon data.
//!
//! Runtime queries never fail: unknown ids come back as `None`, `false` or an
//! empty collection. Only construction from external data can be rejected.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RulesError {
    #[error("unknown monster kind `{0}`")]
    UnknownMonsterKind(String),

    #[error("unknown tunnel kind `{0}`")]
    UnknownTunnelKind(String),

    #[error("vertex {0} does not exist")]
    UnknownVertex(u32),
}
