//! Remote-call capability for the provider's RPC endpoint.
//!
//! The [`Remote`] trait is the narrow seam between this crate and the
//! transport layer: one synchronous call in, one raw response body out.
//! This allows:
//! - a real XML-RPC session owned by the surrounding tool
//! - the scripted [`mock::MockRemote`] for testing
//!
//! Authentication, connection handling and request encoding all live on
//! the other side of this trait.

pub mod mock;

use crate::error::Result;
use std::fmt;

/// A positional argument of a remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    /// Integer argument
    Int(i64),
    /// String argument
    Str(String),
    /// Boolean argument
    Bool(bool),
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Int(v) => write!(f, "{v}"),
            Arg::Str(v) => write!(f, "{v:?}"),
            Arg::Bool(v) => write!(f, "{v}"),
        }
    }
}

impl From<i64> for Arg {
    fn from(v: i64) -> Self {
        Arg::Int(v)
    }
}

impl From<&str> for Arg {
    fn from(v: &str) -> Self {
        Arg::Str(v.to_string())
    }
}

impl From<String> for Arg {
    fn from(v: String) -> Self {
        Arg::Str(v)
    }
}

impl From<bool> for Arg {
    fn from(v: bool) -> Self {
        Arg::Bool(v)
    }
}

/// Synchronous remote procedure call capability.
///
/// Calls are blocking and individually atomic from this crate's
/// perspective; the lifecycle controller never issues two calls
/// concurrently for the same VM. Implementations must not retry on their
/// own behalf unless the surrounding tool wants them to — this crate
/// treats every returned error as final.
pub trait Remote: Send + Sync {
    /// Invoke `method` with positional `args` and return the raw response
    /// body.
    fn call(&self, method: &str, args: &[Arg]) -> Result<String>;
}

// Shared sessions are common: the surrounding tool holds one connection
// and hands clones of it to each per-VM client.
impl<R: Remote + ?Sized> Remote for std::sync::Arc<R> {
    fn call(&self, method: &str, args: &[Arg]) -> Result<String> {
        (**self).call(method, args)
    }
}

impl<R: Remote + ?Sized> Remote for Box<R> {
    fn call(&self, method: &str, args: &[Arg]) -> Result<String> {
        (**self).call(method, args)
    }
}
