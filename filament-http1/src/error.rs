use thiserror::Error;

use crate::generator::{GenResult, State};

/// Errors produced while generating an HTTP/1 message.
#[derive(Debug, Error)]
pub enum HttpError {
    /// The generator returned a (result, state) pair the framer did not
    /// expect at that point. An invariant violation; the operation is
    /// aborted, never retried.
    #[error("unexpected generator result {result:?} in state {state:?}")]
    Generation { result: GenResult, state: State },

    /// More body bytes were written than the declared Content-Length.
    #[error("content exceeds declared content-length")]
    ContentOverrun,

    /// The message was closed with fewer body bytes than declared.
    #[error("content shorter than declared content-length")]
    ContentIncomplete,

    /// The generator was driven outside its contract.
    #[error("generator misuse: {0}")]
    Misuse(&'static str),
}
