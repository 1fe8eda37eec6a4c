//! Per-connection HTTP/1 state.
//!
//! One `H1Connection` is attached to a transport session after protocol
//! negotiation (or directly for plaintext). It hands out one
//! [`H1Output`] per outgoing message over a cloneable session handle and
//! implements [`HttpConnection`] so bootstrap teardown can close it.

use std::sync::atomic::{AtomicBool, Ordering};

use filament_net::{HttpConnection, NetError, Session};

use crate::message::Message;
use crate::output::H1Output;

/// An HTTP/1 connection bound to a transport session.
pub struct H1Connection<S: Session + Clone> {
    session: S,
    open: AtomicBool,
}

impl<S: Session + Clone> H1Connection<S> {
    pub fn new(session: S) -> Self {
        Self {
            session,
            open: AtomicBool::new(true),
        }
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    /// Begin an outgoing message. The framer owns its own clone of the
    /// session handle; the direction follows the message kind.
    pub fn output(&self, info: Message) -> H1Output<S> {
        H1Output::new(info, self.session.clone())
    }
}

impl<S: Session + Clone> HttpConnection for H1Connection<S> {
    fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    fn close(&mut self) -> Result<(), NetError> {
        if self.open.swap(false, Ordering::AcqRel) {
            self.session.close();
        }
        Ok(())
    }
}
