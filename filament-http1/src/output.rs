//! The per-message output framer.
//!
//! `H1Output` owns one outgoing message: it materializes the header block
//! exactly once (commit), frames body writes according to the generator's
//! mode, and emits the terminal framing on close. One instance per
//! message; the message is consumed at construction and immutable once
//! committed.
//!
//! Concurrency: a mutex serializes the commit/write/close state
//! transitions so no two threads can both believe they performed the
//! commit. The lock covers only the transition: encoded buffers are
//! handed to the transport after the guard is dropped, so no lock is held
//! across a network write.

use std::sync::{Mutex, MutexGuard};

use bytes::Bytes;
use filament_net::Session;
use tracing::debug;

use crate::error::HttpError;
use crate::generator::{CHUNK_HEADER_SIZE, GenResult, Generator, State};
use crate::message::Message;

/// Default scratch capacity for a serialized header block.
const HEADER_BUFFER_SIZE: usize = 4096;

struct OutputState {
    info: Message,
    generator: Generator,
    committed: bool,
    closed: bool,
}

/// Side effects produced under the lock and applied after it is dropped.
#[derive(Default)]
struct Actions {
    buffers: Vec<Bytes>,
    close_session: bool,
    complete: bool,
}

/// HTTP/1 output stream for a single message.
pub struct H1Output<S: Session> {
    session: S,
    client_mode: bool,
    header_buffer_size: usize,
    state: Mutex<OutputState>,
    on_complete: Option<Box<dyn Fn() + Send + Sync>>,
}

impl<S: Session> H1Output<S> {
    /// Create a framer for one outgoing message. The direction (request
    /// vs response) follows the message kind.
    pub fn new(info: Message, session: S) -> Self {
        let client_mode = info.is_request();
        Self {
            session,
            client_mode,
            header_buffer_size: HEADER_BUFFER_SIZE,
            state: Mutex::new(OutputState {
                info,
                generator: Generator::new(),
                committed: false,
                closed: false,
            }),
            on_complete: None,
        }
    }

    /// Hook fired after the terminal bytes of a successfully completed
    /// message are flushed.
    pub fn with_complete_hook(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_complete = Some(Box::new(hook));
        self
    }

    pub fn with_header_buffer_size(mut self, size: usize) -> Self {
        self.header_buffer_size = size;
        self
    }

    pub fn is_committed(&self) -> bool {
        self.lock().committed
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    /// Materialize and flush the header block without body bytes.
    /// Idempotent; a no-op once committed or closed.
    pub fn commit(&self) -> Result<(), HttpError> {
        let mut actions = Actions::default();
        {
            let mut st = self.lock();
            self.commit_locked(&mut *st, None, &mut actions)?;
        }
        self.apply(actions);
        Ok(())
    }

    /// Write body bytes, committing the header block first if needed.
    /// Zero-length writes and writes after close are no-ops.
    pub fn write(&self, data: &[u8]) -> Result<(), HttpError> {
        let mut actions = Actions::default();
        {
            let mut st = self.lock();
            if st.closed || data.is_empty() {
                return Ok(());
            }
            if !st.committed {
                self.commit_locked(&mut *st, Some(data), &mut actions)?;
            } else if st.generator.is_chunking() {
                let mut chunk = Vec::with_capacity(CHUNK_HEADER_SIZE);
                let result = Self::generate(
                    &mut st.generator,
                    self.client_mode,
                    None,
                    None,
                    Some(&mut chunk),
                    Some(data),
                    false,
                )?;
                Self::expect(&st.generator, result, GenResult::Flush, State::Committed)?;
                actions.buffers.push(Bytes::from(chunk));
                actions.buffers.push(Bytes::copy_from_slice(data));
            } else {
                let result = Self::generate(
                    &mut st.generator,
                    self.client_mode,
                    None,
                    None,
                    None,
                    Some(data),
                    false,
                )?;
                Self::expect(&st.generator, result, GenResult::Flush, State::Committed)?;
                actions.buffers.push(Bytes::copy_from_slice(data));
            }
        }
        self.apply(actions);
        Ok(())
    }

    /// Write a complete fixed-length body: the Content-Length header is
    /// set to the sum of the part lengths before the header block is
    /// serialized, the parts are written, and the message is closed.
    pub fn write_with_content_length(&self, parts: &[&[u8]]) -> Result<(), HttpError> {
        {
            let mut st = self.lock();
            if !st.closed && !st.committed {
                let total: u64 = parts.iter().map(|p| p.len() as u64).sum();
                st.info.set_content_length(total);
            }
        }
        let mut result = Ok(());
        for part in parts {
            if let Err(e) = self.write(part) {
                result = Err(e);
                break;
            }
        }
        // The message is closed regardless of write failures.
        let close_result = self.close();
        result.and(close_result)
    }

    /// Emit the terminal framing and mark the stream closed. Idempotent;
    /// on failure the stream is still marked closed and cannot be closed
    /// again.
    pub fn close(&self) -> Result<(), HttpError> {
        let mut actions = Actions::default();
        let result;
        {
            let mut st = self.lock();
            if st.closed {
                return Ok(());
            }
            debug!(client_mode = self.client_mode, "http1 output stream closing");
            result = self.close_locked(&mut *st, &mut actions);
            st.closed = true;
        }
        self.apply(actions);
        result
    }

    fn lock(&self) -> MutexGuard<'_, OutputState> {
        // A writer that panicked mid-transition must not wedge close().
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn commit_locked(
        &self,
        st: &mut OutputState,
        data: Option<&[u8]>,
        actions: &mut Actions,
    ) -> Result<(), HttpError> {
        if st.closed || st.committed {
            return Ok(());
        }
        let OutputState {
            info, generator, ..
        } = &mut *st;
        let mut header = Vec::with_capacity(self.header_buffer_size);
        let result = Self::generate(
            generator,
            self.client_mode,
            Some(&*info),
            Some(&mut header),
            None,
            data,
            false,
        )?;
        Self::expect(generator, result, GenResult::Flush, State::Committed)?;
        actions.buffers.push(Bytes::from(header));
        if let Some(data) = data {
            actions.buffers.push(Bytes::copy_from_slice(data));
        }
        st.committed = true;
        Ok(())
    }

    fn close_locked(&self, st: &mut OutputState, actions: &mut Actions) -> Result<(), HttpError> {
        let OutputState {
            info,
            generator,
            committed,
            ..
        } = &mut *st;
        if !*committed {
            // Commit now with empty-body framing.
            let mut header = Vec::with_capacity(self.header_buffer_size);
            let result = Self::generate(
                generator,
                self.client_mode,
                Some(&*info),
                Some(&mut header),
                None,
                None,
                true,
            )?;
            Self::expect(generator, result, GenResult::Flush, State::Completing)?;
            actions.buffers.push(Bytes::from(header));
            *committed = true;
            Self::generate_last(generator, self.client_mode, actions)
        } else if generator.is_chunking() {
            // The generator advances to COMPLETING first, then emits the
            // terminal chunk on the second call.
            let mut chunk = Vec::with_capacity(CHUNK_HEADER_SIZE);
            let result = Self::generate(
                generator,
                self.client_mode,
                None,
                None,
                Some(&mut chunk),
                None,
                true,
            )?;
            Self::expect(generator, result, GenResult::Continue, State::Completing)?;
            let result = Self::generate(
                generator,
                self.client_mode,
                None,
                None,
                Some(&mut chunk),
                None,
                true,
            )?;
            Self::expect(generator, result, GenResult::Flush, State::Completing)?;
            actions.buffers.push(Bytes::from(chunk));
            Self::generate_last(generator, self.client_mode, actions)
        } else {
            let result =
                Self::generate(generator, self.client_mode, None, None, None, None, true)?;
            Self::expect(generator, result, GenResult::Continue, State::Completing)?;
            Self::generate_last(generator, self.client_mode, actions)
        }
    }

    /// Final generator step: END with DONE fires the success hook, END
    /// with SHUTDOWN_OUT closes the transport.
    fn generate_last(
        generator: &mut Generator,
        client_mode: bool,
        actions: &mut Actions,
    ) -> Result<(), HttpError> {
        let result = Self::generate(generator, client_mode, None, None, None, None, true)?;
        if generator.state() != State::End {
            return Err(HttpError::Generation {
                result,
                state: generator.state(),
            });
        }
        match result {
            GenResult::Done => {
                actions.complete = true;
                Ok(())
            }
            GenResult::ShutdownOut => {
                actions.close_session = true;
                Ok(())
            }
            other => Err(HttpError::Generation {
                result: other,
                state: generator.state(),
            }),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn generate(
        generator: &mut Generator,
        client_mode: bool,
        info: Option<&Message>,
        header: Option<&mut Vec<u8>>,
        chunk: Option<&mut Vec<u8>>,
        content: Option<&[u8]>,
        last: bool,
    ) -> Result<GenResult, HttpError> {
        if client_mode {
            generator.generate_request(info, header, chunk, content, last)
        } else {
            generator.generate_response(info, header, chunk, content, last)
        }
    }

    fn expect(
        generator: &Generator,
        result: GenResult,
        want_result: GenResult,
        want_state: State,
    ) -> Result<(), HttpError> {
        if result == want_result && generator.state() == want_state {
            Ok(())
        } else {
            Err(HttpError::Generation {
                result,
                state: generator.state(),
            })
        }
    }

    fn apply(&self, actions: Actions) {
        for buf in actions.buffers {
            self.session.encode(buf);
        }
        if actions.close_session {
            self.session.close();
        }
        if actions.complete
            && let Some(hook) = &self.on_complete
        {
            hook();
        }
    }
}
