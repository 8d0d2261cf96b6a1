//! One streaming request/response cycle
//!
//! A session runs on its own task. Every event it emits carries its
//! [`SessionId`], and it stops emitting the moment its handle is cancelled.
//! The controller still compares ids before applying anything, since an
//! event may already sit in the channel when cancellation happens.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::StreamExt;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::batch::{ResultBatch, ResultKind};
use super::errors::SearchError;
use crate::backend::{PageRequest, SearchBackend};

/// Identity token for one session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a session reports back
#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    /// `exact` batch; more will follow
    Partial(ResultBatch),
    /// `complete` batch; the session is over
    Completed(ResultBatch),
    /// Transport, backend, or payload failure; the session is over
    Failed(SearchError),
}

impl SessionUpdate {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SessionUpdate::Partial(_))
    }
}

/// A session update tagged with the session that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct SessionEvent {
    pub session: SessionId,
    pub update: SessionUpdate,
}

/// Classify one raw stream message.
#[must_use]
pub fn classify(payload: &str) -> SessionUpdate {
    match ResultBatch::parse_stream_message(payload) {
        Ok((ResultKind::Exact, batch)) => SessionUpdate::Partial(batch),
        Ok((ResultKind::Complete, batch)) => SessionUpdate::Completed(batch),
        Ok((ResultKind::Error, batch)) => SessionUpdate::Failed(SearchError::Backend(
            batch
                .message
                .unwrap_or_else(|| "error batch without detail".to_string()),
        )),
        Err(e) => SessionUpdate::Failed(e),
    }
}

/// Sender side shared by the session task
struct Outlet {
    id: SessionId,
    closed: Arc<AtomicBool>,
    events: UnboundedSender<SessionEvent>,
}

impl Outlet {
    /// Returns `false` once nothing more should be sent.
    fn deliver(&self, update: SessionUpdate) -> bool {
        if self.closed.load(Ordering::Acquire) {
            debug!(session = %self.id, "Session closed, dropping update");
            return false;
        }
        let terminal = update.is_terminal();
        let sent = self
            .events
            .send(SessionEvent {
                session: self.id,
                update,
            })
            .is_ok();
        if terminal {
            self.closed.store(true, Ordering::Release);
        }
        sent && !terminal
    }
}

/// Entry point for opening sessions
pub struct StreamSession;

impl StreamSession {
    /// Open a stream for `request` and return its handle immediately.
    ///
    /// Must be called from within a tokio runtime.
    pub fn open<B>(
        backend: &B,
        request: PageRequest,
        id: SessionId,
        events: UnboundedSender<SessionEvent>,
    ) -> SessionHandle
    where
        B: SearchBackend + ?Sized,
    {
        debug!(session = %id, query = %request.query, page = request.page, size = request.size, "Opening session");
        let closed = Arc::new(AtomicBool::new(false));
        let opening = backend.open_stream(request);
        let outlet = Outlet {
            id,
            closed: Arc::clone(&closed),
            events,
        };

        let task = tokio::spawn(async move {
            let mut messages = match opening.await {
                Ok(messages) => messages,
                Err(e) => {
                    warn!(session = %outlet.id, error = %e, "Failed to open search stream");
                    outlet.deliver(SessionUpdate::Failed(e));
                    return;
                }
            };

            while let Some(message) = messages.next().await {
                let update = match message {
                    Ok(payload) => classify(&payload),
                    Err(e) => SessionUpdate::Failed(e),
                };
                if let SessionUpdate::Failed(e) = &update {
                    warn!(session = %outlet.id, error = %e, "Search session failed");
                }
                if !outlet.deliver(update) {
                    // Dropping `messages` closes the connection
                    return;
                }
            }

            warn!(session = %outlet.id, "Stream ended before a terminal batch");
            outlet.deliver(SessionUpdate::Failed(SearchError::Transport(
                "stream ended before a terminal batch".to_string(),
            )));
        });

        SessionHandle { id, closed, task }
    }
}

/// Cancellable handle to a running session
///
/// Dropping the handle cancels the session.
#[derive(Debug)]
pub struct SessionHandle {
    id: SessionId,
    closed: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Whether the session has finished or been cancelled
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Stop the session. Safe to call any number of times.
    pub fn cancel(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            debug!(session = %self.id, "Session cancelled");
        }
        self.task.abort();
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.closed.store(true, Ordering::Release);
        self.task.abort();
    }
}
