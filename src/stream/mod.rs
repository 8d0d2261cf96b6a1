//! Streaming result pipeline
//!
//! Wire batches, the SSE decoder, the per-request session task, and the
//! error taxonomy shared by everything downstream of the backend.

pub mod batch;
pub mod errors;
pub mod session;
pub mod sse;

use futures::stream::BoxStream;

pub use batch::{ResultBatch, ResultItem, ResultKind};
pub use errors::{SearchError, SearchResult};
pub use session::{SessionEvent, SessionHandle, SessionId, SessionUpdate, StreamSession, classify};
pub use sse::{SseDecoder, decode_event_stream};

/// Raw event payloads of one search stream
pub type MessageStream = BoxStream<'static, SearchResult<String>>;
