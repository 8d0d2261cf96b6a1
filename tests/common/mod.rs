//! Test utilities and helper functions for the search session test suite

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::Result;
use futures::future::{self, BoxFuture};
use futures::{FutureExt, StreamExt};
use mockito::{Matcher, Mock, Server};
use serde_json::{Value, json};
use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::UnboundedReceiverStream;

use kodegen_tools_search_session::{
    AppliedFilters, LoadingPhase, MessageStream, PageRequest, Presenter, RemoteConfig,
    RenderedItem, SearchBackend, SearchError, SearchResult, SearchSessionController, SessionId,
};

// ----------------------------------------------------------------------------
// Payload builders
// ----------------------------------------------------------------------------

/// One backend item with the fields the projection reads
#[allow(dead_code)]
pub fn item(id: i64, kind: &str, number: i64, year: i32, summary: &str) -> Value {
    json!({
        "id": id,
        "tipo": kind,
        "numero": number,
        "ano": year,
        "autor": "Vereador Teste",
        "ementa": summary,
        "palavrasChave": "Saúde|Educação",
        "linkPdf": format!("https://example.org/{id}.pdf"),
        "linkPortal": format!("https://example.org/portal/{id}"),
        "linkSpLegis": format!("https://example.org/splegis/{id}"),
    })
}

/// Batch payload as the stream endpoint sends it
#[allow(dead_code)]
pub fn batch(kind: &str, items: Vec<Value>, has_more: bool) -> String {
    json!({
        "resultType": kind,
        "projetos": items,
        "hasMore": has_more,
    })
    .to_string()
}

/// Batch payload carrying applied filters
#[allow(dead_code)]
pub fn batch_with_filters(kind: &str, items: Vec<Value>, has_more: bool, filters: Value) -> String {
    json!({
        "resultType": kind,
        "projetos": items,
        "hasMore": has_more,
        "appliedFilters": filters,
    })
    .to_string()
}

/// Frame payloads as a `text/event-stream` body
#[allow(dead_code)]
pub fn sse_body(payloads: &[String]) -> String {
    payloads.iter().map(|p| format!("data:{p}\n\n")).collect()
}

// ----------------------------------------------------------------------------
// Mock HTTP server
// ----------------------------------------------------------------------------

/// Sets up a mock HTTP server
#[allow(dead_code)]
pub async fn setup_mock_server() -> Result<mockito::ServerGuard> {
    let server = Server::new_async().await;
    Ok(server)
}

/// Creates a mock config endpoint
#[allow(dead_code)]
pub async fn create_config_mock(server: &mut Server, body: Value) -> Mock {
    server
        .mock("GET", "/api/config")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .create_async()
        .await
}

/// Creates a mock stream endpoint answering any query with `payloads`
#[allow(dead_code)]
pub async fn create_stream_mock(server: &mut Server, payloads: &[String]) -> Mock {
    server
        .mock("GET", "/api/search/stream")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body(sse_body(payloads))
        .create_async()
        .await
}

/// Creates a mock endpoint that returns an error
#[allow(dead_code)]
pub async fn create_error_mock(server: &mut Server, path: &str, status: usize) -> Mock {
    server
        .mock("GET", path)
        .match_query(Matcher::Any)
        .with_status(status)
        .with_body("Error")
        .create_async()
        .await
}

// ----------------------------------------------------------------------------
// Scripted backend
// ----------------------------------------------------------------------------

#[derive(Default)]
struct Script {
    requests: Vec<PageRequest>,
    streams: Vec<Option<mpsc::UnboundedSender<SearchResult<String>>>>,
    config_gate: Option<oneshot::Receiver<SearchResult<RemoteConfig>>>,
}

/// In-memory backend whose streams are fed by the test
#[derive(Clone, Default)]
#[allow(dead_code)]
pub struct ScriptedBackend {
    script: Arc<Mutex<Script>>,
}

#[allow(dead_code)]
impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend whose config fetch resolves only when the sender fires
    pub fn with_config_gate() -> (Self, oneshot::Sender<SearchResult<RemoteConfig>>) {
        let (tx, rx) = oneshot::channel();
        let backend = Self::default();
        backend.script.lock().unwrap().config_gate = Some(rx);
        (backend, tx)
    }

    pub fn requests(&self) -> Vec<PageRequest> {
        self.script.lock().unwrap().requests.clone()
    }

    pub fn stream_count(&self) -> usize {
        self.script.lock().unwrap().streams.len()
    }

    /// Send a payload on stream `index`. Returns `false` if that stream is gone.
    pub fn push(&self, index: usize, payload: impl Into<String>) -> bool {
        self.send(index, Ok(payload.into()))
    }

    pub fn push_error(&self, index: usize, error: SearchError) -> bool {
        self.send(index, Err(error))
    }

    /// End stream `index` as if the server closed the connection.
    pub fn close(&self, index: usize) {
        self.script.lock().unwrap().streams[index].take();
    }

    /// Whether the session side of stream `index` has been dropped
    pub fn is_stream_dropped(&self, index: usize) -> bool {
        self.script.lock().unwrap().streams[index]
            .as_ref()
            .is_none_or(|tx| tx.is_closed())
    }

    fn send(&self, index: usize, message: SearchResult<String>) -> bool {
        let script = self.script.lock().unwrap();
        match &script.streams[index] {
            Some(tx) => tx.send(message).is_ok(),
            None => false,
        }
    }
}

impl SearchBackend for ScriptedBackend {
    fn fetch_config(&self) -> BoxFuture<'static, SearchResult<RemoteConfig>> {
        let gate = self.script.lock().unwrap().config_gate.take();
        match gate {
            Some(rx) => async move {
                rx.await.unwrap_or_else(|_| {
                    Err(SearchError::ConfigUnavailable("config gate dropped".into()))
                })
            }
            .boxed(),
            None => future::ready(Ok(RemoteConfig {
                default_page_size: Some(20),
                max_results_limit: Some(1000),
            }))
            .boxed(),
        }
    }

    fn open_stream(&self, request: PageRequest) -> BoxFuture<'static, SearchResult<MessageStream>> {
        let (tx, rx) = mpsc::unbounded_channel();
        {
            let mut script = self.script.lock().unwrap();
            script.requests.push(request);
            script.streams.push(Some(tx));
        }
        let messages: MessageStream = UnboundedReceiverStream::new(rx).boxed();
        future::ready(Ok(messages)).boxed()
    }
}

// ----------------------------------------------------------------------------
// Recording presenter
// ----------------------------------------------------------------------------

/// Everything the controller has pushed so far
#[derive(Debug, Default)]
#[allow(dead_code)]
pub struct Screen {
    pub results: Vec<RenderedItem>,
    pub filters: AppliedFilters,
    pub loading: Option<LoadingPhase>,
    pub error: Option<String>,
    pub load_more: bool,
    pub end_of_results: bool,
    pub summary: Option<(usize, Option<u64>)>,
}

#[allow(dead_code)]
impl Screen {
    pub fn headings(&self) -> Vec<String> {
        self.results.iter().map(|r| r.heading.clone()).collect()
    }
}

/// Presenter that records into a shared [`Screen`]
#[derive(Debug, Clone, Default)]
#[allow(dead_code)]
pub struct RecordingPresenter {
    screen: Arc<Mutex<Screen>>,
}

#[allow(dead_code)]
impl RecordingPresenter {
    pub fn screen(&self) -> MutexGuard<'_, Screen> {
        self.screen.lock().unwrap()
    }
}

impl Presenter for RecordingPresenter {
    fn truncate_results(&mut self, keep: usize) {
        self.screen().results.truncate(keep);
    }

    fn render_results(&mut self, items: &[RenderedItem]) {
        self.screen().results.extend_from_slice(items);
    }

    fn render_filters(&mut self, filters: &AppliedFilters) {
        self.screen().filters = filters.clone();
    }

    fn set_loading(&mut self, phase: Option<LoadingPhase>) {
        self.screen().loading = phase;
    }

    fn show_error(&mut self, message: &str) {
        self.screen().error = Some(message.to_string());
    }

    fn hide_error(&mut self) {
        self.screen().error = None;
    }

    fn set_load_more(&mut self, enabled: bool) {
        self.screen().load_more = enabled;
    }

    fn set_end_of_results(&mut self, visible: bool) {
        self.screen().end_of_results = visible;
    }

    fn show_summary(&mut self, shown: usize, total: Option<u64>) {
        self.screen().summary = Some((shown, total));
    }
}

// ----------------------------------------------------------------------------
// Controller helpers
// ----------------------------------------------------------------------------

#[allow(dead_code)]
pub type TestController<B = ScriptedBackend> = SearchSessionController<B, RecordingPresenter>;

/// Controller over a scripted backend with remote config already applied
#[allow(dead_code)]
pub fn ready_controller(page_size: u32) -> (TestController, ScriptedBackend) {
    let backend = ScriptedBackend::new();
    let mut controller =
        SearchSessionController::new(Arc::new(backend.clone()), RecordingPresenter::default());
    controller.apply_remote_config(Ok(RemoteConfig {
        default_page_size: Some(page_size),
        max_results_limit: None,
    }));
    (controller, backend)
}

/// Apply the next session event, failing the test if none arrives in time.
#[allow(dead_code)]
pub async fn next_event<B, P>(controller: &mut SearchSessionController<B, P>) -> SessionId
where
    B: SearchBackend,
    P: Presenter,
{
    tokio::time::timeout(Duration::from_secs(5), controller.process_next_event())
        .await
        .expect("timed out waiting for a session event")
        .expect("event channel closed")
}

/// Waits for a condition to be true with timeout
#[allow(dead_code)]
pub async fn wait_for_condition<F>(mut check: F, timeout_secs: u64) -> Result<()>
where
    F: FnMut() -> bool,
{
    let start = std::time::Instant::now();
    let timeout = Duration::from_secs(timeout_secs);

    while start.elapsed() < timeout {
        if check() {
            return Ok(());
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    Err(anyhow::anyhow!("Timeout waiting for condition"))
}
