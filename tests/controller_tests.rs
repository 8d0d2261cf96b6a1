mod common;

use std::sync::Arc;

use serde_json::json;
use tokio::sync::mpsc;

use common::*;
use kodegen_tools_search_session::controller::SearchPhase;
use kodegen_tools_search_session::utils::{MSG_NO_MORE_RESULTS, MSG_NO_RESULTS, MSG_SEARCH_FAILED};
use kodegen_tools_search_session::{
    FilterCategory, LoadingPhase, RemoteConfig, ResultBatch, SearchError, SearchSessionController,
    SessionEvent, SessionUpdate, UserCommand,
};

fn items(range: std::ops::RangeInclusive<i64>, summary: &str) -> Vec<serde_json::Value> {
    range
        .map(|id| item(id, "PL", id, 2024, summary))
        .collect()
}

#[tokio::test]
async fn deferred_request_runs_once_config_arrives() {
    let backend = ScriptedBackend::new();
    let mut controller =
        SearchSessionController::new(Arc::new(backend.clone()), RecordingPresenter::default());

    controller.submit_manual_query("lei").expect("valid query");
    assert_eq!(controller.state().phase(), SearchPhase::AwaitingConfig);
    assert_eq!(controller.state().pending_request().map(|p| p.query.as_str()), Some("lei"));
    assert_eq!(backend.stream_count(), 0);

    controller.apply_remote_config(Ok(RemoteConfig {
        default_page_size: Some(20),
        max_results_limit: None,
    }));

    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].query, "lei");
    assert_eq!(requests[0].page, 0);
    assert_eq!(requests[0].size, 20);
    assert!(controller.state().pending_request().is_none());
    assert!(controller.state().is_loading());

    // A second config arrival must not replay anything
    controller.apply_remote_config(Ok(RemoteConfig::default()));
    assert_eq!(backend.stream_count(), 1);
}

#[tokio::test]
async fn only_the_latest_deferred_request_survives() {
    let backend = ScriptedBackend::new();
    let mut controller =
        SearchSessionController::new(Arc::new(backend.clone()), RecordingPresenter::default());

    controller.submit_manual_query("saude").expect("valid query");
    controller.submit_manual_query("educação").expect("valid query");
    controller.apply_remote_config(Ok(RemoteConfig::default()));

    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].query, "educação");
}

#[tokio::test]
async fn failed_config_falls_back_to_default_page_size() {
    let backend = ScriptedBackend::new();
    let mut controller =
        SearchSessionController::new(Arc::new(backend.clone()), RecordingPresenter::default());

    controller.submit_manual_query("lei").expect("valid query");
    controller.apply_remote_config(Err(SearchError::ConfigUnavailable("timeout".into())));

    assert!(controller.state().config_loaded());
    assert_eq!(backend.requests()[0].size, 10);
    assert!(controller.presenter().screen().error.is_none());
}

#[tokio::test]
async fn complete_batch_replaces_exact_batch_on_new_query() {
    let (mut controller, backend) = ready_controller(20);
    controller.submit_manual_query("saude").expect("valid query");
    assert_eq!(
        controller.presenter().screen().loading,
        Some(LoadingPhase::Searching)
    );

    backend.push(0, batch("exact", items(1..=1, "Saúde pública"), true));
    next_event(&mut controller).await;
    {
        let screen = controller.presenter().screen();
        assert_eq!(screen.results.len(), 1);
        assert_eq!(screen.loading, Some(LoadingPhase::SemanticPending));
        assert!(!screen.load_more);
    }
    assert!(controller.state().is_loading());
    assert!(controller.state().has_more());

    backend.push(0, batch("complete", items(5..=7, "Saúde pública"), true));
    next_event(&mut controller).await;

    let screen = controller.presenter().screen();
    assert_eq!(screen.headings(), vec!["1. PL 5/2024", "2. PL 6/2024", "3. PL 7/2024"]);
    assert_eq!(screen.results[0].summary, "<mark>Saúde</mark> pública");
    assert_eq!(screen.loading, None);
    assert!(screen.load_more);
    assert!(!screen.end_of_results);
    assert_eq!(controller.state().rendered_count(), 3);
    assert_eq!(controller.state().phase(), SearchPhase::Loaded);
}

#[tokio::test]
async fn superseded_session_cannot_touch_new_results() {
    let (mut controller, backend) = ready_controller(20);

    controller.submit_manual_query("saude").expect("valid query");
    let stale = controller.state().active_session().expect("first session");
    controller.submit_manual_query("educação").expect("valid query");
    let current = controller.state().active_session().expect("second session");
    assert_ne!(stale, current);
    assert_eq!(backend.stream_count(), 2);

    // A late event from the first session, already queued or not
    let late = ResultBatch::parse_stream_message(&batch("complete", items(1..=3, "saude"), false))
        .expect("valid batch")
        .1;
    controller.handle_session_event(SessionEvent {
        session: stale,
        update: SessionUpdate::Completed(late),
    });
    backend.push(0, batch("complete", items(1..=3, "saude"), false));
    assert!(controller.presenter().screen().results.is_empty());
    assert!(controller.state().is_loading());

    backend.push(1, batch("complete", items(9..=9, "Educação infantil"), false));
    let applied = next_event(&mut controller).await;
    assert_eq!(applied, current);

    let screen = controller.presenter().screen();
    assert_eq!(screen.headings(), vec!["1. PL 9/2024"]);
    assert_eq!(screen.results[0].summary, "<mark>Educação</mark> infantil");
    assert_eq!(controller.state().active_session(), None);
}

#[tokio::test]
async fn load_next_page_is_ignored_while_loading() {
    let (mut controller, backend) = ready_controller(20);
    controller.submit_manual_query("lei").expect("valid query");
    backend.push(0, batch("exact", items(1..=2, "lei"), true));
    next_event(&mut controller).await;

    assert!(controller.state().has_more());
    assert!(!controller.load_next_page());
    assert!(!controller.on_visibility_trigger());
    assert_eq!(controller.state().page_index(), 0);
    assert_eq!(backend.stream_count(), 1);
}

#[tokio::test]
async fn pagination_appends_and_continues_numbering() {
    let (mut controller, backend) = ready_controller(2);
    controller.submit_manual_query("lei").expect("valid query");
    backend.push(0, batch("complete", items(1..=2, "lei"), true));
    next_event(&mut controller).await;

    assert!(controller.load_next_page());
    let request = &backend.requests()[1];
    assert_eq!((request.page, request.size), (1, 2));
    assert!(controller.presenter().screen().error.is_none());

    backend.push(1, batch("exact", items(3..=3, "lei"), true));
    next_event(&mut controller).await;
    assert_eq!(controller.presenter().screen().results.len(), 3);

    // The page's complete batch lands after its exact items
    backend.push(1, batch("complete", items(4..=5, "lei"), false));
    next_event(&mut controller).await;

    let screen = controller.presenter().screen();
    assert_eq!(
        screen.headings(),
        vec![
            "1. PL 1/2024",
            "2. PL 2/2024",
            "3. PL 3/2024",
            "4. PL 4/2024",
            "5. PL 5/2024"
        ]
    );
    assert!(!screen.load_more);
    assert!(screen.end_of_results);
    assert!(screen.error.is_none());
}

#[tokio::test]
async fn empty_new_query_shows_no_results_error() {
    let (mut controller, backend) = ready_controller(20);
    controller.submit_manual_query("xyzzy").expect("valid query");
    backend.push(0, batch("complete", vec![], false));
    next_event(&mut controller).await;

    let screen = controller.presenter().screen();
    assert_eq!(screen.error.as_deref(), Some(MSG_NO_RESULTS));
    assert!(!screen.end_of_results);
    assert!(!screen.load_more);
}

#[tokio::test]
async fn empty_new_query_with_visible_chips_stays_quiet() {
    let (mut controller, backend) = ready_controller(20);
    controller.submit_manual_query("lei").expect("valid query");
    backend.push(
        0,
        batch_with_filters("complete", vec![], false, json!({"Autor": ["Maria"]})),
    );
    next_event(&mut controller).await;

    let screen = controller.presenter().screen();
    assert!(screen.error.is_none());
    assert_eq!(screen.filters.get("Autor"), Some(&["Maria".to_string()][..]));
}

#[tokio::test]
async fn empty_page_after_results_shows_end_of_results() {
    let (mut controller, backend) = ready_controller(2);
    controller.submit_manual_query("lei").expect("valid query");
    backend.push(0, batch("complete", items(1..=2, "lei"), true));
    next_event(&mut controller).await;

    assert!(controller.load_next_page());
    backend.push(1, batch("complete", vec![], false));
    next_event(&mut controller).await;

    let screen = controller.presenter().screen();
    assert!(screen.end_of_results);
    assert!(screen.error.is_none());
    assert_eq!(screen.results.len(), 2);
}

#[tokio::test]
async fn empty_page_with_nothing_rendered_shows_no_more_results() {
    let (mut controller, backend) = ready_controller(2);
    controller.submit_manual_query("lei").expect("valid query");
    // Backend claims more results but sends none
    backend.push(0, batch("complete", vec![], true));
    next_event(&mut controller).await;
    assert_eq!(controller.presenter().screen().error.as_deref(), Some(MSG_NO_RESULTS));

    assert!(controller.load_next_page());
    backend.push(1, batch("complete", vec![], false));
    next_event(&mut controller).await;

    let screen = controller.presenter().screen();
    assert_eq!(screen.error.as_deref(), Some(MSG_NO_MORE_RESULTS));
    assert!(!screen.end_of_results);
}

#[tokio::test]
async fn removing_a_chip_requeries_without_resetting_exclusions() {
    let (mut controller, backend) = ready_controller(20);
    controller.submit_manual_query("lei").expect("valid query");
    backend.push(
        0,
        batch_with_filters(
            "complete",
            items(1..=2, "lei"),
            true,
            json!({"Autor": ["Maria", "João"], "Ano": ["2024"]}),
        ),
    );
    next_event(&mut controller).await;
    assert!(backend.requests()[0].excluded_filters.is_none());

    assert!(controller.remove_filter_value(FilterCategory::Author, "Maria"));
    {
        let screen = controller.presenter().screen();
        assert_eq!(screen.filters.get("Autor"), Some(&["João".to_string()][..]));
        assert!(screen.results.is_empty());
    }

    let refresh = &backend.requests()[1];
    assert_eq!(refresh.page, 0);
    assert_eq!(refresh.query, "lei");
    let excluded: serde_json::Value =
        serde_json::from_str(refresh.excluded_filters.as_deref().expect("exclusions sent"))
            .expect("valid json");
    assert_eq!(excluded, json!({"Autor": ["Maria"]}));
    assert!(controller.filters().is_excluded(FilterCategory::Author, "Maria"));

    // Removing the last value of a category drops the group
    assert!(controller.remove_filter_value(FilterCategory::Year, "2024"));
    assert_eq!(controller.presenter().screen().filters.get("Ano"), None);

    // Removing an already excluded value still refreshes page 0
    let streams_before = backend.stream_count();
    assert!(!controller.remove_filter_value(FilterCategory::Year, "2024"));
    assert_eq!(backend.stream_count(), streams_before + 1);
    let refresh = backend.requests().last().cloned().expect("request");
    assert_eq!((refresh.query.as_str(), refresh.page), ("lei", 0));
    assert!(controller.state().is_loading());

    // A manual query clears every exclusion
    controller.submit_manual_query("lei").expect("valid query");
    assert!(controller.filters().is_empty());
    assert!(backend.requests().last().expect("request").excluded_filters.is_none());
}

#[tokio::test]
async fn error_batch_surfaces_generic_failure() {
    let (mut controller, backend) = ready_controller(20);
    controller.submit_manual_query("lei").expect("valid query");
    backend.push(0, r#"{"resultType":"error"}"#);
    next_event(&mut controller).await;

    let screen = controller.presenter().screen();
    assert_eq!(screen.error.as_deref(), Some(MSG_SEARCH_FAILED));
    assert_eq!(screen.loading, None);
    assert!(!controller.state().is_loading());
    assert_eq!(controller.state().phase(), SearchPhase::Errored);
    assert!(controller.state().active().is_none());
}

#[tokio::test]
async fn malformed_payload_is_treated_as_error() {
    let (mut controller, backend) = ready_controller(20);
    controller.submit_manual_query("lei").expect("valid query");
    backend.push(0, "{not json");
    next_event(&mut controller).await;

    assert_eq!(
        controller.presenter().screen().error.as_deref(),
        Some(MSG_SEARCH_FAILED)
    );
    assert!(!controller.state().is_loading());
}

#[tokio::test]
async fn stream_closing_after_exact_is_a_transport_failure() {
    let (mut controller, backend) = ready_controller(20);
    controller.submit_manual_query("lei").expect("valid query");
    backend.push(0, batch("exact", items(1..=1, "lei"), false));
    backend.close(0);

    next_event(&mut controller).await;
    next_event(&mut controller).await;

    let screen = controller.presenter().screen();
    assert_eq!(screen.error.as_deref(), Some(MSG_SEARCH_FAILED));
    assert_eq!(screen.results.len(), 1);
    assert!(!controller.state().is_loading());
}

#[tokio::test]
async fn transport_error_is_surfaced() {
    let (mut controller, backend) = ready_controller(20);
    controller.submit_manual_query("lei").expect("valid query");
    backend.push_error(0, SearchError::Transport("connection reset".into()));
    next_event(&mut controller).await;

    assert_eq!(
        controller.presenter().screen().error.as_deref(),
        Some(MSG_SEARCH_FAILED)
    );
}

#[tokio::test]
async fn cancel_is_silent_and_idempotent() {
    let (mut controller, backend) = ready_controller(20);
    controller.submit_manual_query("lei").expect("valid query");

    controller.cancel_active_search();
    controller.cancel_active_search();

    assert!(!controller.state().is_loading());
    assert!(controller.state().active().is_none());
    assert_eq!(controller.state().phase(), SearchPhase::Idle);
    let screen = controller.presenter().screen();
    assert!(screen.error.is_none());
    assert_eq!(screen.loading, None);
    drop(screen);

    wait_for_condition(|| backend.is_stream_dropped(0), 5)
        .await
        .expect("cancelled session releases its stream");
}

#[tokio::test]
async fn failed_page_can_be_requested_again() {
    let (mut controller, backend) = ready_controller(2);
    controller.submit_manual_query("lei").expect("valid query");
    backend.push(0, batch("complete", items(1..=2, "lei"), true));
    next_event(&mut controller).await;

    assert!(controller.load_next_page());
    backend.push(1, r#"{"resultType":"error"}"#);
    next_event(&mut controller).await;

    assert_eq!(controller.state().page_index(), 0);
    assert_eq!(controller.state().rendered_count(), 2);
    assert!(controller.state().can_load_more());
    {
        let screen = controller.presenter().screen();
        assert!(screen.load_more);
        assert_eq!(screen.error.as_deref(), Some(MSG_SEARCH_FAILED));
    }

    assert!(controller.load_next_page());
    assert_eq!(backend.requests()[2].page, 1);
}

#[tokio::test]
async fn failed_page_keeps_its_exact_items() {
    let (mut controller, backend) = ready_controller(2);
    controller.submit_manual_query("lei").expect("valid query");
    backend.push(0, batch("complete", items(1..=2, "lei"), true));
    next_event(&mut controller).await;

    assert!(controller.load_next_page());
    backend.push(1, batch("exact", items(3..=3, "lei"), true));
    next_event(&mut controller).await;
    backend.push(1, r#"{"resultType":"error"}"#);
    next_event(&mut controller).await;

    // Shown items stay and the page counts as fetched
    assert_eq!(controller.state().page_index(), 1);
    assert_eq!(controller.state().rendered_count(), 3);
    assert!(!controller.state().is_loading());
    let screen = controller.presenter().screen();
    assert_eq!(
        screen.headings(),
        vec!["1. PL 1/2024", "2. PL 2/2024", "3. PL 3/2024"]
    );
    assert_eq!(screen.error.as_deref(), Some(MSG_SEARCH_FAILED));
    assert!(screen.load_more);
}

#[tokio::test]
async fn pagination_stops_at_max_results_limit() {
    let backend = ScriptedBackend::new();
    let mut controller =
        SearchSessionController::new(Arc::new(backend.clone()), RecordingPresenter::default());
    controller.apply_remote_config(Ok(RemoteConfig {
        default_page_size: Some(2),
        max_results_limit: Some(4),
    }));

    controller.submit_manual_query("lei").expect("valid query");
    backend.push(0, batch("complete", items(1..=2, "lei"), true));
    next_event(&mut controller).await;

    assert!(controller.load_next_page());
    backend.push(1, batch("complete", items(3..=4, "lei"), true));
    next_event(&mut controller).await;

    // The backend still says more, but the next page would start at the limit
    assert!(!controller.state().has_more());
    {
        let screen = controller.presenter().screen();
        assert!(!screen.load_more);
        assert!(screen.end_of_results);
    }

    assert!(!controller.load_next_page());
    assert_eq!(backend.stream_count(), 2);
    let screen = controller.presenter().screen();
    assert!(!screen.load_more);
    assert!(screen.end_of_results);
}

#[tokio::test]
async fn run_loop_parks_queries_until_config_resolves() {
    let (backend, gate) = ScriptedBackend::with_config_gate();
    let presenter = RecordingPresenter::default();
    let controller = SearchSessionController::new(Arc::new(backend.clone()), presenter.clone());

    let (commands, commands_rx) = mpsc::channel(8);
    let running = tokio::spawn(controller.run(commands_rx));

    commands
        .send(UserCommand::Submit("lei".into()))
        .await
        .expect("controller running");
    commands
        .send(UserCommand::NextPage)
        .await
        .expect("controller running");
    tokio::task::yield_now().await;
    assert_eq!(backend.stream_count(), 0);

    gate.send(Ok(RemoteConfig {
        default_page_size: Some(20),
        max_results_limit: None,
    }))
    .expect("controller waiting for config");
    wait_for_condition(|| backend.stream_count() == 1, 5)
        .await
        .expect("deferred search starts");
    assert_eq!(backend.requests()[0].size, 20);

    backend.push(0, batch("complete", items(1..=1, "lei"), false));
    wait_for_condition(|| presenter.screen().results.len() == 1, 5)
        .await
        .expect("results rendered");

    commands.send(UserCommand::Quit).await.expect("controller running");
    let controller = running.await.expect("run loop finishes");
    assert_eq!(controller.state().rendered_count(), 1);
    assert!(controller.state().active().is_none());
}
