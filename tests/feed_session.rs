//! Integration tests for a dashboard session: reset, load more, stale
//! responses, backend failures and the sidebar apply round-trip.
//!
//! Each test drives `App` against its own mock backend, running the fetch
//! jobs inline instead of through the spawned tasks.

use govfeed::api::{ApiClient, SourceId};
use govfeed::app::App;
use govfeed::config::Config;
use govfeed::feed::{LoadState, SortMode, BACKEND_UNREACHABLE};
use govfeed::sidebar::DraftField;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn item(id: &str, source: &str, score: f64) -> Value {
    json!({
        "id": id,
        "source": source,
        "source_type": "contract",
        "title": format!("Opportunity {}", id),
        "description": "Counter-UAS sensor integration",
        "agency": "Department of the Army",
        "posted_date": "2026-10-01",
        "deadline": "2026-11-15",
        "url": format!("https://sam.gov/opp/{}", id),
        "relevance_score": score,
        "is_mock": false
    })
}

fn page(items: Vec<Value>, has_more: bool) -> Value {
    json!({
        "items": items,
        "total": 40,
        "has_more": has_more,
        "source_counts": { "sam": 30, "usaspending": 6, "grants": 4 }
    })
}

fn app_for(server: &MockServer, page_size: usize) -> App {
    let config = Config {
        page_size,
        ..Config::default()
    };
    let client = ApiClient::new(&server.uri()).unwrap();
    App::new(Arc::new(client), &config).unwrap()
}

/// Issue a reset and fold its response back in.
async fn reset(app: &mut App) -> Option<u64> {
    let job = app.request_reset();
    let result = job.run(&app.client).await;
    app.handle_feed_loaded(job.ticket, result)
}

// ============================================================================
// Reset & Load More
// ============================================================================

#[tokio::test]
async fn test_reset_replaces_list_and_highlights_everything() {
    let server = MockServer::start().await;
    let mut body = page(
        vec![item("a", "SAM.gov", 40.0), item("b", "Grants.gov", 90.0)],
        true,
    );
    body["profile"] = json!({ "keywords": "counter-UAS", "focus": "drone defense" });
    Mock::given(method("GET"))
        .and(path("/api/feed/"))
        .and(query_param("page", "0"))
        .and(query_param("limit", "2"))
        .and(query_param("user_id", "default"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(&server)
        .await;

    let mut app = app_for(&server, 2);
    let highlight = reset(&mut app).await;

    assert!(highlight.is_some());
    assert_eq!(app.feed.load_state(), LoadState::Idle);
    assert_eq!(app.feed.items().len(), 2);
    assert_eq!(app.feed.new_count(), 2);
    assert!(app.feed.is_new("a"));
    assert_eq!(app.feed.offset(), 2);
    assert!(app.feed.can_load_more());
    assert_eq!(app.feed.source_count(SourceId::Grants), Some(4));
    assert!(app.feed.last_updated().is_some());

    // Relevance order puts the higher score first.
    let ids: Vec<&str> = app.sorted_items().iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["b", "a"]);

    // The server profile is adopted and the untouched sidebar follows it.
    assert_eq!(app.profile.keywords, "counter-UAS");
    assert_eq!(app.sidebar.keywords(), "counter-UAS");
    assert_eq!(app.sidebar.focus(), "drone defense");

    app.handle_highlight_expired(highlight.unwrap());
    assert_eq!(app.feed.new_count(), 0);
}

#[tokio::test]
async fn test_load_more_appends_next_page_without_duplicates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/feed/"))
        .and(query_param("page", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(
            vec![item("a", "SAM.gov", 80.0), item("b", "SAM.gov", 70.0)],
            true,
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/feed/"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(
            vec![item("b", "SAM.gov", 70.0), item("c", "USASpending.gov", 60.0)],
            false,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let mut app = app_for(&server, 2);
    let highlight = reset(&mut app).await;

    let job = app.request_more().expect("a next page is available");
    assert_eq!(app.feed.load_state(), LoadState::LoadingMore);
    // A second request while one is in flight is refused.
    assert!(app.request_more().is_none());

    let result = job.run(&app.client).await;
    assert_eq!(app.handle_feed_loaded(job.ticket, result), None);

    let ids: Vec<&str> = app.feed.items().iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
    assert_eq!(app.feed.offset(), 4);
    assert!(!app.feed.has_more());
    assert!(app.request_more().is_none());

    // Appended items are not part of the reset highlight.
    assert!(!app.feed.is_new("c"));
    assert!(app.feed.is_new("a"));
    app.handle_highlight_expired(highlight.unwrap());
    assert!(!app.feed.is_new("a"));
}

#[tokio::test]
async fn test_superseded_reset_response_is_discarded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/feed/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(page(vec![item("a", "SAM.gov", 50.0)], false)),
        )
        .mount(&server)
        .await;

    let mut app = app_for(&server, 15);
    let first = app.request_reset();
    let second = app.request_reset();

    let result = first.run(&app.client).await;
    assert_eq!(app.handle_feed_loaded(first.ticket, result), None);
    assert!(app.feed.items().is_empty());
    assert_eq!(app.feed.load_state(), LoadState::LoadingInitial);

    let result = second.run(&app.client).await;
    assert!(app.handle_feed_loaded(second.ticket, result).is_some());
    assert_eq!(app.feed.items().len(), 1);
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_backend_error_keeps_items_and_sets_banner() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/feed/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(page(vec![item("a", "SAM.gov", 50.0)], false)),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/feed/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let mut app = app_for(&server, 15);
    reset(&mut app).await;
    assert_eq!(app.feed.error(), None);

    assert_eq!(reset(&mut app).await, None);
    assert_eq!(app.feed.error(), Some(BACKEND_UNREACHABLE));
    assert_eq!(app.feed.items().len(), 1);
    assert_eq!(app.feed.load_state(), LoadState::Idle);
    assert!(app.can_refresh());
}

#[tokio::test]
async fn test_unreachable_backend_sets_banner() {
    // Nothing listens on port 9 on a test machine.
    let client = ApiClient::new("http://127.0.0.1:9").unwrap();
    let mut app = App::new(Arc::new(client), &Config::default()).unwrap();

    reset(&mut app).await;
    assert_eq!(app.feed.error(), Some(BACKEND_UNREACHABLE));
    assert!(app.feed.items().is_empty());
}

// ============================================================================
// Sidebar Apply
// ============================================================================

#[tokio::test]
async fn test_apply_pushes_profile_and_refetches_with_new_settings() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/profile/update"))
        .and(body_partial_json(json!({
            "user_id": "default",
            "keywords": "hypersonics",
            "openai_api_key": "sk-x"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "profile": { "keywords": "hypersonics", "focus": "", "org_type": "startup" }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/feed/"))
        .and(query_param("sources", "sam"))
        .and(query_param("openai_key", "sk-x"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(page(vec![item("h", "SAM.gov", 95.0)], false)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut app = app_for(&server, 15);
    app.sidebar.clear_field(DraftField::Keywords);
    app.sidebar.clear_field(DraftField::Focus);
    app.sidebar.clear_field(DraftField::ApiKey);
    for c in "hypersonics".chars() {
        app.sidebar.push_char(DraftField::Keywords, c);
    }
    for c in "sk-x".chars() {
        app.sidebar.push_char(DraftField::ApiKey, c);
    }
    app.sidebar.toggle_source(SourceId::UsaSpending);
    app.sidebar.toggle_source(SourceId::Grants);
    app.sidebar.set_sort(SortMode::Date);

    let request = app.begin_apply().expect("apply is allowed");
    assert!(app.sidebar.is_applying());
    assert!(app.begin_apply().is_none());

    let applied = request.resolve(&app.client, &app.user_id).await;
    assert!(applied.confirmed);

    let job = app.apply_settings(applied);
    assert!(!app.sidebar.is_applying());
    assert!(!app.sidebar.is_dirty());
    assert_eq!(app.active_sources, vec![SourceId::Sam]);
    assert_eq!(app.sort, SortMode::Date);
    assert_eq!(app.profile.org_type, "startup");
    assert_eq!(app.feed.load_state(), LoadState::LoadingInitial);

    let result = job.run(&app.client).await;
    app.handle_feed_loaded(job.ticket, result);
    assert_eq!(app.feed.items()[0].id, "h");
}

#[tokio::test]
async fn test_apply_failure_falls_back_to_local_profile() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/profile/update"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/feed/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(vec![], false)))
        .expect(1)
        .mount(&server)
        .await;

    let mut app = app_for(&server, 15);
    app.sidebar.apply_preset(0);
    let keywords = app.sidebar.keywords().to_string();

    let request = app.begin_apply().unwrap();
    let applied = request.resolve(&app.client, &app.user_id).await;
    assert!(!applied.confirmed);

    let job = app.apply_settings(applied);
    assert_eq!(app.profile.keywords, keywords);
    assert_eq!(app.profile.org_type, "");

    // The follow-up reset still goes out.
    let result = job.run(&app.client).await;
    assert!(app.handle_feed_loaded(job.ticket, result).is_some());
    assert!(app.feed.items().is_empty());
}

// ============================================================================
// Profile Endpoints
// ============================================================================

#[tokio::test]
async fn test_profile_from_text_and_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/profile/from-text"))
        .and(body_partial_json(json!({
            "user_id": "team-7",
            "raw_input": "We build radar for small drones",
            "openai_api_key": ""
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "profile": {
                "keywords": "radar, counter-UAS",
                "focus": "Drone detection radar",
                "org_type": "small business",
                "agencies": ["Army", "DHS"]
            }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/profile/team-7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "profile": { "keywords": "radar, counter-UAS", "focus": null }
        })))
        .mount(&server)
        .await;

    let client = ApiClient::new(&server.uri()).unwrap();
    let derived = client
        .update_profile_from_text("We build radar for small drones", None, "team-7")
        .await
        .unwrap();
    assert_eq!(derived.org_type, "small business");
    assert_eq!(
        derived.agencies,
        Some(vec!["Army".to_string(), "DHS".to_string()])
    );

    let stored = client.fetch_profile("team-7").await.unwrap();
    assert_eq!(stored.keywords, "radar, counter-UAS");
    assert_eq!(stored.focus, "");
}
