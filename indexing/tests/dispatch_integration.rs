use config::SearchConfig;
use errors::IndexError;
use gin_core::{InMemoryRepositoryStore, SearchKind, SearchRequest};
use indexing::{IndexDispatcher, IndexRebuilder, SearchClient, decrypt};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::{Duration, Instant};
use testing::{TEST_KEY_128, TEST_KEY_256, alice_repo, init_tracing, repository, search_config};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

fn decrypted_body(request: &Request, key: &str) -> Value {
    let body = String::from_utf8(request.body.clone()).unwrap();
    let plain = decrypt(key.as_bytes(), &body).unwrap();
    serde_json::from_str(&plain).unwrap()
}

#[tokio::test]
async fn test_dispatch_posts_encrypted_repository() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/index"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher =
        IndexDispatcher::new(&search_config(&format!("{}/index", server.uri()))).unwrap();
    let handle = dispatcher.start_indexing(&alice_repo()).unwrap();
    handle.await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        decrypted_body(&requests[0], TEST_KEY_128),
        json!({"RepoID": 42, "RepoPath": "alice/myrepo"})
    );
}

#[tokio::test]
async fn test_256_bit_key_is_accepted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let dispatcher = IndexDispatcher::new(&SearchConfig {
        index_url: Some(server.uri()),
        key: TEST_KEY_256.to_string(),
        ..Default::default()
    })
    .unwrap();
    dispatcher.dispatch(&alice_repo()).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(decrypted_body(&requests[0], TEST_KEY_256)["RepoID"], 42);
}

#[tokio::test]
async fn test_non_200_is_logged_not_raised() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/index"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dispatcher =
        IndexDispatcher::new(&search_config(&format!("{}/index", server.uri()))).unwrap();

    // The detached task absorbs the failure.
    dispatcher.start_indexing(&alice_repo()).unwrap().await.unwrap();

    let result = dispatcher.dispatch(&alice_repo()).await;
    assert!(matches!(
        result,
        Err(IndexError::UnexpectedStatus { status: 500, .. })
    ));
}

#[tokio::test]
async fn test_created_is_not_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;

    let dispatcher = IndexDispatcher::new(&search_config(&server.uri())).unwrap();
    assert!(matches!(
        dispatcher.dispatch(&alice_repo()).await,
        Err(IndexError::UnexpectedStatus { status: 201, .. })
    ));
}

#[tokio::test]
async fn test_disabled_indexing_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dispatcher = IndexDispatcher::new(&SearchConfig {
        index_url: None,
        key: TEST_KEY_128.to_string(),
        ..Default::default()
    })
    .unwrap();
    assert!(dispatcher.start_indexing(&alice_repo()).is_none());

    let store = Arc::new(InMemoryRepositoryStore::with_repositories(vec![alice_repo()]));
    let rebuilder = IndexRebuilder::new(store, dispatcher);
    let err = rebuilder.rebuild_index().await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Indexing service not configured: index_url is empty"
    );
}

/// Fails repository 1 and accepts every other one.
struct FailFirstRepo;

impl Respond for FailFirstRepo {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        match decrypted_body(request, TEST_KEY_128)["RepoID"].as_i64() {
            Some(1) => ResponseTemplate::new(500),
            _ => ResponseTemplate::new(200)
        }
    }
}

#[tokio::test]
async fn test_one_failed_dispatch_does_not_affect_another() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(FailFirstRepo)
        .expect(2)
        .mount(&server)
        .await;

    let dispatcher = IndexDispatcher::new(&search_config(&server.uri())).unwrap();
    let failing = dispatcher.start_indexing(&repository(1, "bob", "broken")).unwrap();
    let healthy = dispatcher.start_indexing(&repository(2, "bob", "fine")).unwrap();
    failing.await.unwrap();
    healthy.await.unwrap();

    assert!(dispatcher.dispatch(&repository(1, "bob", "broken")).await.is_err());
    assert!(dispatcher.dispatch(&repository(2, "bob", "fine")).await.is_ok());
}

#[tokio::test]
async fn test_rebuild_dispatches_every_repository() {
    init_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/index"))
        .respond_with(ResponseTemplate::new(200))
        .expect(3)
        .mount(&server)
        .await;

    let store = Arc::new(InMemoryRepositoryStore::with_repositories(vec![
        repository(1, "alice", "one"),
        repository(2, "alice", "two"),
        repository(3, "carol", "three"),
    ]));
    let dispatcher =
        IndexDispatcher::new(&search_config(&format!("{}/index", server.uri()))).unwrap();
    let rebuilder = IndexRebuilder::new(store, dispatcher);

    let scheduled = rebuilder.rebuild_index().await.unwrap();
    assert_eq!(scheduled.scheduled(), 3);
    scheduled.wait().await;

    let mut ids: Vec<i64> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter_map(|r| decrypted_body(r, TEST_KEY_128)["RepoID"].as_i64())
        .collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_max_in_flight_bounds_concurrency() {
    let delay = Duration::from_millis(150);
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(delay))
        .expect(3)
        .mount(&server)
        .await;

    let dispatcher = IndexDispatcher::new(&SearchConfig {
        max_in_flight: Some(1),
        ..search_config(&server.uri())
    })
    .unwrap();

    let started = Instant::now();
    let handles: Vec<_> = (1..=3)
        .filter_map(|id| dispatcher.start_indexing(&repository(id, "dave", "repo")))
        .collect();
    // Scheduling itself never waits on the limiter.
    assert!(started.elapsed() < delay);

    for handle in handles {
        handle.await.unwrap();
    }
    assert!(started.elapsed() >= delay * 3);
}

#[tokio::test]
async fn test_slow_service_times_out_as_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let dispatcher = IndexDispatcher::new(&SearchConfig {
        request_timeout_secs: 1,
        ..search_config(&server.uri())
    })
    .unwrap();

    assert!(matches!(
        dispatcher.dispatch(&alice_repo()).await,
        Err(IndexError::Transport { .. })
    ));
}

#[tokio::test]
async fn test_unreachable_service_is_transport_error() {
    // Nothing listens on the discard port.
    let dispatcher = IndexDispatcher::new(&search_config("http://127.0.0.1:9/index")).unwrap();
    let err = dispatcher.dispatch(&alice_repo()).await.unwrap_err();
    assert_eq!(err.kind(), "transport");

    dispatcher.start_indexing(&alice_repo()).unwrap().await.unwrap();
}

fn search_client(server: &MockServer) -> SearchClient {
    SearchClient::new(&SearchConfig {
        search_url: Some(format!("{}/search", server.uri())),
        key: TEST_KEY_128.to_string(),
        ..Default::default()
    })
    .unwrap()
}

#[tokio::test]
async fn test_search_sends_encrypted_query_and_parses_results() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Blobs": [{
                "_source": {
                    "GinRepoName": "alice/myrepo",
                    "GinRepoId": "42",
                    "FirstCommit": "4b825dc6",
                    "Id": 7,
                    "Oid": [1, 2, 3],
                    "IndexingTime": "2024-03-01T12:00:00Z",
                    "Content": "spike sorting",
                    "Path": "analysis/README.md"
                },
                "_score": 1.5,
                "highlight": {"Content": ["<em>spike</em> sorting"]}
            }],
            "Commits": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = search_client(&server);
    let request = SearchRequest {
        user_id: 42,
        query: "spike".to_string(),
        kind: SearchKind::Fuzzy,
        ..Default::default()
    };
    let results = client.search(&request).await.unwrap();

    assert_eq!(results.blobs.len(), 1);
    assert!(results.commits.is_empty());
    let blob = results.blobs[0].source.as_ref().unwrap();
    assert_eq!(blob.repo_name, "alice/myrepo");
    assert_eq!(blob.path, "analysis/README.md");
    assert!((results.blobs[0].score - 1.5).abs() < f64::EPSILON);

    let sent = decrypted_body(&server.received_requests().await.unwrap()[0], TEST_KEY_128);
    assert_eq!(sent["Querry"], "spike");
    assert_eq!(sent["SType"], 1);
    assert_eq!(sent["UserID"], 42);
}

#[tokio::test]
async fn test_search_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let result = search_client(&server).search(&SearchRequest::default()).await;
    assert!(matches!(
        result,
        Err(IndexError::UnexpectedStatus { status: 500, .. })
    ));
}

#[tokio::test]
async fn test_search_garbage_body_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let result = search_client(&server).search(&SearchRequest::default()).await;
    assert!(matches!(result, Err(IndexError::InvalidResponse { .. })));
}
