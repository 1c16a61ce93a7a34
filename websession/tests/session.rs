//! Integration tests for WebSession against a wiremock server.

use std::time::Duration;

use bytes::Bytes;
use websession::{CacheStatus, Error, WebSession};
use websession_moka::MokaStore;
use wiremock::matchers::{body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn cached_session() -> WebSession {
    WebSession::builder()
        .cache(MokaStore::builder().max_capacity(100).build())
        .build()
        .unwrap()
}

#[tokio::test]
async fn cache_miss_then_hit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data"))
        .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
        .expect(1)
        .mount(&server)
        .await;

    let session = cached_session();
    let url = format!("{}/data", server.uri());

    let first = session.get(&url, &[]).await.unwrap();
    assert_eq!(first.data, Bytes::from_static(b"hello"));
    assert_eq!(first.cache_status, CacheStatus::Miss);

    let second = session.get(&url, &[]).await.unwrap();
    assert_eq!(second.data, Bytes::from_static(b"hello"));
    assert_eq!(second.cache_status, CacheStatus::Hit);
}

#[tokio::test]
async fn concurrent_requests_share_one_network_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("shared")
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;

    // No cache store: deduplication comes from coalescing alone.
    let session = WebSession::builder().build().unwrap();
    let url = format!("{}/slow", server.uri());

    let (a, b, c) = tokio::join!(
        session.get(&url, &[]),
        session.get(&url, &[]),
        session.get(&url, &[]),
    );
    for fetched in [a.unwrap(), b.unwrap(), c.unwrap()] {
        assert_eq!(fetched.data, Bytes::from_static(b"shared"));
    }
}

#[tokio::test]
async fn concurrent_identical_posts_coalesce() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/submit"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("accepted")
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let session = WebSession::builder().build().unwrap();
    let url = format!("{}/submit", server.uri());

    let (a, b) = tokio::join!(
        session.post_form(&url, &[("name", "x")]),
        session.post_form(&url, &[("name", "x")]),
    );
    assert_eq!(a.unwrap().data, Bytes::from_static(b"accepted"));
    assert_eq!(b.unwrap().data, Bytes::from_static(b"accepted"));
}

#[tokio::test]
async fn http_error_carries_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not here"))
        .expect(1)
        .mount(&server)
        .await;

    let session = cached_session();
    let url = format!("{}/missing", server.uri());

    let error = session.get(&url, &[]).await.unwrap_err();
    match error {
        Error::Http { status, body, .. } => {
            assert_eq!(status.as_u16(), 404);
            assert_eq!(body, Bytes::from_static(b"not here"));
        }
        other => panic!("expected HTTP error, got {other:?}"),
    }
}

#[tokio::test]
async fn error_responses_are_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503).set_body_string("down"))
        .expect(2)
        .mount(&server)
        .await;

    let session = cached_session();
    let url = format!("{}/flaky", server.uri());

    assert!(session.get(&url, &[]).await.unwrap_err().is_http());
    // The failure was not stored: the next read goes back to the server.
    assert!(session.get(&url, &[]).await.unwrap_err().is_http());
}

#[tokio::test]
async fn get_json_decodes_and_caches() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/items"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "count": 3 })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let session = cached_session();
    let url = format!("{}/items", server.uri());

    let first = session.get_json(&url, &[]).await.unwrap();
    assert_eq!(first.data["count"], 3);

    // The cached byte payload decodes again for the second caller.
    let second = session.get_json(&url, &[]).await.unwrap();
    assert_eq!(second.data["count"], 3);
    assert_eq!(second.cache_status, CacheStatus::Hit);
}

#[tokio::test]
async fn post_json_round_trips() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/echo"))
        .and(header("content-type", "application/json"))
        .and(body_string(r#"{"name":"ok"}"#))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": 7 })))
        .expect(1)
        .mount(&server)
        .await;

    let session = WebSession::builder().build().unwrap();
    let url = format!("{}/echo", server.uri());

    let response = session
        .post_json(&url, &serde_json::json!({ "name": "ok" }))
        .await
        .unwrap();
    assert_eq!(response.data["id"], 7);
}

#[tokio::test]
async fn posts_never_touch_the_cache() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/submit"))
        .respond_with(ResponseTemplate::new(200).set_body_string("done"))
        .expect(2)
        .mount(&server)
        .await;

    let session = cached_session();
    let url = format!("{}/submit", server.uri());

    for _ in 0..2 {
        let fetched = session.post_form(&url, &[("a", "1")]).await.unwrap();
        assert_eq!(fetched.cache_status, CacheStatus::Miss);
    }
}

#[tokio::test]
async fn query_parameters_reach_the_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "rust"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string("results"))
        .expect(1)
        .mount(&server)
        .await;

    let session = WebSession::builder().build().unwrap();
    let url = format!("{}/search", server.uri());

    let fetched = session.get(&url, &[("q", "rust"), ("page", "2")]).await.unwrap();
    assert_eq!(fetched.data, Bytes::from_static(b"results"));
}

#[tokio::test]
async fn additional_headers_reach_the_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth"))
        .and(header("X-App", "example"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let session = WebSession::builder().header("X-App", "example").build().unwrap();
    let url = format!("{}/auth", server.uri());

    session.get(&url, &[]).await.unwrap();
}

#[tokio::test]
async fn download_writes_a_temp_file_that_dies_with_its_guard() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/file.bin"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"file-bytes".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let session = cached_session();
    let url = format!("{}/file.bin", server.uri());

    let downloaded = session.download_file(&url, &[]).await.unwrap();
    let temp_path = downloaded.data.path().to_path_buf();
    assert_eq!(std::fs::read(&temp_path).unwrap(), b"file-bytes");

    drop(downloaded);
    assert!(!temp_path.exists());
}

#[tokio::test]
async fn image_reports_content_type_and_bypasses_the_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pic.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"\x89PNG fake".to_vec())
                .insert_header("content-type", "image/png"),
        )
        .expect(2)
        .mount(&server)
        .await;

    let session = cached_session();
    let url = format!("{}/pic.png", server.uri());

    for _ in 0..2 {
        let fetched = session.image(&url, &[]).await.unwrap();
        assert_eq!(fetched.data.content_type.as_deref(), Some("image/png"));
        assert_eq!(fetched.data.data, Bytes::from_static(b"\x89PNG fake"));
        assert_eq!(fetched.cache_status, CacheStatus::Miss);
    }
}
