//! Request pipeline behavior: auth refresh, retries, limiter setup and
//! cancellation. Sequenced responses use wiremock.

use crate::integration::mock_server::{fast_backoff, BASIC_TOKEN};
use reqwest::Method;
use serde_json::json;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use swarm_client::{
    with_cancellation, with_timeout, AuthType, ClientConfig, Error, ListProjectsOptions,
    SwarmClient, SwarmClientBuilder,
};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PROJECTS: &str = "/api/v9/projects";
const PROBE: &str = "/api/v9/";

fn builder(server: &MockServer) -> SwarmClientBuilder {
    SwarmClient::builder()
        .config(ClientConfig::default())
        .base_url(server.uri())
        .with_backoff(fast_backoff())
}

fn empty_projects() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "projects": [] }))
}

async fn mount_once(server: &MockServer, status: u16) {
    Mock::given(method("GET"))
        .and(path(PROJECTS))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({ "error": "nope" })))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(server)
        .await;
}

async fn mount_always(server: &MockServer, template: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(PROJECTS))
        .respond_with(template)
        .mount(server)
        .await;
}

async fn hits(server: &MockServer, p: &str) -> Vec<wiremock::Request> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.url.path() == p)
        .collect()
}

async fn list(client: &SwarmClient) -> swarm_client::Result<()> {
    client
        .projects()
        .list(&ListProjectsOptions::default(), &[])
        .await
        .map(|_| ())
}

#[tokio::test]
async fn basic_auth_refreshes_once_after_401() {
    let server = MockServer::start().await;
    mount_once(&server, 401).await;
    mount_always(&server, empty_projects()).await;
    let client = builder(&server).basic_auth("u", "p").unwrap();

    list(&client).await.unwrap();

    assert_eq!(client.auth().refresh_count(), 2);
    let requests = hits(&server, PROJECTS).await;
    assert_eq!(requests.len(), 2);
    for r in &requests {
        let auth = r.headers.get("authorization").unwrap().to_str().unwrap();
        assert_eq!(auth, BASIC_TOKEN);
    }
}

#[tokio::test]
async fn second_401_is_terminal() {
    let server = MockServer::start().await;
    mount_always(
        &server,
        ResponseTemplate::new(401).set_body_json(json!({ "error": "Unauthorized" })),
    )
    .await;
    let client = builder(&server).basic_auth("u", "p").unwrap();

    let err = list(&client).await.unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert_eq!(err.api().unwrap().message, "{error: Unauthorized}");
    assert_eq!(client.auth().refresh_count(), 2);
    assert_eq!(hits(&server, PROJECTS).await.len(), 2);
}

#[tokio::test]
async fn token_schemes_do_not_refresh_on_401() {
    let server = MockServer::start().await;
    mount_always(&server, ResponseTemplate::new(401)).await;
    let client = builder(&server)
        .token(AuthType::PrivateToken, "secret-token")
        .unwrap();

    let err = list(&client).await.unwrap_err();
    assert_eq!(err.status(), Some(401));
    let requests = hits(&server, PROJECTS).await;
    assert_eq!(requests.len(), 1);
    let sent = requests[0].headers.get("private-token").unwrap().to_str().unwrap();
    assert_eq!(sent, "secret-token");
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn missing_credentials_fail_before_sending() {
    let server = MockServer::start().await;
    mount_always(&server, empty_projects()).await;
    let client = builder(&server).basic_auth("u", "").unwrap();

    let err = list(&client).await.unwrap_err();
    assert!(matches!(err, Error::MissingCredentials));
    assert!(hits(&server, PROJECTS).await.is_empty());
}

#[tokio::test]
async fn server_errors_are_retried_with_hooks() {
    let server = MockServer::start().await;
    mount_once(&server, 500).await;
    mount_always(&server, empty_projects()).await;

    let attempts = Arc::new(AtomicU32::new(0));
    let statuses = Arc::new(Mutex::new(Vec::new()));
    let client = {
        let attempts = attempts.clone();
        let statuses = statuses.clone();
        builder(&server)
            .on_request(move |_, attempt| {
                attempts.fetch_max(attempt + 1, Ordering::SeqCst);
            })
            .on_response(move |resp| {
                statuses.lock().unwrap().push(resp.status.as_u16());
            })
            .basic_auth("u", "p")
            .unwrap()
    };

    list(&client).await.unwrap();
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
    assert_eq!(*statuses.lock().unwrap(), vec![500, 200]);
}

#[tokio::test]
async fn rate_limited_responses_are_retried() {
    let server = MockServer::start().await;
    mount_once(&server, 429).await;
    mount_always(&server, empty_projects()).await;
    let client = SwarmClient::builder()
        .config(ClientConfig::default())
        .base_url(server.uri())
        .retry_wait(Duration::from_millis(1), Duration::from_millis(5))
        .basic_auth("u", "p")
        .unwrap();

    let start = Instant::now();
    list(&client).await.unwrap();
    assert!(start.elapsed() < Duration::from_secs(2));
    assert_eq!(hits(&server, PROJECTS).await.len(), 2);
}

#[tokio::test]
async fn exhausted_retries_surface_last_response() {
    let server = MockServer::start().await;
    mount_always(&server, ResponseTemplate::new(503)).await;
    let client = builder(&server).retry_max(2).basic_auth("u", "p").unwrap();

    let err = list(&client).await.unwrap_err();
    assert_eq!(err.status(), Some(503));
    assert_eq!(hits(&server, PROJECTS).await.len(), 3);
}

#[tokio::test]
async fn disabled_retries_send_once() {
    let server = MockServer::start().await;
    mount_always(&server, ResponseTemplate::new(503)).await;
    let client = builder(&server).without_retries().basic_auth("u", "p").unwrap();

    let err = list(&client).await.unwrap_err();
    assert_eq!(err.status(), Some(503));
    assert_eq!(hits(&server, PROJECTS).await.len(), 1);
}

#[tokio::test]
async fn limiter_is_configured_once_under_concurrency() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PROBE))
        .respond_with(ResponseTemplate::new(200).insert_header("RateLimit-Limit", "60000"))
        .mount(&server)
        .await;
    mount_always(&server, empty_projects()).await;
    let client = Arc::new(builder(&server).basic_auth("u", "p").unwrap());
    assert!(!client.limiter_configured());

    let mut handles = Vec::new();
    for _ in 0..16 {
        let client = client.clone();
        handles.push(tokio::spawn(async move { list(&client).await }));
    }
    for h in handles {
        h.await.unwrap().unwrap();
    }

    assert!(client.limiter_configured());
    let probes = hits(&server, PROBE).await;
    assert_eq!(probes.len(), 1);
    assert!(probes[0].headers.get("authorization").is_none());
    assert_eq!(hits(&server, PROJECTS).await.len(), 16);
    assert_eq!(client.auth().refresh_count(), 1);
}

#[tokio::test]
async fn advertised_limit_throttles_requests() {
    let server = MockServer::start().await;
    // 120/min => 1.32 req/s sustained, burst of one
    Mock::given(method("GET"))
        .and(path(PROBE))
        .respond_with(ResponseTemplate::new(200).insert_header("RateLimit-Limit", "120"))
        .mount(&server)
        .await;
    mount_always(&server, empty_projects()).await;
    let client = builder(&server).basic_auth("u", "p").unwrap();

    let start = Instant::now();
    list(&client).await.unwrap();
    list(&client).await.unwrap();
    assert!(start.elapsed() >= Duration::from_millis(500), "{:?}", start.elapsed());
}

#[tokio::test]
async fn unreachable_probe_leaves_client_unlimited() {
    let client = SwarmClient::builder()
        .config(ClientConfig::default())
        .base_url("http://127.0.0.1:1")
        .basic_auth("u", "p")
        .unwrap();

    let err = list(&client).await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)), "{err:?}");
    assert!(client.limiter_configured());
}

#[tokio::test]
async fn timeout_option_bounds_the_call() {
    let server = MockServer::start().await;
    mount_always(&server, empty_projects().set_delay(Duration::from_secs(3))).await;
    let client = builder(&server).basic_auth("u", "p").unwrap();

    let start = Instant::now();
    let err = client
        .projects()
        .list(
            &ListProjectsOptions::default(),
            &[with_timeout(Duration::from_millis(200))],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::DeadlineExceeded), "{err:?}");
    assert!(start.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn cancelled_call_sends_nothing() {
    let server = MockServer::start().await;
    mount_always(&server, empty_projects()).await;
    let client = builder(&server).basic_auth("u", "p").unwrap();

    let token = CancellationToken::new();
    token.cancel();
    let err = client
        .projects()
        .list(&ListProjectsOptions::default(), &[with_cancellation(token)])
        .await
        .unwrap_err();
    assert!(err.is_cancellation());
    assert!(hits(&server, PROJECTS).await.is_empty());
}

#[tokio::test]
async fn raw_body_is_streamed_to_writer() {
    let server = MockServer::start().await;
    mount_always(
        &server,
        ResponseTemplate::new(200).set_body_string("change 42 submitted"),
    )
    .await;
    let client = builder(&server).basic_auth("u", "p").unwrap();

    let req = client
        .new_request::<()>(Method::GET, "projects", None, &[])
        .unwrap();
    let mut out: Vec<u8> = Vec::new();
    let resp = client.execute_raw(req, &mut out).await.unwrap();
    assert_eq!(resp.status.as_u16(), 200);
    assert_eq!(out, b"change 42 submitted");
}

#[tokio::test]
async fn api_error_reports_the_requested_url_after_redirect() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v9/projects/old"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("location", "/api/v9/projects/new"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v9/projects/new"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "error": "Not Found" })))
        .mount(&server)
        .await;
    let client = builder(&server).basic_auth("u", "p").unwrap();

    let err = client.projects().get("old", &[]).await.unwrap_err();
    let resp = err.response().expect("api error keeps the response");
    assert_eq!(resp.url.path(), "/api/v9/projects/old");
    assert_eq!(resp.final_url.path(), "/api/v9/projects/new");
    let shown = err.to_string();
    assert!(shown.contains("/api/v9/projects/old: 404 {error: Not Found}"), "{shown}");
}
