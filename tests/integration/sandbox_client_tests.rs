//! Integration tests for the sandbox HTTP client
//!
//! These tests verify that the client:
//! - Posts `{"input": code}` to `<base>/eval`
//! - Decodes results with and without a return code
//! - Separates unreachable sandboxes from unusable answers

use assert_matches::assert_matches;
use evalgate_sandbox::{
    ExecutionResult, GatewayError, HttpSandboxClient, SandboxClient, SandboxConfig,
};
use evalgate_tests::common::{server_url, setup_test_logging};
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(base: Url) -> HttpSandboxClient {
    HttpSandboxClient::new(&SandboxConfig {
        url: base,
        timeout: None,
    })
    .unwrap()
}

#[tokio::test]
async fn test_eval_posts_input_json() {
    setup_test_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/eval"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({ "input": "print('hi')" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "stdout": "hi\n", "returncode": 0 })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(server_url(&server));
    let result = client.eval("print('hi')").await.unwrap();
    assert_eq!(result, ExecutionResult::new("hi\n", Some(0)));
}

#[tokio::test]
async fn test_null_returncode_decodes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/eval"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "stdout": "IsolationError: failed to start",
            "returncode": null,
        })))
        .mount(&server)
        .await;

    let result = client_for(server_url(&server)).eval("1").await.unwrap();
    assert_eq!(result.returncode, None);
    assert_eq!(result.stdout, "IsolationError: failed to start");
}

#[tokio::test]
async fn test_base_path_is_kept() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/snekbox/eval"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "stdout": "", "returncode": 0 })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let base = Url::parse(&format!("{}/snekbox/", server.uri())).unwrap();
    let client = client_for(base);
    assert!(client.eval_url().as_str().ends_with("/snekbox/eval"));
    client.eval("pass").await.unwrap();
}

#[tokio::test]
async fn test_error_status_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/eval"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let result = client_for(server_url(&server)).eval("1").await;
    assert_matches!(result, Err(GatewayError::SandboxResponse(_)));
}

#[tokio::test]
async fn test_undecodable_body_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/eval"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let result = client_for(server_url(&server)).eval("1").await;
    assert_matches!(result, Err(GatewayError::SandboxResponse(_)));
}

#[tokio::test]
async fn test_refused_connection_is_unreachable() {
    // Nothing listens on port 1
    let client = client_for(Url::parse("http://127.0.0.1:1").unwrap());
    let result = client.eval("1").await;
    assert_matches!(result, Err(GatewayError::SandboxUnreachable(_)));
}
