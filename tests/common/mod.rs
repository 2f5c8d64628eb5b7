//! Common test utilities shared across integration and E2E tests

use evalgate_sandbox::{EvalGateway, GatewayConfig, OutputLimits};
use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Setup logging for tests
pub fn setup_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init();
}

/// Base URL of a mock server as a `Url`
pub fn server_url(server: &MockServer) -> Url {
    Url::parse(&server.uri()).expect("mock server uri is a valid url")
}

/// Answer every `POST /eval` with the given result
pub async fn mount_eval(server: &MockServer, stdout: &str, returncode: Option<i32>) {
    Mock::given(method("POST"))
        .and(path("/eval"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({
                "stdout": stdout,
                "returncode": returncode,
            })),
        )
        .mount(server)
        .await;
}

/// Answer every `POST /documents` with the given key
pub async fn mount_documents(server: &MockServer, key: &str) {
    Mock::given(method("POST"))
        .and(path("/documents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "key": key })))
        .mount(server)
        .await;
}

/// Gateway wired to a mock sandbox and a mock paste store
pub fn gateway_for(sandbox: &MockServer, paste: &MockServer) -> EvalGateway {
    let mut config = GatewayConfig::default();
    config.sandbox.url = server_url(sandbox);
    config.paste.url = server_url(paste);
    config.output = OutputLimits::default();
    EvalGateway::from_config(&config).expect("mock config is valid")
}
