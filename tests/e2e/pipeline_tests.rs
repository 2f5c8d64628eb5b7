//! End-to-end tests: submission text in, rendered output out
//!
//! Both remote services are wiremock servers, so every request the gateway
//! makes is observable.

use assert_matches::assert_matches;
use evalgate_sandbox::{
    GatewayError, PasteLink, PipelineStage, StatusKind, SubmissionRequest, ESCAPE_WARNING,
};
use evalgate_tests::common::{gateway_for, mount_documents, mount_eval, setup_test_logging};
use serde_json::json;
use std::collections::HashSet;
use std::time::Duration;
use wiremock::matchers::{body_json, body_string, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_fenced_hello_world() {
    setup_test_logging();
    let sandbox = MockServer::start().await;
    let paste = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/eval"))
        .and(body_json(json!({ "input": "print(\"hi\")" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "stdout": "hi\n", "returncode": 0 })),
        )
        .expect(1)
        .mount(&sandbox)
        .await;

    let gateway = gateway_for(&sandbox, &paste);
    let outcome = gateway
        .submit(SubmissionRequest::new("```python\nprint(\"hi\")\n```"))
        .await
        .unwrap();

    assert_eq!(outcome.status.headline, "completed with code 0");
    assert_eq!(outcome.rendered.display_text, "hi");
    assert_eq!(outcome.rendered.paste_link, None);
    assert!(!outcome.rendered.truncated);
    assert_eq!(
        outcome.stages,
        [
            PipelineStage::Received,
            PipelineStage::Normalizing,
            PipelineStage::Normalized,
            PipelineStage::Submitting,
            PipelineStage::Interpreted,
            PipelineStage::Sanitizing,
            PipelineStage::Rendered,
        ]
    );
    assert!(paste.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_long_output_is_uploaded() {
    let sandbox = MockServer::start().await;
    let paste = MockServer::start().await;
    let lines: Vec<String> = (0..15).map(|i| format!("line {:05}", i)).collect();
    let original = lines.join("\n");
    mount_eval(&sandbox, &format!("{}\n", original), Some(0)).await;
    Mock::given(method("POST"))
        .and(path("/documents"))
        .and(body_string(original.clone()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "key": "longout" })))
        .expect(1)
        .mount(&paste)
        .await;

    let outcome = gateway_for(&sandbox, &paste)
        .submit(SubmissionRequest::new("`for i in range(15): print(i)`"))
        .await
        .unwrap();

    let shown: Vec<&str> = outcome.rendered.display_text.lines().collect();
    assert_eq!(shown.len(), 12);
    assert_eq!(shown[0], "001 | line 00000");
    assert_eq!(shown[10], "011 | line 00010");
    assert_eq!(
        shown[11],
        "... (truncated - output contains too many lines)"
    );
    assert!(outcome.rendered.truncated);
    assert_eq!(
        outcome.rendered.paste_link.as_ref().and_then(PasteLink::url).map(|u| u.as_str()),
        Some(format!("{}/longout", paste.uri()).as_str())
    );
}

#[tokio::test]
async fn test_escape_attempt_uploads_original() {
    let sandbox = MockServer::start().await;
    let paste = MockServer::start().await;
    mount_eval(&sandbox, "```````\n", Some(0)).await;
    Mock::given(method("POST"))
        .and(path("/documents"))
        .and(body_string("```````"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "key": "esc" })))
        .expect(1)
        .mount(&paste)
        .await;

    let outcome = gateway_for(&sandbox, &paste)
        .submit(SubmissionRequest::new("```py\nprint('`' * 7)\n```"))
        .await
        .unwrap();

    assert!(outcome.rendered.escape_attempt);
    assert_eq!(outcome.rendered.display_text, ESCAPE_WARNING);
    assert_matches!(outcome.rendered.paste_link, Some(PasteLink::Url(_)));
    assert_eq!(outcome.stages.last(), Some(&PipelineStage::EscapeBlocked));
}

#[tokio::test]
async fn test_paste_failure_still_renders() {
    let sandbox = MockServer::start().await;
    let paste = MockServer::start().await;
    mount_eval(&sandbox, &"x".repeat(1500), Some(0)).await;
    Mock::given(method("POST"))
        .and(path("/documents"))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&paste)
        .await;

    let outcome = gateway_for(&sandbox, &paste)
        .submit(SubmissionRequest::new("print('x' * 1500)"))
        .await
        .unwrap();

    assert!(outcome.rendered.truncated);
    assert_eq!(outcome.rendered.paste_link, None);
    assert!(outcome
        .rendered
        .display_text
        .ends_with("... (output capped - output too long)"));
}

#[tokio::test]
async fn test_oversized_output_is_not_uploaded() {
    let sandbox = MockServer::start().await;
    let paste = MockServer::start().await;
    mount_eval(&sandbox, &"y".repeat(10_001), Some(0)).await;
    mount_documents(&paste, "never").await;

    let outcome = gateway_for(&sandbox, &paste)
        .submit(SubmissionRequest::new("print('y' * 10001)"))
        .await
        .unwrap();

    assert_eq!(outcome.rendered.paste_link, Some(PasteLink::TooLarge));
    assert!(paste.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_sandbox_fault_shows_detail() {
    let sandbox = MockServer::start().await;
    let paste = MockServer::start().await;
    mount_eval(&sandbox, "  IsolationError: nsjail failed\n", None).await;

    let outcome = gateway_for(&sandbox, &paste)
        .submit(SubmissionRequest::new("`1`"))
        .await
        .unwrap();

    assert_eq!(outcome.status.kind, StatusKind::Fault);
    assert_eq!(outcome.status.headline, "evaluation failed");
    assert_eq!(outcome.rendered.display_text, "IsolationError: nsjail failed");
}

#[tokio::test]
async fn test_killed_program() {
    let sandbox = MockServer::start().await;
    let paste = MockServer::start().await;
    mount_eval(&sandbox, "partial", Some(137)).await;

    let outcome = gateway_for(&sandbox, &paste)
        .submit(SubmissionRequest::new("`while True: pass`"))
        .await
        .unwrap();

    assert_eq!(outcome.status.kind, StatusKind::TimedOut);
    assert_eq!(outcome.status.headline, "timed out or exceeded memory");
}

#[tokio::test]
async fn test_rejected_input_makes_no_request() {
    let sandbox = MockServer::start().await;
    let paste = MockServer::start().await;
    mount_eval(&sandbox, "", Some(0)).await;

    let result = gateway_for(&sandbox, &paste)
        .submit(SubmissionRequest::new("   \n\t "))
        .await;

    assert_matches!(result, Err(GatewayError::InputRejected));
    assert!(sandbox.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_sandbox_error_status_fails_submission() {
    let sandbox = MockServer::start().await;
    let paste = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/eval"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&sandbox)
        .await;

    let result = gateway_for(&sandbox, &paste)
        .submit(SubmissionRequest::new("`1`"))
        .await;
    assert_matches!(result, Err(GatewayError::SandboxResponse(_)));
    assert!(paste.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_deadline_expires() {
    let sandbox = MockServer::start().await;
    let paste = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/eval"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "stdout": "late", "returncode": 0 }))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&sandbox)
        .await;

    let gateway = gateway_for(&sandbox, &paste);
    let result = gateway
        .submit_with_deadline(
            SubmissionRequest::new("`import time`"),
            Some(Duration::from_millis(100)),
        )
        .await;
    assert_matches!(result, Err(GatewayError::SandboxUnreachable(_)));
}

#[tokio::test]
async fn test_concurrent_submissions() {
    let sandbox = MockServer::start().await;
    let paste = MockServer::start().await;
    mount_eval(&sandbox, "ok", Some(0)).await;

    let gateway = gateway_for(&sandbox, &paste);
    let submissions = (0..5).map(|i| {
        let gateway = gateway.clone();
        async move { gateway.submit(SubmissionRequest::new(format!("`{}`", i))).await }
    });
    let outcomes = futures::future::join_all(submissions).await;

    let ids: HashSet<String> = outcomes
        .iter()
        .map(|outcome| outcome.as_ref().unwrap().id.to_string())
        .collect();
    assert_eq!(ids.len(), 5);
    assert_eq!(sandbox.received_requests().await.unwrap().len(), 5);
}
