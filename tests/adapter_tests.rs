// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Provider adapter tests against a stubbed HTTP upstream.

use std::sync::Arc;
use std::time::Duration;

use parley::application::ChatGateway;
use parley::domain::chat::ChatMessage;
use parley::domain::llm::{ChatProvider, GatewayError, ProviderId};
use parley::infrastructure::llm::{AnthropicAdapter, OpenAiAdapter};

fn adapter_pair(server_url: &str) -> (OpenAiAdapter, AnthropicAdapter) {
    let client = reqwest::Client::new();
    (
        OpenAiAdapter::new(client.clone(), server_url, "test-key".to_string()),
        AnthropicAdapter::new(client, server_url, "test-key".to_string()),
    )
}

#[tokio::test]
async fn openai_reply_comes_from_first_choice() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer test-key")
        .match_body(mockito::Matcher::PartialJson(serde_json::json!({
            "model": "gpt-4o-mini",
            "messages": [
                {"role": "system", "content": "be brief"},
                {"role": "user", "content": "hi"}
            ]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            serde_json::json!({
                "choices": [
                    {"message": {"role": "assistant", "content": "hello"}},
                    {"message": {"role": "assistant", "content": "ignored"}}
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let (openai, _) = adapter_pair(&server.url());
    let reply = openai
        .send("gpt-4o-mini", "be brief", &[ChatMessage::user("hi")])
        .await
        .unwrap();

    assert_eq!(reply, "hello");
    mock.assert_async().await;
}

#[tokio::test]
async fn openai_http_failure_carries_status_and_body() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/chat/completions")
        .with_status(401)
        .with_body("bad key")
        .create_async()
        .await;

    let (openai, _) = adapter_pair(&server.url());
    let err = openai
        .send("gpt-4o", "sys", &[ChatMessage::user("hi")])
        .await
        .unwrap_err();

    match err {
        GatewayError::Provider {
            provider,
            status,
            body,
        } => {
            assert_eq!(provider, ProviderId::OpenAi);
            assert_eq!(status, 401);
            assert_eq!(body, "bad key");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn anthropic_sends_system_top_level_and_reads_first_block() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/messages")
        .match_header("x-api-key", "test-key")
        .match_header("anthropic-version", "2023-06-01")
        .match_body(mockito::Matcher::PartialJson(serde_json::json!({
            "model": "claude-3-haiku-20240307",
            "system": "be brief",
            "max_tokens": 1024,
            "messages": [{"role": "user", "content": "hi"}]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            serde_json::json!({
                "content": [{"type": "text", "text": "hello there"}]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let (_, anthropic) = adapter_pair(&server.url());
    let reply = anthropic
        .send("claude-3-haiku-20240307", "be brief", &[ChatMessage::user("hi")])
        .await
        .unwrap();

    assert_eq!(reply, "hello there");
    mock.assert_async().await;
}

#[tokio::test]
async fn anthropic_overload_is_retried_then_surfaced() {
    let mut server = mockito::Server::new_async().await;
    // Initial attempt plus 3 retries, all overloaded.
    let mock = server
        .mock("POST", "/messages")
        .with_status(529)
        .with_body("overloaded_error")
        .expect(4)
        .create_async()
        .await;

    let (_, anthropic) = adapter_pair(&server.url());
    let gateway = ChatGateway::new(vec![Arc::new(anthropic) as Arc<dyn ChatProvider>])
        .with_retry_policy(3, Duration::from_millis(5));

    let err = gateway
        .send_with_retry(
            ProviderId::Anthropic,
            "claude-3-opus-20240229",
            "sys",
            &[ChatMessage::user("hi")],
        )
        .await
        .unwrap_err();

    assert!(err.is_overloaded());
    mock.assert_async().await;
}

#[tokio::test]
async fn anthropic_hard_failure_is_not_retried() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/messages")
        .with_status(500)
        .with_body("internal")
        .expect(1)
        .create_async()
        .await;

    let (_, anthropic) = adapter_pair(&server.url());
    let gateway = ChatGateway::new(vec![Arc::new(anthropic) as Arc<dyn ChatProvider>])
        .with_retry_policy(3, Duration::from_millis(5));

    let err = gateway
        .send_with_retry(
            ProviderId::Anthropic,
            "claude-3-opus-20240229",
            "sys",
            &[ChatMessage::user("hi")],
        )
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::Provider { status: 500, .. }));
    mock.assert_async().await;
}

#[tokio::test]
async fn malformed_success_body_is_an_invalid_response() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("{\"choices\": \"not an array\"}")
        .create_async()
        .await;

    let (openai, _) = adapter_pair(&server.url());
    let err = openai
        .send("gpt-4o", "sys", &[ChatMessage::user("hi")])
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::InvalidResponse { .. }));
}
