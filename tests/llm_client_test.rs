//! Integration tests for the completion client
//!
//! Tests HTTP client behavior using wiremock for request/response mocking.

use serde_json::json;
use wiremock::{
    matchers::{body_partial_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

use novel_reasoning::config::{LlmConfig, RequestConfig};
use novel_reasoning::error::CompletionError;
use novel_reasoning::llm::{
    ChatRequest, CompletionOptions, Message, OpenAiClient, TextCompletion,
};

/// Create a test client pointing to mock server
fn create_test_client(base_url: &str, max_retries: u32) -> OpenAiClient {
    let config = LlmConfig {
        api_key: "test-api-key".to_string(),
        base_url: base_url.to_string(),
        model: "test-model".to_string(),
    };

    let request_config = RequestConfig {
        timeout_ms: 5000,
        max_retries,
        retry_delay_ms: 10,
    };

    OpenAiClient::new(&config, request_config).expect("Failed to create client")
}

fn completion_body(content: serde_json::Value) -> serde_json::Value {
    json!({
        "id": "chatcmpl-123",
        "model": "test-model",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 20, "completion_tokens": 5, "total_tokens": 25}
    })
}

#[cfg(test)]
mod chat_tests {
    use super::*;

    #[tokio::test]
    async fn test_successful_chat_call() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer test-api-key"))
            .and(header("Content-Type", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(json!(
                "The sequence doubles."
            ))))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri(), 0);
        let request = ChatRequest::new(
            "test-model",
            vec![Message::user("2, 4, 8?")],
            CompletionOptions::new(0.7, 100),
        );
        let response = client.chat(request).await.expect("chat should succeed");

        assert_eq!(response.first_content(), Some("The sequence doubles."));
        assert_eq!(response.usage.and_then(|u| u.total_tokens), Some(25));
    }

    #[tokio::test]
    async fn test_complete_chat_sends_sampling_settings() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(json!({
                "model": "test-model",
                "temperature": 0.6,
                "max_completion_tokens": 1000,
                "messages": [
                    {"role": "system", "content": "Be brief."},
                    {"role": "user", "content": "Name a rule."}
                ]
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(completion_body(json!("  A rule.  \n"))),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri(), 0);
        let text = client
            .complete_chat(
                vec![Message::system("Be brief."), Message::user("Name a rule.")],
                CompletionOptions::new(0.6, 1000),
            )
            .await
            .expect("completion should succeed");

        assert_eq!(text, "A rule.");
    }

    #[tokio::test]
    async fn test_complete_without_ceiling_omits_field() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(json!("[[1]]"))))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri(), 0);
        let text = client
            .complete_chat(
                vec![Message::user("grid?")],
                CompletionOptions::with_temperature(0.0),
            )
            .await
            .unwrap();
        assert_eq!(text, "[[1]]");

        let requests = mock_server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert!(body.get("max_completion_tokens").is_none());
        assert_eq!(body["temperature"], json!(0.0));
    }

    #[tokio::test]
    async fn test_default_complete_sends_single_user_message() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(json!({
                "messages": [{"role": "user", "content": "hello"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(json!("hi"))))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri(), 0);
        let text = client.complete("hello", 0.7, 50).await.unwrap();
        assert_eq!(text, "hi");
    }

    #[tokio::test]
    async fn test_null_content_is_empty_completion() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(json!(null))))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri(), 0);
        let result = client
            .complete_chat(vec![Message::user("x")], CompletionOptions::new(0.7, 10))
            .await;

        assert!(matches!(result, Err(CompletionError::EmptyCompletion)));
    }
}

#[cfg(test)]
mod error_tests {
    use super::*;

    #[tokio::test]
    async fn test_authentication_error_is_unavailable_after_retries() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": {"message": "Invalid API key", "type": "authentication_error"}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri(), 0);
        let result = client
            .complete_chat(vec![Message::user("x")], CompletionOptions::new(0.7, 10))
            .await;

        match result {
            Err(CompletionError::Unavailable { message, retries }) => {
                assert!(message.contains("401"), "message: {}", message);
                assert!(message.contains("Invalid API key"));
                assert_eq!(retries, 1);
            }
            other => panic!("expected Unavailable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_retries_then_gives_up() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("overloaded"))
            .expect(3)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri(), 2);
        let result = client
            .complete_chat(vec![Message::user("x")], CompletionOptions::new(0.7, 10))
            .await;

        assert!(matches!(
            result,
            Err(CompletionError::Unavailable { retries: 3, .. })
        ));
    }

    #[tokio::test]
    async fn test_malformed_body_is_reported() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri(), 0);
        let result = client
            .complete_chat(vec![Message::user("x")], CompletionOptions::new(0.7, 10))
            .await;

        match result {
            Err(CompletionError::Unavailable { message, .. }) => {
                assert!(message.contains("Invalid response"), "message: {}", message);
            }
            other => panic!("expected Unavailable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failure() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(json!("ok"))))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri(), 1);
        let text = client
            .complete_chat(vec![Message::user("x")], CompletionOptions::new(0.7, 10))
            .await
            .unwrap();
        assert_eq!(text, "ok");
    }
}
