mod common;

use common::{completion_body, config_for, COMPLETION_PATH};
use mockito::Matcher;
use serde_json::json;
use std::time::{Duration, Instant};
use trip_planner::{
    services::{backoff_delay, first_choice_content, ChatMessage, CompletionClient},
    PlannerConfig, PlannerError,
};

fn messages() -> Vec<ChatMessage> {
    vec![
        ChatMessage::system("You are a travel planner."),
        ChatMessage::user(format!("Plan a trip to Paris.\n{}", "context ".repeat(300))),
    ]
}

#[tokio::test]
async fn test_sends_openai_style_request() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", COMPLETION_PATH)
        .match_header("authorization", "Bearer test-token")
        .match_body(Matcher::PartialJson(json!({
            "model": "deepseek-r1-distill-qwen-32b",
            "max_tokens": 1200,
            "response_format": { "type": "json_object" }
        })))
        .with_status(200)
        .with_body(completion_body("{\"ok\": true}"))
        .expect(1)
        .create_async()
        .await;

    let client = CompletionClient::from_config(&config_for(&server));
    let payload = client.complete(messages(), 1200, true).await.unwrap();

    assert_eq!(first_choice_content(&payload).unwrap(), "{\"ok\": true}");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_rate_limit_exhausts_retries_with_backoff() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", COMPLETION_PATH)
        .with_status(429)
        .with_body(r#"{"error": {"message": "Rate limit reached"}}"#)
        .expect(4)
        .create_async()
        .await;

    let base = Duration::from_millis(10);
    let config = config_for(&server)
        .with_max_retries(3)
        .with_backoff_base(base);
    let client = CompletionClient::from_config(&config);

    let started = Instant::now();
    let err = client.complete(messages(), 1000, true).await.unwrap_err();
    let elapsed = started.elapsed();

    assert!(matches!(err, PlannerError::RateLimit { attempts: 4 }));
    let minimum: Duration = (0..3).map(|attempt| backoff_delay(base, attempt)).sum();
    assert!(elapsed >= minimum, "retried after {elapsed:?}, expected at least {minimum:?}");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_context_length_error_shrinks_and_retries() {
    let mut server = mockito::Server::new_async().await;
    let too_long = server
        .mock("POST", COMPLETION_PATH)
        .match_body(Matcher::PartialJson(json!({ "max_tokens": 1000 })))
        .with_status(400)
        .with_body(
            r#"{"error": {"message": "Please reduce the length of the messages", "code": "context_length_exceeded"}}"#,
        )
        .expect(1)
        .create_async()
        .await;
    let shrunk = server
        .mock("POST", COMPLETION_PATH)
        .match_body(Matcher::PartialJson(json!({ "max_tokens": 800 })))
        .with_status(200)
        .with_body(completion_body("[]"))
        .expect(1)
        .create_async()
        .await;

    let client = CompletionClient::from_config(&config_for(&server));
    let payload = client.complete(messages(), 1000, false).await.unwrap();

    assert_eq!(first_choice_content(&payload).unwrap(), "[]");
    too_long.assert_async().await;
    shrunk.assert_async().await;
}

#[tokio::test]
async fn test_context_length_gives_up_after_retries() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", COMPLETION_PATH)
        .with_status(400)
        .with_body(r#"{"error": {"message": "This model's maximum context length is 8192 tokens"}}"#)
        .expect(3)
        .create_async()
        .await;

    let config = config_for(&server).with_max_retries(2);
    let client = CompletionClient::from_config(&config);
    let err = client.complete(messages(), 1000, false).await.unwrap_err();

    assert!(matches!(err, PlannerError::ContextLength { attempts: 3 }));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_other_errors_are_not_retried() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", COMPLETION_PATH)
        .with_status(401)
        .with_body("invalid api key")
        .expect(1)
        .create_async()
        .await;

    let client = CompletionClient::from_config(&config_for(&server));
    let err = client.complete(messages(), 1000, true).await.unwrap_err();

    match &err {
        PlannerError::Upstream { status, body, .. } => {
            assert_eq!(*status, 401);
            assert_eq!(body, "invalid api key");
        }
        other => panic!("expected upstream error, got {other:?}"),
    }
    assert_eq!(err.user_message(), "Trip generation failed (401): invalid api key");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_error_object_in_ok_response() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", COMPLETION_PATH)
        .with_status(200)
        .with_body(r#"{"error": {"message": "model overloaded"}}"#)
        .create_async()
        .await;

    let client = CompletionClient::from_config(&config_for(&server));
    let err = client.complete(messages(), 1000, true).await.unwrap_err();

    assert!(matches!(err, PlannerError::Upstream { status: 200, .. }));
    assert!(err.to_string().contains("model overloaded"));
}

#[tokio::test]
async fn test_empty_choices_is_empty_completion() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", COMPLETION_PATH)
        .with_status(200)
        .with_body(r#"{"choices": []}"#)
        .create_async()
        .await;

    let client = CompletionClient::from_config(&config_for(&server));
    let payload = client.complete(messages(), 1000, true).await.unwrap();

    assert!(matches!(
        first_choice_content(&payload),
        Err(PlannerError::EmptyCompletion)
    ));
}

#[tokio::test]
async fn test_silent_server_times_out_after_retries() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let config = PlannerConfig::new()
        .with_completion_api_key("test-token")
        .with_completion_base_url(format!("http://{address}"))
        .with_timeout(Duration::from_millis(100))
        .with_max_retries(1)
        .with_backoff_base(Duration::from_millis(1));
    let client = CompletionClient::from_config(&config);

    let err = client.complete(messages(), 1000, true).await.unwrap_err();
    assert!(matches!(err, PlannerError::Timeout(_)));
    assert!(err.to_string().contains("2 attempts"));
    assert!(err.is_retryable());
}
