//! End-to-end tests of the Responses API client against a wiremock server.

use std::sync::Arc;
use std::time::Duration;

use aoai::credential::{AccessToken, COGNITIVE_SERVICES_SCOPE, StaticTokenCredential};
use aoai::prelude::*;
use aoai::responses::ResponseStatus;
use aoai::settings::{API_KEY_ENV, Auth, ENDPOINT_ENV, normalize_base_url};
use assert2::{check, let_assert};
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, body_string_contains, header, method, path},
};

fn pong() -> serde_json::Value {
    json!({
        "id": "resp_123",
        "object": "response",
        "model": "gpt-5-mini",
        "status": "completed",
        "output": [
            {"type": "reasoning", "id": "rs_1", "summary": []},
            {"type": "message", "id": "msg_1", "status": "completed", "role": "assistant", "content": [
                {"type": "output_text", "text": "pong", "annotations": []}
            ]}
        ],
        "usage": {"input_tokens": 8, "output_tokens": 2, "total_tokens": 10}
    })
}

fn api_key_settings(server: &MockServer) -> Settings {
    let endpoint = format!("{}/", server.uri());
    Settings::from_lookup(AuthMode::ApiKey, |name| match name {
        ENDPOINT_ENV => Some(endpoint.clone()),
        API_KEY_ENV => Some("k".to_string()),
        _ => None,
    })
    .expect("settings")
}

fn entra_settings(server: &MockServer) -> Settings {
    Settings::builder(
        normalize_base_url(&server.uri()).expect("url"),
        Auth::Entra {
            scope: COGNITIVE_SERVICES_SCOPE.to_string(),
            allow_insecure_http: true,
        },
    )
    .retries(0)
    .build()
}

fn static_token(token: &str) -> Arc<dyn TokenCredential> {
    Arc::new(StaticTokenCredential::new(AccessToken::expiring_in(
        token,
        Duration::from_secs(3600),
    )))
}

#[tokio::test]
async fn ping_pong_with_api_key() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/openai/v1/responses"))
        .and(header("api-key", "k"))
        .and(body_string_contains("ping"))
        .respond_with(ResponseTemplate::new(200).set_body_json(pong()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let settings = api_key_settings(&mock_server);
    let client = AzureOpenAi::connect(&settings);

    let request = CreateResponse::new(settings.model(), "ping")
        .max_output_tokens(settings.max_output_tokens());
    let response = client.create(&request).await.expect("response");

    check!(response.output_text() == "pong");
    check!(response.status == ResponseStatus::Completed);
    check!(response.usage.map(|usage| usage.total_tokens) == Some(10));
}

#[tokio::test]
async fn conversation_with_entra_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/openai/v1/responses"))
        .and(header("Authorization", "Bearer entra-token"))
        .and(body_json(json!({
            "model": "gpt-5-mini",
            "input": [
                {"role": "system", "content": "You are an Azure cloud architect."},
                {"role": "user", "content": "Design a scalable web application architecture."}
            ],
            "max_output_tokens": 1000
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(pong()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let settings = entra_settings(&mock_server);
    let client = AzureOpenAi::connect_with(&settings, static_token("entra-token"));

    let request = CreateResponse::new(
        settings.model(),
        vec![
            InputMessage::system("You are an Azure cloud architect."),
            InputMessage::user("Design a scalable web application architecture."),
        ],
    )
    .max_output_tokens(settings.max_output_tokens());

    let response = client.create(&request).await.expect("response");
    check!(response.output_text() == "pong");
}

#[tokio::test]
async fn remote_error_carries_the_service_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/openai/v1/responses"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {
                "code": "DeploymentNotFound",
                "message": "The API deployment for this resource does not exist."
            }
        })))
        .mount(&mock_server)
        .await;

    let client = AzureOpenAi::connect(&api_key_settings(&mock_server));

    let err = client
        .create(&CreateResponse::new("missing-deployment", "ping"))
        .await
        .expect_err("not found");

    check!(err.status() == Some(404));
    check!(err.to_string().contains("deployment for this resource does not exist"));
    let_assert!(Some(Ok(body)) = err.decode_body::<serde_json::Value>());
    check!(body["error"]["code"] == "DeploymentNotFound");
}

#[tokio::test]
async fn retrieve_then_delete() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/openai/v1/responses/resp_123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(pong()))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/openai/v1/responses/resp_123"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"id": "resp_123", "object": "response", "deleted": true})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = AzureOpenAi::connect(&api_key_settings(&mock_server));

    let response = client.retrieve("resp_123").await.expect("retrieve");
    check!(response.id == "resp_123");

    let deleted = client.delete("resp_123").await.expect("delete");
    check!(deleted.deleted);
}

#[tokio::test]
async fn timeout_covers_the_call() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(pong())
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&mock_server)
        .await;

    let settings = Settings::builder(
        normalize_base_url(&mock_server.uri()).expect("url"),
        Auth::ApiKey("k".into()),
    )
    .timeout(Duration::from_millis(200))
    .build();
    let client = AzureOpenAi::connect(&settings);

    let err = client
        .create(&CreateResponse::new("m", "ping"))
        .await
        .expect_err("deadline");
    check!(err.is_timeout());
}
