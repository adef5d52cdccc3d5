//! Chat backend client: one chat-completion call against one named model.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use bmo_core::config::{GeneralConfig, OpenRouterConfig};

use crate::error::BackendError;
use crate::types::Turn;

/// A chat-completion backend.
///
/// Implementations perform exactly one call per invocation; retries and
/// model fallback are the caller's concern.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send `messages` to `model` and return the raw completion text.
    async fn chat(&self, messages: &[Turn], model: &str) -> Result<String, BackendError>;
}

/// Client for the OpenRouter chat-completions API.
#[derive(Clone)]
pub struct OpenRouterClient {
    client: Client,
    api_key: String,
    endpoint: String,
    temperature: f32,
    app_name: String,
    app_url: String,
}

impl OpenRouterClient {
    pub fn new(config: &OpenRouterConfig, general: &GeneralConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            temperature: config.temperature,
            app_name: general.app_name.clone(),
            app_url: general.app_url.clone(),
        })
    }
}

#[async_trait]
impl ChatBackend for OpenRouterClient {
    async fn chat(&self, messages: &[Turn], model: &str) -> Result<String, BackendError> {
        let body = ChatCompletionRequest {
            model,
            messages,
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", &self.app_url)
            .header("X-Title", &self.app_name)
            .json(&body)
            .send()
            .await
            .map_err(map_send_error)?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(map_http_error(status, &body_text));
        }

        let parsed: ChatCompletionResponse = response.json().await.map_err(|err| {
            if err.is_timeout() {
                BackendError::transient(format!("timed out reading OpenRouter response: {err}"))
            } else {
                BackendError::rejected(format!("failed to parse OpenRouter response: {err}"))
            }
        })?;

        extract_text_response(parsed)
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Turn],
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

fn extract_text_response(response: ChatCompletionResponse) -> Result<String, BackendError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| BackendError::rejected("OpenRouter returned no content"))
}

/// Classify a failure to send the request.
///
/// Connect and timeout errors plus request I/O are transient. Builder
/// errors (bad base URL, invalid header value) are not.
fn map_send_error(err: reqwest::Error) -> BackendError {
    if err.is_connect() || err.is_timeout() || err.is_request() {
        BackendError::transient(format!("could not reach OpenRouter: {err}"))
    } else {
        BackendError::rejected(format!("could not build OpenRouter request: {err}"))
    }
}

/// Classify a non-success HTTP status.
fn map_http_error(status: StatusCode, body: &str) -> BackendError {
    let detail = serde_json::from_str::<ErrorResponse>(body)
        .map(|wrapper| wrapper.error.message)
        .unwrap_or_else(|_| body.to_string());
    let message = format!("HTTP {}: {}", status.as_u16(), detail);

    match status {
        StatusCode::UNAUTHORIZED => BackendError::auth(message),
        StatusCode::TOO_MANY_REQUESTS => BackendError::rate_limited(message),
        _ => BackendError::rejected(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BackendErrorKind;

    #[test]
    fn test_map_http_error_classification() {
        assert_eq!(
            map_http_error(StatusCode::UNAUTHORIZED, "").kind,
            BackendErrorKind::Auth
        );
        assert_eq!(
            map_http_error(StatusCode::TOO_MANY_REQUESTS, "").kind,
            BackendErrorKind::RateLimited
        );
        assert_eq!(
            map_http_error(StatusCode::BAD_REQUEST, "").kind,
            BackendErrorKind::Rejected
        );
        assert_eq!(
            map_http_error(StatusCode::SERVICE_UNAVAILABLE, "").kind,
            BackendErrorKind::Rejected
        );
    }

    #[test]
    fn test_map_http_error_extracts_provider_message() {
        let body = r#"{"error":{"message":"No endpoints found for model","code":404}}"#;
        let err = map_http_error(StatusCode::NOT_FOUND, body);
        assert_eq!(err.message, "HTTP 404: No endpoints found for model");

        let err = map_http_error(StatusCode::BAD_GATEWAY, "upstream exploded");
        assert_eq!(err.message, "HTTP 502: upstream exploded");
    }

    #[test]
    fn test_extract_text_response() {
        let parsed: ChatCompletionResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":"{\"narration\":\"hi\"}"}}]}"#)
                .unwrap();
        assert_eq!(
            extract_text_response(parsed).unwrap(),
            r#"{"narration":"hi"}"#
        );

        let empty: ChatCompletionResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert_eq!(
            extract_text_response(empty).unwrap_err().kind,
            BackendErrorKind::Rejected
        );

        let null_content: ChatCompletionResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":null}}]}"#).unwrap();
        assert!(extract_text_response(null_content).is_err());
    }

    #[test]
    fn test_request_body_shape() {
        let messages = vec![Turn::system("be helpful"), Turn::user("hello")];
        let body = ChatCompletionRequest {
            model: "model-a",
            messages: &messages,
            temperature: 0.2,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "model-a");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hello");
    }

    #[tokio::test]
    async fn test_invalid_base_url_is_rejected_not_transient() {
        let config = OpenRouterConfig {
            base_url: "not a url".to_string(),
            ..OpenRouterConfig::default()
        };
        let client = OpenRouterClient::new(&config, &GeneralConfig::default()).unwrap();

        let err = client.chat(&[Turn::user("hi")], "model-a").await.unwrap_err();
        assert_eq!(err.kind, BackendErrorKind::Rejected);
        assert!(err.message.contains("could not build"));
    }

    #[test]
    fn test_client_endpoint_trims_trailing_slash() {
        let config = OpenRouterConfig {
            base_url: "https://openrouter.ai/api/v1/".to_string(),
            ..OpenRouterConfig::default()
        };
        let client = OpenRouterClient::new(&config, &GeneralConfig::default()).unwrap();
        assert_eq!(client.endpoint, "https://openrouter.ai/api/v1/chat/completions");
    }
}
