//! Convex HTTP function API client.

use crate::backend::Backend;
use crate::error::{BackendError, ConfigError};
use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

#[derive(Serialize)]
struct FunctionRequest<'a> {
    path: &'a str,
    args: Map<String, Value>,
    format: &'static str,
}

#[derive(Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum FunctionResponse {
    Success {
        value: Value,
    },
    Error {
        #[serde(rename = "errorMessage")]
        error_message: String,
        #[serde(rename = "errorData", default)]
        error_data: Option<Value>,
    },
}

/// Client for a Convex deployment's `/api/query` and `/api/mutation` endpoints.
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Clone, Debug)]
pub struct ConvexHttpClient {
    client: Client,
    base_url: String,
}

impl ConvexHttpClient {
    pub fn new(base_url: &str, deploy_key: Option<&str>, timeout: Duration) -> Result<Self, ConfigError> {
        let mut headers = header::HeaderMap::new();
        if let Some(key) = deploy_key {
            let value = header::HeaderValue::from_str(&format!("Convex {}", key)).map_err(|e| {
                ConfigError::InvalidSetting {
                    name: "CONVEX_DEPLOY_KEY",
                    detail: e.to_string(),
                }
            })?;
            headers.insert(header::AUTHORIZATION, value);
        }
        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| ConfigError::InvalidSetting {
                name: "CONVEX_URL",
                detail: e.to_string(),
            })?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn call(&self, kind: &str, function: &str, args: Map<String, Value>) -> Result<Value, BackendError> {
        let url = format!("{}/api/{}", self.base_url, kind);
        tracing::debug!(function = %function, kind = %kind, "convex call");
        let response = self
            .client
            .post(&url)
            .json(&FunctionRequest { path: function, args, format: "json" })
            .send()
            .await
            .map_err(|e| BackendError::Unavailable(e.to_string()))?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            tracing::error!(function = %function, status = %status, "convex rejected the deploy key");
            return Err(BackendError::Unavailable(format!("{} from {}: check CONVEX_DEPLOY_KEY", status, url)));
        }
        let text = response
            .text()
            .await
            .map_err(|e| BackendError::Unavailable(e.to_string()))?;

        match serde_json::from_str::<FunctionResponse>(&text) {
            Ok(FunctionResponse::Success { value }) => Ok(value),
            Ok(FunctionResponse::Error { error_message, error_data }) => {
                tracing::debug!(function = %function, status = %status, error = %error_message, "convex function error");
                if status.is_server_error() {
                    return Err(BackendError::Unavailable(error_message));
                }
                Err(classify(error_message, error_data))
            }
            Err(_) if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS => {
                Err(BackendError::Unavailable(format!("{} from {}", status, url)))
            }
            Err(e) => Err(BackendError::Rejected {
                message: format!("unexpected response ({}): {}", status, e),
                data: None,
            }),
        }
    }
}

/// Split application errors into not-found and other rejections.
fn classify(message: String, data: Option<Value>) -> BackendError {
    let code_not_found = data
        .as_ref()
        .and_then(|d| d.get("code"))
        .and_then(Value::as_str)
        .map(|c| c.eq_ignore_ascii_case("not_found"))
        .unwrap_or(false);
    let lower = message.to_lowercase();
    if code_not_found || lower.contains("not found") || lower.contains("nonexistent document") {
        BackendError::NotFound(message)
    } else {
        BackendError::Rejected { message, data }
    }
}

#[async_trait::async_trait]
impl Backend for ConvexHttpClient {
    async fn query(&self, function: &str, args: Map<String, Value>) -> Result<Value, BackendError> {
        self.call("query", function, args).await
    }

    async fn mutation(&self, function: &str, args: Map<String, Value>) -> Result<Value, BackendError> {
        self.call("mutation", function, args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classifies_not_found_messages() {
        let e = classify("Update on nonexistent document ID abc".into(), None);
        assert!(matches!(e, BackendError::NotFound(_)));
        let e = classify("Uncaught ConvexError".into(), Some(json!({"code": "NOT_FOUND"})));
        assert!(matches!(e, BackendError::NotFound(_)));
        let e = classify("ArgumentValidationError: Value does not match validator".into(), None);
        assert!(matches!(e, BackendError::Rejected { .. }));
    }
}
