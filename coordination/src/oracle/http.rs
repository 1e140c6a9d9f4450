//! OpenAI-compatible chat-completions client.

use std::time::Duration;

use async_trait::async_trait;

use super::{DecisionOracle, OracleError, OracleRequest};

/// Per-request timeout so a hung endpoint cannot stall a game forever.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Oracle backed by any `/chat/completions` endpoint.
pub struct OpenAiOracle {
    base_url: String,
    api_key: Option<String>,
    model: String,
    client: reqwest::Client,
}

impl OpenAiOracle {
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        model: &str,
    ) -> Result<Self, OracleError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| OracleError::RequestFailed(format!("failed to build client: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
            model: model.to_string(),
            client,
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn request_body(&self, request: &OracleRequest) -> serde_json::Value {
        let mut messages = Vec::with_capacity(request.history.len() + 2);
        messages.push(serde_json::json!({"role": "system", "content": request.system}));
        for message in &request.history {
            messages.push(serde_json::json!({
                "role": message.role.to_string(),
                "content": message.content,
            }));
        }
        messages.push(serde_json::json!({"role": "user", "content": request.prompt}));

        serde_json::json!({
            "model": self.model,
            "messages": messages,
            "temperature": request.params.temperature,
            "max_tokens": request.params.max_tokens,
            "stream": false
        })
    }
}

#[async_trait]
impl DecisionOracle for OpenAiOracle {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &OracleRequest) -> Result<String, OracleError> {
        let mut builder = self
            .client
            .post(self.endpoint())
            .header("Content-Type", "application/json")
            .json(&self.request_body(request));
        if let Some(key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", key));
        }

        let response = builder
            .send()
            .await
            .map_err(|e| OracleError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(OracleError::Status { status, body });
        }

        let resp_json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| OracleError::ParseError(e.to_string()))?;

        let choice = resp_json["choices"]
            .get(0)
            .ok_or_else(|| OracleError::ParseError("no choices in response".into()))?;

        match choice["message"]["content"].as_str() {
            Some(content) if !content.trim().is_empty() => Ok(content.to_string()),
            Some(_) => Err(OracleError::EmptyResponse),
            None => Err(OracleError::ParseError("choice has no message content".into())),
        }
    }
}
