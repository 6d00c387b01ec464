// src/provider/ollama.rs — Ollama chat backend

use async_trait::async_trait;
use std::time::Duration;

use super::{ChatRequest, ChatResponse, ModelBackend, Role, TokenUsage};
use crate::infra::errors::PromptTuneError;

pub struct OllamaBackend {
    base_url: String,
    client: reqwest::Client,
}

impl OllamaBackend {
    pub fn new(base_url: Option<String>) -> Self {
        Self {
            base_url: base_url.unwrap_or_else(|| "http://localhost:11434".into()),
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// One cheap readiness check against the root endpoint.
    pub async fn probe(&self) -> Result<(), PromptTuneError> {
        let resp = self
            .client
            .get(&self.base_url)
            .timeout(Duration::from_secs(3))
            .send()
            .await
            .map_err(|e| PromptTuneError::Backend {
                backend: "ollama".into(),
                message: format!("Cannot reach Ollama: {}", e),
                retriable: e.is_timeout() || e.is_connect(),
            })?;

        if !resp.status().is_success() {
            return Err(PromptTuneError::Backend {
                backend: "ollama".into(),
                message: format!("Probe returned HTTP {}", resp.status()),
                retriable: true,
            });
        }
        Ok(())
    }
}

impl Default for OllamaBackend {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl ModelBackend for OllamaBackend {
    fn id(&self) -> &str {
        "ollama"
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, PromptTuneError> {
        let messages: Vec<serde_json::Value> = {
            let mut msgs = Vec::new();
            if let Some(system) = &request.system {
                msgs.push(serde_json::json!({
                    "role": "system",
                    "content": system,
                }));
            }
            for m in &request.messages {
                msgs.push(serde_json::json!({
                    "role": match m.role {
                        Role::User => "user",
                        Role::Assistant => "assistant",
                        Role::System => "system",
                    },
                    "content": m.content,
                }));
            }
            msgs
        };

        let mut body = serde_json::json!({
            "model": request.model,
            "messages": messages,
            "stream": false,
        });

        let mut options = serde_json::Map::new();
        if let Some(temp) = request.temperature {
            options.insert("temperature".into(), serde_json::json!(temp));
        }
        if let Some(max) = request.max_tokens {
            options.insert("num_predict".into(), serde_json::json!(max));
        }
        if !options.is_empty() {
            body["options"] = serde_json::Value::Object(options);
        }

        let timeout = request.timeout.unwrap_or(Duration::from_secs(120));

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .timeout(timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PromptTuneError::Timeout {
                        backend: "ollama".into(),
                        timeout_secs: timeout.as_secs(),
                    }
                } else {
                    PromptTuneError::Backend {
                        backend: "ollama".into(),
                        message: e.to_string(),
                        retriable: e.is_connect(),
                    }
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            return Err(PromptTuneError::Backend {
                backend: "ollama".into(),
                message: format!("HTTP {}: {}", status, error_body),
                retriable: status.is_server_error(),
            });
        }

        let resp: serde_json::Value =
            response.json().await.map_err(|e| PromptTuneError::Backend {
                backend: "ollama".into(),
                message: format!("Failed to parse response: {}", e),
                retriable: false,
            })?;

        let content = resp["message"]["content"]
            .as_str()
            .unwrap_or("")
            .to_string();

        let usage = TokenUsage {
            input_tokens: resp["prompt_eval_count"].as_u64().unwrap_or(0) as u32,
            output_tokens: resp["eval_count"].as_u64().unwrap_or(0) as u32,
        };

        Ok(ChatResponse { content, usage })
    }
}
