// src/provider/roles.rs — Role-based backend assignment

use std::sync::Arc;
use std::time::Duration;

use super::ollama::OllamaBackend;
use super::ModelBackend;
use crate::infra::config::ModelsConfig;

/// One backend role: where to send a call and how to parameterize it.
#[derive(Clone)]
pub struct BackendRole {
    pub backend: Arc<dyn ModelBackend>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

/// Assigns backends to the two roles of the search pipeline: execution
/// (generator) and reflection (judge + instruction proposals). The original
/// deployment runs these as two separately configured models, often on the
/// same server.
#[derive(Clone)]
pub struct BackendRoles {
    pub execution: BackendRole,
    pub reflection: BackendRole,
}

impl BackendRoles {
    pub fn from_config(config: &ModelsConfig) -> Self {
        let timeout = Duration::from_secs(config.request_timeout_secs);

        let execution_backend: Arc<dyn ModelBackend> =
            Arc::new(OllamaBackend::new(Some(config.execution_endpoint.clone())));
        // Reuse the execution backend when the endpoints match; two clients
        // against one server would just split the connection pool.
        let reflection_backend: Arc<dyn ModelBackend> =
            if config.reflection_endpoint == config.execution_endpoint {
                execution_backend.clone()
            } else {
                Arc::new(OllamaBackend::new(Some(config.reflection_endpoint.clone())))
            };

        Self {
            execution: BackendRole {
                backend: execution_backend,
                model: config.execution_model.clone(),
                temperature: config.temperature_execution,
                max_tokens: config.max_output_tokens,
                timeout,
            },
            reflection: BackendRole {
                backend: reflection_backend,
                model: config.reflection_model.clone(),
                temperature: config.temperature_reflection,
                max_tokens: config.max_output_tokens,
                timeout,
            },
        }
    }

    /// Same backend for both roles. Primarily useful in tests.
    pub fn from_single(backend: Arc<dyn ModelBackend>, model: &str) -> Self {
        let role = BackendRole {
            backend,
            model: model.into(),
            temperature: 0.1,
            max_tokens: 1000,
            timeout: Duration::from_secs(120),
        };
        Self {
            execution: role.clone(),
            reflection: role,
        }
    }
}
