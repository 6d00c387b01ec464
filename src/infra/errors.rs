// src/infra/errors.rs — Error types for PromptTune

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PromptTuneError {
    // Backend errors (possibly retriable)
    #[error("Backend '{backend}' error: {message}")]
    Backend {
        backend: String,
        message: String,
        retriable: bool,
    },

    #[error("Backend '{backend}' timed out after {timeout_secs}s")]
    Timeout { backend: String, timeout_secs: u64 },

    #[error("Backend at {url} never became ready after {attempts} attempts")]
    BackendUnavailable { url: String, attempts: u32 },

    // Infra
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PromptTuneError {
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            PromptTuneError::Backend {
                retriable: true,
                ..
            } | PromptTuneError::Timeout { .. }
        )
    }

    /// True for failures of a single external call that should degrade to a
    /// zero score for that evaluation rather than abort the run.
    pub fn is_transient_call_failure(&self) -> bool {
        matches!(
            self,
            PromptTuneError::Backend { .. } | PromptTuneError::Timeout { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retriable_backend_error() {
        let e = PromptTuneError::Backend {
            backend: "ollama".into(),
            message: "connection reset".into(),
            retriable: true,
        };
        assert!(e.is_retriable());
        assert!(e.is_transient_call_failure());
    }

    #[test]
    fn test_timeout_is_transient() {
        let e = PromptTuneError::Timeout {
            backend: "ollama".into(),
            timeout_secs: 30,
        };
        assert!(e.is_retriable());
        assert!(e.is_transient_call_failure());
    }

    #[test]
    fn test_config_error_not_retriable() {
        let e = PromptTuneError::Config("bad range".into());
        assert!(!e.is_retriable());
    }
}
