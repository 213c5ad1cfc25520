use crate::errors::{RelayError, RelayResult};
use crate::providers::base::{CompletionBackend, CompletionResult};
use std::sync::Arc;
use tracing::{debug, warn};

/// Ordered completion backends, primary first. Each backend is invoked at
/// most once per call; the first success wins. No per-backend retry and no
/// backoff — the chain runs exactly once end-to-end.
pub struct FallbackChain {
    backends: Vec<Arc<dyn CompletionBackend>>,
}

impl FallbackChain {
    pub fn new(backends: Vec<Arc<dyn CompletionBackend>>) -> Self {
        Self { backends }
    }

    pub async fn complete(&self, prompt: &str) -> RelayResult<CompletionResult> {
        if self.backends.is_empty() {
            return Err(RelayError::Completion("no backends configured".into()));
        }

        let mut last_error = String::new();
        for backend in &self.backends {
            match backend.complete(prompt).await {
                Ok(text) => {
                    debug!("completion produced by backend {}", backend.name());
                    return Ok(CompletionResult {
                        text,
                        backend: backend.name().to_string(),
                    });
                }
                Err(e) => {
                    warn!("completion backend {} failed: {}", backend.name(), e);
                    last_error = format!("{}: {}", backend.name(), e);
                }
            }
        }

        Err(RelayError::Completion(last_error))
    }
}
