pub mod base;
pub mod fallback;
pub mod openai;

pub use base::{CompletionBackend, CompletionResult};
pub use fallback::FallbackChain;

use crate::config::CompletionConfig;
use std::sync::Arc;

/// Build the fallback chain from config, preserving the configured order
/// (primary first).
pub fn build_chain(config: &CompletionConfig) -> FallbackChain {
    let backends: Vec<Arc<dyn CompletionBackend>> = config
        .backends
        .iter()
        .map(|b| Arc::new(openai::OpenAiBackend::new(b)) as Arc<dyn CompletionBackend>)
        .collect();
    FallbackChain::new(backends)
}
