use async_trait::async_trait;

/// Reply produced by the completion stage, tagged with the backend that
/// actually answered (the primary or one of the fallbacks).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionResult {
    pub text: String,
    pub backend: String,
}

/// An external service that turns a prompt into a natural-language reply.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    fn name(&self) -> &str;

    async fn complete(&self, prompt: &str) -> anyhow::Result<String>;
}
