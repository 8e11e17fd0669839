use async_trait::async_trait;

/// Model inference capability held by agents as a collaborator.
///
/// Implementations never fail from the caller's point of view: transport
/// problems come back as a sentinel string inside the answer.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Ask the model with a role-specific system prompt
    async fn ask(&self, system_prompt: &str, prompt: &str) -> String;

    /// Endpoints this model talks to, for diagnostics
    fn endpoints(&self) -> Vec<String> {
        Vec::new()
    }
}
