use std::pin::Pin;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use futures::Stream;

use super::QuickQuestion;
use super::SessionContext;

/// Raw reads from an open answer stream, in arrival order. Read boundaries are
/// arbitrary and carry no meaning.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>>> + Send>>;

pub type BackendBox = Arc<dyn Backend>;

#[async_trait]
pub trait Backend: Send + Sync {
    /// Used at startup to verify the backend is reachable.
    async fn health_check(&self) -> Result<()>;

    /// Every ingredient label the detector knows about.
    async fn list_classes(&self) -> Result<Vec<String>>;

    /// Detects ingredient labels in a single image.
    async fn detect(&self, name: &str, bytes: Vec<u8>) -> Result<Vec<String>>;

    async fn generate_recipe(&self, ingredients: &[String]) -> Result<String>;

    /// Suggests quick questions tailored to a recipe.
    async fn generate_questions(&self, context: &SessionContext) -> Result<Vec<QuickQuestion>>;

    /// Opens a conversation bound to an ingredient set and recipe, returning
    /// the backend's session id.
    async fn start_chat(&self, context: &SessionContext) -> Result<String>;

    /// Asks a question within a session. The answer is returned as the raw
    /// line-framed stream, decoding is left to the caller.
    async fn chat_stream(&self, session_id: &str, question: &str) -> Result<FragmentStream>;

    async fn end_chat(&self, session_id: &str) -> Result<()>;
}
