use serde_derive::Deserialize;
use serde_derive::Serialize;

/// Lifecycle of the backend chat session. A finished session goes back to
/// `None`, so a new one can be started for the next recipe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
pub enum SessionState {
    None,
    Starting,
    Active,
    Ending,
}

/// What the backend conversation is about, bound when the session starts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub ingredients: Vec<String>,
    pub recipe: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatSession {
    pub id: String,
    pub context: SessionContext,
}
