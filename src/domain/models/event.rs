use anyhow::Result;

use super::ImageId;
use super::QuickQuestion;
use super::SessionContext;
use super::StreamFrame;

/// Results of background backend calls, applied by the workflow in the order
/// they arrive.
pub enum Event {
    DetectionResolved {
        image_id: ImageId,
        result: Result<Vec<String>>,
    },
    RecipeGenerated {
        token: u64,
        ingredients: Vec<String>,
        result: Result<String>,
    },
    QuestionsGenerated {
        token: u64,
        result: Result<Vec<QuickQuestion>>,
    },
    SessionStarted {
        token: u64,
        context: SessionContext,
        result: Result<String>,
    },
    StreamFrame {
        session_id: String,
        frame: StreamFrame,
    },
}

/// What an applied event changed, for the presentation layer to render.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Change {
    ImagesChanged,
    RecipeReady,
    RecipeFailed(String),
    QuestionsReady,
    ChatReady,
    ChatUnavailable(String),
    AnswerChunk(String),
    AnswerDone,
    AnswerFailed(String),
}
