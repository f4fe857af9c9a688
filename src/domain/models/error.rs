/// Refusals the workflow reports synchronously, before any network call is
/// made. Callers match on these to decide what to tell the user.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum WorkflowError {
    #[error("there are no ingredients to build a recipe from")]
    EmptyIngredients,

    #[error("finish or cancel the ingredient edit first")]
    EditInProgress,

    #[error("a recipe is being generated, wait for it to finish")]
    Processing,

    #[error("there is no active chat session")]
    NotActive,

    #[error("a chat session is already running")]
    SessionNotIdle,

    #[error("questions cannot be empty")]
    EmptyQuestion,

    #[error("an answer is still streaming, try again once it completes")]
    StreamBusy,

    #[error("no image with id {0}")]
    UnknownImage(String),

    #[error("{0} is not a supported image, use png, jpg, jpeg, gif, bmp or webp")]
    UnsupportedImage(String),

    #[error("no ingredient edit is in progress")]
    NoEditInProgress,

    #[error("there is no ingredient at position {0}")]
    DraftIndexOutOfRange(usize),

    #[error("there is no quick question number {0}")]
    UnknownQuickQuestion(usize),
}
