#[cfg(test)]
#[path = "recipe_workflow_test.rs"]
mod tests;

use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::time;

use super::ChatSessionManager;
use super::IngredientAggregator;
use crate::domain::models::BackendBox;
use crate::domain::models::Change;
use crate::domain::models::Event;
use crate::domain::models::Image;
use crate::domain::models::ImageId;
use crate::domain::models::IngredientSet;
use crate::domain::models::Message;
use crate::domain::models::MessageType;
use crate::domain::models::QuickQuestion;
use crate::domain::models::Recipe;
use crate::domain::models::Role;
use crate::domain::models::SessionContext;
use crate::domain::models::SessionState;
use crate::domain::models::WorkflowError;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(3);

pub const GREETING: &str =
    "I've put together a recipe from your ingredients! Want to ask me anything about it?";

/// Single owner of everything the client shows: images, ingredients, recipe,
/// chat session and message log.
///
/// Every backend call runs as a spawned task whose result comes back as an
/// [`Event`]. Callers wait with [`RecipeWorkflow::next_event`] and apply with
/// [`RecipeWorkflow::handle_event`], so state only ever changes on the
/// caller's task. Recipe generations are numbered; results from anything but
/// the latest one are dropped.
pub struct RecipeWorkflow {
    backend: BackendBox,
    tx: mpsc::UnboundedSender<Event>,
    rx: mpsc::UnboundedReceiver<Event>,
    aggregator: IngredientAggregator,
    sessions: ChatSessionManager,
    recipe: Option<Recipe>,
    quick_questions: Vec<QuickQuestion>,
    generation: u64,
    processing: bool,
    smart_questions: bool,
}

impl RecipeWorkflow {
    pub fn new(backend: BackendBox, smart_questions: bool) -> RecipeWorkflow {
        let (tx, rx) = mpsc::unbounded_channel::<Event>();

        return RecipeWorkflow {
            sessions: ChatSessionManager::new(backend.clone(), tx.clone()),
            backend,
            tx,
            rx,
            aggregator: IngredientAggregator::default(),
            recipe: None,
            quick_questions: QuickQuestion::defaults(),
            generation: 0,
            processing: false,
            smart_questions,
        };
    }

    pub fn images(&self) -> &[Image] {
        return self.aggregator.images();
    }

    pub fn ingredients(&self) -> &IngredientSet {
        return self.aggregator.ingredients();
    }

    pub fn draft(&self) -> Option<&[String]> {
        return self.aggregator.draft();
    }

    pub fn recipe(&self) -> Option<&Recipe> {
        return self.recipe.as_ref();
    }

    pub fn messages(&self) -> &[Message] {
        return self.sessions.messages();
    }

    pub fn session_state(&self) -> SessionState {
        return self.sessions.state();
    }

    pub fn session_id(&self) -> Option<String> {
        return self.sessions.session_id();
    }

    pub fn quick_questions(&self) -> &[QuickQuestion] {
        return &self.quick_questions;
    }

    /// True while a recipe generation is outstanding.
    pub fn processing(&self) -> bool {
        return self.processing;
    }

    pub fn is_streaming(&self) -> bool {
        return self.sessions.is_streaming();
    }

    /// Reports an unreachable backend in the chat log instead of failing.
    #[allow(clippy::implicit_return)]
    pub async fn health_check(&mut self) -> bool {
        if let Err(err) = self.backend.health_check().await {
            tracing::error!(error = ?err, "Backend health check failed");
            self.sessions.push_message(Message::new_with_type(
                Role::Assistant,
                MessageType::Error,
                &format!("Hey, it looks like the kitchen backend isn't reachable. Detection and recipes won't work until it is.\n\nError: {err}"),
            ));
            return false;
        }

        return true;
    }

    #[allow(clippy::implicit_return)]
    pub async fn list_classes(&self) -> Result<Vec<String>> {
        let mut classes = self.backend.list_classes().await?;
        classes.sort();

        return Ok(classes);
    }

    pub fn upload_image(&mut self, name: &str, bytes: Vec<u8>) -> Result<ImageId, WorkflowError> {
        if !Image::is_supported(name) {
            return Err(WorkflowError::UnsupportedImage(name.to_string()));
        }

        let image = Image::new(name, bytes);
        let image_id = image.id.to_string();

        let backend = self.backend.clone();
        let tx = self.tx.clone();
        let task_id = image_id.to_string();
        let task_name = image.name.to_string();
        let task_bytes = image.bytes.clone();
        self.aggregator.on_image_added(image);

        tokio::spawn(async move {
            let result = backend.detect(&task_name, task_bytes).await;
            let _ = tx.send(Event::DetectionResolved {
                image_id: task_id,
                result,
            });
        });

        return Ok(image_id);
    }

    pub fn remove_image(&mut self, image_id: &str) -> Result<(), WorkflowError> {
        return self.aggregator.on_image_removed(image_id);
    }

    pub fn begin_manual_edit(&mut self) -> Result<(), WorkflowError> {
        if self.processing {
            return Err(WorkflowError::Processing);
        }

        self.aggregator.begin_manual_edit();
        return Ok(());
    }

    pub fn edit_draft(&mut self, index: usize, value: &str) -> Result<(), WorkflowError> {
        return self.aggregator.edit_draft(index, value);
    }

    pub fn add_draft_slot(&mut self) -> Result<(), WorkflowError> {
        return self.aggregator.add_draft_slot();
    }

    pub fn remove_draft_slot(&mut self, index: usize) -> Result<(), WorkflowError> {
        return self.aggregator.remove_draft_slot(index);
    }

    pub fn commit_manual_edit(&mut self) -> Result<(), WorkflowError> {
        if self.processing {
            return Err(WorkflowError::Processing);
        }

        return self.aggregator.commit_manual_edit();
    }

    pub fn cancel_manual_edit(&mut self) {
        self.aggregator.cancel_manual_edit();
    }

    /// Starts a new recipe generation, superseding any previous recipe, its
    /// chat session and any generation still in flight. Returns the token the
    /// result will be matched against.
    pub fn generate(&mut self) -> Result<u64, WorkflowError> {
        if self.aggregator.ingredients().is_empty() {
            return Err(WorkflowError::EmptyIngredients);
        }
        if self.aggregator.is_editing() {
            return Err(WorkflowError::EditInProgress);
        }

        self.generation += 1;
        let token = self.generation;

        if let Some(session_id) = self.sessions.session_id() {
            // Fire and forget, a failed teardown is only logged.
            self.sessions.end(&session_id);
        } else {
            self.sessions.abandon_start();
        }

        self.recipe = None;
        self.processing = true;

        let ingredients = self.aggregator.ingredients().to_vec();
        tracing::debug!(token, ingredients = ?ingredients, "Generating recipe");

        let backend = self.backend.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = backend.generate_recipe(&ingredients).await;
            let _ = tx.send(Event::RecipeGenerated {
                token,
                ingredients,
                result,
            });
        });

        return Ok(token);
    }

    pub fn ask(&mut self, question: &str) -> Result<(), WorkflowError> {
        let session_id = self.sessions.session_id().ok_or(WorkflowError::NotActive)?;
        return self.sessions.ask(&session_id, question);
    }

    /// Asks one of the quick questions by its 1-based position.
    pub fn ask_quick(&mut self, position: usize) -> Result<(), WorkflowError> {
        let question = position
            .checked_sub(1)
            .and_then(|idx| return self.quick_questions.get(idx))
            .map(|quick| return quick.question.to_string())
            .ok_or(WorkflowError::UnknownQuickQuestion(position))?;

        return self.ask(&question);
    }

    #[allow(clippy::implicit_return)]
    pub async fn next_event(&mut self) -> Option<Event> {
        return self.rx.recv().await;
    }

    pub fn handle_event(&mut self, event: Event) -> Option<Change> {
        match event {
            Event::DetectionResolved { image_id, result } => {
                if self.aggregator.on_detection_resolved(&image_id, result) {
                    return Some(Change::ImagesChanged);
                }
                return None;
            }
            Event::RecipeGenerated {
                token,
                ingredients,
                result,
            } => {
                return self.on_recipe_generated(token, ingredients, result);
            }
            Event::QuestionsGenerated { token, result } => {
                return self.on_questions_generated(token, result);
            }
            Event::SessionStarted {
                token,
                context,
                result,
            } => {
                return self.sessions.on_started(token, context, result);
            }
            Event::StreamFrame { session_id, frame } => {
                return self.sessions.on_frame(&session_id, frame);
            }
        }
    }

    fn on_recipe_generated(
        &mut self,
        token: u64,
        ingredients: Vec<String>,
        result: Result<String>,
    ) -> Option<Change> {
        if token != self.generation {
            tracing::debug!(token, latest = self.generation, "Discarding stale recipe");
            return None;
        }

        self.processing = false;
        let text = match result {
            Ok(text) => text,
            Err(err) => {
                tracing::error!(error = ?err, "Failed to generate recipe");
                let reason = format!("Sorry, I couldn't come up with a recipe: {err}");
                self.sessions.push_message(Message::new_with_type(
                    Role::Assistant,
                    MessageType::Error,
                    &reason,
                ));

                return Some(Change::RecipeFailed(reason));
            }
        };

        self.recipe = Some(Recipe::new(&text, ingredients.to_vec()));
        self.quick_questions = QuickQuestion::defaults();
        self.sessions
            .reset_messages(vec![Message::new(Role::Assistant, GREETING)]);

        let context = SessionContext {
            ingredients,
            recipe: text,
        };

        if let Err(err) = self.sessions.start(context.clone(), token) {
            tracing::error!(error = ?err, "Unable to start chat session");
        }

        if self.smart_questions {
            let backend = self.backend.clone();
            let tx = self.tx.clone();
            tokio::spawn(async move {
                let result = backend.generate_questions(&context).await;
                let _ = tx.send(Event::QuestionsGenerated { token, result });
            });
        }

        return Some(Change::RecipeReady);
    }

    fn on_questions_generated(
        &mut self,
        token: u64,
        result: Result<Vec<QuickQuestion>>,
    ) -> Option<Change> {
        if token != self.generation {
            tracing::debug!(token, latest = self.generation, "Discarding stale questions");
            return None;
        }

        match result {
            Ok(questions) if !questions.is_empty() => {
                self.quick_questions = questions;
                return Some(Change::QuestionsReady);
            }
            Ok(_) => return None,
            Err(err) => {
                tracing::warn!(error = ?err, "Failed to generate quick questions, keeping defaults");
                return None;
            }
        }
    }

    /// Ends the chat session before the client exits and waits for the
    /// backend to be told, without ever failing. A session still starting is
    /// waited on for up to `SHUTDOWN_GRACE` so it can be ended too.
    #[allow(clippy::implicit_return)]
    pub async fn shutdown(&mut self) {
        if let Some(token) = self.sessions.pending_start() {
            self.settle_pending_start(token).await;
        }

        self.sessions.abandon_start();
        if let Some(session_id) = self.sessions.session_id() {
            if let Some(handle) = self.sessions.end(&session_id) {
                let _ = handle.await;
            }
        }

        for handle in self.sessions.take_teardown() {
            let _ = handle.await;
        }
    }

    #[allow(clippy::implicit_return)]
    async fn settle_pending_start(&mut self, token: u64) {
        let deadline = time::Instant::now() + SHUTDOWN_GRACE;
        loop {
            let event = match time::timeout_at(deadline, self.rx.recv()).await {
                Ok(Some(event)) => event,
                Ok(None) => return,
                Err(_) => {
                    tracing::warn!(token, "Gave up waiting on a chat session start while shutting down");
                    return;
                }
            };

            // Anything else is moot once the client is exiting.
            if let Event::SessionStarted {
                token: started,
                context,
                result,
            } = event
            {
                self.sessions.on_started(started, context, result);
                if started == token {
                    return;
                }
            }
        }
    }
}
