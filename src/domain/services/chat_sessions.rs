#[cfg(test)]
#[path = "chat_sessions_test.rs"]
mod tests;

use futures::StreamExt;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::stream_decoder::decode_stream;
use crate::domain::models::BackendBox;
use crate::domain::models::Change;
use crate::domain::models::ChatSession;
use crate::domain::models::Event;
use crate::domain::models::Message;
use crate::domain::models::MessageType;
use crate::domain::models::Role;
use crate::domain::models::SessionContext;
use crate::domain::models::SessionState;
use crate::domain::models::StreamFrame;
use crate::domain::models::WorkflowError;

fn end_session(backend: BackendBox, session_id: String) -> JoinHandle<()> {
    return tokio::spawn(async move {
        match backend.end_chat(&session_id).await {
            Ok(()) => tracing::debug!(session_id = %session_id, "Chat session ended"),
            Err(err) => {
                tracing::warn!(session_id = %session_id, error = ?err, "Failed to end chat session, dropping it")
            }
        }
    });
}

/// Owns the backend chat session and the message log shown for it.
///
/// Backend calls run as background tasks which report back through the
/// workflow's event channel; their results are applied with `on_started` and
/// `on_frame`. Only one answer may stream at a time.
pub struct ChatSessionManager {
    backend: BackendBox,
    tx: mpsc::UnboundedSender<Event>,
    state: SessionState,
    session: Option<ChatSession>,
    pending_start: Option<u64>,
    messages: Vec<Message>,
    streaming: bool,
    teardown: Vec<JoinHandle<()>>,
}

impl ChatSessionManager {
    pub fn new(backend: BackendBox, tx: mpsc::UnboundedSender<Event>) -> ChatSessionManager {
        return ChatSessionManager {
            backend,
            tx,
            state: SessionState::None,
            session: None,
            pending_start: None,
            messages: vec![],
            streaming: false,
            teardown: vec![],
        };
    }

    pub fn state(&self) -> SessionState {
        return self.state;
    }

    pub fn session(&self) -> Option<&ChatSession> {
        return self.session.as_ref();
    }

    pub fn session_id(&self) -> Option<String> {
        return self.session.as_ref().map(|session| return session.id.to_string());
    }

    pub fn messages(&self) -> &[Message] {
        return &self.messages;
    }

    pub fn is_active(&self) -> bool {
        return self.state == SessionState::Active;
    }

    pub fn is_streaming(&self) -> bool {
        return self.streaming;
    }

    /// Token of the start request still waiting on the backend, if any.
    pub fn pending_start(&self) -> Option<u64> {
        return self.pending_start;
    }

    /// Hands over the teardowns of sessions that started after they were no
    /// longer wanted, so they can be awaited before exiting.
    pub fn take_teardown(&mut self) -> Vec<JoinHandle<()>> {
        return std::mem::take(&mut self.teardown);
    }

    pub fn reset_messages(&mut self, messages: Vec<Message>) {
        self.messages = messages;
    }

    pub fn push_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Requests a new backend session. `token` identifies the request so a
    /// result that arrives after the request was abandoned can be told apart.
    pub fn start(&mut self, context: SessionContext, token: u64) -> Result<(), WorkflowError> {
        if self.state != SessionState::None {
            return Err(WorkflowError::SessionNotIdle);
        }

        self.state = SessionState::Starting;
        self.pending_start = Some(token);

        let backend = self.backend.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = backend.start_chat(&context).await;
            let _ = tx.send(Event::SessionStarted {
                token,
                context,
                result,
            });
        });

        return Ok(());
    }

    /// Stops waiting on an in-flight start. Its result will be discarded.
    pub fn abandon_start(&mut self) {
        if self.state == SessionState::Starting {
            self.pending_start = None;
            self.state = SessionState::None;
        }
    }

    pub fn on_started(
        &mut self,
        token: u64,
        context: SessionContext,
        result: anyhow::Result<String>,
    ) -> Option<Change> {
        if self.pending_start != Some(token) {
            tracing::debug!(token, "Discarding stale chat session start");
            if let Ok(session_id) = result {
                self.teardown.retain(|handle| return !handle.is_finished());
                self.teardown
                    .push(end_session(self.backend.clone(), session_id));
            }
            return None;
        }

        self.pending_start = None;
        match result {
            Ok(session_id) => {
                tracing::debug!(session_id = %session_id, "Chat session started");
                self.state = SessionState::Active;
                self.session = Some(ChatSession {
                    id: session_id,
                    context,
                });

                return Some(Change::ChatReady);
            }
            Err(err) => {
                tracing::error!(error = ?err, "Failed to start chat session");
                self.state = SessionState::None;

                let reason = format!("Chat is unavailable for this recipe: {err}");
                self.messages.push(Message::new_with_type(
                    Role::Assistant,
                    MessageType::Error,
                    &reason,
                ));

                return Some(Change::ChatUnavailable(reason));
            }
        }
    }

    /// Appends the question and an open answer to the log, then streams the
    /// answer in the background. Refused before any network I/O when the
    /// session is not active or another answer is still streaming.
    pub fn ask(&mut self, session_id: &str, question: &str) -> Result<(), WorkflowError> {
        let current = match &self.session {
            Some(session) if self.state == SessionState::Active && session.id == session_id => {
                session.id.to_string()
            }
            _ => return Err(WorkflowError::NotActive),
        };

        let question = question.trim();
        if question.is_empty() {
            return Err(WorkflowError::EmptyQuestion);
        }
        if self.streaming {
            return Err(WorkflowError::StreamBusy);
        }

        self.messages.push(Message::new(Role::User, question));
        self.messages.push(Message::placeholder());
        self.streaming = true;

        let backend = self.backend.clone();
        let tx = self.tx.clone();
        let question = question.to_string();
        tokio::spawn(async move {
            let fragments = match backend.chat_stream(&current, &question).await {
                Ok(fragments) => fragments,
                Err(err) => {
                    tracing::error!(session_id = %current, error = ?err, "Failed to open answer stream");
                    let _ = tx.send(Event::StreamFrame {
                        session_id: current,
                        frame: StreamFrame::error(&err.to_string()),
                    });
                    return;
                }
            };

            let mut frames = Box::pin(decode_stream(fragments));
            while let Some(frame) = frames.next().await {
                let event = Event::StreamFrame {
                    session_id: current.to_string(),
                    frame,
                };
                if tx.send(event).is_err() {
                    break;
                }
            }
        });

        return Ok(());
    }

    pub fn on_frame(&mut self, session_id: &str, frame: StreamFrame) -> Option<Change> {
        let is_current = self
            .session
            .as_ref()
            .map(|session| return session.id == session_id)
            .unwrap_or(false);
        if !is_current || self.state != SessionState::Active || !self.streaming {
            tracing::debug!(session_id, "Discarding frame for an inactive session");
            return None;
        }

        let answer = match self.messages.last_mut() {
            Some(message) if message.is_open() => message,
            _ => {
                tracing::warn!(session_id, "Received a frame without an open answer");
                return None;
            }
        };

        match frame {
            StreamFrame::Chunk { text } => {
                answer.append(&text);
                return Some(Change::AnswerChunk(text));
            }
            StreamFrame::Done => {
                answer.finish();
                self.streaming = false;
                return Some(Change::AnswerDone);
            }
            StreamFrame::Error { message } => {
                tracing::error!(session_id, error = %message, "Answer stream failed");
                answer.fail(&message);
                self.streaming = false;
                return Some(Change::AnswerFailed(message));
            }
        }
    }

    /// Best-effort teardown. The session is released right away, the backend
    /// is told in the background and a failure there is only logged. The
    /// returned handle may be awaited when the caller is about to exit.
    pub fn end(&mut self, session_id: &str) -> Option<JoinHandle<()>> {
        let is_current = self
            .session
            .as_ref()
            .map(|session| return session.id == session_id)
            .unwrap_or(false);
        if !is_current {
            tracing::debug!(session_id, "Ignoring end for an unknown session");
            return None;
        }

        self.state = SessionState::Ending;
        let handle = end_session(self.backend.clone(), session_id.to_string());

        if self.streaming {
            if let Some(answer) = self.messages.last_mut().filter(|m| return m.is_open()) {
                answer.fail("chat session ended");
            }
        }

        self.session = None;
        self.streaming = false;
        self.state = SessionState::None;

        return Some(handle);
    }
}

impl Drop for ChatSessionManager {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            if Handle::try_current().is_ok() {
                end_session(self.backend.clone(), session.id);
            }
        }
    }
}
