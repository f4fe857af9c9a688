use std::collections::HashMap;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Mutex;

use anyhow::anyhow;
use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use futures::stream;

use crate::domain::models::Backend;
use crate::domain::models::FragmentStream;
use crate::domain::models::QuickQuestion;
use crate::domain::models::SessionContext;

/// In-memory backend for exercising the workflow without HTTP. Answers are
/// split into small reads so frame reassembly is always exercised.
#[derive(Default)]
pub struct FakeBackend {
    detections: HashMap<String, Vec<String>>,
    recipe: Option<String>,
    questions: Option<Vec<QuickQuestion>>,
    sessions: bool,
    answer: Option<String>,
    end_fails: bool,
    started: AtomicUsize,
    pub ended: Mutex<Vec<String>>,
    pub asked: Mutex<Vec<String>>,
    pub recipe_requests: Mutex<Vec<Vec<String>>>,
}

impl FakeBackend {
    pub fn with_detection(mut self, name: &str, labels: &[&str]) -> FakeBackend {
        self.detections.insert(
            name.to_string(),
            labels.iter().map(|e| return e.to_string()).collect(),
        );
        return self;
    }

    pub fn with_recipe(mut self, recipe: &str) -> FakeBackend {
        self.recipe = Some(recipe.to_string());
        return self;
    }

    pub fn with_questions(mut self, questions: Vec<QuickQuestion>) -> FakeBackend {
        self.questions = Some(questions);
        return self;
    }

    pub fn with_sessions(mut self) -> FakeBackend {
        self.sessions = true;
        return self;
    }

    pub fn with_answer(mut self, body: &str) -> FakeBackend {
        self.answer = Some(body.to_string());
        return self;
    }

    pub fn with_end_failure(mut self) -> FakeBackend {
        self.end_fails = true;
        return self;
    }

    pub fn ended(&self) -> Vec<String> {
        return self.ended.lock().unwrap().clone();
    }

    pub fn asked(&self) -> Vec<String> {
        return self.asked.lock().unwrap().clone();
    }
}

#[async_trait]
impl Backend for FakeBackend {
    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn list_classes(&self) -> Result<Vec<String>> {
        let mut classes = self
            .detections
            .values()
            .flatten()
            .cloned()
            .collect::<Vec<String>>();
        classes.sort();
        classes.dedup();

        return Ok(classes);
    }

    #[allow(clippy::implicit_return)]
    async fn detect(&self, name: &str, _bytes: Vec<u8>) -> Result<Vec<String>> {
        return self
            .detections
            .get(name)
            .cloned()
            .ok_or_else(|| return anyhow!("Detection failed: no model output for {name}"));
    }

    #[allow(clippy::implicit_return)]
    async fn generate_recipe(&self, ingredients: &[String]) -> Result<String> {
        self.recipe_requests.lock().unwrap().push(ingredients.to_vec());
        return self
            .recipe
            .clone()
            .ok_or_else(|| return anyhow!("Recipe backend unavailable"));
    }

    #[allow(clippy::implicit_return)]
    async fn generate_questions(&self, _context: &SessionContext) -> Result<Vec<QuickQuestion>> {
        return self
            .questions
            .clone()
            .ok_or_else(|| return anyhow!("Questions backend unavailable"));
    }

    #[allow(clippy::implicit_return)]
    async fn start_chat(&self, _context: &SessionContext) -> Result<String> {
        if !self.sessions {
            bail!("Chat backend unavailable");
        }

        let n = self.started.fetch_add(1, Ordering::SeqCst) + 1;
        return Ok(format!("session-{n}"));
    }

    #[allow(clippy::implicit_return)]
    async fn chat_stream(&self, session_id: &str, question: &str) -> Result<FragmentStream> {
        self.asked
            .lock()
            .unwrap()
            .push(format!("{session_id}: {question}"));

        let body = match &self.answer {
            Some(body) => body.to_string(),
            None => bail!("Answer stream unavailable"),
        };

        let reads = body
            .as_bytes()
            .chunks(5)
            .map(|read| return Ok(read.to_vec()))
            .collect::<Vec<Result<Vec<u8>>>>();

        return Ok(Box::pin(stream::iter(reads)));
    }

    #[allow(clippy::implicit_return)]
    async fn end_chat(&self, session_id: &str) -> Result<()> {
        self.ended.lock().unwrap().push(session_id.to_string());
        if self.end_fails {
            bail!("Connection refused");
        }

        return Ok(());
    }
}
