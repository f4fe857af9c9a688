#[cfg(test)]
#[path = "http_test.rs"]
mod tests;

use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use futures::stream::TryStreamExt;
use reqwest::multipart;
use serde::de::DeserializeOwned;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Backend;
use crate::domain::models::FragmentStream;
use crate::domain::models::QuickQuestion;
use crate::domain::models::SessionContext;

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Status {
    #[serde(default)]
    success: bool,
    error: Option<String>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct DetectResponse {
    ingredients: Vec<String>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ClassesResponse {
    classes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct RecipeRequest<'a> {
    ingredients: &'a [String],
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct RecipeResponse {
    recipe: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct QuestionsResponse {
    questions: Vec<QuickQuestion>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct StartChatResponse {
    session_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct ChatStreamRequest<'a> {
    session_id: &'a str,
    question: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct EndChatRequest<'a> {
    session_id: &'a str,
}

/// Fails on non-2xx statuses and `success: false` bodies, preferring the
/// backend's own error text.
async fn read_reply<T: DeserializeOwned>(res: reqwest::Response, action: &str) -> Result<T> {
    let status = res.status();
    let body = res.text().await?;
    let reply = serde_json::from_str::<Status>(&body).unwrap_or_default();

    if !status.is_success() || !reply.success {
        tracing::error!(
            status = status.as_u16(),
            error = ?reply.error,
            "Failed to {action}"
        );
        if let Some(error) = reply.error {
            bail!(error);
        }
        bail!(format!(
            "Failed to {action}, backend responded with status {}",
            status.as_u16()
        ));
    }

    return Ok(serde_json::from_str::<T>(&body)?);
}

pub struct HttpBackend {
    url: String,
    timeout: String,
    client: reqwest::Client,
}

impl Default for HttpBackend {
    fn default() -> HttpBackend {
        return HttpBackend::new(
            &Config::get(ConfigKey::BackendUrl),
            &Config::get(ConfigKey::BackendHealthCheckTimeout),
        );
    }
}

impl HttpBackend {
    pub fn new(url: &str, timeout: &str) -> HttpBackend {
        return HttpBackend {
            url: url.trim_end_matches('/').to_string(),
            timeout: timeout.to_string(),
            client: reqwest::Client::new(),
        };
    }

    fn endpoint(&self, path: &str) -> String {
        return format!("{url}{path}", url = self.url);
    }
}

#[async_trait]
impl Backend for HttpBackend {
    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        let res = self
            .client
            .get(self.endpoint("/health"))
            .timeout(Duration::from_millis(self.timeout.parse::<u64>()?))
            .send()
            .await;

        let res = match res {
            Ok(res) => res,
            Err(err) => {
                tracing::error!(error = ?err, url = %self.url, "Backend is not running");
                bail!(format!("Backend is not running at {}", self.url));
            }
        };

        if !res.status().is_success() {
            tracing::error!(status = res.status().as_u16(), "Backend health check failed");
            bail!("Backend health check failed");
        }

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn list_classes(&self) -> Result<Vec<String>> {
        let res = self.client.get(self.endpoint("/classes")).send().await?;
        let body = read_reply::<ClassesResponse>(res, "list classes").await?;

        return Ok(body.classes);
    }

    #[allow(clippy::implicit_return)]
    async fn detect(&self, name: &str, bytes: Vec<u8>) -> Result<Vec<String>> {
        let form = multipart::Form::new().part(
            "image",
            multipart::Part::bytes(bytes).file_name(name.to_string()),
        );

        let res = self
            .client
            .post(self.endpoint("/detect"))
            .multipart(form)
            .send()
            .await?;

        let body = read_reply::<DetectResponse>(res, "detect ingredients").await?;
        tracing::debug!(name, ingredients = ?body.ingredients, "Detection response");

        return Ok(body.ingredients);
    }

    #[allow(clippy::implicit_return)]
    async fn generate_recipe(&self, ingredients: &[String]) -> Result<String> {
        let res = self
            .client
            .post(self.endpoint("/generate-recipe"))
            .json(&RecipeRequest { ingredients })
            .send()
            .await?;

        let body = read_reply::<RecipeResponse>(res, "generate recipe").await?;
        return Ok(body.recipe);
    }

    #[allow(clippy::implicit_return)]
    async fn generate_questions(&self, context: &SessionContext) -> Result<Vec<QuickQuestion>> {
        let res = self
            .client
            .post(self.endpoint("/generate-questions"))
            .json(context)
            .send()
            .await?;

        let body = read_reply::<QuestionsResponse>(res, "generate questions").await?;
        return Ok(body.questions);
    }

    #[allow(clippy::implicit_return)]
    async fn start_chat(&self, context: &SessionContext) -> Result<String> {
        let res = self
            .client
            .post(self.endpoint("/start-chat"))
            .json(context)
            .send()
            .await?;

        let body = read_reply::<StartChatResponse>(res, "start chat").await?;
        return Ok(body.session_id);
    }

    #[allow(clippy::implicit_return)]
    async fn chat_stream(&self, session_id: &str, question: &str) -> Result<FragmentStream> {
        let res = self
            .client
            .post(self.endpoint("/chat-stream"))
            .json(&ChatStreamRequest {
                session_id,
                question,
            })
            .send()
            .await?;

        if !res.status().is_success() {
            read_reply::<Status>(res, "open answer stream").await?;
            bail!("Failed to open answer stream");
        }

        let stream = res
            .bytes_stream()
            .map_ok(|bytes| return bytes.to_vec())
            .map_err(anyhow::Error::from);

        return Ok(Box::pin(stream));
    }

    #[allow(clippy::implicit_return)]
    async fn end_chat(&self, session_id: &str) -> Result<()> {
        let res = self
            .client
            .post(self.endpoint("/end-chat"))
            .json(&EndChatRequest { session_id })
            .send()
            .await?;

        if !res.status().is_success() {
            tracing::error!(
                status = res.status().as_u16(),
                session_id,
                "Failed to end chat session"
            );
            bail!(format!(
                "Failed to end chat session, backend responded with status {}",
                res.status().as_u16()
            ));
        }

        return Ok(());
    }
}
