use anyhow::Result;
use futures::StreamExt;
use mockito::Matcher;
use serde_json::json;
use test_utils::chat_stream_fixture;

use super::HttpBackend;
use crate::domain::models::Backend;
use crate::domain::models::QuestionCategory;
use crate::domain::models::QuickQuestion;
use crate::domain::models::SessionContext;
use crate::domain::models::StreamFrame;
use crate::domain::services::stream_decoder::decode_stream;

impl HttpBackend {
    fn with_url(url: String) -> HttpBackend {
        return HttpBackend::new(&url, "200");
    }
}

fn context() -> SessionContext {
    return SessionContext {
        ingredients: vec!["egg".to_string(), "rice".to_string()],
        recipe: "Egg fried rice".to_string(),
    };
}

#[tokio::test]
async fn it_successfully_health_checks() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/health")
        .with_status(200)
        .create_async()
        .await;

    let backend = HttpBackend::with_url(server.url());
    let res = backend.health_check().await;

    assert!(res.is_ok());
    mock.assert_async().await;
}

#[tokio::test]
async fn it_fails_health_checks() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/health")
        .with_status(500)
        .create_async()
        .await;

    let backend = HttpBackend::with_url(server.url());
    let res = backend.health_check().await;

    assert!(res.is_err());
    mock.assert_async().await;
}

#[tokio::test]
async fn it_lists_classes() -> Result<()> {
    let body = json!({
        "success": true,
        "classes": ["egg", "onion", "rice"],
        "total_classes": 3,
    });

    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/classes")
        .with_status(200)
        .with_body(body.to_string())
        .create_async()
        .await;

    let backend = HttpBackend::with_url(server.url());
    let res = backend.list_classes().await?;

    assert_eq!(res, vec!["egg", "onion", "rice"]);
    mock.assert_async().await;

    return Ok(());
}

#[tokio::test]
async fn it_detects_ingredients() -> Result<()> {
    let body = json!({
        "success": true,
        "ingredients": ["egg", "rice"],
        "total_detected": 2,
    });

    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/detect")
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex("name=\"image\"".to_string()),
            Matcher::Regex("filename=\"fridge.jpg\"".to_string()),
        ]))
        .with_status(200)
        .with_body(body.to_string())
        .create_async()
        .await;

    let backend = HttpBackend::with_url(server.url());
    let res = backend.detect("fridge.jpg", b"jpeg-bytes".to_vec()).await?;

    assert_eq!(res, vec!["egg", "rice"]);
    mock.assert_async().await;

    return Ok(());
}

#[tokio::test]
async fn it_surfaces_backend_errors() -> Result<()> {
    let body = json!({
        "success": false,
        "error": "YOLO model not loaded",
        "ingredients": [],
    });

    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/detect")
        .with_status(500)
        .with_body(body.to_string())
        .create_async()
        .await;

    let backend = HttpBackend::with_url(server.url());
    let res = backend.detect("fridge.jpg", vec![]).await;

    assert_eq!(res.unwrap_err().to_string(), "YOLO model not loaded");
    mock.assert_async().await;

    return Ok(());
}

#[tokio::test]
async fn it_fails_unsuccessful_replies_with_ok_status() -> Result<()> {
    let body = json!({
        "success": false,
        "error": "Ingredients list is empty",
    });

    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/generate-recipe")
        .with_status(200)
        .with_body(body.to_string())
        .create_async()
        .await;

    let backend = HttpBackend::with_url(server.url());
    let res = backend.generate_recipe(&[]).await;

    assert_eq!(res.unwrap_err().to_string(), "Ingredients list is empty");
    mock.assert_async().await;

    return Ok(());
}

#[tokio::test]
async fn it_reports_status_when_the_body_is_unreadable() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/start-chat")
        .with_status(502)
        .with_body("<html>Bad Gateway</html>")
        .create_async()
        .await;

    let backend = HttpBackend::with_url(server.url());
    let res = backend.start_chat(&context()).await;

    assert_eq!(
        res.unwrap_err().to_string(),
        "Failed to start chat, backend responded with status 502"
    );
    mock.assert_async().await;

    return Ok(());
}

#[tokio::test]
async fn it_generates_recipes() -> Result<()> {
    let body = json!({
        "success": true,
        "recipe": "Egg fried rice",
    });

    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/generate-recipe")
        .match_body(Matcher::Json(json!({ "ingredients": ["egg", "rice"] })))
        .with_status(200)
        .with_body(body.to_string())
        .create_async()
        .await;

    let backend = HttpBackend::with_url(server.url());
    let res = backend
        .generate_recipe(&["egg".to_string(), "rice".to_string()])
        .await?;

    assert_eq!(res, "Egg fried rice");
    mock.assert_async().await;

    return Ok(());
}

#[tokio::test]
async fn it_generates_questions() -> Result<()> {
    let body = json!({
        "success": true,
        "questions": [
            { "text": "Spicier?", "question": "Can I make it spicier?", "category": "tips" },
        ],
        "total": 1,
    });

    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/generate-questions")
        .match_body(Matcher::Json(json!({
            "ingredients": ["egg", "rice"],
            "recipe": "Egg fried rice",
        })))
        .with_status(200)
        .with_body(body.to_string())
        .create_async()
        .await;

    let backend = HttpBackend::with_url(server.url());
    let res = backend.generate_questions(&context()).await?;

    assert_eq!(
        res,
        vec![QuickQuestion::new(
            "Spicier?",
            "Can I make it spicier?",
            QuestionCategory::Tips
        )]
    );
    mock.assert_async().await;

    return Ok(());
}

#[tokio::test]
async fn it_starts_chats() -> Result<()> {
    let body = json!({
        "success": true,
        "session_id": "abc123",
    });

    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/start-chat")
        .match_body(Matcher::Json(json!({
            "ingredients": ["egg", "rice"],
            "recipe": "Egg fried rice",
        })))
        .with_status(200)
        .with_body(body.to_string())
        .create_async()
        .await;

    let backend = HttpBackend::with_url(server.url());
    let res = backend.start_chat(&context()).await?;

    assert_eq!(res, "abc123");
    mock.assert_async().await;

    return Ok(());
}

#[tokio::test]
async fn it_streams_answers() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat-stream")
        .match_body(Matcher::Json(json!({
            "session_id": "abc123",
            "question": "How long?",
        })))
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body(chat_stream_fixture())
        .create_async()
        .await;

    let backend = HttpBackend::with_url(server.url());
    let fragments = backend.chat_stream("abc123", "How long?").await?;
    let frames = decode_stream(fragments).collect::<Vec<StreamFrame>>().await;

    let text = frames
        .iter()
        .filter_map(|frame| match frame {
            StreamFrame::Chunk { text } => return Some(text.to_string()),
            _ => return None,
        })
        .collect::<String>();

    assert_eq!(text, "Soak the rice for 20 minutes, then fry the eggs.");
    assert_eq!(frames.last(), Some(&StreamFrame::Done));
    mock.assert_async().await;

    return Ok(());
}

#[tokio::test]
async fn it_fails_to_open_streams_for_unknown_sessions() -> Result<()> {
    let body = json!({
        "success": false,
        "error": "Session not found",
    });

    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat-stream")
        .with_status(404)
        .with_body(body.to_string())
        .create_async()
        .await;

    let backend = HttpBackend::with_url(server.url());
    let res = backend.chat_stream("gone", "How long?").await;

    assert_eq!(res.err().unwrap().to_string(), "Session not found");
    mock.assert_async().await;

    return Ok(());
}

#[tokio::test]
async fn it_ends_chats() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/end-chat")
        .match_body(Matcher::Json(json!({ "session_id": "abc123" })))
        .with_status(200)
        .with_body(json!({ "success": true }).to_string())
        .create_async()
        .await;

    let backend = HttpBackend::with_url(server.url());
    backend.end_chat("abc123").await?;

    mock.assert_async().await;
    return Ok(());
}

#[tokio::test]
async fn it_fails_ending_chats_on_error_status() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/end-chat")
        .with_status(500)
        .create_async()
        .await;

    let backend = HttpBackend::with_url(server.url());
    assert!(backend.end_chat("abc123").await.is_err());

    mock.assert_async().await;
    return Ok(());
}
