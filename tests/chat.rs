use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};

use anyhow::Result;
use axum::{http::HeaderMap, http::StatusCode, routing::post, Json, Router};
use leanpad::{
    advisor::{Advisor, ChatRequest},
    llm::{ChatOptions, LlmClient},
    messages::{Locale, Messages},
};
use serde_json::{json, Value};

type Seen = Arc<Mutex<Vec<(HeaderMap, Value)>>>;

/// Local stand-in for the completion API. Answers with `reply` and records
/// each request.
async fn fake_upstream(status: StatusCode, reply: Value) -> Result<(SocketAddr, Seen)> {
    let seen: Seen = Arc::default();
    let recorder = seen.clone();
    let app = Router::new().route(
        "/v1/messages",
        post(move |headers: HeaderMap, Json(body): Json<Value>| {
            let recorder = recorder.clone();
            let reply = reply.clone();
            async move {
                recorder.lock().unwrap().push((headers, body));
                (status, Json(reply))
            }
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((addr, seen))
}

fn advisor(addr: SocketAddr, locale: Locale) -> Result<Advisor> {
    let client = LlmClient::new(format!("http://{}", addr), "sk-test", Duration::from_secs(5))?;
    Ok(Advisor::new(
        Some(client),
        ChatOptions {
            model: "claude-test".into(),
            max_tokens: 64,
        },
        Messages::new(locale),
    ))
}

#[tokio::test]
async fn forwards_question_and_returns_first_text() -> Result<()> {
    let (addr, seen) = fake_upstream(
        StatusCode::OK,
        json!({
            "content": [
                { "type": "text", "text": "Use `simp`." },
                { "type": "text", "text": "ignored" }
            ]
        }),
    )
    .await?;

    let reply = advisor(addr, Locale::En)?
        .ask(&ChatRequest {
            message: "How do I finish this?".into(),
            code: "example : 0 + n = n := by\n  sorry".into(),
            context: Some("unsolved goals".into()),
        })
        .await;
    assert!(reply.success);
    assert_eq!(reply.response, "Use `simp`.");

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    let (headers, body) = &seen[0];
    assert_eq!(headers["x-api-key"], "sk-test");
    assert_eq!(headers["anthropic-version"], "2023-06-01");
    assert_eq!(body["model"], "claude-test");
    assert_eq!(body["max_tokens"], 64);
    assert!(body["system"].as_str().unwrap_or_default().contains("Lean 4"));
    assert_eq!(body["messages"][0]["role"], "user");
    let user = body["messages"][0]["content"].as_str().unwrap_or_default();
    assert!(user.contains("```lean\nexample : 0 + n = n := by\n  sorry\n```"));
    assert!(user.contains("Question: How do I finish this?"));
    assert!(user.ends_with("Additional context: unsolved goals"));
    Ok(())
}

#[tokio::test]
async fn upstream_error_is_reported_not_raised() -> Result<()> {
    let (addr, _) = fake_upstream(
        StatusCode::UNAUTHORIZED,
        json!({ "type": "error", "error": { "message": "invalid x-api-key" } }),
    )
    .await?;

    let reply = advisor(addr, Locale::Ja)?
        .ask(&ChatRequest {
            message: "?".into(),
            code: String::new(),
            context: None,
        })
        .await;
    assert!(!reply.success);
    assert!(reply.response.starts_with("AIチャットエラー: "));
    assert!(reply.response.contains("401"));
    Ok(())
}

#[tokio::test]
async fn reply_without_text_is_a_failure() -> Result<()> {
    let (addr, _) = fake_upstream(StatusCode::OK, json!({ "content": [] })).await?;

    let reply = advisor(addr, Locale::En)?
        .ask(&ChatRequest {
            message: "?".into(),
            code: String::new(),
            context: None,
        })
        .await;
    assert!(!reply.success);
    assert!(reply.response.starts_with("AI chat error: "));
    Ok(())
}
