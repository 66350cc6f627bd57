//! Provider clients against local stand-ins for the Gemini and OpenAI endpoints

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};

use tube_genius::clients::{GeminiClient, OpenAIClient, ScriptProvider};
use tube_genius::prompts::ANALYSIS_INSTRUCTION;
use tube_genius::services::{AnalysisService, GENERATION_FALLBACK, GenerationService};
use tube_genius::{TopicSuggestion, TubeGeniusError};

const GEMINI_KEY: &str = "test-gemini-key";
const OPENAI_KEY: &str = "sk-test-openai";

#[derive(Clone, Default)]
struct Recorder {
    calls: Arc<Mutex<Vec<(String, Value)>>>,
}

impl Recorder {
    fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }
}

fn analysis_json() -> String {
    json!({
        "tone": "교육적인",
        "targetAudience": "초보자",
        "topics": [
            {"title": "실수 TOP 3", "description": "흔한 실수", "reasoning": "검색 수요"},
            {"title": "1주 루틴", "description": "입문 루틴", "reasoning": "시리즈화"},
            {"title": "전문가 꿀팁", "description": "인터뷰", "reasoning": "신규 유입"}
        ]
    })
    .to_string()
}

fn topic() -> TopicSuggestion {
    TopicSuggestion {
        title: "실수 TOP 3".into(),
        description: "흔한 실수".into(),
        reasoning: "검색 수요".into(),
    }
}

async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn gemini_handler(
    State(rec): State<Recorder>,
    Path(action): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if headers.get("x-goog-api-key").and_then(|v| v.to_str().ok()) != Some(GEMINI_KEY) {
        return (StatusCode::UNAUTHORIZED, "API key not valid").into_response();
    }
    rec.calls.lock().unwrap().push((action, body.clone()));

    let user_text = body["contents"][0]["parts"][0]["text"].as_str().unwrap_or("");
    if user_text == "slow" {
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
    if user_text == "garbage" {
        return (StatusCode::OK, "<html>not json</html>").into_response();
    }

    let text = if body["generationConfig"].get("responseSchema").is_some() {
        analysis_json()
    } else {
        "[후킹] **대본**입니다".to_string()
    };
    Json(json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }]
    }))
    .into_response()
}

async fn openai_handler(
    State(rec): State<Recorder>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let expected = format!("Bearer {}", OPENAI_KEY);
    if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some(expected.as_str()) {
        return (StatusCode::UNAUTHORIZED, "Incorrect API key provided").into_response();
    }
    rec.calls
        .lock()
        .unwrap()
        .push(("chat/completions".to_string(), body.clone()));

    let content = if body.get("response_format").is_some() {
        Value::String(analysis_json())
    } else if body["messages"][0]["content"]
        .as_str()
        .is_some_and(|c| c.contains("EMPTY"))
    {
        Value::Null
    } else {
        Value::String("[후킹] 오픈AI 대본".to_string())
    };
    Json(json!({
        "id": "chatcmpl-test",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    }))
    .into_response()
}

async fn gemini_server() -> (String, Recorder) {
    let rec = Recorder::default();
    let router = Router::new()
        .route("/v1beta/models/:action", post(gemini_handler))
        .with_state(rec.clone());
    (spawn(router).await, rec)
}

async fn openai_server() -> (String, Recorder) {
    let rec = Recorder::default();
    let router = Router::new()
        .route("/v1/chat/completions", post(openai_handler))
        .with_state(rec.clone());
    (spawn(router).await, rec)
}

fn gemini(base: &str, key: &str, timeout_ms: u64) -> Arc<dyn ScriptProvider> {
    Arc::new(
        GeminiClient::new(key.into(), "gemini-test".into(), base.into(), timeout_ms).unwrap(),
    )
}

fn openai(base: &str, key: &str) -> Arc<dyn ScriptProvider> {
    Arc::new(OpenAIClient::new(key.into(), "gpt-4o-mini".into(), base.into(), 5_000).unwrap())
}

#[tokio::test]
async fn gemini_analysis_sends_schema_and_persona() {
    let (base, rec) = gemini_server().await;
    let service = AnalysisService::new(gemini(&base, GEMINI_KEY, 5_000), 0.7);

    let result = service.analyze("오늘은 초보자 실수 3가지를 다룹니다").await.unwrap();
    assert_eq!(result.tone, "교육적인");
    assert_eq!(result.topics.len(), 3);

    let calls = rec.calls();
    assert_eq!(calls.len(), 1);
    let (action, body) = &calls[0];
    assert_eq!(action, "gemini-test:generateContent");
    assert_eq!(
        body["systemInstruction"]["parts"][0]["text"],
        ANALYSIS_INSTRUCTION
    );
    assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
    assert_eq!(
        body["generationConfig"]["responseSchema"]["required"],
        json!(["tone", "targetAudience", "topics"])
    );
}

#[tokio::test]
async fn openai_analysis_uses_json_mode_with_example() {
    let (base, rec) = openai_server().await;
    let service = AnalysisService::new(openai(&base, OPENAI_KEY), 0.7);

    let result = service.analyze("대본 내용").await.unwrap();
    assert_eq!(result.target_audience, "초보자");

    let (_, body) = &rec.calls()[0];
    assert_eq!(body["response_format"]["type"], "json_object");
    assert_eq!(body["messages"][0]["role"], "system");
    let system = body["messages"][0]["content"].as_str().unwrap();
    assert!(system.starts_with(ANALYSIS_INSTRUCTION));
    assert!(system.contains("JSON 형식으로 응답하세요"));
    assert_eq!(body["messages"][1]["content"], "대본 내용");
}

#[tokio::test]
async fn both_providers_yield_the_same_analysis() {
    let (g_base, _) = gemini_server().await;
    let (o_base, _) = openai_server().await;
    let from_gemini = AnalysisService::new(gemini(&g_base, GEMINI_KEY, 5_000), 0.7)
        .analyze("같은 입력")
        .await
        .unwrap();
    let from_openai = AnalysisService::new(openai(&o_base, OPENAI_KEY), 0.7)
        .analyze("같은 입력")
        .await
        .unwrap();
    assert_eq!(from_gemini, from_openai);
}

#[tokio::test]
async fn generation_is_plain_text_on_both_providers() {
    let (g_base, g_rec) = gemini_server().await;
    let (o_base, o_rec) = openai_server().await;

    let script = GenerationService::new(gemini(&g_base, GEMINI_KEY, 5_000), 0.7)
        .generate(&topic(), "원본", "교육적인")
        .await
        .unwrap();
    assert_eq!(script, "[후킹] **대본**입니다");
    let (_, g_body) = &g_rec.calls()[0];
    assert!(g_body.get("systemInstruction").is_none());
    assert!(g_body["generationConfig"].get("responseSchema").is_none());

    let script = GenerationService::new(openai(&o_base, OPENAI_KEY), 0.7)
        .generate(&topic(), "원본", "교육적인")
        .await
        .unwrap();
    assert_eq!(script, "[후킹] 오픈AI 대본");
    let (_, o_body) = &o_rec.calls()[0];
    assert_eq!(o_body["messages"].as_array().unwrap().len(), 1);
    assert!(o_body.get("response_format").is_none());
}

#[tokio::test]
async fn null_content_falls_back() {
    let (base, _) = openai_server().await;
    let service = GenerationService::new(openai(&base, OPENAI_KEY), 0.7);
    let empty_topic = TopicSuggestion {
        title: "EMPTY".into(),
        ..topic()
    };
    let script = service.generate(&empty_topic, "원본", "밝은").await.unwrap();
    assert_eq!(script, GENERATION_FALLBACK);
}

#[tokio::test]
async fn rejected_key_is_a_provider_error() {
    let (base, _) = gemini_server().await;
    let service = AnalysisService::new(gemini(&base, "wrong", 5_000), 0.7);
    match service.analyze("대본").await {
        Err(TubeGeniusError::Provider { provider, message }) => {
            assert_eq!(provider, "gemini");
            assert!(message.contains("401"), "{}", message);
        }
        other => panic!("expected provider error, got {:?}", other.map(|_| ())),
    }

    let (base, _) = openai_server().await;
    let service = AnalysisService::new(openai(&base, "sk-wrong"), 0.7);
    assert!(matches!(
        service.analyze("대본").await,
        Err(TubeGeniusError::Provider { .. })
    ));
}

#[tokio::test]
async fn slow_provider_times_out() {
    let (base, _) = gemini_server().await;
    let service = AnalysisService::new(gemini(&base, GEMINI_KEY, 50), 0.7);
    match service.analyze("slow").await {
        Err(TubeGeniusError::Timeout { timeout_ms, .. }) => assert_eq!(timeout_ms, 50),
        other => panic!("expected timeout, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn non_json_body_is_a_parse_error() {
    let (base, _) = gemini_server().await;
    let service = AnalysisService::new(gemini(&base, GEMINI_KEY, 5_000), 0.7);
    assert!(matches!(
        service.analyze("garbage").await,
        Err(TubeGeniusError::Parse { .. })
    ));
}

#[tokio::test]
async fn unreachable_endpoint_is_a_provider_error() {
    // Bind then drop to get a port with nothing listening
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let service = AnalysisService::new(openai(&base, OPENAI_KEY), 0.7);
    assert!(matches!(
        service.analyze("대본").await,
        Err(TubeGeniusError::Provider { .. })
    ));
}
