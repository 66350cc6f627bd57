//! Deterministic, local FakeProvider for testing/dev (no network)

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::clients::traits::{ProviderRequest, ScriptProvider};
use crate::error::Result;
use crate::schemas::ProviderKind;

/// Replays queued replies, falling back to canned ones when the queue is empty.
pub struct FakeProvider {
    kind: ProviderKind,
    structured: Mutex<VecDeque<Result<String>>>,
    text: Mutex<VecDeque<Result<Option<String>>>>,
    requests: Mutex<Vec<ProviderRequest>>,
    calls: AtomicUsize,
}

impl Default for FakeProvider {
    fn default() -> Self {
        Self::new(ProviderKind::Gemini)
    }
}

impl FakeProvider {
    pub fn new(kind: ProviderKind) -> Self {
        Self {
            kind,
            structured: Mutex::new(VecDeque::new()),
            text: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn push_structured(&self, reply: Result<String>) -> &Self {
        lock(&self.structured).push_back(reply);
        self
    }

    pub fn push_text(&self, reply: Result<Option<String>>) -> &Self {
        lock(&self.text).push_back(reply);
        self
    }

    /// Number of provider calls made so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        lock(&self.requests).clone()
    }

    fn record(&self, request: &ProviderRequest) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.requests).push(request.clone());
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

/// Canned analysis used when no reply is queued
pub fn canned_analysis_json() -> String {
    serde_json::json!({
        "tone": "교육적인",
        "targetAudience": "초보자",
        "topics": [
            {
                "title": "초보자가 가장 많이 하는 실수 TOP 3",
                "description": "입문자들이 반복하는 실수와 해결법을 정리합니다.",
                "reasoning": "기존 영상의 시청층과 정확히 겹치는 검색 수요가 있습니다."
            },
            {
                "title": "1주일 만에 기초 끝내기 루틴",
                "description": "하루 30분씩 따라 하는 입문 루틴을 소개합니다.",
                "reasoning": "시리즈화가 쉬워 구독 전환에 유리합니다."
            },
            {
                "title": "전문가에게 물어본 입문 꿀팁",
                "description": "현업 전문가 인터뷰로 신뢰도를 높입니다.",
                "reasoning": "협업 콘텐츠는 신규 유입을 늘립니다."
            }
        ]
    })
    .to_string()
}

/// Canned five-part script used when no reply is queued
pub fn canned_script() -> String {
    [
        "[후킹] **이 실수 하나**가 여러분의 시간을 낭비하고 있습니다! (긴장감 있는 효과음)",
        "[오프닝] 안녕하세요 여러분, 오늘도 찾아와 주셔서 감사합니다.",
        "[본론] 첫 번째 포인트... 두 번째 포인트... 세 번째 포인트... *자료화면 삽입*",
        "[결론] 오늘 내용을 **세 줄로 요약**하면 이렇습니다.",
        "[아웃트로] 도움이 되셨다면 구독과 좋아요 부탁드립니다!",
    ]
    .join("\n\n")
}

#[async_trait]
impl ScriptProvider for FakeProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn complete_structured(&self, request: &ProviderRequest) -> Result<String> {
        self.record(request);
        lock(&self.structured)
            .pop_front()
            .unwrap_or_else(|| Ok(canned_analysis_json()))
    }

    async fn complete_text(&self, request: &ProviderRequest) -> Result<Option<String>> {
        self.record(request);
        lock(&self.text)
            .pop_front()
            .unwrap_or_else(|| Ok(Some(canned_script())))
    }
}
