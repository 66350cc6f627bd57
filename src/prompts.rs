//! Prompt text for the analysis and generation calls.

use crate::schemas::TopicSuggestion;

/// Appended to context that was cut to fit the generation prompt
pub const OMISSION_MARKER: &str = "... (생략됨)";

/// Korean content-strategist persona used for the analysis call
pub const ANALYSIS_INSTRUCTION: &str = "당신은 전문 유튜브 컨텐츠 전략가입니다.
사용자가 제공한 대본이나 아이디어 텍스트를 분석하여 다음을 수행하세요:
1. 톤앤매너(Tone)와 타겟 시청자(Target Audience)를 파악하세요.
2. 해당 채널의 성장에 도움이 될 만한, 조회수가 잘 나올법한 3가지 새로운 콘텐츠 주제를 제안하세요.
3. 각 주제는 매력적인 '제목', 짧은 '설명', 그리고 '추천 이유'를 포함해야 합니다.";

/// Example shape for providers without native schema support
const ANALYSIS_EXAMPLE_JSON: &str = r#"{
  "tone": "분석된 톤앤매너",
  "targetAudience": "타겟 시청자층",
  "topics": [
    {
      "title": "매력적인 유튜브 제목",
      "description": "영상 내용 설명",
      "reasoning": "추천 이유"
    }
  ]
}"#;

const SCRIPT_RULES: &str = "[대본 작성 규칙]
1. 구성: [후킹(Hook) 0-15초] -> [오프닝/인사] -> [본론(3~5개 포인트)] -> [결론 및 요약] -> [아웃트로/구독좋아요 요청]
2. 시청자가 지루하지 않게 구어체로 작성할 것.
3. 중요한 부분은 강조 표시를 할 것 (Markdown Bold 사용).
4. 영상 편집자를 위한 지시사항(예: 자료화면, 효과음)은 괄호()나 *이텔릭*으로 표기할 것.
5. 한국어로 작성할 것.";

/// Analysis instruction with the example JSON appended and a JSON-only constraint.
pub fn analysis_instruction_with_example() -> String {
    format!(
        "{}\n\nJSON 형식으로 응답하세요:\n{}",
        ANALYSIS_INSTRUCTION, ANALYSIS_EXAMPLE_JSON
    )
}

/// Keep the first `limit` characters of `context`, marking the cut.
///
/// Context at or under the limit is returned unchanged.
pub fn truncate_context(context: &str, limit: usize) -> String {
    match context.char_indices().nth(limit) {
        Some((byte_idx, _)) => format!("{}{}", &context[..byte_idx], OMISSION_MARKER),
        None => context.to_string(),
    }
}

pub fn build_generation_prompt(
    topic: &TopicSuggestion,
    tone: &str,
    original_context: &str,
    context_limit: usize,
) -> String {
    let context = truncate_context(original_context, context_limit);
    format!(
        "다음 주제로 유튜브 영상 대본을 작성해줘.

주제: {title}
설명: {description}
유지해야 할 톤앤매너: {tone}

참고할 원본 스타일(Context):
{context}

{rules}",
        title = topic.title,
        description = topic.description,
        tone = tone,
        context = context,
        rules = SCRIPT_RULES,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topic() -> TopicSuggestion {
        TopicSuggestion {
            title: "초보자가 꼭 피해야 할 실수".into(),
            description: "흔한 실수와 해결법".into(),
            reasoning: "검색량이 많음".into(),
        }
    }

    #[test]
    fn short_context_is_untouched() {
        assert_eq!(truncate_context("짧은 대본", 500), "짧은 대본");
        let exact = "가".repeat(500);
        assert_eq!(truncate_context(&exact, 500), exact);
    }

    #[test]
    fn long_context_is_cut_on_char_boundary() {
        let long = "가".repeat(501);
        let cut = truncate_context(&long, 500);
        assert_eq!(cut, format!("{}{}", "가".repeat(500), OMISSION_MARKER));
        assert_eq!(cut.chars().count(), 500 + OMISSION_MARKER.chars().count());
    }

    #[test]
    fn generation_prompt_embeds_topic_tone_and_rules() {
        let prompt = build_generation_prompt(&topic(), "교육적인", "원본 대본", 500);
        assert!(prompt.contains("주제: 초보자가 꼭 피해야 할 실수"));
        assert!(prompt.contains("설명: 흔한 실수와 해결법"));
        assert!(prompt.contains("유지해야 할 톤앤매너: 교육적인"));
        assert!(prompt.contains("원본 대본"));
        for n in 1..=5 {
            assert!(prompt.contains(&format!("\n{}. ", n)), "missing rule {}", n);
        }
        assert!(!prompt.contains(OMISSION_MARKER));
    }

    #[test]
    fn example_instruction_keeps_persona() {
        let s = analysis_instruction_with_example();
        assert!(s.starts_with(ANALYSIS_INSTRUCTION));
        assert!(s.contains("\"targetAudience\""));
    }
}
