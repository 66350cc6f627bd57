//! Presentation helpers shared by the TUI and the headless runner.
//!
//! Nothing here changes state: each function turns controller data into
//! ratatui lines or plain text.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use ratatui::prelude::*;

use crate::error::Result;
use crate::schemas::{AnalysisResult, AppStep, TopicSuggestion};

pub const RESULT_FALLBACK_TITLE: &str = "생성된 대본";
pub const ANALYZING_LABEL: &str = "분석 중...";
pub const GENERATING_LABEL: &str = "대본 작성 중...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Completed,
    Current,
    Pending,
}

const VISIBLE_STEPS: [(AppStep, &str); 3] = [
    (AppStep::Input, "1. 대본 입력"),
    (AppStep::Selecting, "2. 주제 선정"),
    (AppStep::Result, "3. 대본 완성"),
];

fn step_order(step: AppStep) -> usize {
    match step {
        AppStep::Input => 0,
        AppStep::Selecting => 1,
        AppStep::Generating => 2,
        AppStep::Result => 3,
    }
}

/// Status of each visible step. Generating is shown as topic selection.
pub fn step_statuses(current: AppStep) -> [(&'static str, StepStatus); 3] {
    let current = if current == AppStep::Generating {
        AppStep::Selecting
    } else {
        current
    };
    let current_idx = step_order(current);
    VISIBLE_STEPS.map(|(step, label)| {
        let idx = step_order(step);
        let status = if idx < current_idx {
            StepStatus::Completed
        } else if idx == current_idx {
            StepStatus::Current
        } else {
            StepStatus::Pending
        };
        (label, status)
    })
}

pub fn step_indicator_line(current: AppStep) -> Line<'static> {
    let mut spans = Vec::new();
    for (i, (label, status)) in step_statuses(current).into_iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled("  ──  ", Style::default().fg(Color::DarkGray)));
        }
        let (marker, style) = match status {
            StepStatus::Completed => ("✓ ", Style::default().fg(Color::Green)),
            StepStatus::Current => (
                "● ",
                Style::default()
                    .fg(Color::Indexed(99))
                    .add_modifier(Modifier::BOLD),
            ),
            StepStatus::Pending => ("○ ", Style::default().fg(Color::DarkGray)),
        };
        spans.push(Span::styled(format!("{}{}", marker, label), style));
    }
    Line::from(spans)
}

pub fn render_step_indicator_plain(current: AppStep) -> String {
    step_statuses(current)
        .iter()
        .map(|(label, status)| match status {
            StepStatus::Completed => format!("[✓] {}", label),
            StepStatus::Current => format!("[●] {}", label),
            StepStatus::Pending => format!("[ ] {}", label),
        })
        .collect::<Vec<_>>()
        .join("  ")
}

/// Analysis report plus the topic list. `cursor` highlights one topic;
/// while `generating` the list is drawn dimmed.
pub fn analysis_lines(
    analysis: &AnalysisResult,
    cursor: Option<usize>,
    generating: bool,
) -> Vec<Line<'static>> {
    let label = Style::default().fg(Color::Gray);
    let mut lines = vec![
        Line::from(Span::styled(
            "분석 리포트",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled("감지된 톤앤매너: ", label),
            Span::styled(analysis.tone.clone(), Style::default().fg(Color::LightBlue)),
        ]),
        Line::from(vec![
            Span::styled("예상 타겟 시청자: ", label),
            Span::styled(
                analysis.target_audience.clone(),
                Style::default().fg(Color::LightGreen),
            ),
        ]),
        Line::raw(""),
        Line::from(Span::styled(
            "추천 주제 (선택해주세요)",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )),
    ];

    for (idx, topic) in analysis.topics.iter().enumerate() {
        let highlighted = cursor == Some(idx);
        let mut title_style = Style::default().add_modifier(Modifier::BOLD);
        if generating {
            title_style = title_style.fg(Color::DarkGray);
        } else if highlighted {
            title_style = title_style.fg(Color::Indexed(99)).add_modifier(Modifier::REVERSED);
        }
        let body = if generating {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };
        lines.push(Line::raw(""));
        lines.push(Line::from(vec![
            Span::styled(if highlighted { "▶ " } else { "  " }, title_style),
            Span::styled(format!("{}. {}", idx + 1, topic.title), title_style),
        ]));
        lines.push(Line::from(Span::styled(
            format!("   {}", topic.description),
            body,
        )));
        lines.push(Line::from(Span::styled(
            format!("   추천 이유: {}", topic.reasoning),
            body.fg(Color::Gray),
        )));
    }
    lines
}

pub fn render_analysis_plain(analysis: &AnalysisResult) -> String {
    let mut out = format!(
        "분석 리포트\n  감지된 톤앤매너: {}\n  예상 타겟 시청자: {}\n\n추천 주제\n",
        analysis.tone, analysis.target_audience
    );
    for (idx, topic) in analysis.topics.iter().enumerate() {
        out.push_str(&format!(
            "\n{}. {}\n   {}\n   추천 이유: {}\n",
            idx + 1,
            topic.title,
            topic.description,
            topic.reasoning
        ));
    }
    out
}

pub fn script_title(topic: Option<&TopicSuggestion>) -> &str {
    topic
        .map(|t| t.title.as_str())
        .unwrap_or(RESULT_FALLBACK_TITLE)
}

/// Script text with `**bold**` emphasis rendered as styled spans.
pub fn script_lines(script: &str) -> Vec<Line<'static>> {
    script
        .lines()
        .map(|line| {
            let mut spans = Vec::new();
            for (i, part) in line.split("**").enumerate() {
                if part.is_empty() {
                    continue;
                }
                let style = if i % 2 == 1 {
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                spans.push(Span::styled(part.to_string(), style));
            }
            Line::from(spans)
        })
        .collect()
}

pub fn render_script_plain(topic: Option<&TopicSuggestion>, script: &str) -> String {
    format!("# {}\n\n{}\n", script_title(topic), script.trim_end())
}

pub fn busy_label(step: AppStep) -> &'static str {
    if step == AppStep::Generating {
        GENERATING_LABEL
    } else {
        ANALYZING_LABEL
    }
}

pub fn default_script_filename(now: DateTime<Local>) -> String {
    format!("script-{}.md", now.format("%Y%m%d-%H%M%S"))
}

/// Write the rendered script to `path`, or to a timestamped file in `dir`.
pub fn save_script(
    target: Option<&Path>,
    dir: &Path,
    topic: Option<&TopicSuggestion>,
    script: &str,
) -> Result<PathBuf> {
    let path = match target {
        Some(p) => p.to_path_buf(),
        None => dir.join(default_script_filename(Local::now())),
    };
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, render_script_plain(topic, script))?;
    tracing::info!("Saved script to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn analysis() -> AnalysisResult {
        AnalysisResult {
            tone: "교육적인".into(),
            target_audience: "초보자".into(),
            topics: vec![
                TopicSuggestion {
                    title: "첫 주제".into(),
                    description: "설명".into(),
                    reasoning: "이유".into(),
                },
                TopicSuggestion {
                    title: "둘째 주제".into(),
                    description: "설명2".into(),
                    reasoning: "이유2".into(),
                },
            ],
        }
    }

    #[test]
    fn step_statuses_follow_progress() {
        use StepStatus::*;
        let input = step_statuses(AppStep::Input).map(|(_, s)| s);
        assert_eq!(input, [Current, Pending, Pending]);
        let generating = step_statuses(AppStep::Generating).map(|(_, s)| s);
        assert_eq!(generating, [Completed, Current, Pending]);
        let result = step_statuses(AppStep::Result).map(|(_, s)| s);
        assert_eq!(result, [Completed, Completed, Current]);
    }

    #[test]
    fn plain_analysis_lists_numbered_topics() {
        let text = render_analysis_plain(&analysis());
        assert!(text.contains("감지된 톤앤매너: 교육적인"));
        assert!(text.contains("1. 첫 주제"));
        assert!(text.contains("2. 둘째 주제"));
        assert!(text.contains("추천 이유: 이유2"));
    }

    #[test]
    fn analysis_lines_mark_the_cursor() {
        let lines = analysis_lines(&analysis(), Some(1), false);
        let flat: Vec<String> = lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect();
        assert!(flat.iter().any(|l| l == "▶ 2. 둘째 주제"));
        assert!(flat.iter().any(|l| l == "  1. 첫 주제"));
    }

    #[test]
    fn bold_markers_become_styled_spans() {
        let lines = script_lines("이건 **중요**합니다");
        let spans = &lines[0].spans;
        assert_eq!(spans.len(), 3);
        assert_eq!(spans[1].content, "중요");
        assert!(spans[1].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn result_title_falls_back() {
        assert_eq!(script_title(None), RESULT_FALLBACK_TITLE);
        let t = analysis().topics[0].clone();
        assert_eq!(script_title(Some(&t)), "첫 주제");
    }

    #[test]
    fn filename_is_timestamped() {
        let now = Local.with_ymd_and_hms(2026, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(default_script_filename(now), "script-20260309-140507.md");
    }

    #[test]
    fn busy_label_depends_on_step() {
        assert_eq!(busy_label(AppStep::Input), ANALYZING_LABEL);
        assert_eq!(busy_label(AppStep::Generating), GENERATING_LABEL);
    }
}
