//! Interactive terminal front end.
//!
//! Owns the controller. A network call runs on a spawned task; the loop keeps
//! redrawing a busy overlay and polls the task's oneshot until it resolves.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::{execute, terminal};
use ratatui::prelude::*;
use ratatui::widgets::*;
use tokio::sync::oneshot;

use crate::controller::{AppController, JobTicket};
use crate::error::{Result, TubeGeniusError};
use crate::schemas::{AnalysisResult, AppStep};
use crate::views;

const TICK: Duration = Duration::from_millis(100);
const SPINNER: [&str; 8] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧"];

enum Pending {
    Analysis(JobTicket, oneshot::Receiver<Result<AnalysisResult>>),
    Generation(JobTicket, oneshot::Receiver<Result<String>>),
}

pub struct TuiApp {
    controller: AppController,
    pending: Option<Pending>,
    cursor: usize,
    scroll: u16,
    spinner: usize,
    notice: Option<String>,
    save_dir: PathBuf,
    quit: bool,
}

impl TuiApp {
    pub fn new(controller: AppController, save_dir: PathBuf) -> Self {
        Self {
            controller,
            pending: None,
            cursor: 0,
            scroll: 0,
            spinner: 0,
            notice: None,
            save_dir,
            quit: false,
        }
    }

    /// Take over the terminal until the user quits.
    pub async fn run(mut self) -> anyhow::Result<()> {
        terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, terminal::EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut term = Terminal::new(backend)?;

        let outcome = self.event_loop(&mut term).await;

        terminal::disable_raw_mode()?;
        execute!(term.backend_mut(), terminal::LeaveAlternateScreen)?;
        term.show_cursor()?;
        outcome
    }

    async fn event_loop(
        &mut self,
        term: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> anyhow::Result<()> {
        while !self.quit {
            self.poll_pending();
            term.draw(|f| self.draw(f))?;

            if event::poll(TICK)? {
                if let Event::Key(key) = event::read()?
                    && key.kind == KeyEventKind::Press
                {
                    self.handle_key(key);
                }
            } else if self.pending.is_some() {
                self.spinner = (self.spinner + 1) % SPINNER.len();
            }
            tokio::task::yield_now().await;
        }
        Ok(())
    }

    fn poll_pending(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        match pending {
            Pending::Analysis(ticket, mut rx) => match rx.try_recv() {
                Ok(result) => {
                    self.controller.finish_analysis(ticket, result);
                    self.cursor = 0;
                }
                Err(oneshot::error::TryRecvError::Empty) => {
                    self.pending = Some(Pending::Analysis(ticket, rx));
                }
                Err(oneshot::error::TryRecvError::Closed) => {
                    self.controller
                        .finish_analysis(ticket, Err(task_lost("analysis")));
                }
            },
            Pending::Generation(ticket, mut rx) => match rx.try_recv() {
                Ok(result) => {
                    self.controller.finish_generation(ticket, result);
                    self.scroll = 0;
                }
                Err(oneshot::error::TryRecvError::Empty) => {
                    self.pending = Some(Pending::Generation(ticket, rx));
                }
                Err(oneshot::error::TryRecvError::Closed) => {
                    self.controller
                        .finish_generation(ticket, Err(task_lost("generation")));
                }
            },
        }
    }

    fn start_analysis(&mut self) {
        if let Some(job) = self.controller.begin_analysis() {
            let ticket = job.ticket();
            let (tx, rx) = oneshot::channel();
            tokio::spawn(async move {
                let _ = tx.send(job.run().await);
            });
            self.pending = Some(Pending::Analysis(ticket, rx));
        }
    }

    fn start_generation(&mut self, index: usize) {
        if let Some(job) = self.controller.begin_generation(index) {
            let ticket = job.ticket();
            let (tx, rx) = oneshot::channel();
            tokio::spawn(async move {
                let _ = tx.send(job.run().await);
            });
            self.pending = Some(Pending::Generation(ticket, rx));
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && key.code == KeyCode::Char('c') {
            self.quit = true;
            return;
        }
        // Calls cannot be cancelled; everything else waits for the result
        if self.pending.is_some() {
            return;
        }
        self.notice = None;

        match self.controller.step() {
            AppStep::Input => self.handle_input_key(key, ctrl),
            AppStep::Selecting => self.handle_selecting_key(key),
            AppStep::Result => self.handle_result_key(key),
            AppStep::Generating => {}
        }
    }

    fn handle_input_key(&mut self, key: KeyEvent, ctrl: bool) {
        match key.code {
            KeyCode::Esc => self.quit = true,
            KeyCode::F(5) => self.start_analysis(),
            KeyCode::Char('s') if ctrl => self.start_analysis(),
            KeyCode::Char('r') if ctrl => self.controller.reset(),
            KeyCode::Enter => self.edit_input(|buf| buf.push('\n')),
            KeyCode::Tab => self.edit_input(|buf| buf.push_str("    ")),
            KeyCode::Backspace => self.edit_input(|buf| {
                buf.pop();
            }),
            KeyCode::Char(c) if !ctrl => self.edit_input(|buf| buf.push(c)),
            _ => {}
        }
    }

    fn edit_input(&mut self, edit: impl FnOnce(&mut String)) {
        if let Some(buf) = self.controller.input_mut() {
            edit(buf);
            self.controller.clear_error();
        }
    }

    fn handle_selecting_key(&mut self, key: KeyEvent) {
        let count = self
            .controller
            .analysis()
            .map(|a| a.topics.len())
            .unwrap_or(0);
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.quit = true,
            KeyCode::Char('r') => self.controller.reset(),
            KeyCode::Up | KeyCode::Char('k') => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') if count > 0 => {
                self.cursor = (self.cursor + 1).min(count - 1);
            }
            KeyCode::Enter => self.start_generation(self.cursor),
            KeyCode::Char(c) if c.is_ascii_digit() && c != '0' => {
                let idx = c as usize - '1' as usize;
                if idx < count {
                    self.cursor = idx;
                    self.start_generation(idx);
                }
            }
            _ => {}
        }
    }

    fn handle_result_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.quit = true,
            KeyCode::Char('r') => {
                self.controller.reset();
                self.cursor = 0;
                self.scroll = 0;
            }
            KeyCode::Char('s') => {
                let saved = views::save_script(
                    None,
                    &self.save_dir,
                    self.controller.selected_topic(),
                    self.controller.generated_script(),
                );
                self.notice = Some(match saved {
                    Ok(path) => format!("저장 완료: {}", path.display()),
                    Err(e) => {
                        tracing::error!("Failed to save script: {}", e);
                        format!("저장 실패: {}", e)
                    }
                });
            }
            KeyCode::Up | KeyCode::Char('k') => self.scroll = self.scroll.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => self.scroll = self.scroll.saturating_add(1),
            KeyCode::PageUp => self.scroll = self.scroll.saturating_sub(10),
            KeyCode::PageDown => self.scroll = self.scroll.saturating_add(10),
            _ => {}
        }
    }

    fn draw(&self, f: &mut Frame) {
        let banner_height = if self.controller.error().is_some() || self.notice.is_some() {
            3
        } else {
            0
        };
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(1),
                Constraint::Length(banner_height),
                Constraint::Min(6),
                Constraint::Length(1),
            ])
            .split(f.size());

        let provider = self
            .controller
            .provider_kind()
            .map(|k| k.to_string())
            .unwrap_or_else(|| "API 키 없음".to_string());
        let header = Paragraph::new(Line::from(vec![
            Span::styled(
                "TubeGenius",
                Style::default()
                    .fg(Color::Indexed(99))
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("  |  AI 유튜브 대본 생성기  |  provider: "),
            Span::styled(provider, Style::default().fg(Color::Cyan)),
        ]))
        .block(Block::default().borders(Borders::ALL));
        f.render_widget(header, chunks[0]);

        f.render_widget(
            Paragraph::new(views::step_indicator_line(self.controller.step()))
                .alignment(Alignment::Center),
            chunks[1],
        );

        if let Some(err) = self.controller.error() {
            let banner = Paragraph::new(err.to_string())
                .style(Style::default().fg(Color::LightRed))
                .block(Block::default().borders(Borders::ALL).title("오류"));
            f.render_widget(banner, chunks[2]);
        } else if let Some(notice) = &self.notice {
            let banner = Paragraph::new(notice.clone())
                .style(Style::default().fg(Color::LightGreen))
                .block(Block::default().borders(Borders::ALL));
            f.render_widget(banner, chunks[2]);
        }

        self.draw_body(f, chunks[3]);

        let help = match self.controller.step() {
            AppStep::Input => "입력 후 Ctrl+S 또는 F5: 분석  |  Ctrl+R: 지우기  |  Esc: 종료",
            AppStep::Selecting => "↑/↓ 또는 1-9: 주제 선택  |  Enter: 대본 생성  |  r: 처음부터  |  q: 종료",
            AppStep::Generating => "대본을 작성하고 있습니다. 잠시만 기다려주세요.",
            AppStep::Result => "↑/↓: 스크롤  |  s: 파일로 저장  |  r: 새로운 대본 만들기  |  q: 종료",
        };
        f.render_widget(
            Paragraph::new(help).style(Style::default().fg(Color::DarkGray)),
            chunks[4],
        );

        if self.pending.is_some() {
            self.draw_busy(f);
        }
    }

    fn draw_body(&self, f: &mut Frame, area: Rect) {
        match self.controller.step() {
            AppStep::Input => {
                let text = if self.controller.input().is_empty() {
                    Text::from(Span::styled(
                        "예시: 안녕하세요! 오늘은 지난번 댓글에서 요청해주신 '초보자가 실수하는 3가지'에 대해 이야기해보려고 합니다...",
                        Style::default().fg(Color::DarkGray),
                    ))
                } else {
                    Text::raw(format!("{}▏", self.controller.input()))
                };
                let input = Paragraph::new(text).wrap(Wrap { trim: false }).block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title("기존 대본이나 아이디어를 입력하세요 (짧아도 괜찮아요!)"),
                );
                f.render_widget(input, area);
            }
            AppStep::Selecting | AppStep::Generating => {
                if let Some(analysis) = self.controller.analysis() {
                    let generating = self.controller.step() == AppStep::Generating;
                    let lines = views::analysis_lines(analysis, Some(self.cursor), generating);
                    let body = Paragraph::new(lines)
                        .wrap(Wrap { trim: false })
                        .block(Block::default().borders(Borders::ALL));
                    f.render_widget(body, area);
                }
            }
            AppStep::Result => {
                let title = views::script_title(self.controller.selected_topic()).to_string();
                let body = Paragraph::new(views::script_lines(self.controller.generated_script()))
                    .wrap(Wrap { trim: false })
                    .scroll((self.scroll, 0))
                    .block(Block::default().borders(Borders::ALL).title(Span::styled(
                        title,
                        Style::default().add_modifier(Modifier::BOLD),
                    )));
                f.render_widget(body, area);
            }
        }
    }

    fn draw_busy(&self, f: &mut Frame) {
        let area = centered_rect(50, 7, f.size());
        let step = self.controller.step();
        let mut lines = vec![
            Line::raw(""),
            Line::from(Span::styled(
                format!("{} {}", SPINNER[self.spinner], views::busy_label(step)),
                Style::default().add_modifier(Modifier::BOLD),
            )),
        ];
        if step == AppStep::Generating
            && let Some(topic) = self.controller.selected_topic()
        {
            lines.push(Line::from(format!("\"{}\"", topic.title)));
        }
        lines.push(Line::from(Span::styled(
            "AI가 창의력을 발휘하고 있습니다. 잠시만 기다려주세요.",
            Style::default().fg(Color::Gray),
        )));

        f.render_widget(Clear, area);
        f.render_widget(
            Paragraph::new(lines)
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true })
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(Color::Indexed(99))),
                ),
            area,
        );
    }
}

fn task_lost(what: &str) -> TubeGeniusError {
    TubeGeniusError::Internal {
        message: format!("{} task ended without a result", what),
    }
}

/// Rect of `percent_x` width and `height` rows centered in `r`.
fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let width = (u32::from(r.width) * u32::from(percent_x) / 100) as u16;
    let height = height.min(r.height);
    Rect {
        x: r.x + (r.width - width) / 2,
        y: r.y + (r.height - height) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_rect_stays_inside() {
        let outer = Rect::new(0, 0, 100, 40);
        let inner = centered_rect(50, 7, outer);
        assert_eq!(inner.width, 50);
        assert_eq!(inner.height, 7);
        assert_eq!(inner.x, 25);
        assert_eq!(inner.y, 16);

        let tiny = centered_rect(50, 7, Rect::new(0, 0, 10, 3));
        assert_eq!(tiny.height, 3);

        let wide = centered_rect(50, 7, Rect::new(0, 0, 4000, 40));
        assert_eq!(wide.width, 2000);
        assert_eq!(wide.x, 1000);
    }
}
