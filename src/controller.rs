//! The workflow state machine.
//!
//! `Input -> Selecting -> Generating -> Result`, with a rollback from
//! `Generating` to `Selecting` on failure and `reset` back to `Input` from
//! anywhere. Errors never escape: they land in the error slot as a
//! user-facing message and the step falls back to the last stable one.
//!
//! Each network call is split into `begin_*` (guards + transition, returns a
//! job that owns everything the call needs) and `finish_*` (applies the
//! outcome), so a UI can run the job on a task and keep drawing. `analyze`
//! and `select_topic` chain both halves for callers that can simply await.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::clients::ScriptProvider;
use crate::config::GenerationConfig;
use crate::error::{
    MSG_ANALYSIS_FAILED, MSG_EMPTY_INPUT, MSG_GENERATION_FAILED, MSG_MISSING_CREDENTIAL, Result,
    TubeGeniusError,
};
use crate::schemas::{AnalysisResult, AppStep, ProviderKind, TopicSuggestion};
use crate::services::{AnalysisService, GenerationService};

/// Identifies the call a job belongs to; stale outcomes are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobTicket(u64);

pub struct AnalysisJob {
    ticket: JobTicket,
    service: AnalysisService,
    input: String,
}

impl AnalysisJob {
    pub fn ticket(&self) -> JobTicket {
        self.ticket
    }

    pub async fn run(self) -> Result<AnalysisResult> {
        self.service.analyze(&self.input).await
    }
}

pub struct GenerationJob {
    ticket: JobTicket,
    service: GenerationService,
    topic: TopicSuggestion,
    context: String,
    tone: String,
}

impl GenerationJob {
    pub fn ticket(&self) -> JobTicket {
        self.ticket
    }

    pub fn topic(&self) -> &TopicSuggestion {
        &self.topic
    }

    pub async fn run(self) -> Result<String> {
        self.service
            .generate(&self.topic, &self.context, &self.tone)
            .await
    }
}

#[derive(Clone)]
struct Services {
    kind: ProviderKind,
    analysis: AnalysisService,
    generation: GenerationService,
}

pub struct AppController {
    step: AppStep,
    input: String,
    analysis: Option<AnalysisResult>,
    selected_topic: Option<TopicSuggestion>,
    generated_script: String,
    error: Option<String>,
    in_flight: Option<JobTicket>,
    next_ticket: u64,
    generation_config: GenerationConfig,
    services: Option<Services>,
}

impl AppController {
    /// `provider` is `None` when no credential is available. The
    /// missing-credential message is then shown from the start and every
    /// call is blocked.
    pub fn new(provider: Option<Arc<dyn ScriptProvider>>, generation: GenerationConfig) -> Self {
        let mut controller = Self {
            step: AppStep::Input,
            input: String::new(),
            analysis: None,
            selected_topic: None,
            generated_script: String::new(),
            error: None,
            in_flight: None,
            next_ticket: 0,
            generation_config: generation,
            services: None,
        };
        controller.set_provider(provider);
        controller.error = controller.standing_error();
        controller
    }

    fn set_provider(&mut self, provider: Option<Arc<dyn ScriptProvider>>) {
        let config = &self.generation_config;
        self.services = provider.map(|p| Services {
            kind: p.kind(),
            analysis: AnalysisService::new(p.clone(), config.temperature),
            generation: GenerationService::new(p, config.temperature)
                .with_context_limit(config.context_limit),
        });
    }

    /// Message that stays up while nothing can be sent.
    fn standing_error(&self) -> Option<String> {
        self.services
            .is_none()
            .then(|| MSG_MISSING_CREDENTIAL.to_string())
    }

    pub fn step(&self) -> AppStep {
        self.step
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn analysis(&self) -> Option<&AnalysisResult> {
        self.analysis.as_ref()
    }

    pub fn selected_topic(&self) -> Option<&TopicSuggestion> {
        self.selected_topic.as_ref()
    }

    pub fn generated_script(&self) -> &str {
        &self.generated_script
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn provider_kind(&self) -> Option<ProviderKind> {
        self.services.as_ref().map(|s| s.kind)
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        if self.step != AppStep::Input {
            warn!("Ignoring input edit outside the input step ({})", self.step);
            return;
        }
        self.input = text.into();
    }

    pub fn input_mut(&mut self) -> Option<&mut String> {
        (self.step == AppStep::Input && !self.is_busy()).then_some(&mut self.input)
    }

    pub fn clear_error(&mut self) {
        self.error = self.standing_error();
    }

    fn issue_ticket(&mut self) -> JobTicket {
        self.next_ticket += 1;
        let ticket = JobTicket(self.next_ticket);
        self.in_flight = Some(ticket);
        ticket
    }

    /// Guards and bookkeeping for an analysis call.
    pub fn begin_analysis(&mut self) -> Option<AnalysisJob> {
        if self.step != AppStep::Input || self.is_busy() {
            warn!("Analysis requested in step {} (busy={})", self.step, self.is_busy());
            return None;
        }
        self.error = None;

        if self.input.trim().is_empty() {
            self.error = Some(MSG_EMPTY_INPUT.to_string());
            return None;
        }
        let Some(service) = self.services.as_ref().map(|s| s.analysis.clone()) else {
            self.error = Some(MSG_MISSING_CREDENTIAL.to_string());
            return None;
        };

        let ticket = self.issue_ticket();
        info!("Analyzing input ({} chars)", self.input.chars().count());
        Some(AnalysisJob {
            ticket,
            service,
            input: self.input.clone(),
        })
    }

    pub fn finish_analysis(&mut self, ticket: JobTicket, result: Result<AnalysisResult>) {
        if self.in_flight != Some(ticket) || self.step != AppStep::Input {
            warn!("Dropping stale analysis outcome");
            return;
        }
        self.in_flight = None;

        match result {
            Ok(analysis) => {
                info!("Analysis complete: {} topics", analysis.topics.len());
                self.analysis = Some(analysis);
                self.step = AppStep::Selecting;
            }
            Err(e) => {
                error!("Error analyzing script: {}", e);
                self.error = Some(analysis_message(&e).to_string());
            }
        }
    }

    pub async fn analyze(&mut self) -> AppStep {
        if let Some(job) = self.begin_analysis() {
            let ticket = job.ticket();
            let result = job.run().await;
            self.finish_analysis(ticket, result);
        }
        self.step
    }

    /// Guards and the `Selecting -> Generating` transition.
    ///
    /// Returns `None` (and changes nothing) when no analysis is held, the
    /// index is out of range, or a generation is already in flight.
    pub fn begin_generation(&mut self, index: usize) -> Option<GenerationJob> {
        let analysis = self.analysis.as_ref()?;
        if self.step != AppStep::Selecting || self.is_busy() {
            warn!("Topic selection rejected in step {}", self.step);
            return None;
        }
        let Some(topic) = analysis.topics.get(index).cloned() else {
            warn!("Topic index {} out of range", index);
            return None;
        };
        let tone = analysis.tone.clone();

        self.error = None;
        let Some(service) = self.services.as_ref().map(|s| s.generation.clone()) else {
            self.error = Some(MSG_MISSING_CREDENTIAL.to_string());
            return None;
        };

        let ticket = self.issue_ticket();
        info!("Generating script for '{}'", topic.title);
        self.selected_topic = Some(topic.clone());
        self.step = AppStep::Generating;
        Some(GenerationJob {
            ticket,
            service,
            topic,
            context: self.input.clone(),
            tone,
        })
    }

    pub fn finish_generation(&mut self, ticket: JobTicket, result: Result<String>) {
        if self.in_flight != Some(ticket) || self.step != AppStep::Generating {
            warn!("Dropping stale generation outcome");
            return;
        }
        self.in_flight = None;

        match result {
            Ok(script) => {
                self.generated_script = script;
                self.step = AppStep::Result;
            }
            Err(e) => {
                error!("Error generating script: {}", e);
                self.error = Some(MSG_GENERATION_FAILED.to_string());
                self.step = AppStep::Selecting;
            }
        }
    }

    pub async fn select_topic(&mut self, index: usize) -> AppStep {
        if let Some(job) = self.begin_generation(index) {
            let ticket = job.ticket();
            let result = job.run().await;
            self.finish_generation(ticket, result);
        }
        self.step
    }

    /// Back to `Input` with every transient field cleared.
    pub fn reset(&mut self) {
        self.step = AppStep::Input;
        self.input.clear();
        self.analysis = None;
        self.selected_topic = None;
        self.generated_script.clear();
        self.error = self.standing_error();
        self.in_flight = None;
    }
}

fn analysis_message(err: &TubeGeniusError) -> &'static str {
    match err {
        TubeGeniusError::Validation { .. } => MSG_EMPTY_INPUT,
        TubeGeniusError::MissingCredential { .. } => MSG_MISSING_CREDENTIAL,
        _ => MSG_ANALYSIS_FAILED,
    }
}
