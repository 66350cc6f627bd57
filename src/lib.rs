pub mod clients;
pub mod config;
pub mod controller;
pub mod credentials;
pub mod error;
pub mod prompts;
pub mod schemas;
pub mod services;
pub mod tui;
pub mod views;

pub use controller::AppController;
pub use error::{Result, TubeGeniusError};
pub use schemas::{AnalysisResult, AppStep, ProviderKind, TopicSuggestion};

/// Load `.env` from the working directory when present.
pub fn load_env() {
    let _ = dotenvy::dotenv();
}
