pub mod analysis;
pub mod generation;

pub use analysis::AnalysisService;
pub use generation::{GENERATION_FALLBACK, GenerationService};
