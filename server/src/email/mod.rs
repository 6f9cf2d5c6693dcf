pub mod analysis;
pub mod chunker;

pub use analysis::{AnalysisCache, AnalysisResult, EmailAnalyzer};
