pub mod entropy_analyzer;
pub mod pattern_analyzer;

pub use entropy_analyzer::EntropyAnalyzer;
pub use pattern_analyzer::PatternAnalyzer;
