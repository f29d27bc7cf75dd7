pub mod alert;
pub mod attack_pattern;
pub mod event;
pub mod stage_result;

pub use alert::Alert;
pub use attack_pattern::{AttackPattern, Finding};
pub use event::Event;
pub use stage_result::{AnalyzerResult, ConsensusResult, ProcessingResult, StageResult};
