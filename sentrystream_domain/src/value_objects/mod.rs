pub mod confidence;
pub mod enums;
pub mod ids;
pub mod severity;

pub use confidence::Confidence;
pub use enums::{Action, CaptureStatus, Direction, EventKind, ExecutorMode, FilterPriority, StageTag};
pub use ids::{StreamId, SubscriberId};
pub use severity::Severity;
