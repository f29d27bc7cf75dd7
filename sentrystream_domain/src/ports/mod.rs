pub mod capture;
pub mod filter;
pub mod sink;
pub mod stage;

pub use capture::{Capture, CaptureContext, SubscriberCallback};
pub use filter::Filter;
pub use sink::Sink;
pub use stage::{DeepAnalyzer, Stage};
