pub mod stats;
pub mod stream_config;
pub mod stream_data;

pub use stats::{CaptureStats, FilterStats};
pub use stream_config::{FilterSpec, SourceDescriptor, StreamConfig, StreamKind};
pub use stream_data::StreamData;
