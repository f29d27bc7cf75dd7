pub mod ring_buffer;
pub mod smart_buffer;

pub use ring_buffer::RingBuffer;
pub use smart_buffer::{SmartBuffer, ThreatLevel};
