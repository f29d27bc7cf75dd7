pub mod pattern_registry;

pub use pattern_registry::PatternRegistry;
