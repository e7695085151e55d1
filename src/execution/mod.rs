//! Rebuild execution

pub mod bridge;
pub mod engine;

pub use bridge::ExecutionBridge;
pub use engine::RebuildEngine;
