//! bandcast-av: engine argument synthesis and external tool execution.
//!
//! This crate owns the boundary to the external transcoding engine: locating
//! it ([`ToolRegistry`]), building its argument list ([`synthesize`]),
//! running it with a timeout ([`EngineCommand`]), and the [`TranscodeEngine`]
//! trait the conversion session is written against.

pub mod args;
pub mod command;
pub mod engine;
pub mod preview;
pub mod tools;

pub use args::{filter_chain, synthesize};
pub use command::{EngineCommand, EngineReport};
pub use engine::{FfmpegEngine, TranscodeEngine};
pub use tools::{ToolConfig, ToolInfo, ToolRegistry};
