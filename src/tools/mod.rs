//! Extensible tool system.
//!
//! Tools are the agent's interface to the world: profile writes, job
//! search, coaching bookings, user memory. Each is a named operation with
//! a typed JSON-Schema input and a `{success, ..., message}` result
//! envelope. Which tools are gated behind human confirmation is decided
//! by configuration, not by the tools themselves.

pub mod builtin;

mod registry;
mod tool;

pub use builtin::builtin_registry;
pub use registry::ToolRegistry;
pub use tool::{Tool, ToolContext, ToolError, ToolOutput};
