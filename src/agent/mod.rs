//! The agent run-time control plane.
//!
//! Every model turn passes through the same pipeline: the governor
//! checks the tool-call budget, the compactor bounds the model view, and
//! the run controller drives dispatch, suspension, and checkpointing.

pub mod compactor;
pub mod governor;
mod runner;

pub use compactor::{HistoryCompactor, estimate_message_tokens, estimate_tokens};
pub use governor::{ToolCallGovernor, count_tool_calls};
pub use runner::{ControlPlaneConfig, RunController, TurnInput, TurnOutcome, TurnRequest};
