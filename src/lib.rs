//! questline — career-assistance agent backend.
//!
//! The interesting part of this crate is the agent run-time control
//! plane in [`agent`]: every model turn passes through a tool-call
//! budget ([`agent::ToolCallGovernor`]), a history compactor
//! ([`agent::HistoryCompactor`]), and a checkpointing run controller
//! ([`agent::RunController`]) that suspends before gated side effects
//! and resumes deterministically from human confirmation — across
//! process restarts.

pub mod agent;
pub mod config;
pub mod db;
pub mod error;
pub mod history;
pub mod llm;
pub mod search;
pub mod server;
pub mod tools;
