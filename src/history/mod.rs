//! Durable conversation state.
//!
//! A thread's history is an ordered sequence of [`Message`]s persisted as
//! append-only [`Checkpoint`] snapshots. Compaction (see
//! `agent::compactor`) only ever produces an ephemeral view; the types
//! here are what actually lands in storage.

mod message;
mod store;

pub use message::{Checkpoint, Message, MessageRole, PendingInterrupt, ToolCallRequest};
pub use store::{
    CoachFilter, CoachRecord, JobFilter, JobListing, MemoryRecord, ProfilePatch, ProfileRecord,
    SavedJobRecord, SessionRecord, Store,
};
