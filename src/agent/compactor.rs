//! History compaction for the model view.
//!
//! Before each model invocation the durable history is trimmed to fit a
//! token budget. The output is ephemeral: it is handed to the model for
//! that one call and never written back, so checkpoints always carry the
//! full history.
//!
//! Token costs are approximated at four characters per token. Cheap,
//! deterministic, and good enough for trimming decisions; never used for
//! billing.

use std::collections::HashSet;

use crate::config::CompactionConfig;
use crate::history::{Message, MessageRole};

/// Approximate chars-per-token ratio for English text.
const CHARS_PER_TOKEN: usize = 4;

/// Estimate the token cost of a single message.
pub fn estimate_message_tokens(message: &Message) -> usize {
    let mut chars = message.content.len();
    for call in &message.tool_calls {
        chars += call.arguments.to_string().len();
    }
    chars / CHARS_PER_TOKEN
}

/// Estimate the token cost of a message sequence.
pub fn estimate_tokens(messages: &[Message]) -> usize {
    messages.iter().map(estimate_message_tokens).sum()
}

/// Trims message history to a token budget.
///
/// `compact` is a pure function of its inputs: the same history and
/// configuration always produce the same output, and re-compacting an
/// already-compacted view is a no-op.
pub struct HistoryCompactor {
    config: CompactionConfig,
}

impl HistoryCompactor {
    pub fn new(config: CompactionConfig) -> Self {
        Self { config }
    }

    /// Produce a bounded view of the history for one model call.
    pub fn compact(&self, messages: &[Message]) -> Vec<Message> {
        if messages.is_empty() {
            return Vec::new();
        }

        let total = estimate_tokens(messages);
        if total <= self.config.max_tokens {
            return messages.to_vec();
        }

        // A leading system message is preserved in full; its cost comes
        // out of the remaining budget.
        let (system, rest) = if self.config.keep_system_message
            && messages[0].role == MessageRole::System
        {
            (Some(&messages[0]), &messages[1..])
        } else {
            (None, messages)
        };

        let system_tokens = system.map_or(0, estimate_message_tokens);
        let budget = self.config.max_tokens.saturating_sub(system_tokens);

        // Keep the largest suffix that fits the remaining budget.
        let mut start = rest.len();
        let mut used = 0;
        while start > 0 {
            let cost = estimate_message_tokens(&rest[start - 1]);
            if used + cost > budget {
                break;
            }
            used += cost;
            start -= 1;
        }

        // The suffix may not begin with a tool result whose assistant
        // request was trimmed away; advance past orphans.
        while start < rest.len() && rest[start].role == MessageRole::Tool {
            start += 1;
        }

        // Recency floor: the model never loses all immediate context,
        // even at the cost of exceeding the nominal budget.
        if rest.len() - start < self.config.keep_recent_messages {
            start = rest.len().saturating_sub(self.config.keep_recent_messages);
            // Re-extend to the owning assistant message rather than
            // starting on an orphaned tool result.
            while start > 0 && rest[start].role == MessageRole::Tool {
                start -= 1;
            }
        }

        let mut result = Vec::with_capacity(1 + rest.len() - start);
        if let Some(system) = system {
            result.push(system.clone());
        }
        result.extend_from_slice(&rest[start..]);

        tracing::debug!(
            before = messages.len(),
            after = result.len(),
            total_tokens = total,
            kept_tokens = estimate_tokens(&result),
            "history compacted"
        );

        if !pairing_intact(&result) {
            debug_assert!(false, "compaction split a tool-call/tool-result pair");
            tracing::error!("compaction produced a torn tool-call pair; keeping full history");
            return messages.to_vec();
        }

        result
    }
}

/// Every tool result in the view must have its originating assistant
/// request in the view as well.
fn pairing_intact(messages: &[Message]) -> bool {
    let mut requested: HashSet<&str> = HashSet::new();
    for message in messages {
        for call in &message.tool_calls {
            requested.insert(call.call_id.as_str());
        }
        if message.role == MessageRole::Tool {
            match &message.tool_call_id {
                Some(id) if requested.contains(id.as_str()) => {}
                _ => return false,
            }
        }
    }
    true
}
