//! End-to-end turn protocol scenarios against the in-memory store.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use questline::agent::{
    ControlPlaneConfig, RunController, TurnInput, TurnOutcome, TurnRequest, estimate_tokens,
};
use questline::config::{CompactionConfig, GovernorConfig, TurnConfig, default_gated_tools};
use questline::db::{CheckpointStore, Database, MemoryStore};
use questline::error::{LlmError, RunError};
use questline::history::{Checkpoint, Message, ToolCallRequest};
use questline::llm::{LlmProvider, ToolCall, ToolCompletionRequest, ToolCompletionResponse};
use questline::tools::builtin_registry;

/// Provider that replays a fixed script and records what it was sent.
struct ScriptedLlm {
    script: Mutex<Vec<ToolCompletionResponse>>,
    calls: AtomicUsize,
    /// Message counts of each received request.
    seen: Mutex<Vec<usize>>,
}

impl ScriptedLlm {
    fn new(mut responses: Vec<ToolCompletionResponse>) -> Arc<Self> {
        responses.reverse();
        Arc::new(Self {
            script: Mutex::new(responses),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    async fn complete_with_tools(
        &self,
        req: ToolCompletionRequest,
    ) -> Result<ToolCompletionResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(req.messages.len());
        self.script
            .lock()
            .unwrap()
            .pop()
            .ok_or_else(|| LlmError::RequestFailed {
                provider: "scripted".to_string(),
                reason: "script exhausted".to_string(),
            })
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

fn text(content: &str) -> ToolCompletionResponse {
    ToolCompletionResponse {
        content: Some(content.to_string()),
        tool_calls: vec![],
        input_tokens: 0,
        output_tokens: 0,
    }
}

fn tool_call(id: &str, name: &str, args: serde_json::Value) -> ToolCompletionResponse {
    ToolCompletionResponse {
        content: None,
        tool_calls: vec![ToolCall {
            id: id.to_string(),
            name: name.to_string(),
            arguments: args,
        }],
        input_tokens: 0,
        output_tokens: 0,
    }
}

fn control_plane(governor: GovernorConfig, compaction: CompactionConfig) -> ControlPlaneConfig {
    ControlPlaneConfig {
        governor,
        compaction,
        turn: TurnConfig::default(),
        gated_tools: default_gated_tools().into_iter().collect(),
    }
}

fn controller(llm: Arc<ScriptedLlm>, store: Arc<MemoryStore>) -> RunController {
    let registry = Arc::new(builtin_registry(store.clone(), None));
    RunController::new(
        store,
        llm,
        registry,
        control_plane(GovernorConfig::default(), CompactionConfig::default()),
    )
}

fn message_turn(thread_id: &str, message: &str) -> TurnRequest {
    TurnRequest {
        thread_id: thread_id.to_string(),
        input: TurnInput::Message(message.to_string()),
        user_id: Some("user-1".to_string()),
        gated_override: None,
    }
}

fn confirmation_turn(thread_id: &str, call_id: &str, approved: bool) -> TurnRequest {
    TurnRequest {
        thread_id: thread_id.to_string(),
        input: TurnInput::Confirmation {
            call_id: call_id.to_string(),
            approved,
        },
        user_id: Some("user-1".to_string()),
        gated_override: None,
    }
}

/// Scenario A: a gated onboarding call suspends the run, approve resumes
/// it with the captured arguments and the profile write lands.
#[tokio::test]
async fn gated_onboarding_call_suspends_then_approve_executes() {
    let store = Arc::new(MemoryStore::new());
    store.initialize().await.unwrap();

    let llm = ScriptedLlm::new(vec![
        tool_call(
            "call_1",
            "confirm_role_preference",
            serde_json::json!({"role": "cto"}),
        ),
        text("Noted — CTO roles it is. Next: engagement type?"),
    ]);
    let runner = controller(llm.clone(), store.clone());

    let outcome = runner
        .run_turn(message_turn("thread-a", "confirm role = cto"))
        .await
        .unwrap();

    let TurnOutcome::AwaitingConfirmation(interrupt) = outcome else {
        panic!("expected suspension, got {outcome:?}");
    };
    assert_eq!(interrupt.tool_name, "confirm_role_preference");
    assert_eq!(interrupt.arguments, serde_json::json!({"role": "cto"}));
    assert_eq!(llm.call_count(), 1);

    // Nothing was written before confirmation.
    assert!(store.get_profile("user-1").await.unwrap().is_none());

    let outcome = runner
        .run_turn(confirmation_turn("thread-a", &interrupt.call_id, true))
        .await
        .unwrap();

    assert!(matches!(outcome, TurnOutcome::FinalAnswer(ref a) if a.starts_with("Noted")));
    assert_eq!(llm.call_count(), 2);

    // The approved call executed with the captured arguments.
    let profile = store.get_profile("user-1").await.unwrap().unwrap();
    assert_eq!(profile.role_preference.as_deref(), Some("cto"));

    // The success envelope reached the history.
    let checkpoint = store.load("thread-a").await.unwrap().unwrap();
    let result = checkpoint
        .messages
        .iter()
        .find(|m| m.tool_call_id.as_deref() == Some(interrupt.call_id.as_str()))
        .unwrap();
    let payload: serde_json::Value = serde_json::from_str(&result.content).unwrap();
    assert_eq!(payload["success"], true);
    assert_eq!(payload["role_preference"], "cto");
}

/// Scenario B: a thread with `max_calls` tool calls already in history
/// trips the budget before any model call is made.
#[tokio::test]
async fn exhausted_budget_blocks_before_model_call() {
    let store = Arc::new(MemoryStore::new());
    store.initialize().await.unwrap();

    // 50 recorded tool calls, all answered.
    let mut messages = vec![Message::system("sys"), Message::human("do everything")];
    let calls: Vec<ToolCallRequest> = (0..50)
        .map(|i| ToolCallRequest {
            call_id: format!("c{i}"),
            name: "search_jobs".to_string(),
            arguments: serde_json::json!({}),
        })
        .collect();
    messages.push(Message::assistant_with_calls("", calls));
    for i in 0..50 {
        messages.push(Message::tool_result(format!("c{i}"), "{}"));
    }
    store
        .append(
            "thread-b",
            &Checkpoint::new("thread-b", messages, None, 1),
        )
        .await
        .unwrap();

    let llm = ScriptedLlm::new(vec![text("should never be reached")]);
    let registry = Arc::new(builtin_registry(store.clone(), None));
    let runner = RunController::new(
        store,
        llm.clone(),
        registry,
        control_plane(
            GovernorConfig {
                max_calls: 50,
                warn_at_percentage: 80,
            },
            CompactionConfig::default(),
        ),
    );

    let err = runner
        .run_turn(message_turn("thread-b", "one more thing"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RunError::ToolBudgetExceeded {
            limit: 50,
            current: 50
        }
    ));
    assert_eq!(llm.call_count(), 0);
}

/// Scenario C: an over-budget history reaches the model compacted, while
/// the durable history stays complete.
#[tokio::test]
async fn long_history_is_compacted_for_the_model_only() {
    let store = Arc::new(MemoryStore::new());
    store.initialize().await.unwrap();

    // 100 messages of ~100 approximate tokens each.
    let mut messages = vec![Message::system("You are a career assistant.")];
    for i in 0..100 {
        let content = format!("{i:03}{}", "x".repeat(397));
        messages.push(Message::human(content));
    }
    store
        .append(
            "thread-c",
            &Checkpoint::new("thread-c", messages, None, 0),
        )
        .await
        .unwrap();

    let llm = ScriptedLlm::new(vec![text("caught up.")]);
    let registry = Arc::new(builtin_registry(store.clone(), None));
    let runner = RunController::new(
        store.clone(),
        llm.clone(),
        registry,
        control_plane(
            GovernorConfig::default(),
            CompactionConfig {
                max_tokens: 8000,
                keep_recent_messages: 6,
                keep_system_message: true,
            },
        ),
    );

    runner
        .run_turn(message_turn("thread-c", "where were we?"))
        .await
        .unwrap();

    // The model saw a bounded view...
    let seen = llm.seen.lock().unwrap().clone();
    assert_eq!(seen.len(), 1);
    assert!(seen[0] >= 6);
    assert!(seen[0] < 102, "model view was not compacted: {}", seen[0]);

    // ...but the durable history kept everything and grew.
    let checkpoint = store.load("thread-c").await.unwrap().unwrap();
    assert_eq!(checkpoint.messages.len(), 103); // + human + assistant
    assert!(estimate_tokens(&checkpoint.messages) > 8000);
}

/// Scenario D: a restart between suspension and confirmation loses
/// nothing; a deny resume proceeds without replaying the model.
#[tokio::test]
async fn restart_mid_interrupt_then_deny_resumes_cleanly() {
    let store = Arc::new(MemoryStore::new());
    store.initialize().await.unwrap();

    let llm = ScriptedLlm::new(vec![tool_call(
        "call_9",
        "schedule_session",
        serde_json::json!({"coach_id": "not-a-uuid", "session_type": "intro_call"}),
    )]);
    let runner = controller(llm.clone(), store.clone());

    let outcome = runner
        .run_turn(message_turn("thread-d", "book me an intro call"))
        .await
        .unwrap();
    let TurnOutcome::AwaitingConfirmation(interrupt) = outcome else {
        panic!("expected suspension");
    };
    let calls_at_suspension = llm.call_count();

    // "Restart": a brand-new controller over the same store.
    let llm2 = ScriptedLlm::new(vec![text("Okay, I won't book anything.")]);
    let runner2 = controller(llm2.clone(), store.clone());

    // Reloading reproduces the identical interrupt descriptor, with no
    // model call involved.
    let reloaded = store.load("thread-d").await.unwrap().unwrap();
    assert_eq!(reloaded.pending_interrupt.as_ref(), Some(&interrupt));
    assert_eq!(llm.call_count(), calls_at_suspension);

    let outcome = runner2
        .run_turn(confirmation_turn("thread-d", &interrupt.call_id, false))
        .await
        .unwrap();

    assert!(matches!(outcome, TurnOutcome::FinalAnswer(_)));
    // The denied tool never ran: no sessions exist.
    assert!(store
        .list_sessions("user-1", None)
        .await
        .unwrap()
        .is_empty());

    // The decline is recorded and the interrupt cleared.
    let checkpoint = store.load("thread-d").await.unwrap().unwrap();
    assert!(checkpoint.pending_interrupt.is_none());
    let decline = checkpoint
        .messages
        .iter()
        .find(|m| m.tool_call_id.as_deref() == Some("call_9"))
        .unwrap();
    let payload: serde_json::Value = serde_json::from_str(&decline.content).unwrap();
    assert_eq!(payload["declined"], true);
}

/// Free calls before a gated one execute; the gated call halts the rest
/// of the turn, and resolution picks the remainder back up.
#[tokio::test]
async fn first_gated_call_blocks_remaining_calls_until_resolved() {
    let store = Arc::new(MemoryStore::new());
    store.initialize().await.unwrap();

    let llm = ScriptedLlm::new(vec![
        ToolCompletionResponse {
            content: None,
            tool_calls: vec![
                ToolCall {
                    id: "c1".to_string(),
                    name: "get_profile_status".to_string(),
                    arguments: serde_json::json!({}),
                },
                ToolCall {
                    id: "c2".to_string(),
                    name: "save_user_fact".to_string(),
                    arguments: serde_json::json!({"fact": "Prefers async work."}),
                },
                ToolCall {
                    id: "c3".to_string(),
                    name: "get_user_memory".to_string(),
                    arguments: serde_json::json!({}),
                },
            ],
            input_tokens: 0,
            output_tokens: 0,
        },
        text("All done."),
    ]);
    let runner = controller(llm.clone(), store.clone());

    let outcome = runner
        .run_turn(message_turn("thread-e", "remember that I prefer async"))
        .await
        .unwrap();

    // c1 (free) executed, c2 (gated) suspended, c3 untouched.
    let TurnOutcome::AwaitingConfirmation(interrupt) = outcome else {
        panic!("expected suspension");
    };
    assert_eq!(interrupt.call_id, "c2");

    let checkpoint = store.load("thread-e").await.unwrap().unwrap();
    assert!(checkpoint
        .messages
        .iter()
        .any(|m| m.tool_call_id.as_deref() == Some("c1")));
    assert!(!checkpoint
        .messages
        .iter()
        .any(|m| m.tool_call_id.as_deref() == Some("c3")));

    // Approving c2 executes it, then c3, then the model concludes.
    let outcome = runner
        .run_turn(confirmation_turn("thread-e", "c2", true))
        .await
        .unwrap();
    assert!(matches!(outcome, TurnOutcome::FinalAnswer(ref a) if a == "All done."));

    let memories = store.list_memories("user-1").await.unwrap();
    assert_eq!(memories.len(), 1);
    assert_eq!(memories[0].content, "Prefers async work.");

    let checkpoint = store.load("thread-e").await.unwrap().unwrap();
    for id in ["c1", "c2", "c3"] {
        assert!(
            checkpoint
                .messages
                .iter()
                .any(|m| m.tool_call_id.as_deref() == Some(id)),
            "call {id} was never answered"
        );
    }
}

/// The full onboarding flow: six gated confirmations build the profile.
#[tokio::test]
async fn full_onboarding_flow_builds_profile() {
    let store = Arc::new(MemoryStore::new());
    store.initialize().await.unwrap();

    let steps: Vec<(&str, serde_json::Value)> = vec![
        ("confirm_role_preference", serde_json::json!({"role": "cto"})),
        ("confirm_trinity", serde_json::json!({"engagement_type": "fractional"})),
        (
            "confirm_experience",
            serde_json::json!({"years": 15, "industries": "Tech, Gaming"}),
        ),
        (
            "confirm_location",
            serde_json::json!({"location": "London", "remote_preference": "flexible"}),
        ),
        (
            "confirm_search_prefs",
            serde_json::json!({"day_rate_min": 700, "day_rate_max": 1100, "availability": "1_month"}),
        ),
        ("complete_onboarding", serde_json::json!({})),
    ];

    for (i, (tool, args)) in steps.into_iter().enumerate() {
        let llm = ScriptedLlm::new(vec![
            tool_call(&format!("step_{i}"), tool, args),
            text("On to the next step."),
        ]);
        let runner = controller(llm, store.clone());

        let outcome = runner
            .run_turn(message_turn("thread-f", "next"))
            .await
            .unwrap();
        let TurnOutcome::AwaitingConfirmation(interrupt) = outcome else {
            panic!("step {i} did not suspend");
        };

        let outcome = runner
            .run_turn(confirmation_turn("thread-f", &interrupt.call_id, true))
            .await
            .unwrap();
        assert!(matches!(outcome, TurnOutcome::FinalAnswer(_)));
    }

    let profile = store.get_profile("user-1").await.unwrap().unwrap();
    assert!(profile.onboarding_completed);
    assert_eq!(profile.role_preference.as_deref(), Some("cto"));
    assert_eq!(profile.trinity.as_deref(), Some("fractional"));
    assert_eq!(profile.experience_years, Some(15));
    assert_eq!(profile.industries, vec!["Tech", "Gaming"]);
    assert_eq!(profile.location.as_deref(), Some("London"));
    assert_eq!(profile.day_rate_min, Some(700));
    assert_eq!(profile.availability.as_deref(), Some("1_month"));
    assert_eq!(profile.current_step, 6);
}
