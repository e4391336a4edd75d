mod backend_support;

use std::time::Duration;

use backend_support::{ScriptedBackend, TEST_KEY};
use bandmark::{
    backend::{BackendError, ConversationTurn, Credential, FailureClass, Role},
    tutor::{
        AUTH_FAILURE_MESSAGE, BUSY_FAILURE_MESSAGE, INACTIVE_MESSAGE, QUOTA_FAILURE_MESSAGE,
        RetryPolicy, SessionState, TutorReply, TutorSession, TutorSettings,
    },
};

const MATERIAL: &str = "Q1: Describe your hometown.";

fn session(backend: std::sync::Arc<ScriptedBackend>) -> TutorSession {
    let credential = Credential::parse(TEST_KEY).expect("valid key");
    let mut session = TutorSession::new(backend, credential, TutorSettings::default());
    session.start(MATERIAL, Vec::new());
    session
}

fn rate_limited() -> Result<String, BackendError> {
    Err(BackendError::RateLimited("429".into()))
}

#[tokio::test]
async fn successful_send_appends_both_turns() {
    let backend = ScriptedBackend::new([Ok("Welcome!".into())]);
    let mut tutor = session(backend.clone());

    let reply = tutor.send("hello").await;
    assert_eq!(reply, TutorReply::Assistant("Welcome!".into()));
    assert_eq!(
        tutor.transcript(),
        [ConversationTurn::user("hello"), ConversationTurn::assistant("Welcome!")]
    );
    assert_eq!(backend.call_count(), 1);
}

#[tokio::test]
async fn system_prompt_carries_material() {
    let backend = ScriptedBackend::new([Ok("Hi".into())]);
    let mut tutor = session(backend.clone());
    tutor.open().await;

    let request = &backend.requests()[0];
    assert!(request.system.contains("=== LEARNING MATERIAL ==="));
    assert!(request.system.ends_with(MATERIAL));
    assert!((request.temperature - 0.6).abs() < f32::EPSILON);
    assert!(matches!(tutor.state(), SessionState::Active { .. }));
}

#[tokio::test]
async fn auth_failure_rolls_back_without_retry() {
    let backend = ScriptedBackend::new([
        Err(BackendError::Unauthorized("401".into())),
        Ok("never sent".into()),
    ]);
    let mut tutor = session(backend.clone());

    let reply = tutor.send("hello").await;
    let TutorReply::Unavailable(failure) = &reply else {
        panic!("expected failure, got {reply:?}");
    };
    assert_eq!(failure.class, FailureClass::FatalAuth);
    assert_eq!(failure.attempts, 1);
    assert_eq!(reply.text(), AUTH_FAILURE_MESSAGE);
    assert!(tutor.transcript().is_empty());
    assert_eq!(backend.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn quota_failure_is_not_retried() {
    let backend = ScriptedBackend::new([
        Err(BackendError::QuotaExceeded("402".into())),
        Ok("never sent".into()),
    ]);
    let mut tutor = session(backend.clone());

    let reply = tutor.send("hello").await;
    let TutorReply::Unavailable(failure) = &reply else {
        panic!("expected failure, got {reply:?}");
    };
    assert_eq!(failure.class, FailureClass::FatalQuota);
    assert_eq!(failure.attempts, 1);
    assert_eq!(reply.text(), QUOTA_FAILURE_MESSAGE);
    assert_eq!(backend.call_count(), 1);
    assert!(tutor.transcript().is_empty());
}

#[tokio::test(start_paused = true)]
async fn exhausted_connection_errors_report_the_cause() {
    let backend = ScriptedBackend::new([
        Ok("first answer".into()),
        Err(BackendError::Transport("connection reset".into())),
        Err(BackendError::EmptyReply),
        Err(BackendError::Transport("connection reset".into())),
    ]);
    let mut tutor = session(backend.clone());
    assert!(tutor.send("first").await.is_success());

    let reply = tutor.send("second").await;
    let TutorReply::Unavailable(failure) = &reply else {
        panic!("expected failure, got {reply:?}");
    };
    assert_eq!(failure.class, FailureClass::Transient);
    assert_eq!(failure.attempts, 3);
    assert!(reply.text().starts_with("Teacher Connection Error:"));
    assert!(reply.text().contains("connection reset"));
    assert_eq!(backend.call_count(), 4);
    assert_eq!(
        tutor.transcript(),
        [ConversationTurn::user("first"), ConversationTurn::assistant("first answer")]
    );

    let times = backend.call_times();
    assert!(times[2] - times[1] >= Duration::from_millis(2000));
    assert!(times[3] - times[2] >= Duration::from_millis(4000));
}

#[tokio::test(start_paused = true)]
async fn undecodable_reply_is_not_retried() {
    let backend = ScriptedBackend::new([
        Err(BackendError::Decode("missing choices".into())),
        Ok("never sent".into()),
    ]);
    let mut tutor = session(backend.clone());

    let reply = tutor.send("hello").await;
    let TutorReply::Unavailable(failure) = &reply else {
        panic!("expected failure, got {reply:?}");
    };
    assert_eq!(failure.class, FailureClass::FatalSchema);
    assert_eq!(failure.attempts, 1);
    assert!(reply.text().starts_with("Teacher Connection Error:"));
    assert_eq!(backend.call_count(), 1);
    assert!(tutor.transcript().is_empty());
}

#[tokio::test(start_paused = true)]
async fn rate_limits_are_retried_with_growing_backoff() {
    let backend = ScriptedBackend::new([rate_limited(), rate_limited(), Ok("Answer".into())]);
    let mut tutor = session(backend.clone());

    let reply = tutor.send("question").await;
    assert_eq!(reply, TutorReply::Assistant("Answer".into()));
    assert_eq!(tutor.transcript().len(), 2);

    let times = backend.call_times();
    assert_eq!(times.len(), 3);
    let first_gap = times[1] - times[0];
    let second_gap = times[2] - times[1];
    assert!(first_gap >= Duration::from_millis(2000));
    assert!(second_gap >= Duration::from_millis(4000));
    assert!(second_gap > first_gap);
}

#[tokio::test(start_paused = true)]
async fn exhausted_retries_roll_back_the_user_turn() {
    let backend = ScriptedBackend::new([
        Ok("first answer".into()),
        rate_limited(),
        rate_limited(),
        rate_limited(),
    ]);
    let mut tutor = session(backend.clone());
    assert!(tutor.send("first").await.is_success());

    let reply = tutor.send("second").await;
    let TutorReply::Unavailable(failure) = &reply else {
        panic!("expected failure, got {reply:?}");
    };
    assert_eq!(failure.attempts, 3);
    assert_eq!(failure.class, FailureClass::Transient);
    assert_eq!(reply.text(), BUSY_FAILURE_MESSAGE);
    assert_eq!(backend.call_count(), 4);
    assert_eq!(
        tutor.transcript(),
        [ConversationTurn::user("first"), ConversationTurn::assistant("first answer")]
    );
}

#[tokio::test(start_paused = true)]
async fn attempt_cap_follows_policy() {
    let backend = ScriptedBackend::new([rate_limited(), rate_limited()]);
    let credential = Credential::parse(TEST_KEY).expect("valid key");
    let settings = TutorSettings {
        retry: RetryPolicy::new(2, Duration::from_millis(10)),
        ..TutorSettings::default()
    };
    let mut tutor = TutorSession::new(backend.clone(), credential, settings);
    tutor.start(MATERIAL, Vec::new());

    assert!(!tutor.send("hi").await.is_success());
    assert_eq!(backend.call_count(), 2);
}

#[tokio::test]
async fn only_the_recent_window_is_sent() {
    let replies = (0..5).map(|i| Ok(format!("answer {i}")));
    let backend = ScriptedBackend::new(replies);
    let mut tutor = session(backend.clone());

    for i in 0..5 {
        assert!(tutor.send(format!("message {i}")).await.is_success());
    }
    assert_eq!(tutor.transcript().len(), 10);

    let requests = backend.requests();
    assert_eq!(requests[0].turns.len(), 1);
    let last = requests.last().expect("requests");
    assert_eq!(last.turns.len(), 6);
    assert_eq!(last.turns[0], ConversationTurn::assistant("answer 1"));
    assert_eq!(last.turns[1], ConversationTurn::user("message 2"));
    assert_eq!(last.turns[5], ConversationTurn::user("message 4"));
    assert_eq!(last.turns[5].role, Role::User);
}

#[tokio::test]
async fn send_before_start_is_inactive() {
    let backend = ScriptedBackend::new([Ok("unused".into())]);
    let credential = Credential::parse(TEST_KEY).expect("valid key");
    let mut tutor = TutorSession::new(backend.clone(), credential, TutorSettings::default());

    let reply = tutor.send("hello").await;
    assert_eq!(reply, TutorReply::Inactive);
    assert_eq!(reply.text(), INACTIVE_MESSAGE);
    assert_eq!(backend.call_count(), 0);
    assert!(tutor.transcript().is_empty());
}

#[tokio::test]
async fn reset_clears_the_conversation() {
    let backend = ScriptedBackend::new([Ok("Hi".into())]);
    let mut tutor = session(backend.clone());
    tutor.send("hello").await;

    tutor.reset();
    assert!(tutor.transcript().is_empty());
    assert_eq!(tutor.state(), &SessionState::Uninitialized);
    assert_eq!(tutor.send("again").await, TutorReply::Inactive);
}

#[tokio::test]
async fn restored_history_is_sent_with_the_next_message() {
    let backend = ScriptedBackend::new([Ok("Welcome back".into())]);
    let credential = Credential::parse(TEST_KEY).expect("valid key");
    let mut tutor = TutorSession::new(backend.clone(), credential, TutorSettings::default());
    tutor.start(
        MATERIAL,
        vec![ConversationTurn::user("earlier"), ConversationTurn::assistant("reply")],
    );

    tutor.request_idea().await;
    let request = &backend.requests()[0];
    assert_eq!(request.turns.len(), 3);
    assert_eq!(request.turns[0], ConversationTurn::user("earlier"));
    assert_eq!(request.turns[2], ConversationTurn::user("REQUEST_IDEA"));
    assert_eq!(tutor.transcript().len(), 4);
}

#[test]
fn backoff_doubles() {
    let policy = RetryPolicy::default();
    assert_eq!(policy.max_attempts(), 3);
    assert_eq!(policy.delay_after(1), Duration::from_millis(2000));
    assert_eq!(policy.delay_after(2), Duration::from_millis(4000));
    assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts(), 1);
}
