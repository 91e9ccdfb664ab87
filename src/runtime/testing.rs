//! Mock implementations for testing
//!
//! These mocks enable integration testing of the session runtime without
//! network or disk I/O.

use super::traits::TranscriptStore;
use super::{start_session, SessionEvent, SessionHandle, SessionSnapshot};
use crate::notify::{Notification, NotificationSink};
use crate::query::{Answer, QueryClient, QueryError};
use crate::state_machine::SessionContext;
use crate::transcript::Message;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, Notify};
use tokio_util::sync::CancellationToken;

// ============================================================================
// Mock Query Client
// ============================================================================

/// Mock query client that returns queued outcomes
pub struct MockQueryClient {
    responses: Mutex<VecDeque<Result<Answer, QueryError>>>,
    /// Every question asked, in order
    pub questions: Mutex<Vec<String>>,
}

impl MockQueryClient {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            questions: Mutex::new(Vec::new()),
        }
    }

    pub fn queue_answer(&self, answer: Answer) {
        self.responses.lock().unwrap().push_back(Ok(answer));
    }

    pub fn queue_error(&self, error: QueryError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn recorded_questions(&self) -> Vec<String> {
        self.questions.lock().unwrap().clone()
    }

    fn next_outcome(&self, question: &str) -> Result<Answer, QueryError> {
        self.questions.lock().unwrap().push(question.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(QueryError::unreachable("No mock response queued")))
    }
}

impl Default for MockQueryClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QueryClient for MockQueryClient {
    async fn ask(&self, question: &str) -> Result<Answer, QueryError> {
        self.next_outcome(question)
    }

    fn endpoint(&self) -> &str {
        "mock://query"
    }
}

// ============================================================================
// Delayed Mock Query Client (for in-flight testing)
// ============================================================================

/// Mock query client that takes a while to answer
pub struct DelayedMockQueryClient {
    inner: MockQueryClient,
    delay: Duration,
    /// Notified when a request starts (for test synchronization)
    pub request_started: Arc<Notify>,
}

impl DelayedMockQueryClient {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: MockQueryClient::new(),
            delay,
            request_started: Arc::new(Notify::new()),
        }
    }

    pub fn queue_answer(&self, answer: Answer) {
        self.inner.queue_answer(answer);
    }

    pub fn recorded_questions(&self) -> Vec<String> {
        self.inner.recorded_questions()
    }
}

#[async_trait]
impl QueryClient for DelayedMockQueryClient {
    async fn ask(&self, question: &str) -> Result<Answer, QueryError> {
        let outcome = self.inner.next_outcome(question);
        // notify_one keeps a permit, so a test that starts waiting late still wakes
        self.request_started.notify_one();
        tokio::time::sleep(self.delay).await;
        outcome
    }

    fn endpoint(&self) -> &str {
        "mock://delayed"
    }
}

// ============================================================================
// In-Memory Store
// ============================================================================

/// In-memory transcript store
#[derive(Default)]
pub struct InMemoryStore {
    messages: Mutex<Vec<Message>>,
    saves: AtomicUsize,
    failing: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_messages(messages: Vec<Message>) -> Self {
        Self {
            messages: Mutex::new(messages),
            ..Self::default()
        }
    }

    /// Make every subsequent save fail
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// What a fresh load would return
    pub fn stored(&self) -> Vec<Message> {
        self.messages.lock().unwrap().clone()
    }

    /// Number of save attempts, failed ones included
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TranscriptStore for InMemoryStore {
    async fn save(&self, messages: &[Message]) -> Result<(), String> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err("disk full".to_string());
        }
        *self.messages.lock().unwrap() = messages.to_vec();
        Ok(())
    }

    async fn load(&self) -> Vec<Message> {
        self.stored()
    }
}

// ============================================================================
// Recording Sink
// ============================================================================

/// Notification sink that remembers everything it was given
#[derive(Default)]
pub struct RecordingSink {
    notifications: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().unwrap().clone()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, notification: Notification) {
        self.notifications.lock().unwrap().push(notification);
    }
}

// ============================================================================
// Test Session Helper
// ============================================================================

/// A running session wired to mocks
pub struct TestSession<Q: QueryClient + 'static> {
    pub handle: SessionHandle,
    pub store: Arc<InMemoryStore>,
    pub client: Arc<Q>,
    pub sink: Arc<RecordingSink>,
    pub shutdown: CancellationToken,
}

impl TestSession<MockQueryClient> {
    pub async fn start(client: MockQueryClient) -> Self {
        Self::start_with(client, InMemoryStore::new()).await
    }
}

impl<Q: QueryClient + 'static> TestSession<Q> {
    pub async fn start_with(client: Q, store: InMemoryStore) -> Self {
        let store = Arc::new(store);
        let client = Arc::new(client);
        let sink = Arc::new(RecordingSink::new());
        let shutdown = CancellationToken::new();

        let handle = start_session(
            SessionContext::new("test-session"),
            store.clone(),
            client.clone(),
            sink.clone(),
            shutdown.clone(),
        )
        .await;

        Self {
            handle,
            store,
            client,
            sink,
            shutdown,
        }
    }

    /// Wait until a published snapshot satisfies `predicate`
    pub async fn wait_for<F>(&self, predicate: F) -> SessionSnapshot
    where
        F: FnMut(&SessionSnapshot) -> bool,
    {
        let mut rx = self.handle.snapshots();
        let snapshot = tokio::time::timeout(Duration::from_secs(2), rx.wait_for(predicate))
            .await
            .expect("Timed out waiting for session snapshot")
            .expect("Session runtime stopped");
        (*snapshot).clone()
    }

    /// Wait until the session is idle with `count` messages
    pub async fn wait_for_idle_with(&self, count: usize) -> SessionSnapshot {
        self.wait_for(|s| !s.pending() && s.messages.len() == count)
            .await
    }
}

impl<Q: QueryClient + 'static> Drop for TestSession<Q> {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Collect whatever events are already buffered
pub fn drain_events(rx: &mut broadcast::Receiver<SessionEvent>) -> Vec<SessionEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::Severity;
    use crate::query::QueryErrorKind;
    use crate::state_machine::SessionState;
    use crate::transcript::{MessageDraft, Role, Transcript};
    use std::collections::HashSet;

    #[tokio::test]
    async fn test_mock_query_client() {
        let mock = MockQueryClient::new();
        mock.queue_answer(Answer::new("Hello"));

        assert_eq!(mock.ask("hi").await.unwrap().text, "Hello");

        // Nothing left queued
        let err = mock.ask("again").await.unwrap_err();
        assert_eq!(err.kind, QueryErrorKind::Unreachable);
        assert_eq!(mock.recorded_questions(), vec!["hi", "again"]);
    }

    #[tokio::test]
    async fn test_in_memory_store() {
        let store = InMemoryStore::new();
        let mut transcript = Transcript::new();
        transcript.append(MessageDraft::user("hello"));

        store.save(transcript.messages()).await.unwrap();
        assert_eq!(store.load().await.len(), 1);

        store.set_failing(true);
        assert!(store.save(&[]).await.is_err());
        assert_eq!(store.load().await.len(), 1);
        assert_eq!(store.save_count(), 2);
    }

    /// A question answered with tool attribution
    #[tokio::test]
    async fn test_successful_round() {
        let client = MockQueryClient::new();
        client.queue_answer(Answer::new("A field of physics...").with_tools(["wikipedia"]));

        let session = TestSession::start(client).await;
        let mut events = session.handle.subscribe();
        session
            .handle
            .submit("What is quantum computing?")
            .await
            .unwrap();

        let snapshot = session.wait_for_idle_with(2).await;
        assert_eq!(snapshot.messages[0].role, Role::User);
        assert_eq!(snapshot.messages[0].content, "What is quantum computing?");
        assert_eq!(snapshot.messages[1].role, Role::Assistant);
        assert_eq!(snapshot.messages[1].content, "A field of physics...");
        assert_eq!(snapshot.messages[1].tools, vec!["wikipedia".to_string()]);

        assert_eq!(session.store.stored(), snapshot.messages);
        assert!(session.sink.notifications().is_empty());

        let events = drain_events(&mut events);
        assert_eq!(
            events,
            vec![
                SessionEvent::MessageAppended {
                    message: snapshot.messages[0].clone()
                },
                SessionEvent::StateChange {
                    state: SessionState::AwaitingResponse { generation: 1 }
                },
                SessionEvent::MessageAppended {
                    message: snapshot.messages[1].clone()
                },
                SessionEvent::StateChange {
                    state: SessionState::Idle { generation: 1 }
                },
            ]
        );
    }

    /// An unreachable server becomes an error message plus a notification
    #[tokio::test]
    async fn test_failed_round() {
        let client = MockQueryClient::new();
        client.queue_error(QueryError::unreachable("Unable to connect to the server"));

        let session = TestSession::start(client).await;
        session.handle.submit("X").await.unwrap();

        let snapshot = session.wait_for_idle_with(2).await;
        assert_eq!(snapshot.messages[1].role, Role::Error);
        assert_eq!(snapshot.messages[1].content, "Unable to connect to the server");

        let notifications = session.sink.notifications();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].severity, Severity::Error);
        assert_eq!(
            notifications[0].message,
            "Failed to get response: Unable to connect to the server"
        );
        assert_eq!(notifications[0].duration, Some(Duration::from_millis(5000)));
    }

    #[tokio::test]
    async fn test_blank_submit_is_ignored() {
        let client = MockQueryClient::new();
        client.queue_answer(Answer::new("ok"));

        let session = TestSession::start(client).await;
        session.handle.submit("   \n").await.unwrap();
        session.handle.submit("real question").await.unwrap();

        let snapshot = session.wait_for_idle_with(2).await;
        assert_eq!(snapshot.messages[0].content, "real question");
        assert_eq!(session.client.recorded_questions(), vec!["real question"]);
    }

    /// A second submit while awaiting is rejected and never reaches the server
    #[tokio::test]
    async fn test_single_request_in_flight() {
        let client = DelayedMockQueryClient::new(Duration::from_millis(100));
        client.queue_answer(Answer::new("first answer"));

        let session = TestSession::start_with(client, InMemoryStore::new()).await;
        session.handle.submit("A").await.unwrap();
        session.handle.submit("B").await.unwrap();

        let snapshot = session.wait_for_idle_with(2).await;
        assert_eq!(snapshot.messages[0].content, "A");
        assert_eq!(snapshot.messages[1].content, "first answer");
        assert_eq!(session.client.recorded_questions(), vec!["A"]);
    }

    #[tokio::test]
    async fn test_user_message_persisted_before_request() {
        let client = DelayedMockQueryClient::new(Duration::from_millis(200));
        client.queue_answer(Answer::new("done"));

        let session = TestSession::start_with(client, InMemoryStore::new()).await;
        session.handle.submit("persist me").await.unwrap();
        session.client.request_started.notified().await;

        let stored = session.store.stored();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].content, "persist me");
    }

    /// The answer to a request issued before clear() never lands
    #[tokio::test]
    async fn test_result_after_clear_is_discarded() {
        let client = DelayedMockQueryClient::new(Duration::from_millis(150));
        client.queue_answer(Answer::new("late"));
        client.queue_answer(Answer::new("fresh"));

        let session = TestSession::start_with(client, InMemoryStore::new()).await;
        session.handle.submit("abandoned").await.unwrap();
        session.client.request_started.notified().await;
        session.handle.clear().await.unwrap();

        session
            .wait_for(|s| !s.pending() && s.messages.is_empty())
            .await;
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(session.handle.snapshot().messages.is_empty());
        assert!(session.store.stored().is_empty());

        session.handle.submit("next").await.unwrap();
        let snapshot = session.wait_for_idle_with(2).await;
        assert_eq!(snapshot.messages[1].content, "fresh");
        // Ids are never reused after a clear
        assert_eq!(snapshot.messages[0].id, 2);
    }

    #[tokio::test]
    async fn test_failing_store_does_not_block() {
        let client = MockQueryClient::new();
        client.queue_answer(Answer::new("still works"));
        let store = InMemoryStore::new();
        store.set_failing(true);

        let session = TestSession::start_with(client, store).await;
        session.handle.submit("hello").await.unwrap();

        let snapshot = session.wait_for_idle_with(2).await;
        assert_eq!(snapshot.messages[1].content, "still works");
        assert!(session.store.stored().is_empty());
        assert_eq!(session.store.save_count(), 2);
    }

    #[tokio::test]
    async fn test_rehydrates_stored_transcript() {
        let mut previous = Transcript::new();
        previous.append(MessageDraft::user("earlier"));
        previous.append(MessageDraft::assistant("reply", vec![], None));

        let client = MockQueryClient::new();
        client.queue_answer(Answer::new("later reply"));

        let session =
            TestSession::start_with(client, InMemoryStore::with_messages(previous.messages().to_vec()))
                .await;
        assert_eq!(session.handle.snapshot().messages.len(), 2);

        session.handle.submit("later").await.unwrap();
        let snapshot = session.wait_for_idle_with(4).await;
        let ids: Vec<u64> = snapshot.messages.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_clear_resets_and_notifies() {
        let client = MockQueryClient::new();
        client.queue_answer(Answer::new("answer"));

        let session = TestSession::start(client).await;
        session.handle.submit("question").await.unwrap();
        session.wait_for_idle_with(2).await;

        let mut events = session.handle.subscribe();
        session.handle.clear().await.unwrap();
        session.wait_for(|s| s.messages.is_empty()).await;

        assert!(session.store.stored().is_empty());
        assert_eq!(drain_events(&mut events), vec![SessionEvent::TranscriptReset]);

        let notifications = session.sink.notifications();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].message, "Conversation cleared");
        assert_eq!(notifications[0].severity, Severity::Success);
    }

    /// Clearing an already-empty idle session does nothing at all
    #[tokio::test]
    async fn test_clear_when_empty_is_silent() {
        let client = MockQueryClient::new();
        client.queue_answer(Answer::new("answer"));

        let session = TestSession::start(client).await;
        let mut events = session.handle.subscribe();
        session.handle.clear().await.unwrap();
        session.handle.submit("question").await.unwrap();
        session.wait_for_idle_with(2).await;

        let events = drain_events(&mut events);
        assert!(!events.contains(&SessionEvent::TranscriptReset));
        assert!(session.sink.notifications().is_empty());
        // Only the round itself was persisted
        assert_eq!(session.store.save_count(), 2);
    }

    #[tokio::test]
    async fn test_start_with_exhausted_ids_begins_empty() {
        let mut previous = Transcript::new();
        previous.append(MessageDraft::user("earlier"));
        let mut messages = previous.messages().to_vec();
        messages[0].id = u64::MAX;

        let client = MockQueryClient::new();
        client.queue_answer(Answer::new("reply"));
        let session = TestSession::start_with(client, InMemoryStore::with_messages(messages)).await;
        assert!(session.handle.snapshot().messages.is_empty());

        session.handle.submit("again").await.unwrap();
        let snapshot = session.wait_for_idle_with(2).await;
        assert_eq!(snapshot.messages[0].id, 1);
    }

    /// Subscribing and then reading the snapshot never loses a message,
    /// even while the runtime is busy on another worker thread
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_subscribe_then_snapshot_sees_every_message() {
        const ROUNDS: usize = 200;

        let client = MockQueryClient::new();
        for i in 0..ROUNDS {
            client.queue_answer(Answer::new(format!("answer {i}")));
        }
        let session = TestSession::start(client).await;
        let handle = session.handle.clone();
        let done = CancellationToken::new();

        let watcher = tokio::spawn({
            let done = done.clone();
            async move {
                let mut trials = 0usize;
                while !done.is_cancelled() {
                    let mut rx = handle.subscribe();
                    let first = handle.snapshot();
                    tokio::task::yield_now().await;
                    let later = handle.snapshot();

                    let mut seen: HashSet<u64> = first.messages.iter().map(|m| m.id).collect();
                    for message in &later.messages {
                        while !seen.contains(&message.id) {
                            match tokio::time::timeout(Duration::from_secs(1), rx.recv()).await {
                                Ok(Ok(SessionEvent::MessageAppended { message: appended })) => {
                                    seen.insert(appended.id);
                                }
                                Ok(Ok(_)) => {}
                                other => panic!(
                                    "message {} never reached the subscriber: {other:?}",
                                    message.id
                                ),
                            }
                        }
                    }
                    trials += 1;
                }
                trials
            }
        });

        for round in 1..=ROUNDS {
            session.handle.submit(format!("question {round}")).await.unwrap();
            session.wait_for_idle_with(round * 2).await;
        }
        done.cancel();

        let trials = watcher.await.unwrap();
        assert!(trials > 0);
    }

    #[tokio::test]
    async fn test_shutdown_stops_runtime() {
        let session = TestSession::start(MockQueryClient::new()).await;
        session.shutdown.cancel();

        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        loop {
            if session.handle.submit("anyone there?").await.is_err() {
                break;
            }
            assert!(tokio::time::Instant::now() < deadline, "Runtime did not stop");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}
