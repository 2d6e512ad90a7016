//! AppStore - the application state container.
//!
//! Every action mutates the snapshot in one synchronous critical section,
//! publishes the new snapshot to subscribers and then writes the persisted
//! subset through the injected [`StateRepository`].
//!
//! Generations (assistant replies) are tracked by request id. Only the latest
//! request may complete; older ones are cancelled through their token and any
//! reply that still arrives is discarded.

use crate::subscription::SliceSubscription;
use chrono::Utc;
use parley_core::api::{AssistantApi, CreateSessionRequest, QueryOptions, QueryResponse};
use parley_core::error::Result;
use parley_core::permission::{
    PermissionCheck, PermissionDecision, PermissionRequest, PermissionResponse,
};
use parley_core::session::{DeliveryStatus, Message, Session, SessionStatus};
use parley_core::settings::SettingsPatch;
use parley_core::state::{StateRepository, StoreSnapshot, StreamingMessage};
use parley_core::todo::{Todo, TodoStatus};
use parley_core::ui::ActiveView;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// An outstanding `query` call.
struct Generation {
    request_id: String,
    session_id: String,
    user_message_id: String,
    token: CancellationToken,
}

/// Settles a generation whose `send_message` future is dropped before it
/// finishes, e.g. when the host aborts the task driving it.
struct GenerationGuard {
    store: AppStore,
    request_id: String,
    session_id: String,
    user_message_id: String,
    armed: bool,
}

impl GenerationGuard {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for GenerationGuard {
    fn drop(&mut self) {
        if self.armed {
            self.store
                .abandon_generation(&self.request_id, &self.session_id, &self.user_message_id);
        }
    }
}

struct StoreInner {
    state: watch::Sender<Arc<StoreSnapshot>>,
    api: Arc<dyn AssistantApi>,
    repository: Arc<dyn StateRepository>,
    /// Serializes repository writes.
    persist_lock: tokio::sync::Mutex<()>,
    generation: Mutex<Option<Generation>>,
    message_seq: AtomicU64,
}

/// Shared handle to the application state.
///
/// Cloning is cheap; all clones observe and mutate the same state.
#[derive(Clone)]
pub struct AppStore {
    inner: Arc<StoreInner>,
}

impl AppStore {
    /// Creates a store with default state. Nothing is loaded.
    pub fn new(api: Arc<dyn AssistantApi>, repository: Arc<dyn StateRepository>) -> Self {
        Self::with_snapshot(api, repository, StoreSnapshot::default())
    }

    /// Creates a store from whatever the repository holds.
    ///
    /// A failed load is logged and the store starts from defaults.
    pub async fn restore(
        api: Arc<dyn AssistantApi>,
        repository: Arc<dyn StateRepository>,
    ) -> Self {
        let snapshot = match repository.load().await {
            Ok(Some(persisted)) => {
                tracing::info!(
                    "[AppStore] Restored {} session(s), {} permission(s)",
                    persisted.sessions.len(),
                    persisted.permissions.len()
                );
                StoreSnapshot::from_persisted(persisted)
            }
            Ok(None) => {
                tracing::debug!("[AppStore] No stored state, starting fresh");
                StoreSnapshot::default()
            }
            Err(e) => {
                tracing::warn!("[AppStore] Failed to load stored state, using defaults: {}", e);
                StoreSnapshot::default()
            }
        };

        Self::with_snapshot(api, repository, snapshot)
    }

    fn with_snapshot(
        api: Arc<dyn AssistantApi>,
        repository: Arc<dyn StateRepository>,
        snapshot: StoreSnapshot,
    ) -> Self {
        let (state, _) = watch::channel(Arc::new(snapshot));
        Self {
            inner: Arc::new(StoreInner {
                state,
                api,
                repository,
                persist_lock: tokio::sync::Mutex::new(()),
                generation: Mutex::new(None),
                message_seq: AtomicU64::new(0),
            }),
        }
    }

    // ============================================================================
    // Reads and subscriptions
    // ============================================================================

    /// The current immutable snapshot.
    pub fn snapshot(&self) -> Arc<StoreSnapshot> {
        self.inner.state.borrow().clone()
    }

    /// The session `current_session_id` points at.
    pub fn current_session(&self) -> Option<Session> {
        self.inner.state.borrow().current_session().cloned()
    }

    /// Receives every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Arc<StoreSnapshot>> {
        self.inner.state.subscribe()
    }

    /// Receives `selector(snapshot)` whenever it changes.
    pub fn subscribe_slice<T, F>(&self, selector: F) -> SliceSubscription<T>
    where
        T: PartialEq + Clone,
        F: Fn(&StoreSnapshot) -> T + Send + Sync + 'static,
    {
        SliceSubscription::new(self.subscribe(), selector)
    }

    // ============================================================================
    // Sessions
    // ============================================================================

    /// Allocates a remote session and makes it current.
    ///
    /// Returns `None` when the API fails, reports `success: false`, or hands
    /// back an id that already exists locally. State is left untouched then.
    pub async fn create_session(&self, name: Option<String>) -> Option<String> {
        let name = name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(fallback_session_name);

        let response = match self
            .inner
            .api
            .create_session(CreateSessionRequest { name: name.clone() })
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("[AppStore] create_session '{}' failed: {}", name, e);
                return None;
            }
        };

        let Some(session_id) = response.into_session_id() else {
            tracing::warn!("[AppStore] create_session '{}' was rejected by the API", name);
            return None;
        };

        let created = self
            .commit(|state| {
                if state.session(&session_id).is_some() {
                    return false;
                }
                let model = Some(state.settings.model.clone());
                state
                    .sessions
                    .push(Session::new(session_id.clone(), name.clone(), model));
                state.current_session_id = Some(session_id.clone());
                true
            })
            .await;

        if created {
            tracing::debug!("[AppStore] Created session {} ('{}')", session_id, name);
            Some(session_id)
        } else {
            tracing::warn!("[AppStore] API returned duplicate session id {}", session_id);
            None
        }
    }

    pub async fn resume_session(&self, session_id: &str) {
        self.commit(|state| {
            if state.session(session_id).is_none()
                || state.current_session_id.as_deref() == Some(session_id)
            {
                return false;
            }
            state.current_session_id = Some(session_id.to_string());
            true
        })
        .await;
    }

    pub async fn pause_session(&self, session_id: &str) {
        self.set_session_status(session_id, SessionStatus::Paused)
            .await;
    }

    pub async fn complete_session(&self, session_id: &str) {
        self.set_session_status(session_id, SessionStatus::Completed)
            .await;
    }

    async fn set_session_status(&self, session_id: &str, status: SessionStatus) {
        self.update_session(session_id, |session| {
            session.status = status;
        })
        .await;
    }

    /// Removes a session, cancelling any generation running for it.
    pub async fn delete_session(&self, session_id: &str) {
        if let Some(generation) = self.take_generation(|g| g.session_id == session_id) {
            tracing::debug!(
                "[AppStore] Cancelling request {} for deleted session",
                generation.request_id
            );
            generation.token.cancel();
        }

        self.commit(|state| {
            let before = state.sessions.len();
            state.sessions.retain(|s| s.id != session_id);
            if state.sessions.len() == before {
                return false;
            }
            if state.current_session_id.as_deref() == Some(session_id) {
                state.current_session_id = None;
            }
            if state
                .streaming_message
                .as_ref()
                .is_some_and(|s| s.session_id == session_id)
            {
                state.streaming_message = None;
            }
            true
        })
        .await;
    }

    pub async fn rename_session(&self, session_id: &str, name: impl Into<String>) {
        let name = name.into();
        self.update_session(session_id, move |session| {
            session.name = name;
        })
        .await;
    }

    pub async fn set_working_directory(&self, session_id: &str, path: Option<PathBuf>) {
        self.update_session(session_id, move |session| {
            session.working_directory = path;
        })
        .await;
    }

    /// Adds token and cost usage to a session's counters.
    pub async fn record_usage(&self, session_id: &str, tokens: u64, cost: f64) {
        self.update_session(session_id, |session| {
            session.record_usage(tokens, cost);
        })
        .await;
    }

    /// Applies `f` to the session and bumps `updated_at`. No-op when absent.
    async fn update_session<F>(&self, session_id: &str, f: F)
    where
        F: FnOnce(&mut Session) + Send,
    {
        let found = self
            .commit(|state| match state.session_mut(session_id) {
                Some(session) => {
                    f(session);
                    session.touch();
                    true
                }
                None => false,
            })
            .await;

        if !found {
            tracing::debug!("[AppStore] Session {} not found", session_id);
        }
    }

    // ============================================================================
    // Messaging
    // ============================================================================

    /// Sends `content` to the assistant in the current session.
    ///
    /// Resolves once the generation has finished, failed, or been cancelled.
    /// A newer `send_message` supersedes this one.
    pub async fn send_message(&self, content: impl Into<String>) {
        let content = content.into();
        let request_id = Uuid::new_v4().to_string();
        let user_message = Message::user(self.next_message_id(), content.clone());
        let user_message_id = user_message.id.clone();
        let placeholder = Message::assistant_placeholder(self.next_message_id());
        let token = CancellationToken::new();

        let mut started: Option<(String, QueryOptions)> = None;
        let mut superseded: Option<Generation> = None;

        self.mutate(|state| {
            let Some(session) = state.current_session_mut() else {
                return false;
            };
            session.messages.push(user_message);
            session.touch();
            let session_id = session.id.clone();

            superseded = self.replace_generation(Generation {
                request_id: request_id.clone(),
                session_id: session_id.clone(),
                user_message_id: user_message_id.clone(),
                token: token.clone(),
            });
            if let Some(previous) = &superseded {
                mark_delivery(
                    state,
                    &previous.session_id,
                    &previous.user_message_id,
                    DeliveryStatus::Cancelled,
                );
            }

            state.streaming_message = Some(StreamingMessage {
                request_id: request_id.clone(),
                session_id: session_id.clone(),
                message: placeholder,
            });
            started = Some((
                session_id,
                QueryOptions {
                    model: state.settings.model.clone(),
                    temperature: state.settings.temperature,
                    max_tokens: state.settings.max_tokens,
                },
            ));
            true
        });

        let Some((session_id, options)) = started else {
            tracing::debug!("[AppStore] send_message ignored: no current session");
            return;
        };
        let guard = GenerationGuard {
            store: self.clone(),
            request_id: request_id.clone(),
            session_id: session_id.clone(),
            user_message_id: user_message_id.clone(),
            armed: true,
        };

        if let Some(previous) = superseded {
            tracing::debug!(
                "[AppStore] Request {} superseded by {}",
                previous.request_id,
                request_id
            );
            previous.token.cancel();
        }

        self.persist().await;

        tracing::debug!(
            "[AppStore] Request {} started in session {}",
            request_id,
            session_id
        );

        let outcome = tokio::select! {
            biased;
            _ = token.cancelled() => None,
            result = self.inner.api.query(&content, &options) => Some(result),
        };

        self.finish_generation(&request_id, &session_id, &user_message_id, outcome)
            .await;
        guard.disarm();
    }

    async fn finish_generation(
        &self,
        request_id: &str,
        session_id: &str,
        user_message_id: &str,
        outcome: Option<Result<QueryResponse>>,
    ) {
        let is_latest = self
            .take_generation(|g| g.request_id == request_id)
            .is_some();

        match outcome {
            Some(Ok(response)) if is_latest => {
                self.commit(|state| {
                    let placeholder = state
                        .streaming_message
                        .take_if(|s| s.request_id == request_id)
                        .map(|s| s.message)
                        .unwrap_or_else(|| Message::assistant_placeholder(self.next_message_id()));
                    let reply = placeholder.finalize(response.data, response.tool_calls);

                    mark_delivery(state, session_id, user_message_id, DeliveryStatus::Delivered);
                    if let Some(session) = state.session_mut(session_id) {
                        session.messages.push(reply);
                        if let Some(usage) = response.usage {
                            session.record_usage(usage.total_tokens, usage.cost);
                        }
                        session.touch();
                    }
                    true
                })
                .await;
                tracing::debug!("[AppStore] Request {} completed", request_id);
            }
            Some(Ok(_)) => {
                tracing::debug!("[AppStore] Discarding stale reply for request {}", request_id);
                self.settle(request_id, session_id, user_message_id, DeliveryStatus::Cancelled)
                    .await;
            }
            Some(Err(e)) => {
                tracing::warn!("[AppStore] Request {} failed: {}", request_id, e);
                self.settle(request_id, session_id, user_message_id, DeliveryStatus::Failed)
                    .await;
            }
            None => {
                tracing::debug!("[AppStore] Request {} cancelled", request_id);
                self.settle(request_id, session_id, user_message_id, DeliveryStatus::Cancelled)
                    .await;
            }
        }
    }

    /// Records a terminal delivery status and frees the streaming slot if it
    /// still belongs to `request_id`.
    async fn settle(
        &self,
        request_id: &str,
        session_id: &str,
        user_message_id: &str,
        status: DeliveryStatus,
    ) {
        self.commit(|state| {
            let cleared = state
                .streaming_message
                .take_if(|s| s.request_id == request_id)
                .is_some();
            let marked = mark_delivery(state, session_id, user_message_id, status);
            cleared || marked
        })
        .await;
    }

    /// Synchronous cleanup for a `send_message` dropped mid-flight.
    ///
    /// Only a still-pending user message is marked, so a status recorded
    /// before the drop is kept. The write is handed to the runtime.
    fn abandon_generation(&self, request_id: &str, session_id: &str, user_message_id: &str) {
        if let Some(generation) = self.take_generation(|g| g.request_id == request_id) {
            generation.token.cancel();
        }

        let changed = self.mutate(|state| {
            let cleared = state
                .streaming_message
                .take_if(|s| s.request_id == request_id)
                .is_some();
            let marked = settle_pending_delivery(
                state,
                session_id,
                user_message_id,
                DeliveryStatus::Cancelled,
            );
            cleared || marked
        });
        if !changed {
            return;
        }

        tracing::debug!("[AppStore] Request {} abandoned by its caller", request_id);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let store = self.clone();
                handle.spawn(async move { store.persist().await });
            }
            Err(_) => {
                tracing::warn!(
                    "[AppStore] No runtime to persist abandoned request {}",
                    request_id
                );
            }
        }
    }

    /// Aborts the in-flight generation and clears the streaming slot.
    pub async fn cancel_generation(&self) {
        let cancelled = self.take_generation(|_| true);
        if let Some(generation) = &cancelled {
            tracing::debug!("[AppStore] Cancelling request {}", generation.request_id);
            generation.token.cancel();
        }

        self.commit(|state| {
            let mut changed = state.streaming_message.take().is_some();
            if let Some(generation) = &cancelled {
                changed |= mark_delivery(
                    state,
                    &generation.session_id,
                    &generation.user_message_id,
                    DeliveryStatus::Cancelled,
                );
            }
            changed
        })
        .await;
    }

    fn next_message_id(&self) -> String {
        let seq = self.inner.message_seq.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}", Utc::now().timestamp_millis(), seq)
    }

    fn replace_generation(&self, generation: Generation) -> Option<Generation> {
        self.inner
            .generation
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(generation)
    }

    fn take_generation<F>(&self, matches: F) -> Option<Generation>
    where
        F: FnOnce(&Generation) -> bool,
    {
        let mut slot = self
            .inner
            .generation
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        slot.take_if(|g| matches(&*g))
    }

    // ============================================================================
    // Todos
    // ============================================================================

    /// Appends a pending todo and returns its id.
    pub async fn add_todo(&self, content: impl Into<String>) -> String {
        let todo = Todo::new(Uuid::new_v4().to_string(), content);
        let id = todo.id.clone();
        self.commit(|state| {
            state.todos.push(todo);
            true
        })
        .await;
        id
    }

    pub async fn update_todo_status(&self, todo_id: &str, status: TodoStatus) {
        self.commit(|state| match state.todos.iter_mut().find(|t| t.id == todo_id) {
            Some(todo) => {
                todo.transition(status);
                true
            }
            None => false,
        })
        .await;
    }

    pub async fn delete_todo(&self, todo_id: &str) {
        self.commit(|state| {
            let before = state.todos.len();
            state.todos.retain(|t| t.id != todo_id);
            state.todos.len() != before
        })
        .await;
    }

    // ============================================================================
    // Permissions
    // ============================================================================

    pub async fn set_permission(&self, tool: impl Into<String>, decision: PermissionDecision) {
        let tool = tool.into();
        self.commit(|state| state.permissions.insert(tool, decision) != Some(decision))
            .await;
    }

    /// Checks whether `tool` may run, raising a prompt when undecided.
    pub async fn request_permission(
        &self,
        tool: impl Into<String>,
        parameters: Value,
    ) -> PermissionCheck {
        let tool = tool.into();
        let mut check = PermissionCheck::Busy;

        self.commit(|state| {
            match state.permissions.get(&tool) {
                Some(PermissionDecision::Allow) => {
                    check = PermissionCheck::Allowed;
                    return false;
                }
                Some(PermissionDecision::Deny) => {
                    check = PermissionCheck::Denied;
                    return false;
                }
                Some(PermissionDecision::Ask) | None => {}
            }
            if state.permission_request.is_some() {
                return false;
            }
            let request = PermissionRequest::new(Uuid::new_v4().to_string(), tool.clone(), parameters);
            check = PermissionCheck::Pending(request.id.clone());
            state.permission_request = Some(request);
            true
        })
        .await;

        tracing::debug!("[AppStore] Permission check for '{}': {:?}", tool, check);
        check
    }

    /// Answers the pending prompt. Only `Always` is remembered.
    pub async fn handle_permission_response(&self, response: PermissionResponse) {
        self.commit(|state| {
            let Some(request) = state.permission_request.take() else {
                return false;
            };
            if response == PermissionResponse::Always {
                state
                    .permissions
                    .insert(request.tool, PermissionDecision::Allow);
            }
            true
        })
        .await;
    }

    // ============================================================================
    // UI flags, settings, recent projects
    // ============================================================================

    pub async fn set_sidebar_expanded(&self, expanded: bool) {
        self.commit(|state| replace_if_changed(&mut state.ui.sidebar_expanded, expanded))
            .await;
    }

    pub async fn set_side_panel_open(&self, open: bool) {
        self.commit(|state| replace_if_changed(&mut state.ui.side_panel_open, open))
            .await;
    }

    pub async fn set_active_view(&self, view: ActiveView) {
        self.commit(|state| replace_if_changed(&mut state.ui.active_view, view))
            .await;
    }

    /// Shallow-merges `patch` into the settings.
    pub async fn update_settings(&self, patch: SettingsPatch) {
        self.commit(|state| state.settings.apply(patch)).await;
    }

    pub async fn add_recent_project(&self, path: impl Into<String>) {
        let path = path.into();
        self.commit(|state| {
            let before = state.recent_projects.clone();
            state.push_recent_project(path);
            state.recent_projects != before
        })
        .await;
    }

    // ============================================================================
    // Publish and persist
    // ============================================================================

    /// Runs `f` on a private copy of the snapshot and publishes it when `f`
    /// reports a change.
    fn mutate<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut StoreSnapshot) -> bool,
    {
        self.inner
            .state
            .send_if_modified(|snapshot| f(Arc::make_mut(snapshot)))
    }

    async fn commit<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut StoreSnapshot) -> bool + Send,
    {
        let changed = self.mutate(f);
        if changed {
            self.persist().await;
        }
        changed
    }

    /// Writes the persisted subset of the latest snapshot.
    async fn persist(&self) {
        let _guard = self.inner.persist_lock.lock().await;
        let persisted = self.inner.state.borrow().to_persisted();
        if let Err(e) = self.inner.repository.save(&persisted).await {
            tracing::warn!("[AppStore] Failed to persist state: {}", e);
        }
    }
}

/// Sets the delivery status of a user message. Returns true if it changed.
fn mark_delivery(
    state: &mut StoreSnapshot,
    session_id: &str,
    message_id: &str,
    status: DeliveryStatus,
) -> bool {
    let Some(message) = state
        .session_mut(session_id)
        .and_then(|s| s.find_message_mut(message_id))
    else {
        return false;
    };
    if message.delivery == Some(status) {
        return false;
    }
    message.delivery = Some(status);
    true
}

/// Like [`mark_delivery`], but only moves a message that is still `Pending`.
fn settle_pending_delivery(
    state: &mut StoreSnapshot,
    session_id: &str,
    message_id: &str,
    status: DeliveryStatus,
) -> bool {
    let pending = state
        .session(session_id)
        .and_then(|s| s.messages.iter().find(|m| m.id == message_id))
        .is_some_and(|m| m.delivery == Some(DeliveryStatus::Pending));
    pending && mark_delivery(state, session_id, message_id, status)
}

fn replace_if_changed<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

fn fallback_session_name() -> String {
    format!("session {:x}", rand::random::<u32>() & 0x00FF_FFFF)
}
