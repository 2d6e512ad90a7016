//! Store snapshot models.
//!
//! [`StoreSnapshot`] is the full in-memory state published to subscribers.
//! [`PersistedState`] is the subset written to durable storage.

use crate::permission::{PermissionRequest, Permissions};
use crate::session::{DeliveryStatus, Message, Session};
use crate::settings::Settings;
use crate::todo::Todo;
use crate::ui::UiState;
use serde::{Deserialize, Serialize};

/// Maximum number of entries kept in the recent projects list.
pub const MAX_RECENT_PROJECTS: usize = 10;

/// The assistant reply currently being generated.
///
/// Lives outside the session history until the reply completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamingMessage {
    /// Correlates the placeholder with the request that will fill it.
    pub request_id: String,
    /// Session the finished reply will be appended to.
    pub session_id: String,
    pub message: Message,
}

/// Full application state.
///
/// The current session is not stored twice: it is looked up from
/// `current_session_id` on read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSnapshot {
    pub sessions: Vec<Session>,
    pub current_session_id: Option<String>,
    pub streaming_message: Option<StreamingMessage>,
    pub todos: Vec<Todo>,
    pub permissions: Permissions,
    pub permission_request: Option<PermissionRequest>,
    pub ui: UiState,
    pub settings: Settings,
    pub recent_projects: Vec<String>,
}

impl StoreSnapshot {
    /// Builds a fresh snapshot from restored durable state.
    ///
    /// Every field outside [`PersistedState`] starts from its default. Nothing
    /// is in flight after a restart, so user messages still marked `Pending`
    /// become `Failed`.
    pub fn from_persisted(mut persisted: PersistedState) -> Self {
        for session in &mut persisted.sessions {
            session.settle_pending_deliveries(DeliveryStatus::Failed);
        }
        Self {
            sessions: persisted.sessions,
            permissions: persisted.permissions,
            settings: persisted.settings,
            ..Self::default()
        }
    }

    /// Selects the fields that survive a restart.
    pub fn to_persisted(&self) -> PersistedState {
        PersistedState {
            sessions: self.sessions.clone(),
            permissions: self.permissions.clone(),
            settings: self.settings.clone(),
        }
    }

    pub fn session(&self, session_id: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == session_id)
    }

    pub fn session_mut(&mut self, session_id: &str) -> Option<&mut Session> {
        self.sessions.iter_mut().find(|s| s.id == session_id)
    }

    /// The session `current_session_id` points at, if it resolves.
    pub fn current_session(&self) -> Option<&Session> {
        self.current_session_id
            .as_deref()
            .and_then(|id| self.session(id))
    }

    pub fn current_session_mut(&mut self) -> Option<&mut Session> {
        let id = self.current_session_id.clone()?;
        self.session_mut(&id)
    }

    /// Moves `path` to the front of the recent projects list.
    pub fn push_recent_project(&mut self, path: String) {
        self.recent_projects.retain(|p| p != &path);
        self.recent_projects.insert(0, path);
        self.recent_projects.truncate(MAX_RECENT_PROJECTS);
    }
}

/// The durable part of the store: exactly sessions, permissions and settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersistedState {
    pub sessions: Vec<Session>,
    pub permissions: Permissions,
    pub settings: Settings,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permission::PermissionDecision;
    use crate::todo::Todo;

    #[test]
    fn test_current_session_is_derived() {
        let mut snapshot = StoreSnapshot::default();
        snapshot.sessions.push(Session::new("s1", "one", None));
        assert!(snapshot.current_session().is_none());

        snapshot.current_session_id = Some("s1".to_string());
        assert_eq!(snapshot.current_session().map(|s| s.name.as_str()), Some("one"));

        snapshot.sessions.clear();
        assert!(snapshot.current_session().is_none());
    }

    #[test]
    fn test_round_trip_through_persisted_drops_transient_fields() {
        let mut snapshot = StoreSnapshot::default();
        snapshot.sessions.push(Session::new("s1", "one", None));
        snapshot.current_session_id = Some("s1".to_string());
        snapshot.todos.push(Todo::new("t1", "todo"));
        snapshot
            .permissions
            .insert("bash".to_string(), PermissionDecision::Deny);
        snapshot.ui.side_panel_open = true;

        let restored = StoreSnapshot::from_persisted(snapshot.to_persisted());
        assert_eq!(restored.sessions, snapshot.sessions);
        assert_eq!(restored.permissions, snapshot.permissions);
        assert_eq!(restored.settings, snapshot.settings);
        assert!(restored.current_session_id.is_none());
        assert!(restored.todos.is_empty());
        assert_eq!(restored.ui, UiState::default());
    }

    #[test]
    fn test_recent_projects_are_mru_and_capped() {
        let mut snapshot = StoreSnapshot::default();
        for i in 0..12 {
            snapshot.push_recent_project(format!("/p/{i}"));
        }
        snapshot.push_recent_project("/p/5".to_string());

        assert_eq!(snapshot.recent_projects.len(), MAX_RECENT_PROJECTS);
        assert_eq!(snapshot.recent_projects[0], "/p/5");
        assert_eq!(snapshot.recent_projects[1], "/p/11");
        assert_eq!(
            snapshot
                .recent_projects
                .iter()
                .filter(|p| p.as_str() == "/p/5")
                .count(),
            1
        );
    }

    #[test]
    fn test_restore_fails_interrupted_deliveries() {
        let mut session = Session::new("s1", "one", None);
        session.messages.push(Message::user("m1", "sent before restart"));
        let mut persisted = PersistedState::default();
        persisted.sessions.push(session);

        let restored = StoreSnapshot::from_persisted(persisted);
        assert_eq!(
            restored.sessions[0].messages[0].delivery,
            Some(DeliveryStatus::Failed)
        );
    }

    #[test]
    fn test_persisted_state_json_shape() {
        let json = serde_json::to_value(PersistedState::default()).unwrap();
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(|k| k.as_str()).collect();
        assert_eq!(keys.len(), 3);
        assert!(keys.contains(&"sessions"));
        assert!(keys.contains(&"permissions"));
        assert!(keys.contains(&"settings"));
    }
}
