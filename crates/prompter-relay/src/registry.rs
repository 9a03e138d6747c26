use std::collections::HashMap;

use prompter_platforms::PlatformIntegration;
use prompter_schema::{Platform, RelayError};
use serde::Serialize;
use tokio::sync::RwLock;

/// One tracked relay session. Snapshots of this are handed out by the
/// registry; the live integration handle stays inside the registry entry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub session_id: String,
    pub platform: Platform,
    pub participants: Vec<String>,
    pub transcript: Vec<String>,
}

impl Session {
    fn new(session_id: String, platform: Platform) -> Self {
        Self {
            session_id,
            platform,
            participants: Vec::new(),
            transcript: Vec::new(),
        }
    }
}

pub struct SessionEntry {
    pub session: Session,
    pub integration: Box<dyn PlatformIntegration>,
}

/// In-memory map from session id to its entry. Single source of truth for
/// session lifecycle; every entry exclusively owns its integration handle.
///
/// Lock discipline: no await point runs while the map guard is held, so
/// handlers for different sessions only contend for the duration of a map
/// operation. Integrations are only driven while their entry is outside the
/// map (before insert, after remove), which keeps destruction the last
/// operation observable for an id.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, SessionEntry>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session, overwriting any previous entry under the same id.
    /// The displaced entry is returned so its integration can be shut down.
    pub async fn insert(
        &self,
        session_id: impl Into<String>,
        platform: Platform,
        integration: Box<dyn PlatformIntegration>,
    ) -> Option<SessionEntry> {
        let session_id = session_id.into();
        let entry = SessionEntry {
            session: Session::new(session_id.clone(), platform),
            integration,
        };
        self.sessions.write().await.insert(session_id, entry)
    }

    pub async fn get(&self, session_id: &str) -> Option<Session> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .map(|entry| entry.session.clone())
    }

    pub async fn contains(&self, session_id: &str) -> bool {
        self.sessions.read().await.contains_key(session_id)
    }

    pub async fn append_transcript(
        &self,
        session_id: &str,
        text: impl Into<String>,
    ) -> Result<(), RelayError> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions
            .get_mut(session_id)
            .ok_or_else(|| RelayError::SessionNotFound(session_id.to_string()))?;
        entry.session.transcript.push(text.into());
        Ok(())
    }

    /// Append-only ordered set: a participant already present keeps its
    /// original position. Returns whether the participant was new.
    pub async fn add_participant(
        &self,
        session_id: &str,
        participant: impl Into<String>,
    ) -> Result<bool, RelayError> {
        let participant = participant.into();
        let mut sessions = self.sessions.write().await;
        let entry = sessions
            .get_mut(session_id)
            .ok_or_else(|| RelayError::SessionNotFound(session_id.to_string()))?;
        if entry.session.participants.contains(&participant) {
            return Ok(false);
        }
        entry.session.participants.push(participant);
        Ok(true)
    }

    pub async fn remove(&self, session_id: &str) -> Option<SessionEntry> {
        self.sessions.write().await.remove(session_id)
    }

    /// Drain every entry; used for shutdown and test isolation.
    pub async fn clear(&self) -> Vec<SessionEntry> {
        let mut sessions = self.sessions.write().await;
        sessions.drain().map(|(_, entry)| entry).collect()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prompter_platforms::new_integration;

    fn zoom_integration() -> Box<dyn PlatformIntegration> {
        new_integration(Platform::Zoom)
    }

    #[tokio::test]
    async fn transcript_preserves_arrival_order() {
        let registry = SessionRegistry::new();
        registry
            .insert("abc123", Platform::Zoom, zoom_integration())
            .await;

        let fragments = ["first", "second", "third?", "fourth"];
        for fragment in fragments {
            registry.append_transcript("abc123", fragment).await.unwrap();
        }

        let session = registry.get("abc123").await.unwrap();
        assert_eq!(session.transcript, fragments);
    }

    #[tokio::test]
    async fn append_without_session_fails_and_changes_nothing() {
        let registry = SessionRegistry::new();
        let err = registry
            .append_transcript("missing", "hello")
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::SessionNotFound(id) if id == "missing"));
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn remove_makes_session_unreachable() {
        let registry = SessionRegistry::new();
        registry
            .insert("abc123", Platform::Zoom, zoom_integration())
            .await;

        let entry = registry.remove("abc123").await.unwrap();
        assert_eq!(entry.session.session_id, "abc123");
        assert!(registry.get("abc123").await.is_none());

        let err = registry
            .append_transcript("abc123", "late fragment")
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::SessionNotFound(_)));
    }

    #[tokio::test]
    async fn insert_overwrites_and_returns_displaced() {
        let registry = SessionRegistry::new();
        assert!(registry
            .insert("abc123", Platform::Zoom, zoom_integration())
            .await
            .is_none());
        registry.append_transcript("abc123", "old").await.unwrap();

        let displaced = registry
            .insert("abc123", Platform::Meet, new_integration(Platform::Meet))
            .await
            .unwrap();
        assert_eq!(displaced.session.platform, Platform::Zoom);
        assert_eq!(displaced.session.transcript, vec!["old"]);

        let session = registry.get("abc123").await.unwrap();
        assert_eq!(session.platform, Platform::Meet);
        assert!(session.transcript.is_empty());
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn participants_form_an_ordered_set() {
        let registry = SessionRegistry::new();
        registry
            .insert("abc123", Platform::Zoom, zoom_integration())
            .await;

        assert!(registry.add_participant("abc123", "alice").await.unwrap());
        assert!(registry.add_participant("abc123", "bob").await.unwrap());
        assert!(!registry.add_participant("abc123", "alice").await.unwrap());

        let session = registry.get("abc123").await.unwrap();
        assert_eq!(session.participants, vec!["alice", "bob"]);
    }

    #[tokio::test]
    async fn clear_drains_all_entries() {
        let registry = SessionRegistry::new();
        registry.insert("a", Platform::Zoom, zoom_integration()).await;
        registry.insert("b", Platform::Zoom, zoom_integration()).await;

        let drained = registry.clear().await;
        assert_eq!(drained.len(), 2);
        assert!(registry.is_empty().await);
    }
}
