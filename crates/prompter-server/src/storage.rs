use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use prompter_schema::ResponseStyle;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    #[serde(default)]
    pub expertise: Vec<String>,
    #[serde(default)]
    pub preparation_mode: bool,
    #[serde(default)]
    pub response_style: ResponseStyle,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub settings: Option<UserSettings>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub settings: Option<UserSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedResponse {
    pub question: String,
    pub response: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewRecord {
    pub id: u64,
    pub user_id: Option<u64>,
    pub transcript: String,
    pub responses: Vec<RecordedResponse>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInterview {
    #[serde(default)]
    pub user_id: Option<u64>,
    pub transcript: String,
    #[serde(default)]
    pub responses: Vec<RecordedResponse>,
}

/// Key-value persistence for users and saved interviews.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn get_user(&self, id: u64) -> Option<User>;
    async fn get_user_by_username(&self, username: &str) -> Option<User>;
    async fn create_user(&self, user: NewUser) -> User;
    async fn save_interview(&self, interview: NewInterview) -> InterviewRecord;
}

#[derive(Default)]
struct MemStorageInner {
    users: HashMap<u64, User>,
    interviews: HashMap<u64, InterviewRecord>,
    next_user_id: u64,
    next_interview_id: u64,
}

/// Memory-resident storage; nothing survives a process restart.
#[derive(Default)]
pub struct MemStorage {
    inner: RwLock<MemStorageInner>,
}

impl MemStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemStorage {
    async fn get_user(&self, id: u64) -> Option<User> {
        self.inner.read().await.users.get(&id).cloned()
    }

    async fn get_user_by_username(&self, username: &str) -> Option<User> {
        self.inner
            .read()
            .await
            .users
            .values()
            .find(|user| user.username == username)
            .cloned()
    }

    async fn create_user(&self, user: NewUser) -> User {
        let mut inner = self.inner.write().await;
        inner.next_user_id += 1;
        let id = inner.next_user_id;
        let user = User {
            id,
            username: user.username,
            password: user.password,
            settings: user.settings,
        };
        inner.users.insert(id, user.clone());
        user
    }

    async fn save_interview(&self, interview: NewInterview) -> InterviewRecord {
        let mut inner = self.inner.write().await;
        inner.next_interview_id += 1;
        let id = inner.next_interview_id;
        let record = InterviewRecord {
            id,
            user_id: interview.user_id,
            transcript: interview.transcript,
            responses: interview.responses,
            created_at: Utc::now(),
        };
        inner.interviews.insert(id, record.clone());
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(name: &str) -> NewUser {
        NewUser {
            username: name.to_string(),
            password: "hunter2".to_string(),
            settings: None,
        }
    }

    #[tokio::test]
    async fn users_get_sequential_ids() {
        let storage = MemStorage::new();
        let alice = storage.create_user(new_user("alice")).await;
        let bob = storage.create_user(new_user("bob")).await;

        assert_eq!(alice.id, 1);
        assert_eq!(bob.id, 2);
        assert_eq!(storage.get_user(1).await.unwrap().username, "alice");
        assert!(storage.get_user(99).await.is_none());
    }

    #[tokio::test]
    async fn lookup_by_username() {
        let storage = MemStorage::new();
        storage.create_user(new_user("alice")).await;

        assert!(storage.get_user_by_username("alice").await.is_some());
        assert!(storage.get_user_by_username("carol").await.is_none());
    }

    #[tokio::test]
    async fn interviews_are_persisted_with_ids() {
        let storage = MemStorage::new();
        let record = storage
            .save_interview(NewInterview {
                user_id: Some(1),
                transcript: "Q: strengths? A: shipping.".to_string(),
                responses: vec![RecordedResponse {
                    question: "strengths?".to_string(),
                    response: "shipping".to_string(),
                    confidence: 0.9,
                }],
            })
            .await;

        assert_eq!(record.id, 1);
        assert_eq!(record.responses.len(), 1);
    }

    #[test]
    fn password_is_not_serialized() {
        let user = User {
            id: 1,
            username: "alice".to_string(),
            password: "hunter2".to_string(),
            settings: None,
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["username"], "alice");
    }
}
