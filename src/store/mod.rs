// Collaborator contracts for the key-value upload store and the identity
// provider's user directory. The gateway only depends on these read/write
// contracts; actual AWS-backed implementations live outside this crate. The
// in-memory implementations back local development and the integration tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// One room-inspection upload, keyed by uploader and upload time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Upload {
    pub uploaded_by_user_id: String,
    pub uploaded_at: DateTime<Utc>,
    pub image_key: String,
    pub dorm: String,
    pub room: String,
    #[serde(default)]
    pub notes: String,
    pub uploaded_by_name: String,
    pub resident_name: String,
    pub resident_j_number: String,
    pub resident_email: String,
    pub inspection_status: String,
    #[serde(default)]
    pub maintenance_issues: Vec<String>,
    #[serde(default)]
    pub failure_reasons: Vec<String>,
}

/// A staff account as the directory reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    pub user_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0} already exists")]
    Conflict(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait UploadStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Upload>, StoreError>;
    async fn put(&self, upload: Upload) -> Result<(), StoreError>;
    /// Remove one upload by its (uploader, timestamp) key, returning it.
    async fn delete(
        &self,
        user_id: &str,
        uploaded_at: &DateTime<Utc>,
    ) -> Result<Upload, StoreError>;
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn list(&self) -> Result<Vec<UserAccount>, StoreError>;
    async fn find_by_id(&self, user_id: &str) -> Result<Option<UserAccount>, StoreError>;
    /// Create an account; `Conflict` when the email is already registered.
    async fn create(&self, user: NewUser) -> Result<UserAccount, StoreError>;
    async fn delete(&self, user_id: &str) -> Result<UserAccount, StoreError>;
}

// --- In-memory implementations ----------------------------------------------

#[derive(Default)]
pub struct MemoryUploadStore {
    uploads: RwLock<Vec<Upload>>,
}

impl MemoryUploadStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed(&self, uploads: Vec<Upload>) {
        *self.uploads.write().await = uploads;
    }
}

#[async_trait]
impl UploadStore for MemoryUploadStore {
    async fn list(&self) -> Result<Vec<Upload>, StoreError> {
        Ok(self.uploads.read().await.clone())
    }

    async fn put(&self, upload: Upload) -> Result<(), StoreError> {
        self.uploads.write().await.push(upload);
        Ok(())
    }

    async fn delete(
        &self,
        user_id: &str,
        uploaded_at: &DateTime<Utc>,
    ) -> Result<Upload, StoreError> {
        let mut uploads = self.uploads.write().await;
        let position = uploads
            .iter()
            .position(|u| u.uploaded_by_user_id == user_id && &u.uploaded_at == uploaded_at)
            .ok_or_else(|| StoreError::NotFound("upload".to_string()))?;
        Ok(uploads.remove(position))
    }
}

#[derive(Default)]
pub struct MemoryUserDirectory {
    users: RwLock<HashMap<String, UserAccount>>,
}

impl MemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed(&self, users: Vec<UserAccount>) {
        let mut map = self.users.write().await;
        map.clear();
        for user in users {
            map.insert(user.user_id.clone(), user);
        }
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn list(&self) -> Result<Vec<UserAccount>, StoreError> {
        let mut users: Vec<UserAccount> = self.users.read().await.values().cloned().collect();
        users.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(users)
    }

    async fn find_by_id(&self, user_id: &str) -> Result<Option<UserAccount>, StoreError> {
        Ok(self.users.read().await.get(user_id).cloned())
    }

    async fn create(&self, user: NewUser) -> Result<UserAccount, StoreError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
            return Err(StoreError::Conflict(format!("user with email '{}'", user.email)));
        }
        let account = UserAccount {
            user_id: uuid::Uuid::new_v4().to_string(),
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            role: user.role,
            created_at: Utc::now(),
        };
        users.insert(account.user_id.clone(), account.clone());
        Ok(account)
    }

    async fn delete(&self, user_id: &str) -> Result<UserAccount, StoreError> {
        self.users
            .write()
            .await
            .remove(user_id)
            .ok_or_else(|| StoreError::NotFound(format!("user '{}'", user_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(user_id: &str, at: DateTime<Utc>) -> Upload {
        Upload {
            uploaded_by_user_id: user_id.to_string(),
            uploaded_at: at,
            image_key: format!("uploads/{}.jpg", user_id),
            dorm: "North Hall".to_string(),
            room: "214".to_string(),
            notes: String::new(),
            uploaded_by_name: "RA Jordan".to_string(),
            resident_name: "Casey Resident".to_string(),
            resident_j_number: "J00123456".to_string(),
            resident_email: "casey@dorm.example.com".to_string(),
            inspection_status: "pass".to_string(),
            maintenance_issues: vec![],
            failure_reasons: vec![],
        }
    }

    #[tokio::test]
    async fn delete_removes_only_the_keyed_upload() {
        let store = MemoryUploadStore::new();
        let at = Utc::now();
        store.seed(vec![upload("ra-1", at), upload("ra-2", at)]).await;

        let removed = store.delete("ra-1", &at).await.unwrap();
        assert_eq!(removed.uploaded_by_user_id, "ra-1");
        assert_eq!(store.list().await.unwrap().len(), 1);

        let err = store.delete("ra-1", &at).await.unwrap_err();
        assert_eq!(err, StoreError::NotFound("upload".to_string()));
    }

    #[tokio::test]
    async fn duplicate_email_conflicts_case_insensitively() {
        let directory = MemoryUserDirectory::new();
        directory
            .create(NewUser {
                email: "ra@dorm.example.com".to_string(),
                first_name: "Jordan".to_string(),
                last_name: "Lee".to_string(),
                role: "RA".to_string(),
            })
            .await
            .unwrap();

        let err = directory
            .create(NewUser {
                email: "RA@dorm.example.com".to_string(),
                first_name: "Sam".to_string(),
                last_name: "Cho".to_string(),
                role: "RA".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }
}
