use super::FeedbackStore;
use super::StoreError;
use super::UserStore;
use crate::feedback::Feedback;
use crate::feedback::FeedbackId;
use crate::feedback::NewFeedback;
use crate::users::NewUser;
use crate::users::User;
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use std::sync::atomic::AtomicI64;
use std::sync::atomic::Ordering;

/// In-memory storage implementation using DashMap
#[derive(Clone)]
pub struct MemoryStore {
    users: Arc<DashMap<String, User>>,
    email_to_username: Arc<DashMap<String, String>>,
    feedback: Arc<DashMap<FeedbackId, Feedback>>,
    last_feedback_id: Arc<AtomicI64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            users: Arc::new(DashMap::new()),
            email_to_username: Arc::new(DashMap::new()),
            feedback: Arc::new(DashMap::new()),
            last_feedback_id: Arc::new(AtomicI64::new(0)),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let user = User::from(user);

        let Entry::Vacant(user_slot) = self.users.entry(user.username.clone()) else {
            return Err(StoreError::UsernameTaken);
        };
        let Entry::Vacant(email_slot) = self.email_to_username.entry(user.email.clone()) else {
            return Err(StoreError::EmailTaken);
        };

        email_slot.insert(user.username.clone());
        user_slot.insert(user.clone());

        Ok(user)
    }

    async fn get_user(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.get(username).map(|user| user.clone()))
    }

    async fn email_exists(&self, email: &str) -> Result<bool, StoreError> {
        Ok(self.email_to_username.contains_key(email))
    }

    async fn delete_user(&self, username: &str) -> Result<bool, StoreError> {
        let Some((_, user)) = self.users.remove(username) else {
            return Ok(false);
        };

        self.email_to_username.remove(&user.email);
        self.feedback.retain(|_, f| f.username != user.username);

        Ok(true)
    }
}

#[async_trait]
impl FeedbackStore for MemoryStore {
    async fn create_feedback(&self, feedback: NewFeedback) -> Result<Feedback, StoreError> {
        // holding the owner's entry keeps a concurrent delete_user from
        // slipping in between the check and the insert
        let Some(_owner) = self.users.get(&feedback.username) else {
            return Err(StoreError::UnknownOwner);
        };

        let id = self.last_feedback_id.fetch_add(1, Ordering::SeqCst) + 1;
        let feedback = Feedback {
            id,
            title: feedback.title,
            content: feedback.content,
            username: feedback.username,
        };
        self.feedback.insert(id, feedback.clone());

        Ok(feedback)
    }

    async fn get_feedback(&self, id: FeedbackId) -> Result<Option<Feedback>, StoreError> {
        Ok(self.feedback.get(&id).map(|f| f.clone()))
    }

    async fn feedback_for_user(&self, username: &str) -> Result<Vec<Feedback>, StoreError> {
        let mut owned: Vec<Feedback> = self
            .feedback
            .iter()
            .filter(|f| f.username == username)
            .map(|f| f.clone())
            .collect();
        owned.sort_by_key(|f| f.id);

        Ok(owned)
    }

    async fn update_feedback(
        &self,
        id: FeedbackId,
        title: String,
        content: String,
    ) -> Result<Option<Feedback>, StoreError> {
        Ok(self.feedback.get_mut(&id).map(|mut f| {
            f.title = title;
            f.content = content;
            f.clone()
        }))
    }

    async fn delete_feedback(&self, id: FeedbackId) -> Result<bool, StoreError> {
        Ok(self.feedback.remove(&id).is_some())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            password_hash: "not-a-real-hash".to_string(),
            email: email.to_string(),
            first_name: "First".to_string(),
            last_name: "Last".to_string(),
        }
    }

    pub(crate) fn new_feedback(username: &str, title: &str) -> NewFeedback {
        NewFeedback {
            title: title.to_string(),
            content: format!("content of {}", title),
            username: username.to_string(),
        }
    }

    #[tokio::test]
    async fn test_user_store_operations() {
        let store = MemoryStore::new();

        assert!(
            !store
                .email_exists("a@x.com")
                .await
                .expect("Should check email existence")
        );

        let created = store
            .create_user(new_user("alice", "a@x.com"))
            .await
            .expect("Should create user successfully");
        assert_eq!(created.username, "alice");

        assert!(
            store
                .email_exists("a@x.com")
                .await
                .expect("Should check email existence")
        );
        assert!(
            store
                .username_exists("alice")
                .await
                .expect("Should check username existence")
        );
        assert_eq!(
            store.get_user("alice").await.expect("Should get user"),
            Some(created)
        );
        assert_eq!(store.get_user("bob").await.expect("Should get user"), None);
    }

    #[tokio::test]
    async fn test_duplicate_username_and_email_rejected() {
        let store = MemoryStore::new();
        store
            .create_user(new_user("alice", "a@x.com"))
            .await
            .expect("Should create first user");

        match store.create_user(new_user("alice", "other@x.com")).await {
            Err(StoreError::UsernameTaken) => {}
            other => panic!("expected UsernameTaken, got {:?}", other),
        }

        match store.create_user(new_user("bob", "a@x.com")).await {
            Err(StoreError::EmailTaken) => {}
            other => panic!("expected EmailTaken, got {:?}", other),
        }

        // the failed attempt must not leave "bob" half-created
        assert_eq!(store.get_user("bob").await.expect("Should get user"), None);
    }

    #[tokio::test]
    async fn test_feedback_lifecycle() {
        let store = MemoryStore::new();
        store
            .create_user(new_user("alice", "a@x.com"))
            .await
            .expect("Should create user");

        let first = store
            .create_feedback(new_feedback("alice", "first"))
            .await
            .expect("Should create feedback");
        let second = store
            .create_feedback(new_feedback("alice", "second"))
            .await
            .expect("Should create feedback");
        assert_ne!(first.id, second.id);

        let updated = store
            .update_feedback(first.id, "renamed".to_string(), "new body".to_string())
            .await
            .expect("Should update feedback")
            .expect("feedback should exist");
        assert_eq!(updated.title, "renamed");
        assert_eq!(updated.content, "new body");
        assert_eq!(updated.username, "alice");

        let owned = store
            .feedback_for_user("alice")
            .await
            .expect("Should list feedback");
        assert_eq!(owned, vec![updated, second.clone()]);

        assert!(
            store
                .delete_feedback(second.id)
                .await
                .expect("Should delete feedback")
        );
        assert!(
            !store
                .delete_feedback(second.id)
                .await
                .expect("Should report missing feedback")
        );
        assert_eq!(
            store
                .update_feedback(second.id, "x".to_string(), "y".to_string())
                .await
                .expect("Should attempt update"),
            None
        );
    }

    #[tokio::test]
    async fn test_feedback_requires_existing_owner() {
        let store = MemoryStore::new();

        match store.create_feedback(new_feedback("ghost", "boo")).await {
            Err(StoreError::UnknownOwner) => {}
            other => panic!("expected UnknownOwner, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_delete_user_cascades_to_feedback() {
        let store = MemoryStore::new();
        store
            .create_user(new_user("alice", "a@x.com"))
            .await
            .expect("Should create alice");
        store
            .create_user(new_user("bob", "b@x.com"))
            .await
            .expect("Should create bob");

        let alices = store
            .create_feedback(new_feedback("alice", "mine"))
            .await
            .expect("Should create feedback");
        let bobs = store
            .create_feedback(new_feedback("bob", "his"))
            .await
            .expect("Should create feedback");

        assert!(store.delete_user("alice").await.expect("Should delete"));
        assert!(!store.delete_user("alice").await.expect("Should delete"));

        assert_eq!(
            store
                .get_feedback(alices.id)
                .await
                .expect("Should look up feedback"),
            None
        );
        assert_eq!(
            store
                .get_feedback(bobs.id)
                .await
                .expect("Should look up feedback"),
            Some(bobs)
        );

        // the email is free again
        assert!(
            !store
                .email_exists("a@x.com")
                .await
                .expect("Should check email existence")
        );
    }
}
