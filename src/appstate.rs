use crate::auth::Authenticator;
use crate::auth::guard::require_logged_in;
use crate::auth::guard::require_self;
use crate::feedback::Feedback;
use crate::feedback::FeedbackId;
use crate::feedback::NewFeedback;
use crate::forms::Credentials;
use crate::forms::FeedbackFields;
use crate::forms::Registration;
use crate::known_errors::AppResult;
use crate::known_errors::KnownErrors;
use crate::store::Store;
use crate::store::StoreError;
use crate::users::User;
use std::sync::Arc;
use tracing::info;
use tracing::warn;

/// A user together with the feedback they own.
#[derive(Debug, Clone)]
pub struct Profile {
    pub user: User,
    pub feedback: Vec<Feedback>,
}

/// Shared handler state.
///
/// Every operation that touches a user-owned resource takes the session
/// identity as `actor` and runs the guard before any mutation.
#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn Store>,
    authenticator: Authenticator,
}

impl AppState {
    pub async fn new(store: Arc<dyn Store>, bcrypt_cost: u32) -> AppResult<Self> {
        let authenticator = Authenticator::new(store.clone(), bcrypt_cost).await?;
        Ok(Self {
            store,
            authenticator,
        })
    }

    pub async fn register(&self, registration: Registration) -> AppResult<User> {
        let user = self.authenticator.register(registration).await?;
        info!("{} registered", user.username);
        Ok(user)
    }

    pub async fn login(&self, credentials: Credentials) -> AppResult<User> {
        let username = credentials.username.clone();
        match self.authenticator.authenticate(credentials).await? {
            Some(user) => {
                info!("{} logged in", username);
                Ok(user)
            }
            None => {
                warn!("failed login for {}", username);
                Err(KnownErrors::InvalidCredentials)
            }
        }
    }

    pub async fn user_profile(&self, actor: Option<&str>, username: &str) -> AppResult<Profile> {
        self.authorize_self(actor, username)?;

        let user = self
            .store
            .get_user(username)
            .await?
            .ok_or(KnownErrors::NotFound { what: "User" })?;
        let feedback = self.store.feedback_for_user(username).await?;

        Ok(Profile { user, feedback })
    }

    pub async fn user_delete(&self, actor: Option<&str>, username: &str) -> AppResult<()> {
        self.authorize_self(actor, username)?;

        if !self.store.delete_user(username).await? {
            return Err(KnownErrors::NotFound { what: "User" });
        }

        info!("{} deleted their account", username);
        Ok(())
    }

    pub async fn feedback_create(
        &self,
        actor: Option<&str>,
        username: &str,
        fields: FeedbackFields,
    ) -> AppResult<Feedback> {
        self.authorize_self(actor, username)?;

        let created = self
            .store
            .create_feedback(NewFeedback {
                title: fields.title,
                content: fields.content,
                username: username.to_string(),
            })
            .await;

        // the session can outlive its user
        let feedback = match created {
            Ok(feedback) => feedback,
            Err(StoreError::UnknownOwner) => return Err(KnownErrors::NotFound { what: "User" }),
            Err(e) => return Err(e.into()),
        };

        info!("{} added feedback {}", username, feedback.id);
        Ok(feedback)
    }

    /// Loads a feedback row for its owner.
    ///
    /// Anonymous requests are rejected before the lookup; a missing row is
    /// `NotFound`; anyone but the owner is `Unauthorized`.
    pub async fn feedback_get_owned(
        &self,
        actor: Option<&str>,
        id: FeedbackId,
    ) -> AppResult<Feedback> {
        require_logged_in(actor)
            .or_unauthorized()
            .inspect_err(|_| warn!("anonymous access to feedback {}", id))?;

        let feedback = self
            .store
            .get_feedback(id)
            .await?
            .ok_or(KnownErrors::NotFound { what: "Feedback" })?;

        self.authorize_self(actor, &feedback.username)?;

        Ok(feedback)
    }

    pub async fn feedback_update(
        &self,
        actor: Option<&str>,
        id: FeedbackId,
        fields: FeedbackFields,
    ) -> AppResult<Feedback> {
        self.feedback_get_owned(actor, id).await?;

        let feedback = self
            .store
            .update_feedback(id, fields.title, fields.content)
            .await?
            .ok_or(KnownErrors::NotFound { what: "Feedback" })?;

        info!("{} updated feedback {}", feedback.username, id);
        Ok(feedback)
    }

    pub async fn feedback_delete(&self, actor: Option<&str>, id: FeedbackId) -> AppResult<Feedback> {
        let feedback = self.feedback_get_owned(actor, id).await?;

        if !self.store.delete_feedback(id).await? {
            return Err(KnownErrors::NotFound { what: "Feedback" });
        }

        info!("{} deleted feedback {}", feedback.username, id);
        Ok(feedback)
    }

    fn authorize_self(&self, actor: Option<&str>, owner: &str) -> AppResult<()> {
        require_self(actor, owner).or_unauthorized().inspect_err(|_| {
            warn!(
                "denied {} access to resources of {}",
                actor.unwrap_or("<anonymous>"),
                owner
            );
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::auth::tests::registration;
    use crate::store::FeedbackStore;
    use crate::store::MemoryStore;
    use crate::store::UserStore;

    pub(crate) async fn app_state() -> (AppState, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(store.clone(), 4)
            .await
            .expect("Should build app state");
        (state, store)
    }

    fn fields(title: &str, content: &str) -> FeedbackFields {
        FeedbackFields {
            title: title.to_string(),
            content: content.to_string(),
        }
    }

    async fn with_alice_and_bob() -> (AppState, Arc<MemoryStore>) {
        let (state, store) = app_state().await;
        state
            .register(registration("alice", "pw1", "a@x.com"))
            .await
            .expect("Should register alice");
        state
            .register(registration("bob", "pw2", "b@x.com"))
            .await
            .expect("Should register bob");
        (state, store)
    }

    #[tokio::test]
    async fn test_login_with_wrong_password_fails() {
        let (state, _store) = with_alice_and_bob().await;

        let result = state
            .login(Credentials {
                username: "alice".to_string(),
                password: "pw2".to_string(),
            })
            .await;
        assert!(matches!(result, Err(KnownErrors::InvalidCredentials)));

        let user = state
            .login(Credentials {
                username: "alice".to_string(),
                password: "pw1".to_string(),
            })
            .await
            .expect("Should log in");
        assert_eq!(user.username, "alice");
    }

    #[tokio::test]
    async fn test_profile_is_self_only() {
        let (state, _store) = with_alice_and_bob().await;

        let profile = state
            .user_profile(Some("alice"), "alice")
            .await
            .expect("Should load own profile");
        assert_eq!(profile.user.email, "a@x.com");
        assert!(profile.feedback.is_empty());

        assert!(matches!(
            state.user_profile(Some("bob"), "alice").await,
            Err(KnownErrors::Unauthorized)
        ));
        assert!(matches!(
            state.user_profile(None, "alice").await,
            Err(KnownErrors::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_stale_session_identity_is_not_found() {
        let (state, store) = with_alice_and_bob().await;
        store.delete_user("alice").await.expect("Should delete");

        assert!(matches!(
            state.user_profile(Some("alice"), "alice").await,
            Err(KnownErrors::NotFound { .. })
        ));
        assert!(matches!(
            state
                .feedback_create(Some("alice"), "alice", fields("hi", "there"))
                .await,
            Err(KnownErrors::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_other_user_cannot_delete_feedback() {
        let (state, store) = with_alice_and_bob().await;

        let feedback = state
            .feedback_create(Some("alice"), "alice", fields("hi", "there"))
            .await
            .expect("Should create feedback");
        assert_eq!(feedback.title, "hi");
        assert_eq!(feedback.content, "there");
        assert_eq!(feedback.username, "alice");

        assert!(matches!(
            state.feedback_delete(Some("bob"), feedback.id).await,
            Err(KnownErrors::Unauthorized)
        ));
        assert_eq!(
            store
                .get_feedback(feedback.id)
                .await
                .expect("Should look up feedback"),
            Some(feedback)
        );
    }

    #[tokio::test]
    async fn test_update_requires_ownership() {
        let (state, _store) = with_alice_and_bob().await;
        let feedback = state
            .feedback_create(Some("alice"), "alice", fields("hi", "there"))
            .await
            .expect("Should create feedback");

        assert!(matches!(
            state
                .feedback_update(Some("bob"), feedback.id, fields("mine", "now"))
                .await,
            Err(KnownErrors::Unauthorized)
        ));
        assert!(matches!(
            state
                .feedback_update(None, feedback.id, fields("mine", "now"))
                .await,
            Err(KnownErrors::Unauthorized)
        ));

        let updated = state
            .feedback_update(Some("alice"), feedback.id, fields("hello", "again"))
            .await
            .expect("Owner should update");
        assert_eq!(updated.title, "hello");
        assert_eq!(updated.content, "again");
    }

    #[tokio::test]
    async fn test_creating_feedback_for_someone_else_is_denied() {
        let (state, store) = with_alice_and_bob().await;

        assert!(matches!(
            state
                .feedback_create(Some("bob"), "alice", fields("hi", "there"))
                .await,
            Err(KnownErrors::Unauthorized)
        ));
        assert!(
            store
                .feedback_for_user("alice")
                .await
                .expect("Should list")
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_missing_feedback_is_not_found() {
        let (state, _store) = with_alice_and_bob().await;

        assert!(matches!(
            state.feedback_delete(Some("alice"), 999).await,
            Err(KnownErrors::NotFound { what: "Feedback" })
        ));
        assert!(matches!(
            state.feedback_get_owned(Some("alice"), 999).await,
            Err(KnownErrors::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_user_delete_cascades() {
        let (state, store) = with_alice_and_bob().await;
        let feedback = state
            .feedback_create(Some("alice"), "alice", fields("hi", "there"))
            .await
            .expect("Should create feedback");

        assert!(matches!(
            state.user_delete(Some("bob"), "alice").await,
            Err(KnownErrors::Unauthorized)
        ));

        state
            .user_delete(Some("alice"), "alice")
            .await
            .expect("Should delete own account");

        assert!(matches!(
            state.feedback_get_owned(Some("alice"), feedback.id).await,
            Err(KnownErrors::NotFound { .. })
        ));
        assert_eq!(store.get_user("alice").await.expect("Should look up"), None);
        assert!(matches!(
            state.user_delete(Some("alice"), "alice").await,
            Err(KnownErrors::NotFound { .. })
        ));
    }
}
