pub mod guard;
pub mod password;
pub mod session;
pub mod signin;
pub mod signout;
pub mod signup;

use crate::forms::Credentials;
use crate::forms::FormErrors;
use crate::forms::Registration;
use crate::known_errors::AppResult;
use crate::known_errors::KnownErrors;
use crate::store::Store;
use crate::store::StoreError;
use crate::users::NewUser;
use crate::users::User;
use std::sync::Arc;

const USERNAME_TAKEN: &str = "Username already taken.";
const EMAIL_TAKEN: &str = "Email already registered.";

/// Verifies passwords against the user store and registers new users.
#[derive(Clone)]
pub struct Authenticator {
    store: Arc<dyn Store>,
    cost: u32,
    // checked against when the username is unknown, so a miss costs as much as a hit
    dummy_hash: Arc<str>,
}

impl Authenticator {
    pub async fn new(store: Arc<dyn Store>, cost: u32) -> AppResult<Self> {
        let dummy_hash = password::hash("not the password".to_string(), cost).await?;

        Ok(Self {
            store,
            cost,
            dummy_hash: dummy_hash.into(),
        })
    }

    /// Returns the user if the password matches.
    ///
    /// Unknown usernames and wrong passwords are indistinguishable to the caller.
    pub async fn authenticate(&self, credentials: Credentials) -> AppResult<Option<User>> {
        let Some(user) = self.store.get_user(&credentials.username).await? else {
            password::verify(credentials.password, self.dummy_hash.to_string()).await?;
            return Ok(None);
        };

        if password::verify(credentials.password, user.password_hash.clone()).await? {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    /// Hashes the password and stores the new user.
    ///
    /// Fails with [`KnownErrors::Conflict`] naming every field (`username`,
    /// `email`) that is already in use.
    pub async fn register(&self, registration: Registration) -> AppResult<User> {
        let mut conflicts = FormErrors::default();
        if self.store.username_exists(&registration.username).await? {
            conflicts.add("username", USERNAME_TAKEN);
        }
        if self.store.email_exists(&registration.email).await? {
            conflicts.add("email", EMAIL_TAKEN);
        }
        if !conflicts.is_empty() {
            return Err(KnownErrors::Conflict(conflicts));
        }

        let password_hash = password::hash(registration.password, self.cost).await?;

        let created = self
            .store
            .create_user(NewUser {
                username: registration.username,
                password_hash,
                email: registration.email,
                first_name: registration.first_name,
                last_name: registration.last_name,
            })
            .await;

        // a concurrent registration can still win the race after the checks above
        match created {
            Ok(user) => Ok(user),
            Err(StoreError::UsernameTaken) => Err(KnownErrors::Conflict(FormErrors::with(
                "username",
                USERNAME_TAKEN,
            ))),
            Err(StoreError::EmailTaken) => Err(KnownErrors::Conflict(FormErrors::with(
                "email",
                EMAIL_TAKEN,
            ))),
            Err(e) => Err(e.into()),
        }
    }
}
