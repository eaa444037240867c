use crate::forms::FORM;
use crate::forms::FormErrors;
use crate::known_errors::AppResult;
use crate::known_errors::KnownErrors;
use axum::extract::FromRequestParts;
use axum::extract::Request;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::IntoResponseParts;
use axum::response::Response;
use axum::response::ResponseParts;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use std::convert::Infallible;
use tower_sessions::Session;
use tower_sessions::cookie::Key;
use tracing::debug;

const IDENTITY_KEY: &str = "username";
const CSRF_KEY: &str = "csrf_token";

pub const COOKIE_NAME: &str = "feedback_session";

/// Cookie settings for the session layer.
#[derive(Clone)]
pub struct SessionSettings {
    pub key: Key,
    pub secure: bool,
    pub idle_timeout: time::Duration,
}

/// What the session held when the request arrived.
///
/// Handlers read identity from here and never write to the session
/// themselves; changes go back out as a [`SessionUpdate`]. Reading a
/// snapshot never creates a session.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    identity: Option<String>,
    csrf_token: Option<String>,
}

impl SessionSnapshot {
    pub fn new(identity: Option<String>, csrf_token: Option<String>) -> Self {
        Self {
            identity,
            csrf_token,
        }
    }

    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    /// False when the session never issued a token.
    pub fn csrf_valid(&self, submitted: &str) -> bool {
        self.csrf_token
            .as_deref()
            .is_some_and(|expected| tokens_match(expected.as_bytes(), submitted.as_bytes()))
    }

    /// Combines the anti-forgery check with the form's own validation.
    pub fn accept<T>(
        &self,
        submitted_token: &str,
        validated: Result<T, FormErrors>,
    ) -> Result<T, FormErrors> {
        if self.csrf_valid(submitted_token) {
            return validated;
        }

        let mut errors = FormErrors::with(FORM, "The form expired. Please try again.");
        if let Err(field_errors) = validated {
            errors.merge(field_errors);
        }
        Err(errors)
    }
}

fn session_from_parts(parts: &Parts) -> AppResult<Session> {
    parts
        .extensions
        .get::<Session>()
        .cloned()
        .ok_or_else(|| KnownErrors::Internal {
            context: "session layer is not installed".to_string(),
        })
}

impl<S> FromRequestParts<S> for SessionSnapshot
where
    S: Send + Sync,
{
    type Rejection = KnownErrors;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = session_from_parts(parts)?;

        let identity = session.get::<String>(IDENTITY_KEY).await?;
        let csrf_token = session.get::<String>(CSRF_KEY).await?;

        Ok(Self::new(identity, csrf_token))
    }
}

/// Hands out the anti-forgery token for rendered forms.
///
/// The token is stored in the session on first use, so handlers ask for it
/// only once they are about to render a form.
#[derive(Clone)]
pub struct CsrfTokens(Session);

impl CsrfTokens {
    pub async fn issue(&self) -> AppResult<String> {
        if let Some(token) = self.0.get::<String>(CSRF_KEY).await? {
            return Ok(token);
        }

        let token = new_csrf_token();
        self.0.insert(CSRF_KEY, &token).await?;
        Ok(token)
    }
}

impl<S> FromRequestParts<S> for CsrfTokens
where
    S: Send + Sync,
{
    type Rejection = KnownErrors;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(session_from_parts(parts)?))
    }
}

/// A change to the session identity, returned by handlers as a response part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionUpdate {
    Set(String),
    Clear,
}

impl IntoResponseParts for SessionUpdate {
    type Error = Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        res.extensions_mut().insert(self);
        Ok(res)
    }
}

impl SessionUpdate {
    async fn apply(self, session: &Session) -> AppResult<()> {
        match self {
            SessionUpdate::Set(username) => {
                // new id on privilege change
                session.cycle_id().await?;
                session.insert(IDENTITY_KEY, username).await?;
            }
            SessionUpdate::Clear => {
                session.remove_value(IDENTITY_KEY).await?;
            }
        }
        Ok(())
    }
}

/// Persists whatever [`SessionUpdate`] the handler returned.
pub async fn apply_session_update(session: Session, request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;

    let Some(update) = response.extensions_mut().remove::<SessionUpdate>() else {
        return response;
    };

    debug!("applying session update: {:?}", update);
    match update.apply(&session).await {
        Ok(()) => response,
        Err(e) => e.into_response(),
    }
}

fn new_csrf_token() -> String {
    let bytes: [u8; 32] = rand::random();
    URL_SAFE_NO_PAD.encode(bytes)
}

fn tokens_match(expected: &[u8], submitted: &[u8]) -> bool {
    if expected.len() != submitted.len() {
        return false;
    }

    expected
        .iter()
        .zip(submitted)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}
