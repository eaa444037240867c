use crate::forms::FORM;
use crate::forms::FormErrors;
use crate::store::StoreError;
use crate::theme;
use axum::extract::rejection::FormRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use maud::html;
use tracing::error;

pub type AppResult<T> = Result<T, KnownErrors>;

#[derive(Debug, thiserror::Error)]
pub enum KnownErrors {
    #[error("Invalid input: {0}")]
    InvalidInput(FormErrors),

    #[error("Invalid username/password.")]
    InvalidCredentials,

    #[error("You are not allowed to do that.")]
    Unauthorized,

    #[error("Already in use: {0}")]
    Conflict(FormErrors),

    #[error("{what} not found")]
    NotFound { what: &'static str },

    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal error: {context}")]
    Internal { context: String },
}

/// A body that is not a urlencoded form at all.
impl From<FormRejection> for KnownErrors {
    fn from(rejection: FormRejection) -> Self {
        KnownErrors::InvalidInput(FormErrors::with(FORM, rejection.body_text()))
    }
}

impl From<bcrypt::BcryptError> for KnownErrors {
    fn from(e: bcrypt::BcryptError) -> Self {
        KnownErrors::Internal {
            context: format!("password hashing failed: {}", e),
        }
    }
}

impl From<tokio::task::JoinError> for KnownErrors {
    fn from(e: tokio::task::JoinError) -> Self {
        KnownErrors::Internal {
            context: format!("blocking task failed: {}", e),
        }
    }
}

impl KnownErrors {
    pub fn status_code(&self) -> StatusCode {
        match self {
            KnownErrors::InvalidInput(_) => StatusCode::BAD_REQUEST,
            KnownErrors::InvalidCredentials | KnownErrors::Unauthorized => {
                StatusCode::UNAUTHORIZED
            }
            KnownErrors::Conflict(_) => StatusCode::CONFLICT,
            KnownErrors::NotFound { .. } => StatusCode::NOT_FOUND,
            KnownErrors::Session(_) | KnownErrors::Store(_) | KnownErrors::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for KnownErrors {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // don't leak storage or session details to the client
        let message = if status.is_server_error() {
            error!("{}", self);
            "Something went wrong. Please try again later.".to_string()
        } else {
            self.to_string()
        };

        let title = status.canonical_reason().unwrap_or("Error");
        let markup = theme::theme(
            title,
            html! {
                div class="flex min-h-full flex-col justify-center px-6 py-12 lg:px-8" {
                    div class="sm:mx-auto sm:w-full sm:max-w-sm text-center" {
                        h2 class="mt-10 text-2xl/9 font-bold tracking-tight" {
                            (status.as_u16()) " " (title)
                        }
                        p class="mt-4 text-sm text-gray-600 dark:text-gray-400" {
                            (message)
                        }
                        a href="/login" class=(theme::LINK_CLASS) { "Back to login" }
                    }
                }
            },
        );

        (status, markup).into_response()
    }
}
