use axum::Router;
use axum::middleware;
use axum::response::Redirect;
use axum::routing::get;
use axum::routing::post;
use tower_http::trace::TraceLayer;
use tower_sessions::Expiry;
use tower_sessions::SessionManagerLayer;
use tower_sessions::SessionStore;
use tower_sessions::cookie::SameSite;

use crate::appstate::AppState;
use crate::auth::session::COOKIE_NAME;
use crate::auth::session::SessionSettings;
use crate::auth::session::apply_session_update;
use crate::auth::signin;
use crate::auth::signout;
use crate::auth::signup;
use crate::feedback;
use crate::notfoundpage::not_found_page;
use crate::users;

/// Builds the full application router around `state`.
///
/// Sessions live in `sessions`; the cookie only carries the signed id.
pub fn router<S>(state: AppState, settings: SessionSettings, sessions: S) -> Router
where
    S: SessionStore + Clone,
{
    let session_layer = SessionManagerLayer::new(sessions)
        .with_name(COOKIE_NAME)
        .with_http_only(true)
        .with_secure(settings.secure)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(settings.idle_timeout))
        .with_signed(settings.key);

    Router::new()
        .route("/", get(Redirect::to("/register")))
        .route(
            "/register",
            get(signup::register_get).post(signup::register_post),
        )
        .route("/login", get(signin::login_get).post(signin::login_post))
        .route("/logout", get(signout::logout))
        .route("/users/{username}", get(users::views::show_user))
        .route("/users/{username}/delete", post(users::views::delete_user))
        .route(
            "/users/{username}/feedback/new",
            get(feedback::views::new_feedback_get).post(feedback::views::new_feedback_post),
        )
        .route(
            "/feedback/{id}/update",
            get(feedback::views::update_feedback_get).post(feedback::views::update_feedback_post),
        )
        .route(
            "/feedback/{id}/delete",
            post(feedback::views::delete_feedback),
        )
        .fallback(not_found_page)
        .layer(middleware::from_fn(apply_session_update))
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
