use axum::response::IntoResponse;
use axum::response::Redirect;
use axum::response::Response;

use super::session::SessionSnapshot;
use super::session::SessionUpdate;
use tracing::info;

/// Without an identity there is nothing to clear and no session is touched.
pub async fn logout(snapshot: SessionSnapshot) -> Response {
    let Some(username) = snapshot.identity() else {
        return Redirect::to("/login").into_response();
    };

    info!("{} logged out", username);
    (SessionUpdate::Clear, Redirect::to("/login")).into_response()
}
