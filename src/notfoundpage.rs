use axum::http::StatusCode;
use maud::Markup;
use maud::html;

use crate::auth::session::SessionSnapshot;
use crate::theme::LINK_CLASS;
use crate::theme::layout;

pub async fn not_found_page(snapshot: SessionSnapshot) -> (StatusCode, Markup) {
    (
        StatusCode::NOT_FOUND,
        layout(
            "Page not found",
            snapshot.identity(),
            html! {
                a href="/" class=(LINK_CLASS) { "Go home" }
            },
        ),
    )
}
