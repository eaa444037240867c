use axum::extract::Form;
use axum::extract::Path;
use axum::extract::State;
use axum::extract::rejection::FormRejection;
use axum::response::IntoResponse;
use axum::response::Redirect;
use axum::response::Response;
use maud::Markup;
use maud::html;
use tracing::warn;

use super::delete_url;
use super::new_feedback_url;
use super::profile_url;
use crate::appstate::AppState;
use crate::appstate::Profile;
use crate::auth::guard::require_self;
use crate::auth::session::CsrfTokens;
use crate::auth::session::SessionSnapshot;
use crate::auth::session::SessionUpdate;
use crate::feedback;
use crate::forms::DeleteForm;
use crate::known_errors::AppResult;
use crate::theme::BUTTON_CLASS;
use crate::theme::DANGER_BUTTON_CLASS;
use crate::theme::LINK_CLASS;
use crate::theme::csrf_field;
use crate::theme::layout;

fn profile_page(snapshot: &SessionSnapshot, token: &str, profile: &Profile) -> Markup {
    let user = &profile.user;

    layout(
        &user.username,
        snapshot.identity(),
        html! {
            dl class="grid grid-cols-3 gap-2 text-sm/6" {
                dt class="font-medium text-gray-500 dark:text-gray-400" { "Name" }
                dd class="col-span-2" { (user.full_name()) }
                dt class="font-medium text-gray-500 dark:text-gray-400" { "Email" }
                dd class="col-span-2" { (user.email) }
            }

            h3 class="text-lg font-semibold" { "Feedback" }

            @if profile.feedback.is_empty() {
                p class="text-sm text-gray-500 dark:text-gray-400" { "No feedback yet." }
            }

            ul class="space-y-4" {
                @for item in &profile.feedback {
                    li class="rounded-md border border-gray-200 dark:border-gray-700 p-4" {
                        h4 class="font-semibold" { (item.title) }
                        p class="mt-1 text-sm whitespace-pre-line" { (item.content) }
                        div class="mt-3 flex items-center gap-4" {
                            a href=(feedback::update_url(item.id)) class=(LINK_CLASS) { "Edit" }
                            form action=(feedback::delete_url(item.id)) method="post" {
                                (csrf_field(token))
                                button type="submit" class=(DANGER_BUTTON_CLASS) { "Delete" }
                            }
                        }
                    }
                }
            }

            a href=(new_feedback_url(&user.username)) class=(BUTTON_CLASS) { "Add feedback" }

            form action=(delete_url(&user.username)) method="post" class="border-t border-gray-200 dark:border-gray-700 pt-6" {
                (csrf_field(token))
                button type="submit" class=(DANGER_BUTTON_CLASS) { "Delete account" }
            }
        },
    )
}

pub async fn show_user(
    State(state): State<AppState>,
    snapshot: SessionSnapshot,
    tokens: CsrfTokens,
    Path(username): Path<String>,
) -> AppResult<Markup> {
    let profile = state.user_profile(snapshot.identity(), &username).await?;
    let token = tokens.issue().await?;
    Ok(profile_page(&snapshot, &token, &profile))
}

/// Deletes the account and everything it owns, then logs out.
///
/// The body is only read once the guard has passed.
pub async fn delete_user(
    State(state): State<AppState>,
    snapshot: SessionSnapshot,
    Path(username): Path<String>,
    form: Result<Form<DeleteForm>, FormRejection>,
) -> AppResult<Response> {
    require_self(snapshot.identity(), &username)
        .or_unauthorized()
        .inspect_err(|_| warn!("denied account deletion of {}", username))?;

    let Form(form) = form?;
    if !snapshot.csrf_valid(&form.csrf_token) {
        warn!("ignored account deletion with a stale form for {}", username);
        return Ok(Redirect::to(&profile_url(&username)).into_response());
    }

    state.user_delete(snapshot.identity(), &username).await?;

    Ok((SessionUpdate::Clear, Redirect::to("/login")).into_response())
}
