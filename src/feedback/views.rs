use axum::extract::Form;
use axum::extract::FromRequestParts;
use axum::extract::Path;
use axum::extract::State;
use axum::extract::rejection::FormRejection;
use axum::http::request::Parts;
use axum::response::IntoResponse;
use axum::response::Redirect;
use axum::response::Response;
use maud::Markup;
use maud::html;
use tracing::warn;

use super::FeedbackId;
use super::update_url;
use crate::appstate::AppState;
use crate::auth::guard::require_self;
use crate::auth::session::CsrfTokens;
use crate::auth::session::SessionSnapshot;
use crate::forms::DeleteForm;
use crate::forms::FORM;
use crate::forms::FeedbackFields;
use crate::forms::FeedbackForm;
use crate::forms::FormErrors;
use crate::known_errors::AppResult;
use crate::known_errors::KnownErrors;
use crate::theme::BUTTON_CLASS;
use crate::theme::LINK_CLASS;
use crate::theme::csrf_field;
use crate::theme::field_errors;
use crate::theme::input_field;
use crate::theme::layout;
use crate::theme::textarea_field;
use crate::users::new_feedback_url;
use crate::users::profile_url;

/// The `{id}` segment of a feedback route. Anything that is not an id
/// cannot name a row, so it is `NotFound` rather than a bad request.
pub struct FeedbackPath(pub FeedbackId);

impl<S> FromRequestParts<S> for FeedbackPath
where
    S: Send + Sync,
{
    type Rejection = KnownErrors;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<FeedbackId>::from_request_parts(parts, state)
            .await
            .map_err(|_| KnownErrors::NotFound { what: "Feedback" })?;
        Ok(Self(id))
    }
}

/// Shared by the new and edit pages; `action` is where the form posts.
fn feedback_page(
    title: &str,
    action: &str,
    owner: &str,
    token: &str,
    fields: &FeedbackFields,
    errors: &FormErrors,
) -> Markup {
    layout(
        title,
        Some(owner),
        html! {
            form class="space-y-6" action=(action) method="post" {
                (csrf_field(token))
                (field_errors(errors.field(FORM)))
                (input_field("title", "Title", "text", &fields.title, errors.field("title")))
                (textarea_field("content", "Content", &fields.content, errors.field("content")))
                button type="submit" class=(BUTTON_CLASS) { "Save" }
            }

            a href=(profile_url(owner)) class=(LINK_CLASS) { "Back to profile" }
        },
    )
}

pub async fn new_feedback_get(
    snapshot: SessionSnapshot,
    tokens: CsrfTokens,
    Path(username): Path<String>,
) -> AppResult<Markup> {
    require_self(snapshot.identity(), &username).or_unauthorized()?;

    let token = tokens.issue().await?;
    Ok(feedback_page(
        "Add feedback",
        &new_feedback_url(&username),
        &username,
        &token,
        &FeedbackFields::default(),
        &FormErrors::default(),
    ))
}

pub async fn new_feedback_post(
    State(state): State<AppState>,
    snapshot: SessionSnapshot,
    tokens: CsrfTokens,
    Path(username): Path<String>,
    form: Result<Form<FeedbackForm>, FormRejection>,
) -> AppResult<Response> {
    require_self(snapshot.identity(), &username).or_unauthorized()?;

    let Form(form) = form?;
    let fields = match snapshot.accept(&form.csrf_token, form.validate()) {
        Ok(fields) => fields,
        Err(errors) => {
            let token = tokens.issue().await?;
            let page = feedback_page(
                "Add feedback",
                &new_feedback_url(&username),
                &username,
                &token,
                &form.fields(),
                &errors,
            );
            return Ok(page.into_response());
        }
    };

    state
        .feedback_create(snapshot.identity(), &username, fields)
        .await?;

    Ok(Redirect::to(&profile_url(&username)).into_response())
}

pub async fn update_feedback_get(
    State(state): State<AppState>,
    snapshot: SessionSnapshot,
    tokens: CsrfTokens,
    FeedbackPath(id): FeedbackPath,
) -> AppResult<Markup> {
    let feedback = state.feedback_get_owned(snapshot.identity(), id).await?;

    let token = tokens.issue().await?;
    Ok(feedback_page(
        "Edit feedback",
        &update_url(id),
        &feedback.username,
        &token,
        &FeedbackFields::from(&feedback),
        &FormErrors::default(),
    ))
}

pub async fn update_feedback_post(
    State(state): State<AppState>,
    snapshot: SessionSnapshot,
    tokens: CsrfTokens,
    FeedbackPath(id): FeedbackPath,
    form: Result<Form<FeedbackForm>, FormRejection>,
) -> AppResult<Response> {
    let feedback = state.feedback_get_owned(snapshot.identity(), id).await?;

    let Form(form) = form?;
    let fields = match snapshot.accept(&form.csrf_token, form.validate()) {
        Ok(fields) => fields,
        Err(errors) => {
            let token = tokens.issue().await?;
            let page = feedback_page(
                "Edit feedback",
                &update_url(id),
                &feedback.username,
                &token,
                &form.fields(),
                &errors,
            );
            return Ok(page.into_response());
        }
    };

    let updated = state
        .feedback_update(snapshot.identity(), id, fields)
        .await?;

    Ok(Redirect::to(&profile_url(&updated.username)).into_response())
}

/// A stale anti-forgery token leaves the row alone but still redirects.
pub async fn delete_feedback(
    State(state): State<AppState>,
    snapshot: SessionSnapshot,
    FeedbackPath(id): FeedbackPath,
    form: Result<Form<DeleteForm>, FormRejection>,
) -> AppResult<Response> {
    let feedback = state.feedback_get_owned(snapshot.identity(), id).await?;

    let Form(form) = form?;
    if snapshot.csrf_valid(&form.csrf_token) {
        state.feedback_delete(snapshot.identity(), id).await?;
    } else {
        warn!("ignored deletion of feedback {} with a stale form", id);
    }

    Ok(Redirect::to(&profile_url(&feedback.username)).into_response())
}
