use axum::extract::Form;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::response::Redirect;
use axum::response::Response;
use maud::Markup;
use maud::html;

use super::session::CsrfTokens;
use super::session::SessionSnapshot;
use super::session::SessionUpdate;
use crate::appstate::AppState;
use crate::forms::FORM;
use crate::forms::FormErrors;
use crate::forms::RegisterForm;
use crate::known_errors::AppResult;
use crate::known_errors::KnownErrors;
use crate::theme::BUTTON_CLASS;
use crate::theme::LINK_CLASS;
use crate::theme::csrf_field;
use crate::theme::field_errors;
use crate::theme::input_field;
use crate::theme::layout;
use crate::users::profile_url;

fn register_page(token: &str, form: &RegisterForm, errors: &FormErrors) -> Markup {
    layout(
        "Register",
        None,
        html! {
            form class="space-y-6" action="/register" method="post" {
                (csrf_field(token))
                (field_errors(errors.field(FORM)))
                (input_field("username", "Username", "text", &form.username, errors.field("username")))
                // the password is never echoed back
                (input_field("password", "Password", "password", "", errors.field("password")))
                (input_field("email", "Email", "email", &form.email, errors.field("email")))
                (input_field("first_name", "First name", "text", &form.first_name, errors.field("first_name")))
                (input_field("last_name", "Last name", "text", &form.last_name, errors.field("last_name")))
                button type="submit" class=(BUTTON_CLASS) { "Register" }
            }

            p class="text-center text-sm/6 text-gray-500 dark:text-gray-400" {
                "Already registered? "
                a href="/login" class=(LINK_CLASS) { "Log in" }
            }
        },
    )
}

pub async fn register_get(snapshot: SessionSnapshot, tokens: CsrfTokens) -> AppResult<Response> {
    if let Some(username) = snapshot.identity() {
        return Ok(Redirect::to(&profile_url(username)).into_response());
    }

    let token = tokens.issue().await?;
    Ok(register_page(&token, &RegisterForm::default(), &FormErrors::default()).into_response())
}

pub async fn register_post(
    State(state): State<AppState>,
    snapshot: SessionSnapshot,
    tokens: CsrfTokens,
    Form(form): Form<RegisterForm>,
) -> AppResult<Response> {
    if let Some(username) = snapshot.identity() {
        return Ok(Redirect::to(&profile_url(username)).into_response());
    }

    let registration = match snapshot.accept(&form.csrf_token, form.validate()) {
        Ok(registration) => registration,
        Err(errors) => {
            let token = tokens.issue().await?;
            return Ok(register_page(&token, &form, &errors).into_response());
        }
    };

    let user = match state.register(registration).await {
        Ok(user) => user,
        Err(KnownErrors::Conflict(errors)) => {
            let token = tokens.issue().await?;
            return Ok(register_page(&token, &form, &errors).into_response());
        }
        Err(e) => return Err(e),
    };

    let profile = profile_url(&user.username);
    Ok((SessionUpdate::Set(user.username), Redirect::to(&profile)).into_response())
}
