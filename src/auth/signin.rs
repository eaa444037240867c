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
use crate::forms::LoginForm;
use crate::known_errors::AppResult;
use crate::known_errors::KnownErrors;
use crate::theme::BUTTON_CLASS;
use crate::theme::LINK_CLASS;
use crate::theme::csrf_field;
use crate::theme::field_errors;
use crate::theme::input_field;
use crate::theme::layout;
use crate::users::profile_url;

fn login_page(token: &str, form: &LoginForm, errors: &FormErrors) -> Markup {
    layout(
        "Log in",
        None,
        html! {
            form class="space-y-6" action="/login" method="post" {
                (csrf_field(token))
                (field_errors(errors.field(FORM)))
                (input_field("username", "Username", "text", &form.username, errors.field("username")))
                (input_field("password", "Password", "password", "", errors.field("password")))
                button type="submit" class=(BUTTON_CLASS) { "Log in" }
            }

            p class="text-center text-sm/6 text-gray-500 dark:text-gray-400" {
                "No account yet? "
                a href="/register" class=(LINK_CLASS) { "Register" }
            }
        },
    )
}

pub async fn login_get(snapshot: SessionSnapshot, tokens: CsrfTokens) -> AppResult<Response> {
    if let Some(username) = snapshot.identity() {
        return Ok(Redirect::to(&profile_url(username)).into_response());
    }

    let token = tokens.issue().await?;
    Ok(login_page(&token, &LoginForm::default(), &FormErrors::default()).into_response())
}

pub async fn login_post(
    State(state): State<AppState>,
    snapshot: SessionSnapshot,
    tokens: CsrfTokens,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    if let Some(username) = snapshot.identity() {
        return Ok(Redirect::to(&profile_url(username)).into_response());
    }

    let credentials = match snapshot.accept(&form.csrf_token, form.validate()) {
        Ok(credentials) => credentials,
        Err(errors) => {
            let token = tokens.issue().await?;
            return Ok(login_page(&token, &form, &errors).into_response());
        }
    };

    let user = match state.login(credentials).await {
        Ok(user) => user,
        Err(e @ KnownErrors::InvalidCredentials) => {
            let errors = FormErrors::with("username", e.to_string());
            let token = tokens.issue().await?;
            return Ok(login_page(&token, &form, &errors).into_response());
        }
        Err(e) => return Err(e),
    };

    let profile = profile_url(&user.username);
    Ok((SessionUpdate::Set(user.username), Redirect::to(&profile)).into_response())
}
