use crate::feedback::Feedback;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;

pub const USERNAME_MAX: usize = 20;
pub const EMAIL_MAX: usize = 50;
pub const NAME_MAX: usize = 30;
pub const TITLE_MAX: usize = 100;
pub const CONTENT_MAX: usize = 1000;

/// Field name used for errors that belong to the whole form.
pub const FORM: &str = "form";

/// Validation messages keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors(BTreeMap<&'static str, Vec<String>>);

impl FormErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn with(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.add(field, message);
        errors
    }

    pub fn field(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn merge(&mut self, other: FormErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    fn finish<T>(self, value: T) -> Result<T, FormErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{}: {}", field, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

fn required(errors: &mut FormErrors, field: &'static str, value: &str, max: usize) -> String {
    let value = value.trim();
    if value.is_empty() {
        errors.add(field, "This field is required.");
    } else if value.chars().count() > max {
        errors.add(field, format!("Field cannot be longer than {} characters.", max));
    }
    value.to_string()
}

fn looks_like_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !email.contains(char::is_whitespace)
        && !domain.contains('@')
        && domain.contains('.')
        && domain.split('.').all(|part| !part.is_empty())
}

fn valid_username(username: &str) -> bool {
    username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

/// Validated registration data.
#[derive(Clone)]
pub struct Registration {
    pub username: String,
    pub password: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub csrf_token: String,
}

impl RegisterForm {
    pub fn validate(&self) -> Result<Registration, FormErrors> {
        let mut errors = FormErrors::default();

        let username = required(&mut errors, "username", &self.username, USERNAME_MAX);
        if !username.is_empty() && !valid_username(&username) {
            errors.add(
                "username",
                "Username may only contain letters, digits, '.', '_' and '-'.",
            );
        }

        if self.password.is_empty() {
            errors.add("password", "This field is required.");
        }

        let email = required(&mut errors, "email", &self.email, EMAIL_MAX);
        if !email.is_empty() && !looks_like_email(&email) {
            errors.add("email", "Invalid email address.");
        }

        let first_name = required(&mut errors, "first_name", &self.first_name, NAME_MAX);
        let last_name = required(&mut errors, "last_name", &self.last_name, NAME_MAX);

        errors.finish(Registration {
            username,
            password: self.password.clone(),
            email,
            first_name,
            last_name,
        })
    }
}

#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub csrf_token: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<Credentials, FormErrors> {
        let mut errors = FormErrors::default();

        let username = required(&mut errors, "username", &self.username, USERNAME_MAX);
        if self.password.is_empty() {
            errors.add("password", "This field is required.");
        }

        errors.finish(Credentials {
            username,
            password: self.password.clone(),
        })
    }
}

/// Title and content of a feedback note, as shown in the new/edit forms.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedbackFields {
    pub title: String,
    pub content: String,
}

impl From<&Feedback> for FeedbackFields {
    fn from(feedback: &Feedback) -> Self {
        Self {
            title: feedback.title.clone(),
            content: feedback.content.clone(),
        }
    }
}

#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct FeedbackForm {
    pub title: String,
    pub content: String,
    pub csrf_token: String,
}

impl FeedbackForm {
    pub fn validate(&self) -> Result<FeedbackFields, FormErrors> {
        let mut errors = FormErrors::default();

        let title = required(&mut errors, "title", &self.title, TITLE_MAX);
        let content = required(&mut errors, "content", &self.content, CONTENT_MAX);

        errors.finish(FeedbackFields { title, content })
    }

    pub fn fields(&self) -> FeedbackFields {
        FeedbackFields {
            title: self.title.clone(),
            content: self.content.clone(),
        }
    }
}

/// A form carrying nothing but the anti-forgery token.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct DeleteForm {
    pub csrf_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register_form() -> RegisterForm {
        RegisterForm {
            username: "alice".to_string(),
            password: "pw1".to_string(),
            email: "a@x.com".to_string(),
            first_name: "A".to_string(),
            last_name: "L".to_string(),
            csrf_token: String::new(),
        }
    }

    #[test]
    fn test_valid_registration_is_trimmed() {
        let mut form = register_form();
        form.username = "  alice ".to_string();
        form.email = " a@x.com".to_string();

        let registration = form.validate().expect("form should be valid");
        assert_eq!(registration.username, "alice");
        assert_eq!(registration.email, "a@x.com");
        assert_eq!(registration.password, "pw1");
    }

    #[test]
    fn test_registration_requires_every_field() {
        let errors = match RegisterForm::default().validate() {
            Err(errors) => errors,
            Ok(_) => panic!("empty form should be rejected"),
        };

        for field in ["username", "password", "email", "first_name", "last_name"] {
            assert_eq!(errors.field(field), ["This field is required."], "{}", field);
        }
    }

    #[test]
    fn test_registration_length_bounds() {
        let mut form = register_form();
        form.username = "a".repeat(USERNAME_MAX + 1);
        form.first_name = "b".repeat(NAME_MAX);

        let errors = match form.validate() {
            Err(errors) => errors,
            Ok(_) => panic!("long username should be rejected"),
        };
        assert_eq!(errors.field("username").len(), 1);
        assert!(errors.field("first_name").is_empty());
    }

    #[test]
    fn test_registration_rejects_bad_email_and_username() {
        let mut form = register_form();
        form.email = "not-an-email".to_string();
        form.username = "al/ice".to_string();

        let errors = match form.validate() {
            Err(errors) => errors,
            Ok(_) => panic!("form should be rejected"),
        };
        assert_eq!(errors.field("email"), ["Invalid email address."]);
        assert_eq!(errors.field("username").len(), 1);
    }

    #[test]
    fn test_email_shapes() {
        assert!(looks_like_email("a@x.com"));
        assert!(looks_like_email("first.last@mail.example.org"));
        assert!(!looks_like_email("@x.com"));
        assert!(!looks_like_email("a@x"));
        assert!(!looks_like_email("a@x..com"));
        assert!(!looks_like_email("a@b@x.com"));
        assert!(!looks_like_email("a b@x.com"));
    }

    #[test]
    fn test_feedback_form_bounds() {
        let form = FeedbackForm {
            title: "t".repeat(TITLE_MAX + 1),
            content: "   ".to_string(),
            csrf_token: String::new(),
        };

        let errors = match form.validate() {
            Err(errors) => errors,
            Ok(_) => panic!("form should be rejected"),
        };
        assert_eq!(errors.field("title").len(), 1);
        assert_eq!(errors.field("content"), ["This field is required."]);
    }

    #[test]
    fn test_feedback_fields_from_entity() {
        let feedback = Feedback {
            id: 7,
            title: "hi".to_string(),
            content: "there".to_string(),
            username: "alice".to_string(),
        };

        assert_eq!(
            FeedbackFields::from(&feedback),
            FeedbackFields {
                title: "hi".to_string(),
                content: "there".to_string(),
            }
        );
    }

    #[test]
    fn test_merge_and_display() {
        let mut errors = FormErrors::with("username", "taken");
        errors.merge(FormErrors::with("email", "taken too"));

        assert_eq!(errors.to_string(), "email: taken too; username: taken");
    }
}
