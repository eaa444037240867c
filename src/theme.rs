use crate::users::profile_url;
use maud::DOCTYPE;
use maud::Markup;
use maud::html;

const INPUT_CLASS: &str = "block w-full rounded-md bg-white px-3 py-1.5 text-base text-gray-900 outline-1 -outline-offset-1 outline-gray-300 placeholder:text-gray-400 focus:outline-2 focus:-outline-offset-2 focus:outline-indigo-600 sm:text-sm/6 dark:bg-white/5 dark:text-white dark:outline-white/10";

pub const BUTTON_CLASS: &str = "flex w-full justify-center rounded-md bg-indigo-600 px-3 py-1.5 text-sm/6 font-semibold text-white shadow-xs hover:bg-indigo-500 focus-visible:outline-2 focus-visible:outline-offset-2 focus-visible:outline-indigo-600";

pub const DANGER_BUTTON_CLASS: &str = "rounded-md bg-red-600 px-3 py-1.5 text-sm/6 font-semibold text-white shadow-xs hover:bg-red-500";

pub const LINK_CLASS: &str =
    "font-semibold text-indigo-600 hover:text-indigo-500 dark:text-indigo-400";

pub fn theme(title: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" class="h-full bg-white dark:bg-gray-900 text-gray-900 dark:text-white" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                script src="https://cdn.jsdelivr.net/npm/@tailwindcss/browser@4" {}
                title { (title) " - Feedback" }
            }
            body {
                (content)
            }
        }
    }
}

/// Page shell with the navigation bar. `identity` is the logged-in user, if any.
pub fn layout(title: &str, identity: Option<&str>, content: Markup) -> Markup {
    theme(
        title,
        html! {
            div class="min-h-full" {
                nav class="bg-white dark:bg-gray-800 border-b border-gray-200 dark:border-gray-700" {
                    div class="max-w-7xl mx-auto px-4 sm:px-6 lg:px-8" {
                        div class="flex justify-between h-16" {
                            div class="flex items-center" {
                                span class="text-xl font-bold text-gray-900 dark:text-white" {
                                    "Feedback"
                                }
                            }
                            div class="flex items-center gap-4" {
                                @if let Some(username) = identity {
                                    a href=(profile_url(username)) class="text-sm text-gray-700 dark:text-gray-300" {
                                        (username)
                                    }
                                    a href="/logout" class="text-xs text-gray-500 hover:text-gray-700 dark:text-gray-400 px-2 py-1" {
                                        "Log out"
                                    }
                                } @else {
                                    a href="/login" class="text-xs text-gray-500 hover:text-gray-700 px-2 py-1" {
                                        "Log in"
                                    }
                                    a href="/register" class="text-xs text-gray-500 hover:text-gray-700 px-2 py-1" {
                                        "Register"
                                    }
                                }
                            }
                        }
                    }
                }

                div class="flex-1 p-6" {
                    div class="max-w-7xl mx-auto" {
                        div class="flex flex-col gap-6 sm:mx-auto sm:w-full sm:max-w-sm" {
                            h2 class="text-center text-2xl/9 font-bold tracking-tight" {
                                (title)
                            }
                            (content)
                        }
                    }
                }
            }
        },
    )
}

pub fn csrf_field(token: &str) -> Markup {
    html! {
        input type="hidden" name="csrf_token" value=(token);
    }
}

pub fn field_errors(errors: &[String]) -> Markup {
    html! {
        @for error in errors {
            p class="mt-1 text-sm/6 text-red-500" { (error) }
        }
    }
}

pub fn input_field(
    name: &str,
    label: &str,
    input_type: &str,
    value: &str,
    errors: &[String],
) -> Markup {
    html! {
        div {
            label for=(name) class="block text-sm/6 font-medium text-gray-900 dark:text-gray-100" {
                (label)
            }
            div class="mt-2" {
                input id=(name) name=(name) type=(input_type) value=(value) required class=(INPUT_CLASS);
            }
            (field_errors(errors))
        }
    }
}

pub fn textarea_field(name: &str, label: &str, value: &str, errors: &[String]) -> Markup {
    html! {
        div {
            label for=(name) class="block text-sm/6 font-medium text-gray-900 dark:text-gray-100" {
                (label)
            }
            div class="mt-2" {
                textarea id=(name) name=(name) rows="5" required class=(INPUT_CLASS) { (value) }
            }
            (field_errors(errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_titles_the_page() {
        let page = theme("Log in", html! { p { "body" } }).into_string();

        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains("<title>Log in - Feedback</title>"));
        assert!(page.contains("@tailwindcss/browser@4"));
        assert!(page.contains("<p>body</p>"));
    }

    #[test]
    fn test_layout_shows_identity() {
        let anonymous = layout("Register", None, html! {}).into_string();
        assert!(!anonymous.contains("Log out"));

        let alice = layout("Profile", Some("alice"), html! {}).into_string();
        assert!(alice.contains("href=\"/users/alice\""));
        assert!(alice.contains("Log out"));
    }
}
