pub mod views;

use sqlx::prelude::FromRow;

pub type FeedbackId = i64;

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Feedback {
    pub id: FeedbackId,
    pub title: String,
    pub content: String,
    /// owner
    pub username: String,
}

#[derive(Debug, Clone)]
pub struct NewFeedback {
    pub title: String,
    pub content: String,
    pub username: String,
}

pub fn update_url(id: FeedbackId) -> String {
    format!("/feedback/{}/update", id)
}

pub fn delete_url(id: FeedbackId) -> String {
    format!("/feedback/{}/delete", id)
}
