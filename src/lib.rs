pub mod app;
pub mod appstate;
pub mod auth;
pub mod config;
pub mod feedback;
pub mod forms;
pub mod known_errors;
pub mod notfoundpage;
pub mod store;
pub mod theme;
pub mod users;
