use crate::known_errors::AppResult;
use tokio::task;

/// Runs on the blocking pool.
pub async fn hash(password: String, cost: u32) -> AppResult<String> {
    Ok(task::spawn_blocking(move || bcrypt::hash(password, cost)).await??)
}

/// A malformed stored hash counts as a mismatch.
pub async fn verify(password: String, hash: String) -> AppResult<bool> {
    Ok(task::spawn_blocking(move || bcrypt::verify(password, &hash).is_ok_and(|f| f)).await?)
}
