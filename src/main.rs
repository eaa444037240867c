use dotenvy::dotenv;
use feedback::app;
use feedback::appstate::AppState;
use feedback::config::Config;
use feedback::store;
use feedback::store::Backend;
use std::time::Duration;
use tower_sessions::ExpiredDeletion;
use tracing::info;
use tracing::warn;
use tracing_subscriber::EnvFilter;

const EXPIRED_SESSION_SWEEP: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() {
    dotenv().ok();

    // RUST_LOG wins when set
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::from_env().expect("Environment misconfigured");

    let backend = store::open(&config)
        .await
        .expect("failed to open the store");

    let state = AppState::new(backend.store(), config.bcrypt_cost)
        .await
        .expect("failed to build the app state");

    let app = match backend {
        Backend::Sqlite(db) => {
            let sessions = db
                .session_store()
                .await
                .expect("failed to create the session table");

            let sweeper = sessions.clone();
            tokio::spawn(async move {
                if let Err(e) = sweeper.continuously_delete_expired(EXPIRED_SESSION_SWEEP).await {
                    warn!("expired session cleanup stopped: {}", e);
                }
            });

            app::router(state, config.session_settings(), sessions)
        }
        Backend::Memory(_) => app::router(
            state,
            config.session_settings(),
            tower_sessions::MemoryStore::default(),
        ),
    };

    info!("listening on http://{}", &config.site_addr);
    let listener = tokio::net::TcpListener::bind(&config.site_addr)
        .await
        .expect("failed to bind the tcp address");
    axum::serve(listener, app.into_make_service())
        .await
        .expect("failed to serve on the address");
}
