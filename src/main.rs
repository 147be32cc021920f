mod app;
mod auth;
mod comments;
mod config;
mod error;
mod extract;
mod mail;
mod moderation;
mod pagination;
mod posts;
mod state;
#[cfg(test)]
mod testing;
mod users;

use tracing_subscriber::EnvFilter;

use crate::auth::repo::Managers;
use crate::state::AppState;

const DEFAULT_LOG_FILTER: &str = "campuswall=debug,axum=info,tower_http=info";

/// `RUST_LOG` wins over the default filter; `json` switches to one object per line.
fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.with_target(false).json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    init_tracing(std::env::var("LOG_FORMAT").is_ok_and(|v| v == "json"));

    let app_state = AppState::init().await?;

    sqlx::migrate!("./migrations").run(&app_state.db).await?;

    let seeded = Managers::seed(&app_state.db, &app_state.config.manager_emails).await?;
    if seeded > 0 {
        tracing::info!(seeded, "manager emails added");
    }

    app::serve(app::build_app(app_state)).await
}
