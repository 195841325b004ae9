use std::sync::Arc;

use axum::Router;
use choreboard::auth::routes::{AuthRouteState, auth_routes};
use choreboard::auth::session::{self, SessionStore};
use choreboard::chores::rewards::RewardLedger;
use choreboard::chores::routes::{ChoreRouteState, chore_routes};
use choreboard::config::{ChoreboardConfig, DataMode};
use choreboard::store::{Database, LibSqlBackend};
use secrecy::ExposeSecret;
use tower_http::cors::CorsLayer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new("choreboard=debug,tower_http=debug")
                }),
        )
        .with_target(false)
        .init();

    let config = Arc::new(match ChoreboardConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    });

    eprintln!("🧹 Choreboard v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   API: http://0.0.0.0:{}/api", config.port);
    eprintln!(
        "   Children: {}",
        config
            .children
            .iter()
            .map(|c| c.display_name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    if config.password.is_none() {
        eprintln!("   Warning: CHOREBOARD_PASSWORD not set, login will fail");
    }
    if config.parent_pin.is_none() {
        eprintln!("   Warning: CHOREBOARD_PARENT_PIN not set, the editor stays locked");
    }

    // ── Database ─────────────────────────────────────────────────────────
    let db: Arc<dyn Database> = match config.data_mode {
        DataMode::Remote => {
            let url = config.db_url.clone().unwrap_or_default();
            let token = config
                .db_token
                .as_ref()
                .map(|t| t.expose_secret().to_string())
                .unwrap_or_default();
            eprintln!("   Database: {} (remote)", url);
            Arc::new(
                LibSqlBackend::new_remote(&url, &token)
                    .await
                    .unwrap_or_else(|e| {
                        eprintln!("Error: Failed to connect to {}: {}", url, e);
                        std::process::exit(1);
                    }),
            )
        }
        DataMode::Local => {
            eprintln!("   Database: {} (local)", config.db_path);
            Arc::new(
                LibSqlBackend::new_local(std::path::Path::new(&config.db_path))
                    .await
                    .unwrap_or_else(|e| {
                        eprintln!(
                            "Error: Failed to open database at {}: {}",
                            config.db_path, e
                        );
                        std::process::exit(1);
                    }),
            )
        }
        DataMode::Memory => {
            eprintln!("   Database: in-memory (data is lost on restart)");
            Arc::new(LibSqlBackend::new_memory().await.unwrap_or_else(|e| {
                eprintln!("Error: Failed to open in-memory database: {}", e);
                std::process::exit(1);
            }))
        }
    };
    db.run_migrations().await?;

    // ── Shared state ─────────────────────────────────────────────────────
    let sessions = SessionStore::new();
    let rewards = RewardLedger::new();

    // Sweep task prunes idle sessions and stale rewards (runs every 60s)
    let _sweep_handle = session::spawn_sweep_task(sessions.clone(), rewards.clone());

    let auth_state = AuthRouteState {
        sessions: sessions.clone(),
        config: config.clone(),
    };
    let chore_state = ChoreRouteState {
        db,
        sessions,
        rewards,
        toggle_lock: Arc::new(tokio::sync::Mutex::new(())),
        config: config.clone(),
    };

    // ── HTTP server ──────────────────────────────────────────────────────
    let app = Router::new()
        .merge(auth_routes(auth_state))
        .merge(chore_routes(chore_state))
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    tracing::info!(port = config.port, "Choreboard server started");
    axum::serve(listener, app).await?;

    Ok(())
}
