//! FocusFlow - A study-session tracker server with a Pomodoro timer
//! 
//! This is the main entry point for the focusflow application.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use focusflow::{api::create_router, config::Config, state::AppState, utils::shutdown_signal};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("focusflow={},tower_http=info", config.log_level()))
        .init();

    info!("Starting focusflow server v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: host={}, port={}, tick={}ms",
          config.host, config.port, config.tick_ms);

    // Create application state
    let state = Arc::new(AppState::new(
        config.port,
        config.host.clone(),
        config.tick_period(),
        config.event_buffer,
    ));

    // Create HTTP router with all endpoints
    let app = create_router(Arc::clone(&state));

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST   /auth/register - Create an account");
    info!("  POST   /auth/login    - Sign in");
    info!("  POST   /auth/logout   - Sign out");
    info!("  GET    /auth/me       - Current profile");
    info!("  GET    /sessions      - List study sessions");
    info!("  POST   /sessions      - Record a session and start its timer");
    info!("  GET    /stats         - Today and weekly totals");
    info!("  GET    /timer         - Timer status");
    info!("  POST   /timer         - Start a timer");
    info!("  POST   /timer/toggle  - Start or pause the timer");
    info!("  POST   /timer/skip    - Skip to the next phase");
    info!("  DELETE /timer         - Dispose the timer");
    info!("  GET    /timer/events  - Timer event stream (SSE)");
    info!("  GET    /health        - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    state.dispose_all_timers();
    info!("Server shutdown complete");
    Ok(())
}
