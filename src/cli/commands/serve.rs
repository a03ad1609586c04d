use anyhow::Result;
use social::sessions::purge_expired_sessions;
use tokio::net::TcpListener;
use tracing::{debug, error, info, trace, warn};

use crate::config::{Settings, initialize_app_state};
use crate::router::create_router;
use crate::schemas::AppState;

pub async fn serve(settings: &Settings) -> Result<()> {
    trace!("Entering serve function");
    info!("socialnet starting up");
    debug!("Bind address: {}", settings.bind_address);

    trace!("Initializing application state");
    let state = match initialize_app_state(settings).await {
        Ok(state) => {
            debug!("Application state initialized successfully");
            state
        }
        Err(e) => {
            error!("Failed to initialize application state: {}", e);
            return Err(e);
        }
    };

    run_server(state, &settings.bind_address).await
}

/// Bind `bind_address` and serve the application until shutdown.
pub(crate) async fn run_server(state: AppState, bind_address: &str) -> Result<()> {
    match purge_expired_sessions(&state.db).await {
        Ok(purged) => debug!("Purged {} expired sessions", purged),
        Err(e) => warn!("Could not purge expired sessions: {}", e),
    }

    trace!("Creating application router");
    let app = create_router(state);

    info!("Starting server on {}", bind_address);
    let listener = match TcpListener::bind(bind_address).await {
        Ok(listener) => {
            debug!("Successfully bound to address: {}", bind_address);
            listener
        }
        Err(e) => {
            error!("Failed to bind to address {}: {}", bind_address, e);
            return Err(e.into());
        }
    };

    info!("socialnet server running on http://{}", bind_address);
    info!("Swagger UI available at http://{}/swagger-ui", bind_address);

    trace!("Starting axum server");
    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
        return Err(e.into());
    }

    info!("Server shutdown gracefully");
    Ok(())
}
