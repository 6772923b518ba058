use crate::components::session::{GoogleProviderFactory, SessionStore};
use crate::config::Config;
use crate::error::Error;
use crate::shutdown;
use crate::web::{self, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Initialize logging with environment-based configuration
pub fn init_logging() -> miette::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Other(format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load and initialize the application config
pub fn load_config() -> miette::Result<Arc<Config>> {
    match Config::load() {
        Ok(config) => {
            info!(
                "Using calendar {} in timezone {}",
                config.google_calendar_id, config.timezone
            );
            Ok(Arc::new(config))
        }
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            Err(e.into())
        }
    }
}

/// Build the router state with Google-backed sessions
pub fn build_state(config: Arc<Config>) -> AppState {
    let factory = Arc::new(GoogleProviderFactory::new(Arc::clone(&config)));
    let sessions = Arc::new(SessionStore::new(Arc::clone(&config), factory));
    AppState::new(config, sessions)
}

/// Start the web server and run until a shutdown signal arrives
pub async fn start_server(config: Arc<Config>) -> miette::Result<()> {
    // Set locale from config
    rust_i18n::set_locale(&config.locale);
    info!("Setting locale to {}", config.locale);

    let state = build_state(Arc::clone(&config));
    let sessions = Arc::clone(&state.sessions);
    sessions.spawn_eviction();
    let app = web::router(state);

    // Bind to address and run server
    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(Error::from)?;
    info!("Listening on {}", addr);

    if config.open_browser {
        let url = format!("http://{}", addr);
        if let Err(e) = webbrowser::open(&url) {
            warn!("Failed to open browser at {}: {}", url, e);
        }
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown::handle_signals(sessions))
        .await
        .map_err(Error::from)?;

    info!("Server stopped");
    Ok(())
}
