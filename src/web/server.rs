//! Web server for vpspanel.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::Mutex;

use crate::auth::SessionManager;
use crate::config::Config;
use crate::{Database, PanelError, Result};

use super::handlers::AppState;
use super::router::{create_health_router, create_router};

/// Session cleanup interval: 10 minutes.
const CLEANUP_INTERVAL_SECS: u64 = 600;

/// The HTTP front end.
pub struct WebServer {
    addr: SocketAddr,
    app_state: Arc<AppState>,
}

impl WebServer {
    /// Create a new web server.
    pub fn new(config: &Config, db: Database) -> Result<Self> {
        let addr = format!("{}:{}", config.server.host, config.server.port)
            .parse::<SocketAddr>()
            .map_err(|e| {
                PanelError::Config(format!(
                    "invalid server address {}:{}: {e}",
                    config.server.host, config.server.port
                ))
            })?;

        let app_state = AppState::new(db, config.session.clone())?;
        Ok(Self::with_state(addr, app_state))
    }

    /// Create a server around prepared state.
    pub fn with_state(addr: SocketAddr, app_state: AppState) -> Self {
        Self {
            addr,
            app_state: Arc::new(app_state),
        }
    }

    /// Get the configured address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Periodically drop expired sessions and stale lockouts.
    fn start_session_cleanup_task(sessions: Arc<Mutex<SessionManager>>) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(CLEANUP_INTERVAL_SECS));

            // Skip the first immediate tick
            interval.tick().await;

            loop {
                interval.tick().await;

                let removed = sessions.lock().await.cleanup();
                if removed > 0 {
                    tracing::info!(removed_count = removed, "Cleaned up expired sessions");
                } else {
                    tracing::debug!("No expired sessions to clean up");
                }
            }
        });
    }

    async fn bind(self) -> std::io::Result<(TcpListener, axum::Router, SocketAddr)> {
        let sessions = self.app_state.sessions.clone();
        let router = create_router(self.app_state).merge(create_health_router());

        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;

        // Start after a successful bind
        Self::start_session_cleanup_task(sessions);
        tracing::info!("Web server listening on http://{}", local_addr);

        Ok((listener, router, local_addr))
    }

    /// Run the web server until it fails.
    pub async fn run(self) -> std::io::Result<()> {
        let (listener, router, _) = self.bind().await?;
        axum::serve(listener, router).await
    }

    /// Run the server in the background and return the bound address.
    ///
    /// Binding to port 0 picks a free port, which tests rely on.
    pub async fn run_with_addr(self) -> std::io::Result<SocketAddr> {
        let (listener, router, local_addr) = self.bind().await?;

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    fn create_test_config() -> Config {
        let mut config = Config::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 0; // Use random port
        config
    }

    #[tokio::test]
    async fn test_web_server_new() {
        let config = create_test_config();
        let db = Database::open_in_memory().await.unwrap();

        let server = WebServer::new(&config, db).unwrap();
        assert_eq!(server.addr().ip().to_string(), "127.0.0.1");
    }

    #[tokio::test]
    async fn test_invalid_address_is_config_error() {
        let mut config = create_test_config();
        config.server.host = "not an address".to_string();
        let db = Database::open_in_memory().await.unwrap();

        let result = WebServer::new(&config, db);
        assert!(matches!(result, Err(PanelError::Config(_))));
    }

    #[tokio::test]
    async fn test_web_server_run() {
        let config = create_test_config();
        let db = Database::open_in_memory().await.unwrap();

        let server = WebServer::new(&config, db).unwrap();
        let addr = server.run_with_addr().await.unwrap();

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();

        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.ends_with("OK"));
    }
}
