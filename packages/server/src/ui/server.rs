//! Server execution logic.

use std::{future::Future, sync::Arc};

use axum::{
    Router, middleware,
    routing::{get, post},
};
use bookcycle_shared::time::Clock;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::{
    admission::{AdmissionController, admit_request, verify_origin},
    config::ServerConfig,
    domain::{CourseCatalog, MessageRepository, SessionStore, UserDirectory},
    hub::HubHandle,
};

use super::{
    handler::{
        http::{
            get_course, health_check, mark_conversation_read, past_messages, unread_messages,
        },
        session::{login, logout},
        websocket::websocket_handler,
    },
    signal::shutdown_signal,
    state::AppState,
};

/// Errors that stop the server from serving.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Bookcycle HTTP / WebSocket server
///
/// # Example
///
/// ```ignore
/// let (hub, hub_task) = Hub::spawn(messages.clone(), clock.clone());
/// let server = Server::new(config, hub, messages, courses, sessions, users, clock);
/// server.run().await?;
/// hub_task.shutdown().await;
/// ```
pub struct Server {
    state: Arc<AppState>,
}

impl Server {
    /// Create a new Server instance
    ///
    /// # Arguments
    ///
    /// * `config` - Runtime configuration
    /// * `hub` - Handle to the running hub
    /// * `messages` - Message history (the same storage the hub persists to)
    /// * `courses` - Course catalog
    /// * `sessions` - Login sessions
    /// * `users` - Accounts checked by `POST /login`
    /// * `clock` - Clock driving the admission windows
    pub fn new(
        config: ServerConfig,
        hub: HubHandle,
        messages: Arc<dyn MessageRepository>,
        courses: Arc<dyn CourseCatalog>,
        sessions: Arc<dyn SessionStore>,
        users: Arc<dyn UserDirectory>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let admission = Arc::new(AdmissionController::new(config.admission(), clock));
        if !admission.is_enabled() {
            tracing::warn!("Load-test mode: admission control and cross-site checks are disabled");
        }

        Self {
            state: Arc::new(AppState {
                hub,
                messages,
                courses,
                sessions,
                users,
                admission,
                config,
            }),
        }
    }

    /// Build the axum router.
    ///
    /// Every CRUD route passes the admission controller first, then the
    /// cross-site check. The upgrade endpoint, logout, the health check and
    /// static assets are not counted.
    pub fn router(&self) -> Router {
        let admission = self.state.admission.clone();
        let origin_guard = self.state.config.origin_guard();

        Router::new()
            // HTTP エンドポイント（アドミッション制御あり）
            .route("/login", post(login))
            .route("/courses/{id}/json", get(get_course))
            .route("/unread_messages", get(unread_messages))
            .route("/past_messages/{id}", get(past_messages))
            .route("/message/{id}/read", post(mark_conversation_read))
            .route_layer(middleware::from_fn_with_state(origin_guard, verify_origin))
            .route_layer(middleware::from_fn_with_state(admission, admit_request))
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            .route("/logout", get(logout))
            .route("/api/health", get(health_check))
            .fallback_service(ServeDir::new(&self.state.config.static_dir))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Bind to the configured address and serve until Ctrl+C / SIGTERM.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the configured address or
    /// if there's an error during server execution.
    pub async fn run(self) -> Result<(), ServerError> {
        let bind_addr = self.state.config.bind_addr();
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("Bookcycle server listening on {}", listener.local_addr()?);
        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}
