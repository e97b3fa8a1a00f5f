//! One-shot webhook callback server
//!
//! Serves the challenge and event endpoints on every path so the public
//! callback URL may carry any path component. A scenario starts the server,
//! lets Dock Health verify the webhook and deliver events, and stops it again.

use axum::{
    middleware as axum_middleware,
    routing::{get, post, MethodRouter},
    Router,
};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tower_http::trace::TraceLayer;

use crate::config::CallbackConfig;
use crate::error::{DockError, DockResult};
use crate::handlers::{challenge_handler, event_handler, CallbackState};
use crate::middleware::{self, SignatureState};

/// Build the callback router
///
/// `GET` answers challenges, `POST` receives signed events; both on `/`
/// and on any sub-path.
pub fn router(state: Arc<CallbackState>) -> Router {
    let methods: MethodRouter<Arc<CallbackState>> = get(challenge_handler).merge(
        post(event_handler).route_layer(axum_middleware::from_fn_with_state(
            state.signer.clone(),
            middleware::verify_signature,
        )),
    );

    Router::new()
        .route("/", methods.clone())
        .route("/*path", methods)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Starts callback servers
pub struct CallbackServer;

impl CallbackServer {
    /// Bind `host:local_port` and serve in the background
    ///
    /// `secrets` are tried in order (current first). Port 0 binds a free port;
    /// use [`CallbackHandle::local_addr`] to find it.
    pub async fn start(config: &CallbackConfig, secrets: Vec<String>) -> DockResult<CallbackHandle> {
        if secrets.iter().all(|s| s.is_empty()) {
            return Err(DockError::MissingValue(
                "Webhook secret is undefined!".to_string(),
            ));
        }

        let signer = SignatureState::with_rotation(secrets, config.max_timestamp_drift_secs);
        if signer.is_rotation_active() {
            tracing::info!("Secret rotation active: accepting current and previous secret");
        }
        let state = Arc::new(CallbackState::new(signer));
        let app = router(state.clone());

        let listener = TcpListener::bind((config.host.as_str(), config.local_port))
            .await
            .map_err(|e| {
                DockError::Server(format!(
                    "Failed to bind {}:{}: {}",
                    config.host, config.local_port, e
                ))
            })?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| DockError::Server(e.to_string()))?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
        });

        tracing::info!(%local_addr, "Callback server listening");

        Ok(CallbackHandle {
            local_addr,
            state,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        })
    }
}

/// A running callback server
///
/// Dropping the handle signals shutdown without waiting for it.
pub struct CallbackHandle {
    local_addr: SocketAddr,
    state: Arc<CallbackState>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<std::io::Result<()>>>,
}

impl CallbackHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Events received so far, in arrival order
    pub fn received_events(&self) -> Vec<Value> {
        self.state.events()
    }

    /// Number of verification challenges answered
    pub fn challenge_count(&self) -> usize {
        self.state.challenge_count()
    }

    /// Wait until at least `count` events have arrived
    ///
    /// Returns the events received, or `Assertion` if `timeout` elapses first.
    pub async fn wait_for_events(&self, count: usize, timeout: Duration) -> DockResult<Vec<Value>> {
        let deadline = Instant::now() + timeout;

        loop {
            // Register before checking so a notification between the check and the await is not lost
            let notified = self.state.notify().notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.state.event_count() >= count {
                return Ok(self.state.events());
            }

            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                let received = self.state.event_count();
                if received >= count {
                    return Ok(self.state.events());
                }
                return Err(DockError::Assertion(format!(
                    "Expected {} events within {:?}, received {}",
                    count, timeout, received
                )));
            }
        }
    }

    /// Stop the server and wait for it to finish; calling again is a no-op
    pub async fn stop(&mut self) -> DockResult<()> {
        if let Some(tx) = self.shutdown.take() {
            tx.send(()).ok();
        }

        if let Some(task) = self.task.take() {
            task.await
                .map_err(|e| DockError::Server(format!("Callback server task failed: {}", e)))?
                .map_err(|e| DockError::Server(format!("Callback server error: {}", e)))?;
            tracing::info!(local_addr = %self.local_addr, "Callback server stopped");
        }

        Ok(())
    }
}

impl Drop for CallbackHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            tx.send(()).ok();
        }
    }
}
