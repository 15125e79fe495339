//! HTTP server implementation.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderName;
use axum::Router;
use tokio::net::TcpListener;
use tracing::{error, info};

use super::service;
use crate::error::{GatekeeperError, Result};
use crate::ratelimit::AdmissionController;

/// HTTP server for the admission decision service.
pub struct HttpServer {
    /// Address to bind to
    addr: SocketAddr,
    /// The admission controller instance
    controller: Arc<AdmissionController>,
    /// Header carrying the caller identity on forward-auth requests
    subject_header: HeaderName,
}

impl HttpServer {
    pub fn new(
        addr: SocketAddr,
        controller: Arc<AdmissionController>,
        subject_header: HeaderName,
    ) -> Self {
        Self {
            addr,
            controller,
            subject_header,
        }
    }

    /// Routes served by this server.
    pub fn router(&self) -> Router {
        service::router(Arc::clone(&self.controller), self.subject_header.clone())
    }

    /// Start the HTTP server with graceful shutdown.
    ///
    /// The server will shut down when the provided signal resolves.
    pub async fn serve_with_shutdown<F>(self, signal: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.addr).await?;
        self.serve_on(listener, signal).await
    }

    /// Serve on an already bound listener.
    pub async fn serve_on<F>(self, listener: TcpListener, signal: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        info!(
            addr = %listener.local_addr()?,
            "Starting HTTP admission service"
        );

        axum::serve(listener, self.router())
            .with_graceful_shutdown(signal)
            .await
            .map_err(|e| {
                error!(error = %e, "HTTP server failed");
                GatekeeperError::Server(e.to_string())
            })
    }
}
