//! The front door: HTTP listener serving pages and relaying form posts.

pub mod assets;
mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{info, Level};

pub use assets::{Assets, Page};

use crate::error::{Error, Result};
use crate::relay::Relay;

/// Shared state handed to every request handler.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Where submitted form bodies go.
    pub relay: Arc<dyn Relay>,
    /// Pages and static files.
    pub assets: Assets,
}

impl AppState {
    /// Bundle a relay and an asset set.
    #[must_use]
    pub fn new(relay: Arc<dyn Relay>, assets: Assets) -> Self {
        Self { relay, assets }
    }
}

/// Build the complete front door application with request tracing.
pub fn build_app(state: AppState) -> Router {
    routes::routes(state).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    )
}

/// A bound HTTP listener ready to serve the front door.
#[derive(Debug)]
pub struct FrontDoor {
    listener: TcpListener,
    app: Router,
}

impl FrontDoor {
    /// Bind the listener. Connections are not accepted until [`run`](Self::run).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bind`] if the address is unavailable.
    pub async fn bind(addr: SocketAddr, state: AppState) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| Error::Bind { addr, source })?;
        Ok(Self {
            listener,
            app: build_app(state),
        })
    }

    /// The address actually bound.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket address cannot be queried.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve connections until the listener fails.
    ///
    /// Every connection is handled on its own task.
    ///
    /// # Errors
    ///
    /// Returns an error if accepting connections fails.
    pub async fn run(self) -> Result<()> {
        info!("Listening on http://{}", self.local_addr()?);
        axum::serve(self.listener, self.app).await?;
        Ok(())
    }
}
