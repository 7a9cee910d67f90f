//! HTTP front end: maps verbs on `/v1/key/{key}` to store operations.

use std::future::Future;
use std::net::SocketAddr;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::context::AppContext;
use crate::error::{LogError, StoreError};

const INTERNAL_SERVER_ERROR: &str = "internal server error";

/// Builds the router. Exposed separately from [`Server`] so tests can drive
/// it without binding a socket.
pub fn router(context: AppContext) -> Router {
    Router::new()
        .route("/", get(healthcheck))
        .route(
            "/v1/key/:key",
            get(get_handler).put(put_handler).delete(delete_handler),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(context)
}

pub struct Server {
    listener: TcpListener,
    context: AppContext,
}

impl Server {
    pub fn new(listener: TcpListener, context: AppContext) -> Self {
        Self { listener, context }
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serves until `shutdown` resolves, then finishes in-flight requests.
    pub async fn run_until<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let Server { listener, context } = self;
        axum::serve(listener, router(context))
            .with_graceful_shutdown(shutdown)
            .await
    }

    pub async fn run_until_ctrl_c(self) -> std::io::Result<()> {
        self.run_until(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!(error = ?err, "failed to install ctrl-c handler");
            }
        })
        .await
    }
}

#[derive(Debug)]
pub enum ServiceError {
    Store(StoreError),
    Log(LogError),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

impl From<LogError> for ServiceError {
    fn from(err: LogError) -> Self {
        Self::Log(err)
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        match self {
            ServiceError::Store(err @ StoreError::NoSuchKey(_)) => {
                (StatusCode::NOT_FOUND, err.to_string()).into_response()
            }
            ServiceError::Log(err @ LogError::EmptyKey) => {
                (StatusCode::BAD_REQUEST, err.to_string()).into_response()
            }
            ServiceError::Log(err) => {
                error!(error = %err, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_SERVER_ERROR).into_response()
            }
        }
    }
}

async fn healthcheck() -> &'static str {
    "OK!"
}

async fn put_handler(
    State(context): State<AppContext>,
    Path(key): Path<String>,
    value: String,
) -> Result<StatusCode, ServiceError> {
    context.put(&key, &value).await?;
    Ok(StatusCode::CREATED)
}

async fn get_handler(
    State(context): State<AppContext>,
    Path(key): Path<String>,
) -> Result<String, ServiceError> {
    Ok(context.get(&key)?)
}

async fn delete_handler(
    State(context): State<AppContext>,
    Path(key): Path<String>,
) -> Result<StatusCode, ServiceError> {
    context.delete(&key).await?;
    Ok(StatusCode::NO_CONTENT)
}
