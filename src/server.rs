//! The REST surface.
//!
//! Handlers parse their JSON bodies themselves so malformed input maps onto
//! the error taxonomy instead of a framework default reply, then move the
//! operation onto the blocking pool: the executors are synchronous and the
//! only suspension point is the native engine call.

use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tokio::task;
use tracing::info;

use crate::api::{BatchRequest, PkReadBody};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::gateway::{Gateway, Reply};

/// Build the REST router for one gateway runtime.
pub fn router(gateway: Arc<Gateway>, api_version: &str) -> Router {
    Router::new()
        .route(&format!("/{api_version}/stat"), get(stat))
        .route(&format!("/{api_version}/ping"), get(stat))
        .route(
            &format!("/{api_version}/{{db}}/{{table}}/pk-read"),
            post(pk_read),
        )
        .route(&format!("/{api_version}/batch"), post(batch))
        .with_state(gateway)
}

/// Bind and serve until ctrl-c.
pub async fn serve(config: &Config, gateway: Arc<Gateway>) -> Result<()> {
    let address = config.listen_address();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|e| Error::BadConfig(format!("cannot bind {address}: {e}")))?;
    info!(%address, "listening");
    axum::serve(listener, router(gateway, &config.rest.api_version))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| Error::BadConfig(format!("server error: {e}")))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn json_response(code: StatusCode, body: String) -> Response {
    (code, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.public_message() }).to_string();
        json_response(self.status_code(), body)
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        json_response(
            StatusCode::from_u16(self.code).unwrap_or(StatusCode::OK),
            self.body,
        )
    }
}

async fn run_blocking<T>(operation: impl FnOnce() -> Result<T> + Send + 'static) -> Response
where
    T: IntoResponse + Send + 'static,
{
    match task::spawn_blocking(operation).await {
        Ok(Ok(value)) => value.into_response(),
        Ok(Err(err)) => err.into_response(),
        Err(join_err) => {
            Error::engine_internal(format!("worker failed: {join_err}")).into_response()
        }
    }
}

async fn pk_read(
    State(gateway): State<Arc<Gateway>>,
    Path((db, table)): Path<(String, String)>,
    body: Bytes,
) -> Response {
    let parsed: PkReadBody = match serde_json::from_slice(&body) {
        Ok(parsed) => parsed,
        Err(e) => return Error::MalformedJson(e.to_string()).into_response(),
    };
    run_blocking(move || gateway.pk_read(&db, &table, &parsed)).await
}

async fn batch(State(gateway): State<Arc<Gateway>>, body: Bytes) -> Response {
    let parsed: BatchRequest = match serde_json::from_slice(&body) {
        Ok(parsed) => parsed,
        Err(e) => return Error::MalformedJson(e.to_string()).into_response(),
    };
    run_blocking(move || gateway.batch(&parsed)).await
}

async fn stat(State(gateway): State<Arc<Gateway>>) -> Response {
    run_blocking(move || {
        let stats = gateway.stats()?;
        let body = serde_json::to_string(&stats)
            .map_err(|e| Error::engine_internal(format!("cannot serialize stats: {e}")))?;
        Ok(Reply { code: 200, body })
    })
    .await
}
