//! Web chat surface
//!
//! An HTML chat page plus a small JSON API, both served by axum over the
//! same [`ChatService`](crate::agent::ChatService).

pub mod page;
pub mod routes;

pub use routes::{create_router, AppState};

use crate::error::{AuraError, Result};

/// Serve the router on `bind` until the process is stopped
pub async fn serve(state: AppState, bind: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|e| AuraError::Config(format!("Failed to bind {}: {}", bind, e)))?;
    tracing::info!("Web UI listening on http://{}", bind);
    axum::serve(listener, create_router(state)).await?;
    Ok(())
}
