//! Server Lifecycle
//!
//! Serves the router until a shutdown signal arrives, then gives in-flight
//! requests a bounded window to finish.

use std::future::{Future, IntoFuture};
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::Notify;

/// How the server stopped after the shutdown signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Drain {
    /// Every open connection finished before the deadline
    Completed,
    /// Connections were still open when the deadline passed
    DeadlineExceeded,
}

/// Runs `app` on `listener` until `signal` resolves.
///
/// Once the signal fires the listener stops accepting and open connections
/// get `grace` to finish. Whatever is still running after that is abandoned.
pub async fn serve_until<F>(
    listener: TcpListener,
    app: Router,
    signal: F,
    grace: Duration,
) -> std::io::Result<Drain>
where
    F: Future<Output = ()> + Send + 'static,
{
    let fired = Arc::new(Notify::new());
    let notifier = fired.clone();

    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            signal.await;
            notifier.notify_one();
        })
        .into_future();
    tokio::pin!(server);

    let deadline = async {
        fired.notified().await;
        tokio::time::sleep(grace).await;
    };

    tokio::select! {
        result = &mut server => result.map(|()| Drain::Completed),
        _ = deadline => Ok(Drain::DeadlineExceeded),
    }
}
