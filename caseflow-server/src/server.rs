//! HTTP/1 accept loop and background session expiry.

use crate::routes;
use crate::state::AppState;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Serves connections until `shutdown` resolves.
///
/// In-flight connections are left to finish on their own tasks.
pub async fn serve<F>(listener: TcpListener, state: Arc<AppState>, shutdown: F)
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(conn) => conn,
                    Err(err) => {
                        warn!(error = %err, "Failed to accept connection");
                        continue;
                    }
                };
                let state = state.clone();
                tokio::spawn(async move {
                    let service = service_fn(move |req| routes::handle(state.clone(), req));
                    if let Err(err) = http1::Builder::new()
                        .serve_connection(TokioIo::new(stream), service)
                        .await
                    {
                        debug!(%peer, error = %err, "Connection ended with error");
                    }
                });
            }
            () = &mut shutdown => {
                info!("Shutdown requested, no longer accepting connections");
                break;
            }
        }
    }
}

/// Purges finished sessions older than `ttl` every `interval`.
pub fn spawn_sweeper(state: Arc<AppState>, interval: Duration, ttl: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let removed = state.tracker.purge_finished(ttl);
            debug!(removed, remaining = state.tracker.session_count(), "Session sweep");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use caseflow::config::ServerConfig;
    use caseflow::report::ResultFormatter;
    use caseflow::session::{ExecutionMode, InMemorySessionStore, SessionTracker};
    use caseflow::testing::{sample_request, wait_until_finished};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    fn state() -> Arc<AppState> {
        let tracker = SessionTracker::new(
            Arc::new(InMemorySessionStore::new()),
            ExecutionMode::Fallback {
                formatter: ResultFormatter::default(),
            },
        );
        Arc::new(AppState::new(tracker, ServerConfig::default()))
    }

    #[tokio::test]
    async fn test_serves_health_over_tcp() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
        let server = tokio::spawn(serve(listener, state(), async {
            let _ = stop_rx.await;
        }));

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();

        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert!(response.contains("\"status\":\"healthy\""));

        stop_tx.send(()).unwrap();
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_sweeper_purges_finished_sessions() {
        let state = state();
        let id = state.tracker.create(sample_request()).unwrap();
        wait_until_finished(&state.tracker, &id).await;
        assert_eq!(state.tracker.session_count(), 1);

        let sweeper = spawn_sweeper(state.clone(), Duration::from_millis(10), Duration::ZERO);
        for _ in 0..100 {
            if state.tracker.session_count() == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        sweeper.abort();
        assert_eq!(state.tracker.session_count(), 0);
    }
}
