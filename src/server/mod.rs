// Server module - hyper HTTP/1 accept loop and routing

use bytes::Bytes;
use http::header::{HeaderValue, ALLOW, CONTENT_TYPE};
use http::{Method, Request, Response, StatusCode};
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::future::Future;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinSet;

use crate::constants::{
    HEALTH_PATH, METRICS_PATH, MSG_METHOD_NOT_ALLOWED, MSG_NOT_FOUND, SHUTDOWN_GRACE_SECS,
    WATERMARK_ROUTE_PREFIX,
};
use crate::proxy::{EndpointResponse, ProxyResponse, WatermarkProxy};

/// Where a request goes, decided from method and path only
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Watermark the upstream resource at this suffix (query string included)
    Watermark(String),
    Health,
    Metrics,
    MethodNotAllowed,
    NotFound,
}

/// Resolve the route for a request line
pub fn route(method: &Method, path_and_query: &str) -> Route {
    let path = path_and_query
        .split_once('?')
        .map_or(path_and_query, |(path, _)| path);

    if let Some(suffix) = path_and_query.strip_prefix(WATERMARK_ROUTE_PREFIX) {
        if method != Method::GET {
            return Route::MethodNotAllowed;
        }
        return Route::Watermark(suffix.to_string());
    }

    match (method, path) {
        (&Method::GET, HEALTH_PATH) => Route::Health,
        (&Method::GET, METRICS_PATH) => Route::Metrics,
        _ => Route::NotFound,
    }
}

/// Serve connections from `listener` until `shutdown` resolves
///
/// Each connection gets its own task. After the shutdown signal no new
/// connections are accepted and open ones get a grace period to finish.
pub async fn serve<F>(listener: TcpListener, proxy: WatermarkProxy, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()>,
{
    let local_addr = listener.local_addr()?;
    tracing::info!(address = %local_addr, "Listening for connections");

    let mut connections = JoinSet::new();
    let (close_tx, close_rx) = watch::channel(());
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(conn) => conn,
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to accept connection");
                        continue;
                    }
                };

                let proxy = proxy.clone();
                let mut close_rx = close_rx.clone();
                connections.spawn(async move {
                    let service = service_fn(move |req| {
                        let proxy = proxy.clone();
                        async move { Ok::<_, Infallible>(handle_request(&proxy, req).await) }
                    });

                    let conn = http1::Builder::new().serve_connection(TokioIo::new(stream), service);
                    tokio::pin!(conn);

                    let result = tokio::select! {
                        result = conn.as_mut() => result,
                        _ = close_rx.changed() => {
                            conn.as_mut().graceful_shutdown();
                            conn.await
                        }
                    };
                    if let Err(e) = result {
                        tracing::debug!(peer = %peer, error = %e, "Connection closed with error");
                    }
                });
            }
            Some(_) = connections.join_next(), if !connections.is_empty() => {}
            _ = &mut shutdown => {
                tracing::info!(open_connections = connections.len(), "Shutdown signal received, no longer accepting connections");
                break;
            }
        }
    }

    // Idle keep-alive connections close now, busy ones after their response
    let _ = close_tx.send(());
    let drain = async { while connections.join_next().await.is_some() {} };
    if tokio::time::timeout(Duration::from_secs(SHUTDOWN_GRACE_SECS), drain)
        .await
        .is_err()
    {
        tracing::warn!(
            remaining = connections.len(),
            "Grace period elapsed, aborting open connections"
        );
        connections.shutdown().await;
    }

    tracing::info!("Server stopped");
    Ok(())
}

async fn handle_request(proxy: &WatermarkProxy, req: Request<Incoming>) -> Response<Full<Bytes>> {
    let path_and_query = req
        .uri()
        .path_and_query()
        .map_or_else(|| req.uri().path(), |pq| pq.as_str());

    match route(req.method(), path_and_query) {
        Route::Watermark(suffix) => proxy_response(proxy.handle(&suffix).await),
        Route::Health => endpoint_response(proxy.health()),
        Route::Metrics => endpoint_response(proxy.metrics_response()),
        Route::MethodNotAllowed => {
            let mut response = proxy_response(ProxyResponse::text(405, MSG_METHOD_NOT_ALLOWED));
            response
                .headers_mut()
                .insert(ALLOW, HeaderValue::from_static("GET"));
            response
        }
        Route::NotFound => proxy_response(ProxyResponse::text(404, MSG_NOT_FOUND)),
    }
}

fn proxy_response(response: ProxyResponse) -> Response<Full<Bytes>> {
    build_response(response.status, response.content_type, response.body)
}

fn endpoint_response(response: EndpointResponse) -> Response<Full<Bytes>> {
    build_response(response.status, response.content_type, Bytes::from(response.body))
}

fn build_response(status: u16, content_type: &'static str, body: Bytes) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body));
    *response.status_mut() =
        StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}
