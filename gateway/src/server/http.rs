//! Admin HTTP server for health checks and metrics

use crate::audit;
use crate::metrics;
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Request, Response, Server, StatusCode};
use std::convert::Infallible;
use std::net::SocketAddr;
use tokio_util::sync::CancellationToken;

/// Start the admin HTTP server serving /healthz and /metrics.
pub async fn serve_admin(addr: SocketAddr, shutdown: CancellationToken) -> Result<(), hyper::Error> {
    let make_svc = make_service_fn(|_| async {
        Ok::<_, Infallible>(service_fn(|req: Request<Body>| async move {
            Ok::<_, Infallible>(handle(&req))
        }))
    });

    tracing::info!("Admin HTTP server listening on {}", addr);
    Server::bind(&addr)
        .serve(make_svc)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}

fn text_response(status: StatusCode, content_type: &str, body: String) -> Response<Body> {
    let mut res = Response::new(Body::from(body));
    *res.status_mut() = status;
    if let Ok(value) = content_type.parse() {
        res.headers_mut().insert(hyper::header::CONTENT_TYPE, value);
    }
    res
}

fn handle(req: &Request<Body>) -> Response<Body> {
    let path = req.uri().path();
    let response = match path {
        "/healthz" => text_response(StatusCode::OK, "text/plain", "ok\n".to_string()),
        "/metrics" => text_response(
            StatusCode::OK,
            "text/plain; version=0.0.4",
            metrics::encode_metrics(),
        ),
        _ => text_response(StatusCode::NOT_FOUND, "text/plain", "not found\n".to_string()),
    };

    if path == "/metrics" || path == "/healthz" {
        audit::admin_http_request(path, response.status().as_u16());
    }
    response
}
