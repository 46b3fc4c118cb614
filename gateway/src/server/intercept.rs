//! Per-call interceptor chain.
//!
//! Two tower layers sit in front of every gRPC service, unary and streaming
//! alike, since both arrive as one HTTP/2 request:
//!
//! 1. [`AuditLayer`] records the attempt: it publishes an [`AuditEvent`] to the
//!    hub and counts the call in the stats tracker. It never rejects.
//! 2. [`AuthLayer`] checks the consumer against the [`AccessList`] and answers
//!    denied calls itself with `UNAUTHENTICATED`.
//!
//! The audit layer must be outermost so denied attempts are still recorded;
//! [`access_layers`] builds the stack in that order.

use crate::acl::AccessList;
use crate::audit;
use crate::hub::EventHub;
use crate::metrics;
use crate::stats::StatTracker;
use futures::future::{self, Either, Ready};
use http::{Request, Response};
use std::borrow::Cow;
use std::sync::Arc;
use std::task::{Context, Poll};
use tonic::body::BoxBody;
use tonic::transport::server::TcpConnectInfo;
use tonic::Status;
use tower::layer::util::{Identity, Stack};
use tower::{Layer, Service, ServiceBuilder};
use warden_shared::AuditEvent;

/// Metadata key carrying the caller identifier.
pub const CONSUMER_HEADER: &str = "consumer";

/// Caller identifier from request metadata, empty when absent. Bytes outside
/// visible ASCII are decoded lossily so the audit trail still shows them.
pub fn consumer_of<B>(req: &Request<B>) -> Cow<'_, str> {
    match req.headers().get(CONSUMER_HEADER) {
        Some(value) => String::from_utf8_lossy(value.as_bytes()),
        None => Cow::Borrowed(""),
    }
}

/// Peer address of the connection, empty when the transport doesn't expose it.
pub fn peer_host<B>(req: &Request<B>) -> String {
    req.extensions()
        .get::<TcpConnectInfo>()
        .and_then(|info| info.remote_addr())
        .map(|addr| addr.to_string())
        .unwrap_or_default()
}

/// Audit stage outermost, authorization inside it.
pub type AccessLayers = Stack<AuthLayer, Stack<AuditLayer, Identity>>;

pub fn access_layers(
    acl: Arc<AccessList>,
    hub: Arc<EventHub>,
    stats: Arc<StatTracker>,
) -> AccessLayers {
    ServiceBuilder::new()
        .layer(AuditLayer::new(hub, stats))
        .layer(AuthLayer::new(acl))
        .into_inner()
}

// ── Audit stage ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct AuditLayer {
    hub: Arc<EventHub>,
    stats: Arc<StatTracker>,
}

impl AuditLayer {
    pub fn new(hub: Arc<EventHub>, stats: Arc<StatTracker>) -> Self {
        Self { hub, stats }
    }
}

impl<S> Layer<S> for AuditLayer {
    type Service = AuditService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuditService {
            inner,
            hub: Arc::clone(&self.hub),
            stats: Arc::clone(&self.stats),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuditService<S> {
    inner: S,
    hub: Arc<EventHub>,
    stats: Arc<StatTracker>,
}

impl<S, B> Service<Request<B>> for AuditService<S>
where
    S: Service<Request<B>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        {
            let consumer = consumer_of(&req);
            let method = req.uri().path();
            self.hub
                .publish(AuditEvent::new(&*consumer, method, peer_host(&req)));
            self.stats.track(method, &consumer);
        }

        self.inner.call(req)
    }
}

// ── Authorization stage ──────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct AuthLayer {
    acl: Arc<AccessList>,
}

impl AuthLayer {
    pub fn new(acl: Arc<AccessList>) -> Self {
        Self { acl }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthService {
            inner,
            acl: Arc::clone(&self.acl),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthService<S> {
    inner: S,
    acl: Arc<AccessList>,
}

impl<S, B> Service<Request<B>> for AuthService<S>
where
    S: Service<Request<B>, Response = Response<BoxBody>>,
{
    type Response = Response<BoxBody>;
    type Error = S::Error;
    type Future = Either<Ready<Result<Response<BoxBody>, S::Error>>, S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        let verdict = self.acl.authorize(&consumer_of(&req), req.uri().path());

        match verdict {
            Ok(()) => {
                metrics::CALLS_TOTAL.with_label_values(&["allowed"]).inc();
                Either::Right(self.inner.call(req))
            }
            Err(denied) => {
                metrics::CALLS_TOTAL.with_label_values(&["denied"]).inc();
                audit::call_denied(&denied.consumer, &denied.method, &peer_host(&req));
                let status: Status = denied.into();
                Either::Left(future::ready(Ok(status.to_http())))
            }
        }
    }
}
