//! gRPC server assembly

pub mod admin;
pub mod biz;
pub mod http;
pub mod intercept;

use crate::acl::AccessList;
use crate::hub::EventHub;
use crate::stats::StatTracker;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tokio_util::sync::CancellationToken;
use tonic::transport::Server;
use warden_shared::{AuditEvent, CallerCounters, StatSnapshot};

pub mod proto {
    tonic::include_proto!("warden.v1");
}

use proto::{admin_server::AdminServer, biz_server::BizServer, Event, Stat};

impl From<&AuditEvent> for Event {
    fn from(event: &AuditEvent) -> Self {
        Self {
            timestamp: event.timestamp,
            consumer: event.consumer.clone(),
            method: event.method.clone(),
            host: event.host.clone(),
        }
    }
}

impl From<Event> for AuditEvent {
    fn from(event: Event) -> Self {
        Self {
            timestamp: event.timestamp,
            consumer: event.consumer,
            method: event.method,
            host: event.host,
        }
    }
}

impl Stat {
    pub fn from_counters(counters: CallerCounters, timestamp: i64) -> Self {
        Self {
            timestamp,
            by_method: counters.by_method,
            by_consumer: counters.by_consumer,
        }
    }
}

impl From<Stat> for StatSnapshot {
    fn from(stat: Stat) -> Self {
        Self {
            timestamp: stat.timestamp,
            counters: CallerCounters {
                by_method: stat.by_method,
                by_consumer: stat.by_consumer,
            },
        }
    }
}

/// Shared state behind every gRPC call: the allow-list and the two
/// subscriber registries. Built once per process.
#[derive(Debug, Clone)]
pub struct Gateway {
    acl: Arc<AccessList>,
    hub: Arc<EventHub>,
    stats: Arc<StatTracker>,
}

impl Gateway {
    pub fn new(acl: AccessList, hub: Arc<EventHub>, stats: Arc<StatTracker>) -> Self {
        Self {
            acl: Arc::new(acl),
            hub,
            stats,
        }
    }

    pub fn hub(&self) -> &Arc<EventHub> {
        &self.hub
    }

    pub fn stats(&self) -> &Arc<StatTracker> {
        &self.stats
    }

    /// Serve admin and biz services on `listener` until `shutdown` fires.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: CancellationToken,
    ) -> Result<(), tonic::transport::Error> {
        let layers = intercept::access_layers(
            Arc::clone(&self.acl),
            Arc::clone(&self.hub),
            Arc::clone(&self.stats),
        );
        // open admin streams must end for the graceful shutdown to finish
        let admin = admin::AdminService::new(
            Arc::clone(&self.hub),
            Arc::clone(&self.stats),
            shutdown.child_token(),
        );

        Server::builder()
            .layer(layers)
            .add_service(AdminServer::new(admin))
            .add_service(BizServer::new(biz::BizService))
            .serve_with_incoming_shutdown(TcpListenerStream::new(listener), async move {
                shutdown.cancelled().await
            })
            .await
    }
}
