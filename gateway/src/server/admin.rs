//! Admin streaming service: live audit log and periodic statistics.
//!
//! Each call takes a fresh [`SubscriberId`], registers with the hub or the
//! stats tracker before the response is returned, and hands the stream to a
//! background task. The task ends, and unregisters, when the client drops the
//! response stream or the server begins shutting down.

use super::proto::{admin_server::Admin, Event, Nothing, Stat, StatInterval};
use crate::audit;
use crate::hub::{EventHub, EventReceiver};
use crate::stats::StatTracker;
use crate::subscriber::SubscriberId;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tonic::{Request, Response, Status};
use warden_shared::utils::time::system_time_secs;

/// Messages buffered between a stream task and the transport.
const OUTBOUND_BUFFER: usize = 4;

pub struct AdminService {
    hub: Arc<EventHub>,
    stats: Arc<StatTracker>,
    shutdown: CancellationToken,
}

impl AdminService {
    /// Streams opened through this service end once `shutdown` is cancelled.
    pub fn new(hub: Arc<EventHub>, stats: Arc<StatTracker>, shutdown: CancellationToken) -> Self {
        Self {
            hub,
            stats,
            shutdown,
        }
    }
}

#[tonic::async_trait]
impl Admin for AdminService {
    type LoggingStream = ReceiverStream<Result<Event, Status>>;
    type StatisticsStream = ReceiverStream<Result<Stat, Status>>;

    async fn logging(
        &self,
        _request: Request<Nothing>,
    ) -> Result<Response<Self::LoggingStream>, Status> {
        let id = SubscriberId::next();
        let events = self.hub.subscribe(id);
        let (tx, rx) = mpsc::channel(OUTBOUND_BUFFER);

        audit::admin_stream_opened("logging", id.as_u64());
        tokio::spawn(relay_events(
            Arc::clone(&self.hub),
            id,
            events,
            tx,
            self.shutdown.clone(),
        ));

        Ok(Response::new(ReceiverStream::new(rx)))
    }

    async fn statistics(
        &self,
        request: Request<StatInterval>,
    ) -> Result<Response<Self::StatisticsStream>, Status> {
        let secs = request.into_inner().interval_seconds;
        if secs <= 0 {
            return Err(Status::invalid_argument(format!(
                "interval_seconds must be at least 1, got {}",
                secs
            )));
        }
        let period = Duration::from_secs(secs as u64);

        let id = SubscriberId::next();
        self.stats.subscribe(id);
        let (tx, rx) = mpsc::channel(OUTBOUND_BUFFER);

        audit::admin_stream_opened("statistics", id.as_u64());
        tokio::spawn(relay_stats(
            Arc::clone(&self.stats),
            id,
            period,
            tx,
            self.shutdown.clone(),
        ));

        Ok(Response::new(ReceiverStream::new(rx)))
    }
}

/// Forward hub events to one client until it goes away or shutdown begins.
async fn relay_events(
    hub: Arc<EventHub>,
    id: SubscriberId,
    mut events: EventReceiver,
    tx: mpsc::Sender<Result<Event, Status>>,
    shutdown: CancellationToken,
) {
    loop {
        let event = tokio::select! {
            event = events.recv() => event,
            _ = tx.closed() => break,
            _ = shutdown.cancelled() => break,
        };
        let Some(event) = event else {
            // replaced or removed from the hub by someone else
            break;
        };

        tokio::select! {
            sent = tx.send(Ok(Event::from(event.as_ref()))) => {
                if let Err(e) = sent {
                    tracing::debug!(subscriber = %id, "logging send failed: {}", e);
                    break;
                }
            }
            _ = shutdown.cancelled() => break,
        }
    }

    hub.unsubscribe(id);
    audit::admin_stream_closed("logging", id.as_u64());
}

/// Emit this subscriber's counters every `period` until the client goes away
/// or shutdown begins.
async fn relay_stats(
    stats: Arc<StatTracker>,
    id: SubscriberId,
    period: Duration,
    tx: mpsc::Sender<Result<Stat, Status>>,
    shutdown: CancellationToken,
) {
    loop {
        // a fresh full period after every completed send
        tokio::select! {
            _ = time::sleep(period) => {}
            _ = tx.closed() => break,
            _ = shutdown.cancelled() => break,
        }

        let counters = match stats.pull(id) {
            Ok(counters) => counters,
            Err(e) => {
                tracing::error!(subscriber = %id, "statistics pull failed: {}", e);
                let _ = tx.send(Err(Status::internal(e.to_string()))).await;
                break;
            }
        };
        let stat = Stat::from_counters(counters, system_time_secs());

        tokio::select! {
            sent = tx.send(Ok(stat)) => {
                if let Err(e) = sent {
                    tracing::debug!(subscriber = %id, "statistics send failed: {}", e);
                    break;
                }
            }
            _ = shutdown.cancelled() => break,
        }
    }

    stats.unsubscribe(id);
    audit::admin_stream_closed("statistics", id.as_u64());
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;
    use tokio_stream::StreamExt;
    use warden_shared::AuditEvent;

    fn service() -> (AdminService, Arc<EventHub>, Arc<StatTracker>) {
        let (admin, hub, stats, _) = service_with_shutdown();
        (admin, hub, stats)
    }

    fn service_with_shutdown() -> (
        AdminService,
        Arc<EventHub>,
        Arc<StatTracker>,
        CancellationToken,
    ) {
        let hub = Arc::new(EventHub::new(8));
        let stats = Arc::new(StatTracker::new());
        let shutdown = CancellationToken::new();
        (
            AdminService::new(Arc::clone(&hub), Arc::clone(&stats), shutdown.clone()),
            hub,
            stats,
            shutdown,
        )
    }

    async fn wait_until(cond: impl Fn() -> bool) {
        for _ in 0..200 {
            if cond() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached");
    }

    #[tokio::test]
    async fn test_logging_relays_published_events() {
        let (admin, hub, _) = service();
        let mut stream = admin
            .logging(Request::new(Nothing::default()))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(hub.subscriber_count(), 1);

        hub.publish(AuditEvent::new("bob", "/warden.v1.Biz/Check", "10.0.0.1:5000"));
        hub.publish(AuditEvent::new("", "/warden.v1.Biz/Add", ""));

        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first.consumer, "bob");
        assert_eq!(first.method, "/warden.v1.Biz/Check");
        assert_eq!(first.host, "10.0.0.1:5000");

        let second = stream.next().await.unwrap().unwrap();
        assert_eq!(second.consumer, "");
        assert_eq!(second.method, "/warden.v1.Biz/Add");
    }

    #[tokio::test]
    async fn test_logging_unsubscribes_on_disconnect() {
        let (admin, hub, _) = service();
        let stream = admin
            .logging(Request::new(Nothing::default()))
            .await
            .unwrap()
            .into_inner();
        let mut other = admin
            .logging(Request::new(Nothing::default()))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(hub.subscriber_count(), 2);

        drop(stream);
        wait_until(|| hub.subscriber_count() == 1).await;

        // the remaining stream is unaffected
        hub.publish(AuditEvent::new("bob", "/x.Y/Z", ""));
        assert_eq!(other.next().await.unwrap().unwrap().method, "/x.Y/Z");
    }

    #[tokio::test]
    async fn test_statistics_rejects_non_positive_interval() {
        let (admin, _, stats) = service();
        for secs in [0, -5] {
            let err = admin
                .statistics(Request::new(StatInterval {
                    interval_seconds: secs,
                }))
                .await
                .unwrap_err();
            assert_eq!(err.code(), tonic::Code::InvalidArgument);
        }
        assert_eq!(stats.subscriber_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_statistics_emits_zero_snapshot_when_idle() {
        let (admin, _, _) = service();
        let mut stream = admin
            .statistics(Request::new(StatInterval {
                interval_seconds: 1,
            }))
            .await
            .unwrap()
            .into_inner();

        let stat = stream.next().await.unwrap().unwrap();
        assert!(stat.by_method.is_empty());
        assert!(stat.by_consumer.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_statistics_windows_reset_between_snapshots() {
        let (admin, _, stats) = service();
        let mut stream = admin
            .statistics(Request::new(StatInterval {
                interval_seconds: 2,
            }))
            .await
            .unwrap()
            .into_inner();

        stats.track("/warden.v1.Biz/Check", "bob");
        stats.track("/warden.v1.Biz/Check", "alice");

        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first.by_method["/warden.v1.Biz/Check"], 2);
        assert_eq!(first.by_consumer["bob"], 1);
        assert_eq!(first.by_consumer["alice"], 1);

        let second = stream.next().await.unwrap().unwrap();
        assert!(second.by_method.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_statistics_waits_one_interval() {
        let (admin, _, _) = service();
        let mut stream = admin
            .statistics(Request::new(StatInterval {
                interval_seconds: 10,
            }))
            .await
            .unwrap()
            .into_inner();

        let start = Instant::now();
        stream.next().await.unwrap().unwrap();
        assert!(start.elapsed() >= Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_statistics_unsubscribes_on_disconnect() {
        let (admin, _, stats) = service();
        let stream = admin
            .statistics(Request::new(StatInterval {
                interval_seconds: 60,
            }))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(stats.subscriber_count(), 1);

        drop(stream);
        wait_until(|| stats.subscriber_count() == 0).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_statistics_fails_when_subscription_vanishes() {
        let stats = Arc::new(StatTracker::new());
        let id = SubscriberId::next();
        let (tx, rx) = mpsc::channel(OUTBOUND_BUFFER);

        // never subscribed, so the first pull finds nothing
        let task = tokio::spawn(relay_stats(
            Arc::clone(&stats),
            id,
            Duration::from_secs(1),
            tx,
            CancellationToken::new(),
        ));
        let mut stream = ReceiverStream::new(rx);

        let err = stream.next().await.unwrap().unwrap_err();
        assert_eq!(err.code(), tonic::Code::Internal);
        task.await.unwrap();
        assert!(stream.next().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_statistics_rearms_after_slow_send() {
        let (admin, _, _) = service();
        let mut stream = admin
            .statistics(Request::new(StatInterval {
                interval_seconds: 1,
            }))
            .await
            .unwrap()
            .into_inner();

        // nobody reads: four snapshots fill the buffer and the fifth send blocks
        time::sleep(Duration::from_millis(10_500)).await;

        stream.next().await.unwrap().unwrap();
        let resumed = Instant::now();
        for _ in 0..4 {
            stream.next().await.unwrap().unwrap();
        }

        stream.next().await.unwrap().unwrap();
        assert!(resumed.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_shutdown_ends_open_streams() {
        let (admin, hub, stats, shutdown) = service_with_shutdown();
        let mut log = admin
            .logging(Request::new(Nothing::default()))
            .await
            .unwrap()
            .into_inner();
        let mut stat = admin
            .statistics(Request::new(StatInterval {
                interval_seconds: 60,
            }))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(hub.subscriber_count(), 1);
        assert_eq!(stats.subscriber_count(), 1);

        shutdown.cancel();

        assert!(log.next().await.is_none());
        assert!(stat.next().await.is_none());
        wait_until(|| hub.subscriber_count() == 0 && stats.subscriber_count() == 0).await;
    }
}
