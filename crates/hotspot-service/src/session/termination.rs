//! Session termination: single and bulk flows.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::{Id as TaskId, JoinError, JoinSet};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use hotspot_auth::{Permission, RbacEnforcer};
use hotspot_coa::CoaDispatcher;
use hotspot_core::config::TerminationConfig;
use hotspot_core::error::AppError;
use hotspot_core::result::AppResult;
use hotspot_core::types::SessionId;
use hotspot_entity::session::{SessionRecord, SessionState};
use hotspot_entity::termination::{BulkTerminationReport, TerminationOutcome, TerminationReason};
use hotspot_realtime::{EventBroadcaster, EventPayload, SessionMonitor, Topic};
use hotspot_session::{SessionRegistry, SessionStore};

use crate::context::RequestContext;

/// Handles operator-initiated session termination.
///
/// Every termination claims the session in the registry first, so at most
/// one Disconnect-Request is in flight per session. Dispatches run on their
/// own tasks and always record their outcome, even when the caller has gone
/// away.
#[derive(Clone)]
pub struct TerminationService {
    registry: Arc<SessionRegistry>,
    dispatcher: Arc<CoaDispatcher>,
    store: Arc<dyn SessionStore>,
    broadcaster: Arc<EventBroadcaster>,
    monitor: SessionMonitor,
    rbac: Arc<RbacEnforcer>,
    config: TerminationConfig,
}

impl std::fmt::Debug for TerminationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminationService")
            .field("max_concurrency", &self.config.max_concurrency)
            .finish()
    }
}

impl TerminationService {
    /// Creates a new termination service.
    pub fn new(
        registry: Arc<SessionRegistry>,
        dispatcher: Arc<CoaDispatcher>,
        store: Arc<dyn SessionStore>,
        broadcaster: Arc<EventBroadcaster>,
        rbac: Arc<RbacEnforcer>,
        config: TerminationConfig,
    ) -> Self {
        let monitor = SessionMonitor::new(Arc::clone(&registry), Arc::clone(&broadcaster));
        Self {
            registry,
            dispatcher,
            store,
            broadcaster,
            monitor,
            rbac,
            config,
        }
    }

    /// Terminates one session and waits for the NAS verdict.
    ///
    /// Unknown sessions fail with `NotFound`, sessions already being
    /// terminated (or already gone) with `AlreadyInProgress`. A NAS that
    /// rejects or never answers is not an error: it is reported through the
    /// returned outcome.
    pub async fn terminate_one(
        &self,
        ctx: &RequestContext,
        session_id: &SessionId,
        reason: Option<&str>,
    ) -> AppResult<TerminationOutcome> {
        self.rbac
            .require_permission(&ctx.role, &Permission::SessionTerminate)?;
        let reason = resolve_reason(reason, &self.config.default_reason);

        self.registry.get(session_id)?;
        if !self.registry.try_begin_termination(session_id) {
            let message = match self.registry.state_of(session_id) {
                Some(SessionState::Terminated) => {
                    format!("Session {session_id} is already terminated")
                }
                Some(_) => format!("Termination of session {session_id} is already in progress"),
                None => return Err(AppError::not_found(format!("Session {session_id} not found"))),
            };
            return Err(AppError::already_in_progress(message));
        }
        self.monitor.push_update();

        let record = match self.registry.get(session_id) {
            Ok(record) => record,
            Err(e) => {
                // Removed by an accounting stop between claim and dispatch.
                debug!(session_id = %session_id, "Session vanished before dispatch");
                return Err(e);
            }
        };

        info!(
            operator = %ctx.operator_id,
            session_id = %session_id,
            reason = %reason,
            "Session termination requested"
        );

        let service = self.clone();
        let task = tokio::spawn(async move { service.dispatch(record, &reason).await });
        match task.await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                error!(session_id = %session_id, error = %e, "Dispatch task failed");
                Ok(self.settle_lost_dispatch(session_id.clone()))
            }
        }
    }

    /// Terminates a batch of sessions with bounded concurrency.
    ///
    /// Unknown ids are listed in the report and never dispatched; ids that
    /// are already being terminated are reported as duplicates. When
    /// `cancel` fires, the batch deadline passes, or the returned future is
    /// dropped, no further dispatches start: claimed but undispatched
    /// sessions go back to `ACTIVE` and are listed as not dispatched, while
    /// dispatches already started run to completion.
    pub async fn terminate_many(
        &self,
        ctx: &RequestContext,
        session_ids: Vec<SessionId>,
        reason: Option<&str>,
        cancel: CancellationToken,
    ) -> AppResult<BulkTerminationReport> {
        self.rbac
            .require_permission(&ctx.role, &Permission::SessionTerminate)?;
        if session_ids.is_empty() {
            return Err(AppError::invalid_request("sessionIds must not be empty"));
        }
        let reason = resolve_reason(reason, &self.config.default_bulk_reason);
        let batch_id = Uuid::new_v4();

        let mut report = BulkTerminationReport::new(session_ids.len());
        let mut claimed = Vec::with_capacity(session_ids.len());
        for session_id in session_ids {
            if self.registry.state_of(&session_id).is_none() {
                report.mark_unknown(session_id);
            } else if self.registry.try_begin_termination(&session_id) {
                claimed.push(session_id);
            } else {
                report.record(TerminationOutcome::duplicate(session_id));
            }
        }
        if !claimed.is_empty() {
            self.monitor.push_update();
        }

        info!(
            operator = %ctx.operator_id,
            batch_id = %batch_id,
            requested = report.requested,
            claimed = claimed.len(),
            unknown = report.unknown.len(),
            duplicates = report.duplicates,
            reason = %reason,
            "Bulk termination started"
        );

        let batch_cancel = cancel.child_token();
        let guard = batch_cancel.clone().drop_guard();
        let coordinator = tokio::spawn(self.clone().run_batch(
            batch_id,
            claimed,
            reason,
            batch_cancel,
            report,
        ));
        let report = coordinator
            .await
            .map_err(|e| AppError::internal(format!("Bulk termination coordinator failed: {e}")))?;
        guard.disarm();

        info!(
            batch_id = %batch_id,
            succeeded = report.succeeded,
            failed = report.failed,
            not_dispatched = report.not_dispatched.len(),
            status = ?report.status,
            "Bulk termination finished"
        );
        Ok(report)
    }

    async fn run_batch(
        self,
        batch_id: Uuid,
        claimed: Vec<SessionId>,
        reason: String,
        cancel: CancellationToken,
        mut report: BulkTerminationReport,
    ) -> BulkTerminationReport {
        let permits = Arc::new(Semaphore::new(self.config.max_concurrency.max(1)));
        let deadline = self.config.batch_deadline().map(|d| Instant::now() + d);
        let reason: Arc<str> = Arc::from(reason);
        let mut in_flight: JoinSet<TerminationOutcome> = JoinSet::new();
        let mut dispatched: HashMap<TaskId, SessionId> = HashMap::new();

        let mut pending = claimed.into_iter();
        while let Some(session_id) = pending.next() {
            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                _ = deadline_reached(deadline) => None,
                permit = Arc::clone(&permits).acquire_owned() => permit.ok(),
            };
            let Some(permit) = permit else {
                let undispatched: Vec<SessionId> =
                    std::iter::once(session_id).chain(pending).collect();
                warn!(
                    batch_id = %batch_id,
                    remaining = undispatched.len(),
                    cancelled = cancel.is_cancelled(),
                    "Bulk termination stopped before dispatching every session"
                );
                for session_id in undispatched {
                    self.registry.release_termination(&session_id);
                    report.record(TerminationOutcome::not_dispatched(session_id));
                }
                self.monitor.push_update();
                break;
            };

            let record = match self.registry.get(&session_id) {
                Ok(record) => record,
                Err(_) => {
                    debug!(batch_id = %batch_id, session_id = %session_id, "Session vanished before dispatch");
                    report.mark_unknown(session_id);
                    continue;
                }
            };

            let service = self.clone();
            let reason = Arc::clone(&reason);
            let handle = in_flight.spawn(async move {
                let _permit = permit;
                service.dispatch(record, &reason).await
            });
            dispatched.insert(handle.id(), session_id);

            while let Some(joined) = in_flight.try_join_next_with_id() {
                self.collect(&mut report, &mut dispatched, joined);
            }
        }

        while let Some(joined) = in_flight.join_next_with_id().await {
            self.collect(&mut report, &mut dispatched, joined);
        }

        report.finish()
    }

    fn collect(
        &self,
        report: &mut BulkTerminationReport,
        dispatched: &mut HashMap<TaskId, SessionId>,
        joined: Result<(TaskId, TerminationOutcome), JoinError>,
    ) {
        match joined {
            Ok((task_id, outcome)) => {
                dispatched.remove(&task_id);
                report.record(outcome);
            }
            Err(e) => {
                let Some(session_id) = dispatched.remove(&e.id()) else {
                    error!(error = %e, "Dispatch task failed for an untracked session");
                    return;
                };
                error!(session_id = %session_id, error = %e, "Dispatch task failed");
                report.record(self.settle_lost_dispatch(session_id));
            }
        }
    }

    /// Fails a claimed session whose dispatch task ended without an outcome,
    /// so it leaves `TERMINATION_REQUESTED` and can be retried.
    fn settle_lost_dispatch(&self, session_id: SessionId) -> TerminationOutcome {
        let outcome =
            TerminationOutcome::failed(session_id, TerminationReason::NasUnreachable, 0, None);
        if let Err(e) = self.registry.complete_termination(&outcome.session_id, &outcome) {
            debug!(error = %e, "Failed session no longer tracked");
        }
        self.monitor.push_update();
        outcome
    }

    /// Sends the Disconnect-Request for a claimed session and records the
    /// result everywhere it is observed.
    async fn dispatch(&self, record: SessionRecord, reason: &str) -> TerminationOutcome {
        let outcome = self.dispatcher.disconnect(&record, reason).await;
        let session_id = &record.session_id;

        let state = match self.registry.complete_termination(session_id, &outcome) {
            Ok(state) => state,
            Err(_) => {
                debug!(session_id = %session_id, "Session stopped by accounting during dispatch");
                if outcome.succeeded {
                    SessionState::Terminated
                } else {
                    SessionState::TerminationFailed
                }
            }
        };

        if outcome.succeeded {
            if let Err(e) = self
                .store
                .mark_terminated(session_id, reason, outcome.completed_at)
                .await
            {
                warn!(session_id = %session_id, error = %e, "Failed to persist session termination");
            }
        }

        self.broadcaster.publish(
            Topic::Sessions,
            EventPayload::SessionTerminated {
                session_id: session_id.clone(),
                state,
                outcome: outcome.clone(),
            },
        );
        self.monitor.push_update();
        outcome
    }
}

fn resolve_reason(requested: Option<&str>, default: &str) -> String {
    requested
        .map(str::trim)
        .filter(|reason| !reason.is_empty())
        .unwrap_or(default)
        .to_string()
}

async fn deadline_reached(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, SocketAddr};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::Utc;
    use hotspot_coa::packet::{EncodedRequest, Reply, ReplyKind};
    use hotspot_coa::{NasTransport, TransportError};
    use hotspot_core::config::CoaConfig;
    use hotspot_core::error::ErrorKind;
    use hotspot_entity::termination::BulkStatus;
    use hotspot_entity::user::OperatorRole;
    use hotspot_session::MemorySessionStore;

    use super::*;

    const NAK_NAS: &str = "10.0.0.66";
    const SILENT_NAS: &str = "10.0.0.99";
    const FAULTY_NAS: &str = "10.0.0.13";

    /// Answers after `delay`; NAKs for [`NAK_NAS`], never answers for
    /// [`SILENT_NAS`], panics for [`FAULTY_NAS`]. Tracks the highest number
    /// of concurrent exchanges.
    #[derive(Debug)]
    struct InstrumentedTransport {
        delay: Duration,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        calls: AtomicUsize,
    }

    impl InstrumentedTransport {
        fn new(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                delay,
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl NasTransport for InstrumentedTransport {
        async fn resolve(&self, nas_identifier: &str) -> Result<SocketAddr, TransportError> {
            nas_identifier
                .parse::<IpAddr>()
                .map(|ip| SocketAddr::new(ip, 3799))
                .map_err(|e| TransportError::Resolve {
                    nas: nas_identifier.to_string(),
                    reason: e.to_string(),
                })
        }

        async fn exchange(
            &self,
            remote: SocketAddr,
            request: &EncodedRequest,
        ) -> Result<Reply, TransportError> {
            let nas_identifier = remote.ip().to_string();
            self.calls.fetch_add(1, Ordering::SeqCst);
            if nas_identifier == FAULTY_NAS {
                panic!("transport fault");
            }
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            if nas_identifier == SILENT_NAS {
                self.in_flight.fetch_sub(1, Ordering::SeqCst);
                return std::future::pending().await;
            }
            tokio::time::sleep(self.delay).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            let kind = if nas_identifier == NAK_NAS {
                ReplyKind::Nak
            } else {
                ReplyKind::Ack
            };
            Ok(Reply {
                kind,
                identifier: request.identifier,
                error_cause: None,
            })
        }
    }

    struct Harness {
        service: TerminationService,
        registry: Arc<SessionRegistry>,
        store: Arc<MemorySessionStore>,
        broadcaster: Arc<EventBroadcaster>,
        transport: Arc<InstrumentedTransport>,
    }

    fn harness(config: TerminationConfig, delay: Duration) -> Harness {
        let registry = Arc::new(SessionRegistry::new());
        let store = Arc::new(MemorySessionStore::new());
        let broadcaster = Arc::new(EventBroadcaster::new(1024));
        let transport = InstrumentedTransport::new(delay);
        let dispatcher = Arc::new(CoaDispatcher::new(
            CoaConfig::default(),
            Arc::clone(&transport) as Arc<dyn NasTransport>,
        ));
        let service = TerminationService::new(
            Arc::clone(&registry),
            dispatcher,
            Arc::clone(&store) as Arc<dyn SessionStore>,
            Arc::clone(&broadcaster),
            Arc::new(RbacEnforcer::new()),
            config,
        );
        Harness {
            service,
            registry,
            store,
            broadcaster,
            transport,
        }
    }

    fn add_session(registry: &SessionRegistry, id: &str, nas: &str) -> SessionId {
        let session_id = SessionId::new(id);
        registry.insert(SessionRecord::new(session_id.clone(), "0712000000_AB12", nas, Utc::now()));
        session_id
    }

    fn add_sessions(registry: &SessionRegistry, count: usize) -> Vec<SessionId> {
        (0..count)
            .map(|i| add_session(registry, &format!("s-{i:03}"), "10.0.0.1"))
            .collect()
    }

    fn admin() -> RequestContext {
        RequestContext::new("op-1", OperatorRole::Admin, "ops")
    }

    #[tokio::test(start_paused = true)]
    async fn test_bulk_reports_unknown_ids_without_dispatching_them() {
        let h = harness(TerminationConfig::default(), Duration::from_millis(20));
        let mut ids = add_sessions(&h.registry, 5);
        ids.push(SessionId::new("ghost-1"));
        ids.push(SessionId::new("ghost-2"));

        let report = h
            .service
            .terminate_many(&admin(), ids, None, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.requested, 7);
        assert_eq!(report.succeeded, 5);
        assert_eq!(report.failed, 0);
        assert_eq!(report.outcomes.len(), 5);
        assert_eq!(report.unknown, vec![SessionId::new("ghost-1"), SessionId::new("ghost-2")]);
        assert_eq!(report.status, BulkStatus::Partial);
        assert_eq!(h.transport.calls.load(Ordering::SeqCst), 5);
        assert_eq!(h.registry.state_counts().terminated, 5);
        assert_eq!(h.store.terminated_count(), 5);
        assert_eq!(
            h.store.terminate_cause(&SessionId::new("s-000")).as_deref(),
            Some("Bulk-Terminated")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_bulk_concurrency_is_bounded_by_pool_size() {
        let config = TerminationConfig {
            max_concurrency: 8,
            ..TerminationConfig::default()
        };
        let h = harness(config, Duration::from_millis(50));
        let ids = add_sessions(&h.registry, 100);

        let report = h
            .service
            .terminate_many(&admin(), ids, Some("Maintenance"), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.succeeded, 100);
        assert_eq!(report.outcomes.len(), 100);
        assert_eq!(report.status, BulkStatus::AllSucceeded);
        assert_eq!(h.transport.max_in_flight.load(Ordering::SeqCst), 8);
        assert_eq!(h.registry.state_counts().terminated, 100);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bulk_marks_sessions_already_in_progress_as_duplicates() {
        let h = harness(TerminationConfig::default(), Duration::from_millis(10));
        let ids = add_sessions(&h.registry, 3);
        assert!(h.registry.try_begin_termination(&ids[0]));

        let mut request = ids.clone();
        request.push(ids[1].clone());
        let report = h
            .service
            .terminate_many(&admin(), request, None, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.requested, 4);
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.duplicates, 2);
        assert_eq!(report.failed, 0);
        assert_eq!(h.transport.calls.load(Ordering::SeqCst), 2);
        assert_eq!(
            h.registry.state_of(&ids[0]),
            Some(SessionState::TerminationRequested)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_bulk_counts_cover_each_valid_id_once() {
        let h = harness(TerminationConfig::default(), Duration::from_millis(10));
        let valid = add_sessions(&h.registry, 5);
        assert!(h.registry.try_begin_termination(&valid[2]));

        let mut ids = valid.clone();
        ids.push(SessionId::new("ghost-1"));
        ids.push(SessionId::new("ghost-2"));
        let report = h
            .service
            .terminate_many(&admin(), ids, None, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.unknown.len(), 2);
        assert_eq!(report.succeeded, 4);
        assert_eq!(report.failed, 0);
        assert_eq!(report.duplicates, 1);
        assert_eq!(report.succeeded + report.failed + report.duplicates, valid.len());
        assert_eq!(report.status, BulkStatus::Partial);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bulk_rejects_empty_input() {
        let h = harness(TerminationConfig::default(), Duration::from_millis(10));
        add_sessions(&h.registry, 2);

        let err = h
            .service
            .terminate_many(&admin(), Vec::new(), None, CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::InvalidRequest);
        assert_eq!(h.registry.state_counts().active, 2);
        assert_eq!(h.transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bulk_with_no_successes_reports_none_succeeded() {
        let h = harness(TerminationConfig::default(), Duration::from_millis(10));
        let ids = vec![
            add_session(&h.registry, "n-1", NAK_NAS),
            add_session(&h.registry, "n-2", NAK_NAS),
        ];

        let report = h
            .service
            .terminate_many(&admin(), ids.clone(), None, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.status, BulkStatus::NoneSucceeded);
        assert!(report.outcomes.iter().all(|o| o.reason == TerminationReason::Nak));
        assert_eq!(h.registry.state_of(&ids[0]), Some(SessionState::TerminationFailed));
        assert_eq!(h.store.terminated_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_new_dispatches_but_finishes_in_flight() {
        let config = TerminationConfig {
            max_concurrency: 2,
            ..TerminationConfig::default()
        };
        let h = harness(config, Duration::from_secs(1));
        let ids = add_sessions(&h.registry, 6);

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            trigger.cancel();
        });

        let report = h
            .service
            .terminate_many(&admin(), ids, None, cancel)
            .await
            .unwrap();

        assert_eq!(report.succeeded, 2);
        assert_eq!(report.not_dispatched.len(), 4);
        assert_eq!(report.outcomes.len(), 6);
        assert_eq!(report.status, BulkStatus::Partial);
        let counts = h.registry.state_counts();
        assert_eq!(counts.terminated, 2);
        assert_eq!(counts.active, 4);
        assert_eq!(counts.termination_requested, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_deadline_stops_new_dispatches() {
        let config = TerminationConfig {
            max_concurrency: 2,
            batch_deadline_seconds: 1,
            ..TerminationConfig::default()
        };
        let h = harness(config, Duration::from_secs(2));
        let ids = add_sessions(&h.registry, 6);

        let report = h
            .service
            .terminate_many(&admin(), ids, None, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.succeeded, 2);
        assert_eq!(report.not_dispatched.len(), 4);
        assert_eq!(h.transport.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_caller_leaves_in_flight_dispatches_running() {
        let config = TerminationConfig {
            max_concurrency: 2,
            ..TerminationConfig::default()
        };
        let h = harness(config, Duration::from_secs(1));
        let ids = add_sessions(&h.registry, 6);
        let ctx = admin();

        let abandoned = tokio::time::timeout(
            Duration::from_millis(500),
            h.service
                .terminate_many(&ctx, ids, None, CancellationToken::new()),
        )
        .await;
        assert!(abandoned.is_err());

        tokio::time::sleep(Duration::from_secs(3)).await;
        let counts = h.registry.state_counts();
        assert_eq!(counts.terminated, 2);
        assert_eq!(counts.active, 4);
        assert_eq!(counts.termination_requested, 0);
        assert_eq!(h.store.terminated_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_termination_ack() {
        let h = harness(TerminationConfig::default(), Duration::from_millis(10));
        let id = add_session(&h.registry, "81000001", "10.0.0.1");
        let mut events = h.broadcaster.subscribe(Topic::Sessions);

        let outcome = h
            .service
            .terminate_one(&admin(), &id, None)
            .await
            .unwrap();

        assert!(outcome.succeeded);
        assert_eq!(h.registry.state_of(&id), Some(SessionState::Terminated));
        assert_eq!(h.store.terminate_cause(&id).as_deref(), Some("Admin-Terminated"));

        let event = events.recv().await.unwrap();
        match &event.payload {
            EventPayload::SessionTerminated {
                session_id, state, ..
            } => {
                assert_eq!(session_id, &id);
                assert_eq!(*state, SessionState::Terminated);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_termination_unknown_and_duplicate() {
        let h = harness(TerminationConfig::default(), Duration::from_millis(10));
        let err = h
            .service
            .terminate_one(&admin(), &SessionId::new("missing"), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);

        let id = add_session(&h.registry, "81000002", "10.0.0.1");
        assert!(h.registry.try_begin_termination(&id));
        let err = h
            .service
            .terminate_one(&admin(), &id, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::AlreadyInProgress);
        assert_eq!(h.transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_termination_failure_can_be_retried() {
        let h = harness(TerminationConfig::default(), Duration::from_millis(10));
        let id = add_session(&h.registry, "81000003", SILENT_NAS);

        let outcome = h
            .service
            .terminate_one(&admin(), &id, Some("Fraud"))
            .await
            .unwrap();
        assert!(!outcome.succeeded);
        assert_eq!(outcome.reason, TerminationReason::Timeout);
        assert_eq!(h.registry.state_of(&id), Some(SessionState::TerminationFailed));

        let again = h.service.terminate_one(&admin(), &id, None).await.unwrap();
        assert_eq!(again.reason, TerminationReason::Timeout);
        assert_eq!(h.transport.calls.load(Ordering::SeqCst), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_termination_recovers_from_failed_dispatch_task() {
        let h = harness(TerminationConfig::default(), Duration::from_millis(10));
        let id = add_session(&h.registry, "81000005", FAULTY_NAS);

        let outcome = h.service.terminate_one(&admin(), &id, None).await.unwrap();
        assert!(!outcome.succeeded);
        assert_eq!(outcome.reason, TerminationReason::NasUnreachable);
        assert_eq!(h.registry.state_of(&id), Some(SessionState::TerminationFailed));

        // Retrying is accepted rather than reported as in progress.
        let again = h.service.terminate_one(&admin(), &id, None).await.unwrap();
        assert_eq!(again.reason, TerminationReason::NasUnreachable);
        assert_eq!(h.transport.calls.load(Ordering::SeqCst), 2);
        assert_eq!(h.registry.state_counts().termination_requested, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bulk_records_failed_dispatch_task_as_failure() {
        let h = harness(TerminationConfig::default(), Duration::from_millis(10));
        let ids = vec![
            add_session(&h.registry, "f-1", FAULTY_NAS),
            add_session(&h.registry, "f-2", "10.0.0.1"),
        ];

        let report = h
            .service
            .terminate_many(&admin(), ids.clone(), None, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(h.registry.state_of(&ids[0]), Some(SessionState::TerminationFailed));
    }

    #[tokio::test(start_paused = true)]
    async fn test_termination_requires_permission() {
        let h = harness(TerminationConfig::default(), Duration::from_millis(10));
        let id = add_session(&h.registry, "81000004", "10.0.0.1");
        let viewer = RequestContext::new("op-2", OperatorRole::Accounting, "billing");

        let err = h
            .service
            .terminate_one(&viewer, &id, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authorization);

        let err = h
            .service
            .terminate_many(&viewer, vec![id.clone()], None, CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authorization);
        assert_eq!(h.registry.state_of(&id), Some(SessionState::Active));
    }

    #[test]
    fn test_resolve_reason_falls_back_on_blank() {
        assert_eq!(resolve_reason(None, "Admin-Terminated"), "Admin-Terminated");
        assert_eq!(resolve_reason(Some("  "), "Admin-Terminated"), "Admin-Terminated");
        assert_eq!(resolve_reason(Some(" Fraud "), "Admin-Terminated"), "Fraud");
    }
}
