//! Application state shared across all handlers.

use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;

use hotspot_auth::{JwtDecoder, RbacEnforcer};
use hotspot_coa::CoaDispatcher;
use hotspot_core::config::AppConfig;
use hotspot_realtime::{EventBroadcaster, RouterHealthMonitor, SessionMonitor};
use hotspot_service::{AccountingService, SessionMaintenance, SessionService, TerminationService};
use hotspot_session::{SessionRegistry, SessionStore};

/// Shared dependencies, passed to every handler via `State<AppState>`.
///
/// All fields are cheap to clone.
#[derive(Debug, Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    pub config: Arc<AppConfig>,

    // ── Auth ─────────────────────────────────────────────────
    pub jwt_decoder: Arc<JwtDecoder>,
    pub rbac: Arc<RbacEnforcer>,

    // ── Core ─────────────────────────────────────────────────
    pub registry: Arc<SessionRegistry>,
    pub dispatcher: Arc<CoaDispatcher>,
    pub broadcaster: Arc<EventBroadcaster>,
    pub session_monitor: SessionMonitor,
    pub router_monitor: RouterHealthMonitor,

    // ── Services ─────────────────────────────────────────────
    pub session_service: Arc<SessionService>,
    pub accounting_service: Arc<AccountingService>,
    pub termination_service: Arc<TerminationService>,
    pub maintenance: SessionMaintenance,

    // ── Lifecycle ────────────────────────────────────────────
    /// Fires when the server begins shutting down.
    pub shutdown: CancellationToken,
    pub started_at: Instant,
}

impl AppState {
    /// Wire every component around an empty registry.
    pub fn new(config: AppConfig, store: Arc<dyn SessionStore>, dispatcher: CoaDispatcher) -> Self {
        let registry = Arc::new(SessionRegistry::new());
        let dispatcher = Arc::new(dispatcher);
        let broadcaster = Arc::new(EventBroadcaster::new(config.realtime.channel_buffer_size));
        let rbac = Arc::new(RbacEnforcer::new());
        let jwt_decoder = Arc::new(JwtDecoder::new(&config.auth));

        let session_monitor = SessionMonitor::new(Arc::clone(&registry), Arc::clone(&broadcaster));
        let router_monitor =
            RouterHealthMonitor::new(Arc::clone(dispatcher.health()), Arc::clone(&broadcaster));

        let session_service = Arc::new(SessionService::new(Arc::clone(&registry), Arc::clone(&rbac)));
        let accounting_service = Arc::new(AccountingService::new(
            Arc::clone(&registry),
            Arc::clone(&broadcaster),
            Arc::clone(&rbac),
        ));
        let termination_service = Arc::new(TerminationService::new(
            Arc::clone(&registry),
            Arc::clone(&dispatcher),
            Arc::clone(&store),
            Arc::clone(&broadcaster),
            Arc::clone(&rbac),
            config.termination.clone(),
        ));
        let maintenance =
            SessionMaintenance::new(Arc::clone(&registry), store, session_monitor.clone());

        Self {
            config: Arc::new(config),
            jwt_decoder,
            rbac,
            registry,
            dispatcher,
            broadcaster,
            session_monitor,
            router_monitor,
            session_service,
            accounting_service,
            termination_service,
            maintenance,
            shutdown: CancellationToken::new(),
            started_at: Instant::now(),
        }
    }
}
