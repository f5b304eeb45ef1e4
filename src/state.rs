use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::{broadcast, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::warn;
use uuid::Uuid;

use crate::config::Config;
use crate::engine::lifecycle::DispatchController;
use crate::engine::policy::RejectionOutcome;
use crate::engine::timers;
use crate::error::DispatchError;
use crate::models::notification::Notification;
use crate::models::session::SessionView;
use crate::observability::metrics::Metrics;
use crate::storage::{self, KeyValueStore, StoreError};

pub struct AppState {
    pub config: Config,
    controller: Mutex<DispatchController>,
    pub store: Arc<dyn KeyValueStore>,
    pub notification_tx: broadcast::Sender<Notification>,
    /// Countdown per pending request, keyed by order id.
    pub request_timers: DashMap<Uuid, CancellationToken>,
    pub shutdown: CancellationToken,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn KeyValueStore>) -> Self {
        let (notification_tx, _unused_rx) = broadcast::channel(config.event_buffer_size);

        Self {
            controller: Mutex::new(DispatchController::new(&config)),
            config,
            store,
            notification_tx,
            request_timers: DashMap::new(),
            shutdown: CancellationToken::new(),
            metrics: Metrics::new(),
        }
    }

    /// Reopens the session persisted by a previous run, if any.
    pub async fn restore_session(&self) -> Result<bool, StoreError> {
        let Some(partner) = storage::load_session(self.store.as_ref()).await? else {
            return Ok(false);
        };

        self.controller.lock().await.restore_session(partner);
        Ok(true)
    }

    pub async fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&DispatchController) -> R,
    {
        let controller = self.controller.lock().await;
        f(&*controller)
    }

    /// Runs one controller operation. Persists the partner when the
    /// operation changed it and publishes any notifications it raised.
    pub async fn act<F, R>(self: &Arc<Self>, f: F) -> R
    where
        F: FnOnce(&mut DispatchController, DateTime<Utc>) -> R + Send,
        R: Send,
    {
        let mut controller = self.controller.lock().await;
        let revision = controller.partner_revision();
        let last_notification = controller.notifications().last_id();

        let result = f(&mut *controller, Utc::now());

        if controller.partner_revision() != revision {
            if let Some(partner) = controller.partner() {
                if let Err(err) = storage::save_partner(self.store.as_ref(), partner).await {
                    warn!(error = %err, partner_id = %partner.id, "failed to persist partner");
                }
            }
        }

        let fresh = controller.notifications().since(last_notification);
        self.metrics
            .notifications_pending
            .set(controller.notifications().len() as i64);
        drop(controller);

        for notification in fresh {
            timers::schedule_dismissal(self, notification.id);
            let _ = self.notification_tx.send(notification);
        }

        result
    }

    pub async fn login(
        self: &Arc<Self>,
        username: String,
        password: String,
    ) -> Result<SessionView, DispatchError> {
        tokio::time::sleep(self.config.login_delay).await;

        let stored = match storage::load_partner(self.store.as_ref()).await {
            Ok(partner) => partner,
            Err(err) => {
                warn!(error = %err, "stored partner unreadable; starting fresh");
                None
            }
        };

        let view = self
            .act(move |controller, _now| {
                controller.login(&username, &password, stored)?;
                Ok::<_, DispatchError>(controller.session_view())
            })
            .await?;

        if let Err(err) = storage::set_authenticated(self.store.as_ref(), true).await {
            warn!(error = %err, "failed to persist auth flag");
        }
        Ok(view)
    }

    pub async fn logout(self: &Arc<Self>) {
        self.act(|controller, _now| controller.logout()).await;
        self.cancel_request_timers();

        if let Err(err) = storage::set_authenticated(self.store.as_ref(), false).await {
            warn!(error = %err, "failed to clear auth flag");
        }
    }

    pub fn cancel_request_timer(&self, order_id: Uuid) {
        if let Some((_, token)) = self.request_timers.remove(&order_id) {
            token.cancel();
        }
    }

    pub fn cancel_request_timers(&self) {
        for entry in self.request_timers.iter() {
            entry.value().cancel();
        }
        self.request_timers.clear();
    }

    pub fn observe_rejection(&self, outcome: &RejectionOutcome, label: &str) {
        self.metrics.outcome(label);
        if let RejectionOutcome::Blocked { .. } = outcome {
            self.metrics.partner_blocks_total.inc();
        }
    }
}
