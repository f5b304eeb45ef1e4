//! Scheduled callbacks that drive the controller without user input.
//!
//! Each task owns a `CancellationToken` (a child of the service shutdown
//! token) and re-checks controller state when it fires. Cancellation only
//! stops a task that has not fired yet; the controller-side checks cover
//! the rest.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::order::Order;
use crate::state::AppState;

/// Offers a new request if the partner is eligible and arms its countdown.
pub async fn offer_order(state: &Arc<AppState>) -> Option<Order> {
    let order = state
        .act(|controller, now| controller.generate_order_request(now))
        .await?;

    state.metrics.order_requests_total.inc();
    arm_request_countdown(state, order.id);
    Some(order)
}

/// Expires the pending request `order_id` once the request timeout elapses,
/// unless it is accepted, rejected or cancelled first.
pub fn arm_request_countdown(state: &Arc<AppState>, order_id: Uuid) {
    let token = state.shutdown.child_token();
    state.request_timers.insert(order_id, token.clone());

    let state = state.clone();
    let timeout = state.config.request_timeout;
    tokio::spawn(async move {
        tokio::select! {
            _ = token.cancelled() => {
                debug!(order_id = %order_id, "request countdown cancelled");
            }
            _ = sleep(timeout) => {
                state.request_timers.remove(&order_id);
                let outcome = state
                    .act(move |controller, now| controller.expire_request(order_id, now))
                    .await;
                match outcome {
                    Some(outcome) => {
                        info!(order_id = %order_id, "order request expired");
                        state.observe_rejection(&outcome, "expired");
                    }
                    None => debug!(order_id = %order_id, "countdown fired for a request that is gone"),
                }
            }
        }
    });
}

/// Offers orders after a randomized delay for as long as the service runs.
pub async fn run_order_feed(state: Arc<AppState>) {
    info!("order feed started");
    let min = state.config.order_delay_min;
    let max = state.config.order_delay_max;

    loop {
        let delay = random_delay(min, max);
        tokio::select! {
            _ = state.shutdown.cancelled() => break,
            _ = sleep(delay) => {}
        }
        offer_order(&state).await;
    }

    info!("order feed stopped");
}

fn random_delay(min: Duration, max: Duration) -> Duration {
    if max <= min {
        return min;
    }
    let millis = rand::thread_rng().gen_range(min.as_millis()..=max.as_millis());
    Duration::from_millis(millis as u64)
}

/// Polls for an expired block and lifts it.
pub async fn run_block_monitor(state: Arc<AppState>) {
    info!(interval = ?state.config.block_poll_interval, "block monitor started");
    let mut ticker = interval(state.config.block_poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = state.shutdown.cancelled() => break,
            _ = ticker.tick() => {
                state.act(|controller, now| controller.check_block_status(now)).await;
            }
        }
    }

    info!("block monitor stopped");
}

pub async fn run_idle_ticker(state: Arc<AppState>) {
    let mut ticker = interval(state.config.idle_tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // the first tick completes immediately
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = state.shutdown.cancelled() => break,
            _ = ticker.tick() => {
                state.act(|controller, now| controller.record_idle_tick(now)).await;
            }
        }
    }
}

/// Simulated back-office review after onboarding.
pub fn schedule_verification(state: &Arc<AppState>) {
    let state = state.clone();
    let token = state.shutdown.child_token();
    let delay = state.config.verification_delay;

    tokio::spawn(async move {
        tokio::select! {
            _ = token.cancelled() => {}
            _ = sleep(delay) => {
                let approved = state
                    .act(|controller, now| controller.auto_approve_verification(now))
                    .await;
                if approved {
                    info!("verification auto-approved");
                }
            }
        }
    });
}

/// Removes a notification once its display time has passed.
pub fn schedule_dismissal(state: &Arc<AppState>, notification_id: u64) {
    let state = state.clone();
    let token = state.shutdown.child_token();
    let ttl = state.config.notification_ttl;

    tokio::spawn(async move {
        tokio::select! {
            _ = token.cancelled() => {}
            _ = sleep(ttl) => {
                state
                    .act(move |controller, _now| controller.dismiss_notification(notification_id))
                    .await;
            }
        }
    });
}

/// Starts the long-running timers. They stop when `state.shutdown` fires.
pub fn spawn_background(state: &Arc<AppState>) {
    tokio::spawn(run_order_feed(state.clone()));
    tokio::spawn(run_block_monitor(state.clone()));
    tokio::spawn(run_idle_ticker(state.clone()));
}
