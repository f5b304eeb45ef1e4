use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::engine::generator::random_order;
use crate::engine::notifications::NotificationQueue;
use crate::engine::policy::{RejectionOutcome, RejectionPolicy};
use crate::error::DispatchError;
use crate::models::earnings::{demo_history, DeliveryOutcome, DeliveryRecord, Earnings};
use crate::models::notification::{Notification, Severity};
use crate::models::order::{Order, OrderStatus, RejectionReason};
use crate::models::partner::{DocumentKind, Partner, PartnerUpdate};
use crate::models::session::{DeviceConditions, Screen, SessionView};

const REJECTION_BLOCK_MESSAGE: &str =
    "You are temporarily paused due to frequent order rejections. Please try again later.";
const EXPIRY_BLOCK_MESSAGE: &str =
    "You are temporarily paused due to frequent order rejections.";

/// Single owner of the partner session, the order lifecycle and the
/// notification list. Every operation is a synchronous read-modify-write;
/// callers that run on timers must go through the id-checked entry points
/// (`expire_request`, `auto_approve_verification`) so a late timer never
/// acts on state it was not scheduled for.
pub struct DispatchController {
    username: String,
    password: String,
    policy: RejectionPolicy,
    idle_warning_ticks: u32,
    is_authenticated: bool,
    partner: Option<Partner>,
    pending_request: Option<Order>,
    current_order: Option<Order>,
    earnings: Earnings,
    history: Vec<DeliveryRecord>,
    notifications: NotificationQueue,
    device: DeviceConditions,
    idle_ticks: u32,
    partner_revision: u64,
    rng: StdRng,
}

impl DispatchController {
    pub fn new(config: &Config) -> Self {
        let (earnings, history) = if config.demo_seed {
            (Earnings::demo(), demo_history())
        } else {
            (Earnings::default(), Vec::new())
        };

        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            username: config.demo_username.clone(),
            password: config.demo_password.clone(),
            policy: RejectionPolicy::from_config(config),
            idle_warning_ticks: config.idle_warning_ticks,
            is_authenticated: false,
            partner: None,
            pending_request: None,
            current_order: None,
            earnings,
            history,
            notifications: NotificationQueue::new(config.notification_capacity),
            device: DeviceConditions::default(),
            idle_ticks: 0,
            partner_revision: 0,
            rng,
        }
    }

    /// Checks the demo credentials and opens a session with the stored
    /// profile, or a fresh one when nothing was stored.
    pub fn login(
        &mut self,
        username: &str,
        password: &str,
        stored: Option<Partner>,
    ) -> Result<(), DispatchError> {
        if username != self.username || password != self.password {
            warn!(username, "login rejected");
            return Err(DispatchError::InvalidCredentials);
        }

        let partner = stored.unwrap_or_default();
        info!(partner_id = %partner.id, "partner logged in");
        self.is_authenticated = true;
        self.partner = Some(partner);
        self.touch_partner();
        Ok(())
    }

    /// Reopens a session persisted by an earlier run without re-writing it.
    pub fn restore_session(&mut self, partner: Partner) {
        info!(partner_id = %partner.id, "session restored");
        self.is_authenticated = true;
        self.partner = Some(partner);
    }

    pub fn logout(&mut self) {
        if let Some(partner) = &self.partner {
            info!(partner_id = %partner.id, "partner logged out");
        }
        self.is_authenticated = false;
        self.partner = None;
        self.current_order = None;
        self.pending_request = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated
    }

    pub fn screen(&self) -> Screen {
        match &self.partner {
            _ if !self.is_authenticated => Screen::Login,
            None => Screen::Login,
            Some(partner) if !partner.is_onboarded => Screen::Onboarding,
            Some(partner) if !partner.is_verified => Screen::VerificationPending,
            Some(_) => Screen::Home,
        }
    }

    pub fn session_view(&self) -> SessionView {
        SessionView {
            is_authenticated: self.is_authenticated,
            screen: self.screen(),
            partner: self.partner.clone(),
            device: self.device,
            idle_ticks: self.idle_ticks,
        }
    }

    pub fn partner(&self) -> Option<&Partner> {
        self.partner.as_ref()
    }

    /// Bumped on every partner mutation; the caller persists when it moves.
    pub fn partner_revision(&self) -> u64 {
        self.partner_revision
    }

    fn touch_partner(&mut self) {
        self.partner_revision += 1;
    }

    fn partner_mut(&mut self) -> Result<&mut Partner, DispatchError> {
        self.partner.as_mut().ok_or(DispatchError::NotLoggedIn)
    }

    pub fn update_partner_details(&mut self, update: PartnerUpdate) -> Result<&Partner, DispatchError> {
        self.partner_mut()?.apply(update);
        self.touch_partner();
        self.partner.as_ref().ok_or(DispatchError::NotLoggedIn)
    }

    pub fn attach_document(&mut self, kind: DocumentKind, uri: String) -> Result<(), DispatchError> {
        if uri.trim().is_empty() {
            return Err(DispatchError::Validation("Document URI is empty".to_string()));
        }
        self.partner_mut()?.attach_document(kind, uri);
        self.touch_partner();
        Ok(())
    }

    pub fn complete_onboarding(&mut self, now: DateTime<Utc>) -> Result<(), DispatchError> {
        let partner = self.partner_mut()?;
        if let Some(gap) = partner.onboarding_gap() {
            return Err(DispatchError::Validation(gap.to_string()));
        }
        partner.is_onboarded = true;
        info!(partner_id = %partner.id, "onboarding completed");

        self.touch_partner();
        self.notify("Onboarding completed! Awaiting verification...", Severity::Info, now);
        Ok(())
    }

    pub fn approve_verification(&mut self, now: DateTime<Utc>) -> Result<(), DispatchError> {
        let partner = self.partner_mut()?;
        if !partner.is_onboarded {
            return Err(DispatchError::NotOnboarded);
        }
        partner.is_verified = true;
        info!(partner_id = %partner.id, "partner verified");

        self.touch_partner();
        self.notify(
            "Your account has been verified! You can now go online.",
            Severity::Success,
            now,
        );
        Ok(())
    }

    /// Timer entry point: approves only a partner still waiting on review.
    pub fn auto_approve_verification(&mut self, now: DateTime<Utc>) -> bool {
        let waiting = self
            .partner
            .as_ref()
            .is_some_and(|partner| partner.is_onboarded && !partner.is_verified);

        waiting && self.approve_verification(now).is_ok()
    }

    pub fn set_device_conditions(&mut self, device: DeviceConditions) {
        self.device = device;
    }

    /// Flips online state. Returns the new value.
    pub fn toggle_online(&mut self, now: DateTime<Utc>) -> Result<bool, DispatchError> {
        if self.partner.is_none() {
            return Err(DispatchError::NotLoggedIn);
        }

        self.check_block_status(now);

        let has_current_order = self.current_order.is_some();
        let device = self.device;
        let partner = self.partner_mut()?;

        if partner.is_blocked {
            return Err(DispatchError::Blocked);
        }
        if !partner.is_verified {
            return Err(DispatchError::NotVerified);
        }
        if partner.is_online && has_current_order {
            return Err(DispatchError::ActiveDelivery);
        }

        let going_online = !partner.is_online;
        partner.is_online = going_online;
        info!(partner_id = %partner.id, online = going_online, "availability changed");
        self.touch_partner();

        if going_online && device.low_battery {
            self.notify(
                "Warning: Low battery detected. Charge your device soon.",
                Severity::Warning,
                now,
            );
        }
        if going_online && device.poor_network {
            self.notify("Warning: Poor network connection detected.", Severity::Warning, now);
        }

        let message = if going_online {
            "You are now online and ready to receive orders!"
        } else {
            "You are now offline."
        };
        self.notify(message, Severity::Info, now);

        Ok(going_online)
    }

    /// Lifts an expired block. Returns true when a block was lifted.
    pub fn check_block_status(&mut self, now: DateTime<Utc>) -> bool {
        let policy = self.policy;
        let Some(partner) = self.partner.as_mut() else {
            return false;
        };
        if !policy.lift_expired_block(partner, now) {
            return false;
        }

        info!(partner_id = %partner.id, "temporary block lifted");
        self.touch_partner();
        self.notify(
            "Your temporary block has been lifted. You can now go online.",
            Severity::Success,
            now,
        );
        true
    }

    pub fn record_idle_tick(&mut self, now: DateTime<Utc>) {
        self.idle_ticks = self.idle_ticks.saturating_add(1);

        let online = self.partner.as_ref().is_some_and(|partner| partner.is_online);
        if online && self.idle_ticks == self.idle_warning_ticks {
            self.notify(
                "You have been idle for a while. Stay active to receive orders!",
                Severity::Warning,
                now,
            );
        }
    }

    pub fn reset_idle(&mut self) {
        self.idle_ticks = 0;
    }

    pub fn idle_ticks(&self) -> u32 {
        self.idle_ticks
    }

    pub fn pending_request(&self) -> Option<&Order> {
        self.pending_request.as_ref()
    }

    pub fn current_order(&self) -> Option<&Order> {
        self.current_order.as_ref()
    }

    /// Offers a new request when the partner is online, unblocked and idle.
    /// Returns the offered order, or `None` when generation was skipped.
    pub fn generate_order_request(&mut self, now: DateTime<Utc>) -> Option<Order> {
        let eligible = self
            .partner
            .as_ref()
            .is_some_and(|partner| partner.is_online && !partner.is_blocked);
        if !eligible || self.current_order.is_some() || self.pending_request.is_some() {
            return None;
        }

        let order = random_order(&mut self.rng, now);
        info!(order_id = %order.id, code = %order.code, restaurant = %order.restaurant_name, "order request offered");

        self.notify(
            format!("New order request from {}!", order.restaurant_name),
            Severity::Info,
            now,
        );
        self.pending_request = Some(order.clone());
        Some(order)
    }

    pub fn accept_order(&mut self, now: DateTime<Utc>) -> Result<Order, DispatchError> {
        let mut order = self
            .pending_request
            .take()
            .ok_or(DispatchError::NoPendingRequest)?;
        order.status = OrderStatus::Accepted;

        let policy = self.policy;
        if let Some(partner) = self.partner.as_mut() {
            policy.record_acceptance(partner);
            self.touch_partner();
        }

        info!(order_id = %order.id, "order accepted");
        self.current_order = Some(order.clone());
        self.notify("Order accepted! Navigate to the restaurant.", Severity::Success, now);
        Ok(order)
    }

    pub fn reject_order(
        &mut self,
        reason: RejectionReason,
        now: DateTime<Utc>,
    ) -> Result<RejectionOutcome, DispatchError> {
        if self.pending_request.is_none() {
            return Err(DispatchError::NoPendingRequest);
        }
        if self.partner.is_none() {
            return Err(DispatchError::NotLoggedIn);
        }

        let outcome = self.drop_pending_request(reason, REJECTION_BLOCK_MESSAGE, now)?;
        if let RejectionOutcome::Counted { .. } = outcome {
            self.notify(format!("Order rejected: {reason}"), Severity::Info, now);
        }
        Ok(outcome)
    }

    /// Countdown entry point. Only expires the request it was armed for;
    /// returns `None` when that request is no longer pending.
    pub fn expire_request(&mut self, order_id: Uuid, now: DateTime<Utc>) -> Option<RejectionOutcome> {
        let still_pending = self
            .pending_request
            .as_ref()
            .is_some_and(|order| order.id == order_id);
        if !still_pending {
            return None;
        }

        let outcome = if self.partner.is_some() {
            self.drop_pending_request(RejectionReason::Other, EXPIRY_BLOCK_MESSAGE, now)
                .ok()
        } else {
            self.pending_request = None;
            None
        };
        self.notify("Order request expired", Severity::Info, now);
        outcome
    }

    fn drop_pending_request(
        &mut self,
        reason: RejectionReason,
        block_message: &str,
        now: DateTime<Utc>,
    ) -> Result<RejectionOutcome, DispatchError> {
        let order = self
            .pending_request
            .take()
            .ok_or(DispatchError::NoPendingRequest)?;
        let policy = self.policy;
        let partner = self.partner_mut()?;
        let outcome = policy.record_rejection(partner, now);
        let partner_id = partner.id.clone();
        self.touch_partner();

        match outcome {
            RejectionOutcome::Counted { consecutive } => {
                info!(order_id = %order.id, reason = %reason, consecutive, "order request dropped");
            }
            RejectionOutcome::Blocked { until } => {
                warn!(order_id = %order.id, reason = %reason, partner_id = %partner_id, until = %until, "partner blocked after repeated rejections");
                self.notify(block_message, Severity::Warning, now);
            }
        }
        Ok(outcome)
    }

    /// Moves the current order exactly one step forward. `delivered` is
    /// only reachable through [`Self::complete_delivery`].
    pub fn advance_order(
        &mut self,
        target: OrderStatus,
        now: DateTime<Utc>,
    ) -> Result<Order, DispatchError> {
        let order = self
            .current_order
            .as_mut()
            .ok_or(DispatchError::NoActiveOrder)?;

        let from = order.status;
        if target == OrderStatus::Delivered || from.next() != Some(target) {
            return Err(DispatchError::InvalidTransition { from, to: target });
        }
        order.status = target;
        let updated = order.clone();
        info!(order_id = %updated.id, status = %target, "order status advanced");

        let message = match target {
            OrderStatus::ReachedRestaurant => Some("Marked as reached restaurant"),
            OrderStatus::PickedUp => Some("Order picked up! Navigate to customer."),
            OrderStatus::ReachedCustomer => Some("Reached customer location"),
            _ => None,
        };
        if let Some(message) = message {
            self.notify(message, Severity::Info, now);
        }
        Ok(updated)
    }

    /// Closes the current order when `pin` matches its delivery PIN.
    pub fn complete_delivery(
        &mut self,
        pin: &str,
        now: DateTime<Utc>,
    ) -> Result<DeliveryRecord, DispatchError> {
        if self.partner.is_none() {
            return Err(DispatchError::NoActiveOrder);
        }
        let order = self
            .current_order
            .as_ref()
            .ok_or(DispatchError::NoActiveOrder)?;
        if pin != order.delivery_pin {
            warn!(order_id = %order.id, "delivery pin mismatch");
            return Err(DispatchError::InvalidPin);
        }

        let mut order = self
            .current_order
            .take()
            .ok_or(DispatchError::NoActiveOrder)?;
        order.status = OrderStatus::Delivered;
        order.completed_at = Some(now);

        let record = DeliveryRecord {
            id: self.history.len() as u64 + 1,
            order_id: Some(order.id),
            order_code: order.code.clone(),
            date: now.date_naive(),
            restaurant_name: order.restaurant_name.clone(),
            drop_area: order.drop_area.clone(),
            outcome: DeliveryOutcome::Delivered,
            earnings: order.estimated_earnings,
        };

        self.earnings.record_delivery(order.estimated_earnings);
        self.history.insert(0, record.clone());
        info!(order_id = %order.id, earnings = order.estimated_earnings, "delivery completed");

        self.notify(
            format!("Delivery completed! Earned ₹{}", order.estimated_earnings),
            Severity::Success,
            now,
        );
        Ok(record)
    }

    pub fn earnings(&self) -> Earnings {
        self.earnings
    }

    pub fn history(&self) -> &[DeliveryRecord] {
        &self.history
    }

    pub fn notify(&mut self, message: impl Into<String>, severity: Severity, now: DateTime<Utc>) {
        self.notifications.push(message, severity, now);
    }

    pub fn dismiss_notification(&mut self, id: u64) -> bool {
        self.notifications.dismiss(id)
    }

    pub fn notifications(&self) -> &NotificationQueue {
        &self.notifications
    }

    pub fn latest_notification(&self) -> Option<&Notification> {
        self.notifications.latest()
    }

    #[cfg(test)]
    pub(crate) fn set_pending_request(&mut self, order: Order) {
        self.pending_request = Some(order);
    }
}
