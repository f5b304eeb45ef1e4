use chrono::{DateTime, TimeDelta, Utc};

use crate::config::Config;
use crate::models::partner::Partner;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionOutcome {
    Counted { consecutive: u32 },
    Blocked { until: DateTime<Utc> },
}

/// Consecutive-rejection counter with a timed block once the threshold is hit.
#[derive(Debug, Clone, Copy)]
pub struct RejectionPolicy {
    pub threshold: u32,
    pub block_duration: TimeDelta,
}

impl RejectionPolicy {
    pub fn new(threshold: u32, block_duration: std::time::Duration) -> Self {
        Self {
            threshold,
            block_duration: TimeDelta::from_std(block_duration).unwrap_or(TimeDelta::MAX),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.rejection_threshold, config.block_duration)
    }

    /// Counts a rejection or expiry. Crossing the threshold blocks the
    /// partner and takes them offline.
    pub fn record_rejection(&self, partner: &mut Partner, now: DateTime<Utc>) -> RejectionOutcome {
        partner.rejection_count = partner.rejection_count.saturating_add(1);

        if partner.rejection_count >= self.threshold {
            let until = now
                .checked_add_signed(self.block_duration)
                .unwrap_or(DateTime::<Utc>::MAX_UTC);
            partner.is_blocked = true;
            partner.block_ends_at = Some(until);
            partner.is_online = false;
            return RejectionOutcome::Blocked { until };
        }

        RejectionOutcome::Counted {
            consecutive: partner.rejection_count,
        }
    }

    pub fn record_acceptance(&self, partner: &mut Partner) {
        partner.rejection_count = 0;
    }

    /// Clears an expired block. Returns true when the block was lifted.
    pub fn lift_expired_block(&self, partner: &mut Partner, now: DateTime<Utc>) -> bool {
        match (partner.is_blocked, partner.block_ends_at) {
            (true, Some(until)) if now > until => {
                partner.is_blocked = false;
                partner.block_ends_at = None;
                partner.rejection_count = 0;
                true
            }
            _ => false,
        }
    }
}
