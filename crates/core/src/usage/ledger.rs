//! Quota checks and usage recording.

use std::sync::Arc;

use tracing::{debug, warn};

use super::{PlanLimits, UsageError, UsageRecord, UsageStore, UsageSummary};
use crate::metrics;

/// Answers "is this user within quota" and records consumption.
///
/// The check is advisory: it is not transactional with the conversion that
/// follows it or with the increment recorded afterwards. Two jobs for the same
/// user running on different workers can both pass the check before either
/// records its usage, so a user may overshoot their limit by at most one job
/// per concurrent worker.
#[derive(Clone)]
pub struct UsageLedger {
    store: Arc<dyn UsageStore>,
    limits: PlanLimits,
}

impl UsageLedger {
    pub fn new(store: Arc<dyn UsageStore>, limits: PlanLimits) -> Self {
        Self { store, limits }
    }

    pub fn limits(&self) -> &PlanLimits {
        &self.limits
    }

    /// Returns whether `additional_secs` more processing fits in the user's
    /// monthly limit.
    ///
    /// A missing or unreadable usage record counts as zero prior usage. A
    /// failed user lookup is returned as an error.
    pub fn check_limit(&self, user_id: &str, additional_secs: f64) -> Result<bool, UsageError> {
        validate_duration(additional_secs)?;

        let user = self
            .store
            .find_user(user_id)?
            .ok_or_else(|| UsageError::UserNotFound(user_id.to_string()))?;

        let limit = self.limits.monthly_limit(user.plan);

        let used = match self.store.find_usage(user_id) {
            Ok(Some(record)) => record.monthly_usage,
            Ok(None) => 0.0,
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Usage lookup failed, treating as no prior usage");
                0.0
            }
        };

        let allowed = used + additional_secs <= limit;
        debug!(
            user_id = %user_id,
            plan = %user.plan,
            limit,
            used,
            additional = additional_secs,
            allowed,
            "Checked usage limit"
        );

        Ok(allowed)
    }

    /// Records `duration_secs` of processing for the user.
    ///
    /// Must be called exactly once per successfully processed job.
    pub fn record_usage(&self, user_id: &str, duration_secs: f64) -> Result<(), UsageError> {
        validate_duration(duration_secs)?;
        self.store.increment_usage(user_id, duration_secs)?;
        metrics::USAGE_SECONDS_RECORDED.inc_by(duration_secs);
        debug!(user_id = %user_id, duration_secs, "Recorded usage");
        Ok(())
    }

    /// Current usage record for a user, if any.
    pub fn usage(&self, user_id: &str) -> Result<Option<UsageRecord>, UsageError> {
        self.store.find_usage(user_id)
    }

    /// Plan, limit and consumption for a user. `None` if the user is unknown.
    pub fn summary(&self, user_id: &str) -> Result<Option<UsageSummary>, UsageError> {
        let Some(user) = self.store.find_user(user_id)? else {
            return Ok(None);
        };

        let record = self.store.find_usage(user_id)?;
        let (monthly_usage, total_usage) = record
            .map(|r| (r.monthly_usage, r.total_usage))
            .unwrap_or((0.0, 0.0));
        let monthly_limit = self.limits.monthly_limit(user.plan);

        Ok(Some(UsageSummary {
            user_id: user.id,
            plan: user.plan,
            monthly_limit,
            monthly_usage,
            total_usage,
            remaining: (monthly_limit - monthly_usage).max(0.0),
        }))
    }
}

fn validate_duration(secs: f64) -> Result<(), UsageError> {
    if !secs.is_finite() || secs < 0.0 {
        return Err(UsageError::InvalidDuration(secs));
    }
    Ok(())
}
