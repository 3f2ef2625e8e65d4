//! Types for the usage ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Subscription tier of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Plan {
    Free,
    Basic,
    Pro,
}

impl Plan {
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Basic => "basic",
            Plan::Pro => "pro",
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Plan {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(Plan::Free),
            "basic" => Ok(Plan::Basic),
            "pro" => Ok(Plan::Pro),
            other => Err(format!("unknown plan: {}", other)),
        }
    }
}

/// Monthly processed-duration limits per plan, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanLimits {
    #[serde(default = "default_free_limit")]
    pub free: f64,
    #[serde(default = "default_basic_limit")]
    pub basic: f64,
    #[serde(default = "default_pro_limit")]
    pub pro: f64,
}

fn default_free_limit() -> f64 {
    1_800.0 // 30 minutes
}

fn default_basic_limit() -> f64 {
    18_000.0 // 5 hours
}

fn default_pro_limit() -> f64 {
    72_000.0 // 20 hours
}

impl Default for PlanLimits {
    fn default() -> Self {
        Self {
            free: default_free_limit(),
            basic: default_basic_limit(),
            pro: default_pro_limit(),
        }
    }
}

impl PlanLimits {
    /// Monthly limit in seconds for the given plan.
    pub fn monthly_limit(&self, plan: Plan) -> f64 {
        match plan {
            Plan::Free => self.free,
            Plan::Basic => self.basic,
            Plan::Pro => self.pro,
        }
    }

    /// Iterates over every plan and its limit.
    pub fn iter(&self) -> impl Iterator<Item = (Plan, f64)> + '_ {
        [Plan::Free, Plan::Basic, Plan::Pro]
            .into_iter()
            .map(move |plan| (plan, self.monthly_limit(plan)))
    }
}

/// A user as seen by the ledger. Only the plan matters here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: String,
    pub plan: Plan,
}

/// Accumulated processed duration for one user, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub user_id: String,
    pub monthly_usage: f64,
    pub total_usage: f64,
    pub updated_at: DateTime<Utc>,
}

/// A user's standing against their plan for the current cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageSummary {
    pub user_id: String,
    pub plan: Plan,
    pub monthly_limit: f64,
    pub monthly_usage: f64,
    pub total_usage: f64,
    pub remaining: f64,
}
