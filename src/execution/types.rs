//! Execution types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::broker::{OrderHandle, OrderStatus};
use crate::order::OrderLeg;
use crate::planner::{OrderStrategy, PlanError};

/// Failures surfaced by plan execution
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    #[error("Not connected to the gateway")]
    Connectivity,
    #[error("Another order submission is still in flight")]
    SubmissionInProgress,
    #[error("Primary order rejected: {0}")]
    PrimaryRejected(String),
    #[error("Market order was not filled ({status})")]
    PrimaryNotFilled { status: OrderStatus },
    #[error("Leg {leg_index} not placed: {reason}")]
    LegPlacementFailure { leg_index: usize, reason: String },
    #[error("No terminal order status after {elapsed:?}")]
    Timeout { elapsed: Duration },
    #[error("Protective orders could not be built: {0}")]
    Protection(PlanError),
    #[error("Order plan rejected: {0}")]
    Plan(PlanError),
}

/// What happened to one leg
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LegStatus {
    Placed {
        order: OrderHandle,
    },
    /// Primary filled at the gateway
    Filled {
        order: OrderHandle,
        avg_fill_price: Decimal,
    },
    Rejected {
        reason: String,
    },
    TimedOut {
        order: OrderHandle,
    },
}

/// Per-leg execution record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegOutcome {
    /// Position of the leg in placement order
    pub index: usize,
    pub leg: OrderLeg,
    pub status: LegStatus,
}

impl LegOutcome {
    pub fn is_placed(&self) -> bool {
        matches!(
            self.status,
            LegStatus::Placed { .. } | LegStatus::Filled { .. }
        )
    }
}

/// Outcome of executing one plan, surfaced verbatim to the trader
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    pub summary: String,
    pub symbol: String,
    pub strategy: OrderStrategy,
    pub fill_price: Option<Decimal>,
    pub legs: Vec<LegOutcome>,
    /// Fatal error or first leg failure, written out as its message
    #[serde(serialize_with = "error_message", skip_deserializing)]
    pub error: Option<ExecutionError>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

fn error_message<S>(error: &Option<ExecutionError>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match error {
        Some(e) => serializer.serialize_some(&e.to_string()),
        None => serializer.serialize_none(),
    }
}

impl ExecutionResult {
    /// Result for a request that never became a plan; nothing was placed
    pub fn refused(symbol: &str, strategy: OrderStrategy, err: PlanError) -> Self {
        let now = Utc::now();
        let error = ExecutionError::Plan(err);
        Self {
            success: false,
            summary: error.to_string(),
            symbol: symbol.to_string(),
            strategy,
            fill_price: None,
            legs: Vec::new(),
            error: Some(error),
            started_at: now,
            finished_at: now,
        }
    }

    /// Legs that failed to place
    pub fn failures(&self) -> impl Iterator<Item = &LegOutcome> {
        self.legs.iter().filter(|l| !l.is_placed())
    }

    /// Number of protective/independent legs placed (excludes the primary)
    pub fn placed_count(&self) -> usize {
        self.legs
            .iter()
            .filter(|l| matches!(l.status, LegStatus::Placed { .. }))
            .count()
    }

    /// Some protection was placed but not all of it
    pub fn is_partial(&self) -> bool {
        !self.success && self.placed_count() > 0 && self.failures().count() > 0
    }
}
