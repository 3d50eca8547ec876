//! Plan execution against a broker
//!
//! Walks an [`OrderLegPlan`] step by step: the primary order is placed and
//! awaited to a terminal status under a wall-clock ceiling, then independent
//! and fill-derived legs are placed in order with pacing between them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

use super::{ExecutionError, ExecutionResult, LegOutcome, LegStatus};
use crate::broker::{Broker, OrderHandle, OrderStatus, OrderStatusReport};
use crate::config::ExecutionConfig;
use crate::order::{OrderKind, OrderLeg};
use crate::planner::{OrderLegPlan, OrderStrategy, PlanStep};
use crate::telemetry::{increment, record_latency, CounterMetric, LatencyMetric};

/// Executes order plans one at a time
pub struct ExecutionCoordinator {
    broker: Arc<dyn Broker>,
    config: ExecutionConfig,
    in_flight: Mutex<()>,
}

impl ExecutionCoordinator {
    pub fn new(broker: Arc<dyn Broker>, config: ExecutionConfig) -> Self {
        Self {
            broker,
            config,
            in_flight: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    /// A submission is currently in flight
    pub fn is_busy(&self) -> bool {
        self.in_flight.try_lock().is_err()
    }

    /// Execute a plan and report what was placed
    ///
    /// Never panics and never returns early with an error: every failure is
    /// folded into the returned [`ExecutionResult`].
    pub async fn execute_plan(&self, plan: &OrderLegPlan) -> ExecutionResult {
        let started_at = Utc::now();

        let Ok(_guard) = self.in_flight.try_lock() else {
            increment(CounterMetric::SubmissionsRefused);
            tracing::warn!(symbol = %plan.symbol, "Submission refused: another is in flight");
            return Run::new(plan, started_at).abort(ExecutionError::SubmissionInProgress);
        };

        increment(CounterMetric::PlansExecuted);
        let clock = Instant::now();
        tracing::info!(
            symbol = %plan.symbol,
            strategy = plan.strategy.id(),
            action = %plan.action,
            quantity = plan.quantity,
            "Executing order plan"
        );

        let result = self.run(Run::new(plan, started_at)).await;
        record_latency(LatencyMetric::PlanExecution, clock.elapsed());

        if result.success {
            tracing::info!(symbol = %plan.symbol, summary = %result.summary, "Order plan executed");
        } else {
            tracing::warn!(symbol = %plan.symbol, summary = %result.summary, "Order plan incomplete");
        }
        result
    }

    async fn run(&self, mut run: Run<'_>) -> ExecutionResult {
        if !self.broker.is_connected() {
            return run.abort(ExecutionError::Connectivity);
        }

        let plan = run.plan;
        let mut previous: Option<Option<String>> = None;

        for step in &plan.steps {
            match step {
                PlanStep::Primary { leg } => {
                    if let Err(err) = self.execute_primary(&mut run, leg).await {
                        return run.abort(err);
                    }
                }
                PlanStep::Independent { leg } => {
                    self.place_leg(&mut run, leg, &mut previous).await;
                }
                PlanStep::OnFill { protection } => {
                    let Some(fill_price) = run.fill_price else {
                        return run.abort(ExecutionError::PrimaryRejected(
                            "no filled primary order to protect".to_string(),
                        ));
                    };
                    let legs = match protection.legs(fill_price) {
                        Ok(legs) => legs,
                        Err(err) => {
                            tracing::error!(
                                symbol = %plan.symbol,
                                %fill_price,
                                error = %err,
                                "Position filled but protection could not be built"
                            );
                            return run.abort(ExecutionError::Protection(err));
                        }
                    };
                    for leg in &legs {
                        self.place_leg(&mut run, leg, &mut previous).await;
                    }
                }
            }
        }

        run.finish()
    }

    /// Place the primary order and wait for a fill
    async fn execute_primary(&self, run: &mut Run<'_>, leg: &OrderLeg) -> Result<(), ExecutionError> {
        let plan = run.plan;
        let symbol = plan.symbol.as_str();
        let placed_at = Instant::now();

        let order = match self.broker.place_order(symbol, leg).await {
            Ok(order) => order,
            Err(err) => {
                increment(CounterMetric::LegsRejected);
                tracing::error!(symbol, order_leg = %leg, error = %err, "Primary order rejected");
                run.record(leg, LegStatus::Rejected { reason: err.to_string() });
                return Err(ExecutionError::PrimaryRejected(err.to_string()));
            }
        };
        increment(CounterMetric::LegsPlaced);
        tracing::info!(symbol, %order, order_leg = %leg, "Primary order placed");

        let waited =
            tokio::time::timeout(self.config.fill_timeout(), self.await_terminal(order)).await;

        let report = match waited {
            Ok(Some(report)) => report,
            Ok(None) | Err(_) => {
                let elapsed = placed_at.elapsed();
                tracing::warn!(symbol, %order, ?elapsed, "Primary order did not reach a terminal status");
                run.record(leg, LegStatus::TimedOut { order });
                self.cancel_primary(order).await;
                return Err(ExecutionError::Timeout { elapsed });
            }
        };
        record_latency(LatencyMetric::PrimaryFill, placed_at.elapsed());

        if report.status != OrderStatus::Filled {
            tracing::warn!(symbol, %order, status = %report.status, "Primary order not filled");
            run.record(
                leg,
                LegStatus::Rejected {
                    reason: format!("order {}", report.status),
                },
            );
            return Err(ExecutionError::PrimaryNotFilled {
                status: report.status,
            });
        }

        tracing::info!(symbol, %order, fill_price = %report.avg_fill_price, "Primary order filled");
        run.fill_price = Some(report.avg_fill_price);
        run.record(
            leg,
            LegStatus::Filled {
                order,
                avg_fill_price: report.avg_fill_price,
            },
        );
        Ok(())
    }

    /// Poll until a terminal status, at most `max_fill_polls` times
    async fn await_terminal(&self, order: OrderHandle) -> Option<OrderStatusReport> {
        for poll in 0..self.config.max_fill_polls {
            if poll > 0 {
                tokio::time::sleep(self.config.fill_poll_interval()).await;
            }
            match self.broker.poll_order_status(order).await {
                Ok(report) if report.status.is_terminal() => return Some(report),
                Ok(report) => {
                    tracing::debug!(%order, poll, status = %report.status, "Waiting for fill");
                }
                Err(err) => {
                    tracing::warn!(%order, poll, error = %err, "Order status poll failed");
                }
            }
        }
        None
    }

    async fn cancel_primary(&self, order: OrderHandle) {
        if !self.config.cancel_on_timeout {
            return;
        }
        match self.broker.cancel_order(order).await {
            Ok(()) => tracing::info!(%order, "Cancelled unfilled primary order"),
            Err(err) => tracing::error!(%order, error = %err, "Failed to cancel primary order"),
        }
    }

    /// Place one non-primary leg; failures are recorded, never propagated
    async fn place_leg(
        &self,
        run: &mut Run<'_>,
        leg: &OrderLeg,
        previous: &mut Option<Option<String>>,
    ) {
        if let Some(prev_group) = previous.as_ref() {
            let same_pair = leg.oco_group.is_some() && *prev_group == leg.oco_group;
            let pause = if same_pair {
                self.config.oco_pacing()
            } else {
                self.config.leg_pacing()
            };
            tokio::time::sleep(pause).await;
        }
        *previous = Some(leg.oco_group.clone());

        let plan = run.plan;
        let symbol = plan.symbol.as_str();
        match self.broker.place_order(symbol, leg).await {
            Ok(order) => {
                increment(CounterMetric::LegsPlaced);
                tracing::info!(symbol, %order, order_leg = %leg, "Order placed");
                run.record(leg, LegStatus::Placed { order });
            }
            Err(err) => {
                increment(CounterMetric::LegsRejected);
                let leg_index = run.legs.len();
                tracing::error!(symbol, leg_index, order_leg = %leg, error = %err, "Order placement failed");
                run.record(leg, LegStatus::Rejected { reason: err.to_string() });
                run.first_failure.get_or_insert(ExecutionError::LegPlacementFailure {
                    leg_index,
                    reason: err.to_string(),
                });
            }
        }
    }
}

/// Accumulates outcomes while a plan runs
struct Run<'a> {
    plan: &'a OrderLegPlan,
    started_at: DateTime<Utc>,
    fill_price: Option<Decimal>,
    legs: Vec<LegOutcome>,
    first_failure: Option<ExecutionError>,
}

impl<'a> Run<'a> {
    fn new(plan: &'a OrderLegPlan, started_at: DateTime<Utc>) -> Self {
        Self {
            plan,
            started_at,
            fill_price: None,
            legs: Vec::new(),
            first_failure: None,
        }
    }

    fn record(&mut self, leg: &OrderLeg, status: LegStatus) {
        self.legs.push(LegOutcome {
            index: self.legs.len(),
            leg: leg.clone(),
            status,
        });
    }

    fn abort(self, err: ExecutionError) -> ExecutionResult {
        if !matches!(err, ExecutionError::SubmissionInProgress) {
            increment(CounterMetric::PlansAborted);
        }
        let summary = match self.fill_price {
            Some(fill) => format!(
                "{} {} shares of {} filled at ${:.2}, but {}.",
                self.plan.action, self.plan.quantity, self.plan.symbol, fill, err
            ),
            None => err.to_string(),
        };
        self.into_result(false, summary, Some(err))
    }

    fn finish(self) -> ExecutionResult {
        let mut summary = self.summary();
        let failed: Vec<&LegOutcome> = self.legs.iter().filter(|l| !l.is_placed()).collect();
        if let Some(first) = failed.first() {
            let reason = match &first.status {
                LegStatus::Rejected { reason } => reason.as_str(),
                _ => "not placed",
            };
            summary.push_str(&format!(
                " {} of {} orders failed ({}).",
                failed.len(),
                self.legs.len(),
                reason
            ));
        }
        let error = self.first_failure.clone();
        self.into_result(error.is_none(), summary, error)
    }

    fn into_result(self, success: bool, summary: String, error: Option<ExecutionError>) -> ExecutionResult {
        ExecutionResult {
            success,
            summary,
            symbol: self.plan.symbol.clone(),
            strategy: self.plan.strategy,
            fill_price: self.fill_price,
            legs: self.legs,
            error,
            started_at: self.started_at,
            finished_at: Utc::now(),
        }
    }

    fn placed_after_primary(&self) -> impl Iterator<Item = &OrderLeg> {
        self.legs
            .iter()
            .filter(|o| matches!(o.status, LegStatus::Placed { .. }))
            .map(|o| &o.leg)
    }

    /// Confirmation text in the panel's wording
    fn summary(&self) -> String {
        let plan = self.plan;
        let fill = self.fill_price.unwrap_or(plan.entry_price);
        let head = format!("{} {} shares of {}", plan.action, plan.quantity, plan.symbol);
        let stops = self
            .placed_after_primary()
            .filter(|leg| matches!(leg.kind, OrderKind::Stop(_)) && leg.oco_group.is_none())
            .count();

        match plan.strategy {
            OrderStrategy::MarketOnly => format!("{head} at market price ${fill:.2} submitted."),
            OrderStrategy::MarketPlusOneStop => format!(
                "{head} at ${fill:.2}. {stops} stop-loss order submitted at ${:.2}.",
                plan.stop_price
            ),
            OrderStrategy::MarketPlusThreeStops => {
                format!("{head} at ${fill:.2}. {stops} stop-loss orders submitted.")
            }
            OrderStrategy::ThreeStopsOnly => format!(
                "{stops} stop-loss orders for {} shares of {} submitted.",
                plan.quantity, plan.symbol
            ),
            OrderStrategy::LimitOnly => format!(
                "Limit order to {} {} shares of {} at ${:.2} submitted.",
                plan.action, plan.quantity, plan.symbol, plan.entry_price
            ),
            OrderStrategy::StopOnly => format!(
                "Stop order to {} {} shares of {} at stop ${:.2} submitted.",
                plan.action, plan.quantity, plan.symbol, plan.stop_price
            ),
            OrderStrategy::MarketPlusThreeStopsWithOco => {
                let oco_price = |limit: bool| {
                    self.placed_after_primary()
                        .filter(|leg| leg.oco_group.is_some())
                        .find(|leg| matches!(leg.kind, OrderKind::Limit(_)) == limit)
                        .and_then(OrderLeg::price)
                };
                match (oco_price(true), oco_price(false)) {
                    (Some(target), Some(stop)) => format!(
                        "{head} at ${fill:.2}. OCO (Limit@${target:.2}/Stop@${stop:.2}) + {stops} stops submitted."
                    ),
                    _ => format!("{head} at ${fill:.2}. {stops} stops submitted."),
                }
            }
        }
    }
}
