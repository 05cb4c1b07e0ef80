//! Time-Weighted Average Price (TWAP) execution.
//!
//! Splits a parent quantity into equal child orders submitted one after
//! another with an even pause between them. Slices run strictly in sequence;
//! a slice that fails is recorded and, under the default policy, the run
//! carries on with the next one.

use bot_core::error::{BotError, ErrorKind, ValidationError};
use bot_core::traits::Exchange;
use bot_core::types::{round_down_to_step, OrderRequest, OrderResult, Side, TimeInForce};
use bot_core::validation;
use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::handler::OrderHandler;

/// Decimal places kept per slice when the symbol's lot step is unknown.
const DEFAULT_SLICE_DP: u32 = 8;

/// Upper bound on the number of child orders in one run.
pub const MAX_SLICES: u32 = 1000;

/// TWAP parameters as entered by the operator.
#[derive(Debug, Clone, Default)]
pub struct TwapRequest {
    pub symbol: String,
    pub side: String,
    pub total_quantity: String,
    pub slice_count: u32,
    pub duration_secs: u64,
    /// Work each slice as a limit order at this price instead of at market
    pub limit_price: Option<String>,
    pub time_in_force: Option<String>,
}

/// What each slice is submitted as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChildOrder {
    Market,
    Limit {
        price: Decimal,
        time_in_force: TimeInForce,
    },
}

/// Validated execution schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct TwapPlan {
    pub symbol: String,
    pub side: Side,
    pub total_quantity: Decimal,
    pub slice_count: u32,
    pub duration_secs: u64,
    /// Per-slice quantities; they sum to `total_quantity` exactly
    pub slices: Vec<Decimal>,
    pub inter_slice_delay: Duration,
    pub child: ChildOrder,
}

impl TwapPlan {
    /// Validate the request and compute the schedule.
    ///
    /// `step_size` is the symbol's lot step; slices are rounded down to it and
    /// the last slice takes whatever is left.
    pub fn new(request: &TwapRequest, step_size: Option<Decimal>) -> Result<Self, ValidationError> {
        let symbol = validation::parse_symbol(&request.symbol)?;
        let side = validation::parse_side(&request.side)?;
        let total_quantity = validation::parse_quantity(&request.total_quantity)?;
        check_slice_count(request.slice_count)?;

        let child = match request.limit_price.as_deref().map(str::trim) {
            Some(price) if !price.is_empty() => ChildOrder::Limit {
                price: validation::parse_price("price", Some(price))?,
                time_in_force: validation::parse_time_in_force(request.time_in_force.as_deref())?
                    .unwrap_or_default(),
            },
            _ => ChildOrder::Market,
        };

        let slices = split_quantity(total_quantity, request.slice_count, step_size)?;
        let inter_slice_delay = inter_slice_delay(request.duration_secs, request.slice_count);

        Ok(Self {
            symbol,
            side,
            total_quantity,
            slice_count: request.slice_count,
            duration_secs: request.duration_secs,
            slices,
            inter_slice_delay,
            child,
        })
    }

    /// Re-split onto the symbol's lot step.
    pub fn with_step_size(mut self, step_size: Option<Decimal>) -> Result<Self, ValidationError> {
        self.slices = split_quantity(self.total_quantity, self.slice_count, step_size)?;
        Ok(self)
    }

    /// Build the child order for slice `index`.
    pub fn child_request(&self, quantity: Decimal, client_order_id: String) -> OrderRequest {
        let request = match self.child {
            ChildOrder::Market => OrderRequest::market(&self.symbol, self.side, quantity),
            ChildOrder::Limit { price, time_in_force } => {
                OrderRequest::limit(&self.symbol, self.side, quantity, price)
                    .with_time_in_force(time_in_force)
            }
        };
        request.with_client_order_id(client_order_id)
    }
}

/// Split `total` into `count` slices. All but the last are equal and rounded
/// down to `step` (or to 8 decimal places); the last absorbs the remainder.
pub fn split_quantity(
    total: Decimal,
    count: u32,
    step: Option<Decimal>,
) -> Result<Vec<Decimal>, ValidationError> {
    check_slice_count(count)?;
    if count == 1 {
        return Ok(vec![total]);
    }

    let even = total / Decimal::from(count);
    let base = match step {
        Some(step) if !step.is_zero() => round_down_to_step(even, Some(step)),
        _ => even
            .round_dp_with_strategy(DEFAULT_SLICE_DP, RoundingStrategy::ToZero)
            .normalize(),
    };

    if base <= Decimal::ZERO {
        return Err(ValidationError::InvalidTwap(format!(
            "{} split into {} slices rounds to zero",
            total, count
        )));
    }

    let mut slices = vec![base; count as usize - 1];
    slices.push((total - base * Decimal::from(count - 1)).normalize());
    Ok(slices)
}

fn check_slice_count(count: u32) -> Result<(), ValidationError> {
    if count == 0 {
        return Err(ValidationError::InvalidTwap("slice count must be at least 1".into()));
    }
    if count > MAX_SLICES {
        return Err(ValidationError::InvalidTwap(format!(
            "slice count {} exceeds the maximum of {}",
            count, MAX_SLICES
        )));
    }
    Ok(())
}

/// `duration / (count - 1)`, or zero for a single slice.
pub fn inter_slice_delay(duration_secs: u64, count: u32) -> Duration {
    if count <= 1 {
        return Duration::ZERO;
    }
    Duration::from_millis(duration_secs.saturating_mul(1000) / u64::from(count - 1))
}

/// What to do when a slice fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Record the failure and submit the remaining slices
    #[default]
    Continue,
    /// Stop at the first failed slice
    AbortOnFailure,
}

/// A slice that did not produce an order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SliceFailure {
    pub slice_index: u32,
    pub kind: ErrorKind,
    pub code: Option<i64>,
    pub message: String,
}

impl SliceFailure {
    fn from_error(slice_index: u32, err: &BotError) -> Self {
        Self {
            slice_index,
            kind: err.kind(),
            code: err.code(),
            message: err.to_string(),
        }
    }
}

/// One attempted slice.
#[derive(Debug, Clone, Serialize)]
pub struct SliceRecord {
    pub index: u32,
    pub quantity: Decimal,
    pub submitted_at: DateTime<Utc>,
    pub outcome: Result<OrderResult, SliceFailure>,
}

impl SliceRecord {
    pub fn is_failure(&self) -> bool {
        self.outcome.is_err()
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// Every slice was attempted
    Completed,
    /// Planning failed; nothing was submitted
    Aborted { reason: String },
    /// The stop signal arrived during a pause
    Stopped { after_slice: u32 },
    /// A slice failed under `FailurePolicy::AbortOnFailure`
    Halted { failed_slice: u32 },
}

/// Outcome of one TWAP run.
#[derive(Debug, Clone, Serialize)]
pub struct TwapReport {
    pub symbol: String,
    pub side: Option<Side>,
    pub planned_slices: u32,
    pub state: RunState,
    pub slices: Vec<SliceRecord>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl TwapReport {
    fn aborted(symbol: &str, reason: String) -> Self {
        let now = Utc::now();
        Self {
            symbol: symbol.to_string(),
            side: None,
            planned_slices: 0,
            state: RunState::Aborted { reason },
            slices: Vec::new(),
            started_at: now,
            finished_at: now,
        }
    }

    pub fn len(&self) -> usize {
        self.slices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    pub fn failure_count(&self) -> usize {
        self.slices.iter().filter(|s| s.is_failure()).count()
    }

    pub fn success_count(&self) -> usize {
        self.len() - self.failure_count()
    }

    pub fn total_filled(&self) -> Decimal {
        self.orders().map(|o| o.filled_quantity).sum()
    }

    /// Fill-weighted average price across slices that report one.
    pub fn average_price(&self) -> Option<Decimal> {
        let (value, qty) = self
            .orders()
            .filter_map(|o| o.filled_value().map(|v| (v, o.filled_quantity)))
            .fold((Decimal::ZERO, Decimal::ZERO), |(v, q), (dv, dq)| (v + dv, q + dq));
        (!qty.is_zero()).then(|| value / qty)
    }

    fn orders(&self) -> impl Iterator<Item = &OrderResult> {
        self.slices.iter().filter_map(|s| s.outcome.as_ref().ok())
    }

    /// Human-readable report.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "TWAP {} {}: {:?}\n",
            self.symbol,
            self.side.map(|s| s.to_string()).unwrap_or_default(),
            self.state
        ));
        for slice in &self.slices {
            match &slice.outcome {
                Ok(order) => out.push_str(&format!(
                    "  [{}] {} -> {}\n",
                    slice.index + 1,
                    slice.quantity,
                    order
                )),
                Err(failure) => out.push_str(&format!(
                    "  [{}] {} -> FAILED ({}): {}\n",
                    slice.index + 1,
                    slice.quantity,
                    failure.kind,
                    failure.message
                )),
            }
        }
        out.push_str(&format!(
            "Slices: {}/{} ok, {} failed. Total filled: {}",
            self.success_count(),
            self.planned_slices,
            self.failure_count(),
            self.total_filled()
        ));
        if let Some(avg) = self.average_price() {
            out.push_str(&format!(", avg price: {}", avg.round_dp(8).normalize()));
        }
        out
    }
}

/// Runs TWAP plans against an exchange.
pub struct TwapRunner<'a> {
    exchange: &'a dyn Exchange,
    handler: OrderHandler<'a>,
    policy: FailurePolicy,
    client_id_prefix: String,
}

impl<'a> TwapRunner<'a> {
    pub fn new(exchange: &'a dyn Exchange) -> Self {
        Self {
            exchange,
            handler: OrderHandler::new(exchange),
            policy: FailurePolicy::Continue,
            client_id_prefix: "twap".to_string(),
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_client_id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.client_id_prefix = prefix.into();
        self
    }

    /// Plan and run. A planning failure produces an `Aborted` report with no
    /// slices.
    pub async fn execute(
        &self,
        request: &TwapRequest,
        step_size: Option<Decimal>,
        stop: Option<watch::Receiver<bool>>,
    ) -> TwapReport {
        match TwapPlan::new(request, step_size) {
            Ok(plan) => self.run(&plan, stop).await,
            Err(e) => {
                error!("TWAP planning failed: {}", e);
                TwapReport::aborted(&request.symbol, e.to_string())
            }
        }
    }

    /// Validate `request`, then fetch the symbol's lot step and run on that
    /// grid. Nothing reaches the exchange when validation fails. If the rules
    /// cannot be fetched the run falls back to 8 decimal places.
    pub async fn execute_on_lot_grid(
        &self,
        request: &TwapRequest,
        stop: Option<watch::Receiver<bool>>,
    ) -> TwapReport {
        let plan = match TwapPlan::new(request, None) {
            Ok(plan) => plan,
            Err(e) => {
                error!("TWAP planning failed: {}", e);
                return TwapReport::aborted(&request.symbol, e.to_string());
            }
        };

        let step_size = match self.exchange.get_symbol_info(&plan.symbol).await {
            Ok(info) => {
                if !info.is_trading() {
                    warn!("{} status is {}, slices may be rejected", info.symbol, info.status);
                }
                info.step_size
            }
            Err(e) => {
                warn!("Lot step for {} unavailable, rounding slices to 8 dp: {}", plan.symbol, e);
                None
            }
        };

        match plan.with_step_size(step_size) {
            Ok(plan) => self.run(&plan, stop).await,
            Err(e) => {
                error!("TWAP planning failed: {}", e);
                TwapReport::aborted(&request.symbol, e.to_string())
            }
        }
    }

    /// Submit every slice of `plan` in order.
    pub async fn run(&self, plan: &TwapPlan, mut stop: Option<watch::Receiver<bool>>) -> TwapReport {
        let run_id: String = Uuid::new_v4().simple().to_string().chars().take(8).collect();
        let started_at = Utc::now();
        let last = plan.slices.len().saturating_sub(1);

        info!(
            run_id = %run_id,
            symbol = %plan.symbol,
            side = %plan.side,
            total = %plan.total_quantity,
            slices = plan.slice_count,
            delay_ms = plan.inter_slice_delay.as_millis() as u64,
            "Starting TWAP execution"
        );

        let mut records = Vec::with_capacity(plan.slices.len());
        let mut state = RunState::Completed;

        for (i, quantity) in plan.slices.iter().copied().enumerate() {
            let index = i as u32;
            let client_id = format!("{}-{}-{}", self.client_id_prefix, run_id, index);
            let request = plan.child_request(quantity, client_id);
            let submitted_at = Utc::now();

            let outcome = match self.handler.submit(&request).await {
                Ok(order) => {
                    info!("TWAP slice {}/{} placed: {}", index + 1, plan.slice_count, order);
                    Ok(order)
                }
                Err(e) => {
                    warn!("TWAP slice {}/{} failed: {}", index + 1, plan.slice_count, e);
                    Err(SliceFailure::from_error(index, &e))
                }
            };
            let failed = outcome.is_err();
            records.push(SliceRecord {
                index,
                quantity,
                submitted_at,
                outcome,
            });

            if failed && self.policy == FailurePolicy::AbortOnFailure {
                state = RunState::Halted { failed_slice: index };
                break;
            }

            if i < last && !pause(plan.inter_slice_delay, stop.as_mut()).await {
                info!("TWAP stop requested after slice {}", index + 1);
                state = RunState::Stopped { after_slice: index };
                break;
            }
        }

        let report = TwapReport {
            symbol: plan.symbol.clone(),
            side: Some(plan.side),
            planned_slices: plan.slice_count,
            state,
            slices: records,
            started_at,
            finished_at: Utc::now(),
        };
        info!(
            run_id = %run_id,
            state = ?report.state,
            filled = %report.total_filled(),
            failures = report.failure_count(),
            "TWAP execution finished"
        );
        report
    }
}

/// Sleep for `delay`. Returns false if the stop signal fired first.
async fn pause(delay: Duration, stop: Option<&mut watch::Receiver<bool>>) -> bool {
    let Some(stop) = stop else {
        tokio::time::sleep(delay).await;
        return true;
    };

    let sleep = tokio::time::sleep(delay);
    tokio::pin!(sleep);
    loop {
        if *stop.borrow_and_update() {
            return false;
        }
        tokio::select! {
            _ = &mut sleep => return true,
            changed = stop.changed() => {
                if changed.is_err() {
                    // Sender gone; nobody can stop us any more.
                    (&mut sleep).await;
                    return true;
                }
            }
        }
    }
}
