//! TWAP runner behaviour against a scripted exchange on a paused clock.

use async_trait::async_trait;
use bot_core::error::{ErrorKind, ExchangeError};
use bot_core::traits::Exchange;
use bot_core::types::{
    AccountBalance, OrderResult, OrderStatus, OrderType, PriceTicker, Side, SymbolInfo,
    TimeInForce,
};
use bot_execution::{FailurePolicy, RunState, TwapRequest, TwapRunner};
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

/// Fills market orders at a fixed price and rejects the listed submissions
/// (1-based).
struct ScriptedExchange {
    reject: Vec<usize>,
    calls: Mutex<Vec<(Instant, Decimal, Option<String>)>>,
}

impl ScriptedExchange {
    fn new(reject: &[usize]) -> Self {
        Self {
            reject: reject.to_vec(),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().iter().map(|c| c.0).collect()
    }

    fn client_ids(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|c| c.2.clone())
            .collect()
    }
}

#[async_trait]
impl Exchange for ScriptedExchange {
    async fn validate_connection(&self) -> Result<AccountBalance, ExchangeError> {
        unimplemented!()
    }

    async fn place_market_order(
        &self,
        symbol: &str,
        side: Side,
        quantity: Decimal,
        client_order_id: Option<&str>,
    ) -> Result<OrderResult, ExchangeError> {
        let n = {
            let mut calls = self.calls.lock().unwrap();
            calls.push((Instant::now(), quantity, client_order_id.map(str::to_string)));
            calls.len()
        };
        if self.reject.contains(&n) {
            return Err(ExchangeError::Rejected {
                code: -2019,
                message: "Margin is insufficient.".into(),
            });
        }
        Ok(OrderResult {
            order_id: n as i64,
            client_order_id: client_order_id.map(str::to_string),
            symbol: symbol.to_string(),
            side,
            order_type: OrderType::Market,
            status: OrderStatus::Filled,
            quantity,
            filled_quantity: quantity,
            price: None,
            avg_price: Some(dec!(50000)),
            stop_price: None,
            time_in_force: None,
            updated_at: Utc::now(),
            raw: serde_json::Value::Null,
        })
    }

    async fn place_limit_order(
        &self,
        _symbol: &str,
        _side: Side,
        _quantity: Decimal,
        _price: Decimal,
        _time_in_force: TimeInForce,
        _client_order_id: Option<&str>,
    ) -> Result<OrderResult, ExchangeError> {
        unimplemented!()
    }

    async fn place_stop_limit_order(
        &self,
        _symbol: &str,
        _side: Side,
        _quantity: Decimal,
        _stop_price: Decimal,
        _price: Decimal,
        _time_in_force: TimeInForce,
        _client_order_id: Option<&str>,
    ) -> Result<OrderResult, ExchangeError> {
        unimplemented!()
    }

    async fn get_order_status(&self, _: &str, _: i64) -> Result<OrderResult, ExchangeError> {
        unimplemented!()
    }

    async fn cancel_order(&self, _: &str, _: i64) -> Result<OrderResult, ExchangeError> {
        unimplemented!()
    }

    async fn list_open_orders(&self, _: Option<&str>) -> Result<Vec<OrderResult>, ExchangeError> {
        unimplemented!()
    }

    async fn get_account_balance(&self) -> Result<AccountBalance, ExchangeError> {
        unimplemented!()
    }

    async fn get_symbol_info(&self, _: &str) -> Result<SymbolInfo, ExchangeError> {
        unimplemented!()
    }

    async fn get_current_price(&self, _: &str) -> Result<PriceTicker, ExchangeError> {
        unimplemented!()
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

fn btc_twap(total: &str, slices: u32, duration_secs: u64) -> TwapRequest {
    TwapRequest {
        symbol: "BTCUSDT".into(),
        side: "BUY".into(),
        total_quantity: total.into(),
        slice_count: slices,
        duration_secs,
        ..Default::default()
    }
}

#[tokio::test(start_paused = true)]
async fn test_failed_slice_does_not_stop_the_run() {
    let ex = ScriptedExchange::new(&[3]);
    let runner = TwapRunner::new(&ex);

    let report = runner.execute(&btc_twap("0.01", 5, 600), None, None).await;

    assert_eq!(report.state, RunState::Completed);
    assert_eq!(report.len(), 5);
    assert_eq!(report.failure_count(), 1);
    assert_eq!(report.success_count(), 4);
    assert_eq!(ex.call_count(), 5);
    assert_eq!(report.total_filled(), dec!(0.008));
    assert_eq!(report.average_price(), Some(dec!(50000)));

    let failure = report.slices[2].outcome.as_ref().unwrap_err();
    assert_eq!(failure.slice_index, 2);
    assert_eq!(failure.kind, ErrorKind::Rejected);
    assert_eq!(failure.code, Some(-2019));
}

#[tokio::test(start_paused = true)]
async fn test_slices_are_evenly_spaced() {
    let ex = ScriptedExchange::new(&[]);
    let runner = TwapRunner::new(&ex);
    let start = Instant::now();

    let report = runner.execute(&btc_twap("0.01", 5, 600), None, None).await;
    assert_eq!(report.len(), 5);

    let times = ex.call_times();
    assert!(times[0] - start < Duration::from_secs(1));
    for pair in times.windows(2) {
        assert_eq!(pair[1] - pair[0], Duration::from_secs(150));
    }
    // No trailing pause after the last slice.
    assert!(Instant::now() - times[4] < Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn test_client_ids_share_a_run_prefix() {
    let ex = ScriptedExchange::new(&[]);
    let runner = TwapRunner::new(&ex).with_client_id_prefix("bot");

    runner.execute(&btc_twap("0.003", 3, 2), None, None).await;

    let ids = ex.client_ids();
    assert_eq!(ids.len(), 3);
    let run = ids[0].trim_end_matches("-0");
    assert!(run.starts_with("bot-"));
    assert_eq!(ids[1], format!("{}-1", run));
    assert_eq!(ids[2], format!("{}-2", run));
}

#[tokio::test(start_paused = true)]
async fn test_planning_failure_submits_nothing() {
    let ex = ScriptedExchange::new(&[]);
    let runner = TwapRunner::new(&ex);

    let report = runner.execute(&btc_twap("0.01", 0, 600), None, None).await;

    assert!(matches!(report.state, RunState::Aborted { .. }));
    assert!(report.is_empty());
    assert_eq!(ex.call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_abort_policy_halts_on_first_failure() {
    let ex = ScriptedExchange::new(&[2]);
    let runner = TwapRunner::new(&ex).with_policy(FailurePolicy::AbortOnFailure);

    let report = runner.execute(&btc_twap("0.01", 5, 60), None, None).await;

    assert_eq!(report.state, RunState::Halted { failed_slice: 1 });
    assert_eq!(report.len(), 2);
    assert_eq!(ex.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_stop_signal_interrupts_pause() {
    let ex = ScriptedExchange::new(&[]);
    let runner = TwapRunner::new(&ex);
    let (tx, rx) = watch::channel(false);
    let request = btc_twap("0.01", 5, 600);

    let stopper = async {
        tokio::time::sleep(Duration::from_secs(200)).await;
        tx.send(true).unwrap();
    };
    let (report, _) = tokio::join!(
        runner.execute(&request, None, Some(rx)),
        stopper
    );

    // Slices at t=0 and t=150; the stop lands during the second pause.
    assert_eq!(report.state, RunState::Stopped { after_slice: 1 });
    assert_eq!(report.len(), 2);
    assert_eq!(ex.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_step_size_rounding() {
    let ex = ScriptedExchange::new(&[]);
    let runner = TwapRunner::new(&ex);

    let report = runner
        .execute(&btc_twap("0.01", 3, 10), Some(dec!(0.001)), None)
        .await;

    let quantities: Vec<Decimal> = report.slices.iter().map(|s| s.quantity).collect();
    assert_eq!(quantities, vec![dec!(0.003), dec!(0.003), dec!(0.004)]);
}
