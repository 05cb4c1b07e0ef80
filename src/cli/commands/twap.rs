//! TWAP command.

use anyhow::{bail, Result};
use bot_config::TwapSettings;
use bot_core::Exchange;
use bot_execution::{FailurePolicy, RunState, TwapReport, TwapRequest, TwapRunner};

use crate::cli::interrupt::Interrupt;
use crate::cli::TwapArgs;

pub async fn run(
    exchange: &dyn Exchange,
    args: &TwapArgs,
    settings: &TwapSettings,
    interrupt: &Interrupt,
) -> Result<()> {
    let request = TwapRequest {
        symbol: args.symbol.clone(),
        side: args.side.clone(),
        total_quantity: args.quantity.clone(),
        slice_count: args.slices,
        duration_secs: args.duration,
        limit_price: args.limit_price.clone(),
        time_in_force: args.time_in_force.clone(),
    };
    let report = execute(exchange, &request, settings, args.abort_on_failure, interrupt).await;
    println!("{}", report.summary());
    if let RunState::Aborted { reason } = &report.state {
        bail!("TWAP aborted: {}", reason);
    }
    if report.failure_count() > 0 {
        bail!("TWAP finished with {} failed slice(s)", report.failure_count());
    }
    Ok(())
}

/// Run a TWAP with Ctrl-C wired to the stop signal.
pub async fn execute(
    exchange: &dyn Exchange,
    request: &TwapRequest,
    settings: &TwapSettings,
    abort_on_failure: bool,
    interrupt: &Interrupt,
) -> TwapReport {
    let policy = if abort_on_failure || settings.abort_on_failure {
        FailurePolicy::AbortOnFailure
    } else {
        FailurePolicy::Continue
    };

    println!(
        "Executing TWAP: {} {} {} over {} slices (Ctrl-C to stop)",
        request.side, request.total_quantity, request.symbol, request.slice_count
    );
    TwapRunner::new(exchange)
        .with_policy(policy)
        .with_client_id_prefix(settings.client_id_prefix.as_str())
        .execute_on_lot_grid(request, Some(interrupt.subscribe()))
        .await
}
