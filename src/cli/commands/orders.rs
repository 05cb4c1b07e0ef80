//! One-shot order commands.

use anyhow::Result;
use bot_core::Exchange;
use bot_execution::OrderHandler;

use crate::cli::output::print_order;
use crate::cli::{LimitArgs, MarketArgs, ProtectiveArgs, StopLimitArgs};

pub async fn market(exchange: &dyn Exchange, args: &MarketArgs) -> Result<()> {
    let order = OrderHandler::new(exchange)
        .place_market(&args.symbol, &args.side, &args.quantity)
        .await?;
    print_order(&order);
    Ok(())
}

pub async fn limit(exchange: &dyn Exchange, args: &LimitArgs) -> Result<()> {
    let order = OrderHandler::new(exchange)
        .place_limit(
            &args.symbol,
            &args.side,
            &args.quantity,
            &args.price,
            args.time_in_force.as_deref(),
        )
        .await?;
    print_order(&order);
    Ok(())
}

pub async fn stop_limit(exchange: &dyn Exchange, args: &StopLimitArgs) -> Result<()> {
    let order = OrderHandler::new(exchange)
        .place_stop_limit(
            &args.symbol,
            &args.side,
            &args.quantity,
            &args.stop_price,
            &args.price,
            args.time_in_force.as_deref(),
        )
        .await?;
    print_order(&order);
    Ok(())
}

pub async fn stop_loss(exchange: &dyn Exchange, args: &ProtectiveArgs) -> Result<()> {
    let order = OrderHandler::new(exchange)
        .place_stop_loss(&args.symbol, &args.quantity, &args.trigger_price, args.offset)
        .await?;
    print_order(&order);
    Ok(())
}

pub async fn take_profit(exchange: &dyn Exchange, args: &ProtectiveArgs) -> Result<()> {
    let order = OrderHandler::new(exchange)
        .place_take_profit(&args.symbol, &args.quantity, &args.trigger_price, args.offset)
        .await?;
    print_order(&order);
    Ok(())
}
